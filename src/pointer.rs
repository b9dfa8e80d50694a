use crate::geometry::Point;

/// Last known pointer position, dropped after a stretch without movement
/// or when the terminal loses focus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerTracker {
    timeout: f32,
    idle: f32,
    position: Option<Point>,
}

impl PointerTracker {
    /// `timeout` is in seconds.
    pub fn new(timeout: f32) -> Self {
        Self {
            timeout,
            idle: 0.0,
            position: None,
        }
    }

    pub fn current(&self) -> Option<Point> {
        self.position
    }

    pub fn seen(&mut self, at: Point) {
        self.position = Some(at);
        self.idle = 0.0;
    }

    pub fn lost(&mut self) {
        self.position = None;
        self.idle = 0.0;
    }

    /// Age the last sighting by `dt` seconds. Returns `true` on the call
    /// that clears the pointer.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.position.is_none() {
            return false;
        }
        self.idle += dt;
        if self.idle > self.timeout {
            self.lost();
            return true;
        }
        false
    }
}
