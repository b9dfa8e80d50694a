use crate::color::Hsla;
use crate::geometry::{Point, Rect};

pub mod terminal;

#[cfg(test)]
pub mod recording;

/// Soft halo drawn around a shape, in logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
    pub blur: f32,
    pub color: Hsla,
}

/// Immediate-mode 2-D target the scene draws into. All coordinates are logical units.
pub trait Surface {
    fn clear(&mut self, region: Rect);
    fn fill_circle(&mut self, center: Point, radius: f32, color: Hsla, glow: Option<Glow>);
    /// Stroke connected segments through `points`. Fewer than two points draws nothing.
    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Hsla, glow: Option<Glow>);
}
