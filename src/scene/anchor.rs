use crate::config::ElementRect;
use crate::geometry::{Point, Rect, Viewport};

/// Where bursts originate: the centre of the anchor element's box, or the
/// viewport centre when there is no usable element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorLayout {
    element: Option<ElementRect>,
}

impl AnchorLayout {
    pub fn new(element: Option<ElementRect>) -> Self {
        Self { element }
    }

    /// Bounding box of the anchor element laid out in `viewport`.
    pub fn element_rect(&self, viewport: Viewport) -> Option<Rect> {
        let el = self.element?;
        let rect = Rect {
            x: el.x * viewport.width,
            y: el.y * viewport.height,
            width: el.width * viewport.width,
            height: el.height * viewport.height,
        };
        (!rect.is_empty()).then_some(rect)
    }

    pub fn resolve(&self, viewport: Viewport) -> Point {
        match self.element_rect(viewport) {
            Some(rect) => rect.center(),
            None => viewport.center(),
        }
    }
}
