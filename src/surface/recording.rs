use super::{Glow, Surface};
use crate::color::Hsla;
use crate::geometry::{Point, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear(Rect),
    Circle {
        center: Point,
        radius: f32,
        color: Hsla,
        glow: Option<Glow>,
    },
    Polyline {
        points: Vec<Point>,
        width: f32,
        color: Hsla,
        glow: Option<Glow>,
    },
}

/// Surface that keeps every call for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<Command>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circles(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| matches!(c, Command::Circle { .. }))
    }

    pub fn polylines(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(|c| matches!(c, Command::Polyline { .. }))
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, region: Rect) {
        self.commands.push(Command::Clear(region));
    }

    fn fill_circle(&mut self, center: Point, radius: f32, color: Hsla, glow: Option<Glow>) {
        self.commands.push(Command::Circle { center, radius, color, glow });
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, color: Hsla, glow: Option<Glow>) {
        self.commands.push(Command::Polyline {
            points: points.to_vec(),
            width,
            color,
            glow,
        });
    }
}
