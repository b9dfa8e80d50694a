use std::collections::VecDeque;

use super::FrameContext;
use crate::color::Hsla;
use crate::config::CircuitConfig;
use crate::geometry::{Point, Viewport};
use crate::surface::{Glow, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    fn random(rng: &mut fastrand::Rng) -> Self {
        match rng.u8(0..4) {
            0 => Direction::Up,
            1 => Direction::Right,
            2 => Direction::Down,
            _ => Direction::Left,
        }
    }

    fn unit(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Right => (1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
        }
    }
}

/// A data packet running along circuit traces, leaving a fading trail.
#[derive(Debug, Clone)]
pub struct TrailEmitter {
    pub position: Point,
    pub direction: Direction,
    speed: f32,
    size: f32,
    pub life: i32,
    /// Oldest first, never longer than `CircuitConfig::history_len`.
    pub history: VecDeque<Point>,
    hue: f32,
}

impl TrailEmitter {
    fn spawn(viewport: Viewport, cfg: &CircuitConfig, rng: &mut fastrand::Rng) -> Self {
        let mut emitter = Self {
            position: Point::default(),
            direction: Direction::Up,
            speed: 0.0,
            size: 0.0,
            life: 0,
            history: VecDeque::with_capacity(cfg.history_len + 1),
            hue: 0.0,
        };
        emitter.reset(viewport, cfg, rng);
        emitter
    }

    /// Reinitialise in place, keeping the history allocation.
    fn reset(&mut self, viewport: Viewport, cfg: &CircuitConfig, rng: &mut fastrand::Rng) {
        self.position = Point::new(
            (rng.f32() * viewport.width).floor(),
            (rng.f32() * viewport.height).floor(),
        );
        self.direction = Direction::random(rng);
        self.speed = cfg.speed.sample(rng);
        self.size = cfg.size.sample(rng);
        self.life = cfg.life.sample(rng);
        self.history.clear();
        self.hue = match cfg.accent_hue {
            Some(accent) if rng.f32() < cfg.accent_chance => accent,
            _ if cfg.hues.is_empty() => 30.0,
            _ => cfg.hues[rng.usize(0..cfg.hues.len())],
        };
    }

    fn out_of_bounds(&self, viewport: Viewport, padding: f32) -> bool {
        self.position.x < -padding
            || self.position.x > viewport.width + padding
            || self.position.y < -padding
            || self.position.y > viewport.height + padding
    }

    fn update(&mut self, viewport: Viewport, cfg: &CircuitConfig, rng: &mut fastrand::Rng) {
        self.history.push_back(self.position);
        while self.history.len() > cfg.history_len {
            self.history.pop_front();
        }

        let (dx, dy) = self.direction.unit();
        self.position.x += dx * self.speed;
        self.position.y += dy * self.speed;

        if rng.f32() < cfg.turn_chance {
            self.direction = Direction::random(rng);
        }

        self.life -= 1;
        if self.life <= 0 || self.out_of_bounds(viewport, cfg.bounds_padding) {
            self.reset(viewport, cfg, rng);
        }
    }

    fn draw(&self, surface: &mut impl Surface, cfg: &CircuitConfig, trail: &mut Vec<Point>) {
        let color = Hsla::new(self.hue, cfg.saturation, cfg.lightness, 1.0);

        trail.clear();
        trail.extend(self.history.iter().copied());
        trail.push(self.position);

        if trail.len() >= 2 {
            let stroke = color.with_alpha(cfg.trail_alpha);
            surface.stroke_polyline(trail, cfg.trail_width, stroke, None);
            surface.stroke_polyline(
                trail,
                cfg.trail_width,
                stroke,
                Some(Glow { blur: cfg.trail_glow, color: stroke }),
            );
        }

        surface.fill_circle(self.position, self.size, color, None);
        surface.fill_circle(
            self.position,
            self.size,
            color,
            Some(Glow { blur: cfg.head_glow, color }),
        );
    }
}

/// Constant-size pool of [`TrailEmitter`]s; expired packets are recycled in place.
pub struct CircuitField {
    emitters: Vec<TrailEmitter>,
    config: CircuitConfig,
    trail: Vec<Point>,
}

impl CircuitField {
    pub fn new(count: usize, viewport: Viewport, config: CircuitConfig, rng: &mut fastrand::Rng) -> Self {
        let emitters = (0..count).map(|_| TrailEmitter::spawn(viewport, &config, rng)).collect();
        let trail = Vec::with_capacity(config.history_len + 1);
        Self { emitters, config, trail }
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    #[cfg(test)]
    pub fn emitters(&self) -> &[TrailEmitter] {
        &self.emitters
    }

    pub fn update(&mut self, ctx: &FrameContext, rng: &mut fastrand::Rng) {
        for e in &mut self.emitters {
            e.update(ctx.viewport, &self.config, rng);
        }
    }

    pub fn draw(&mut self, surface: &mut impl Surface) {
        for e in &self.emitters {
            e.draw(surface, &self.config, &mut self.trail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::recording::{Command, RecordingSurface};

    const VIEW: Viewport = Viewport::new(400.0, 300.0);

    fn ctx() -> FrameContext {
        FrameContext {
            viewport: VIEW,
            anchor: VIEW.center(),
            pointer: None,
            tick: 0,
        }
    }

    fn steady() -> CircuitConfig {
        CircuitConfig {
            turn_chance: 0.0,
            life: crate::config::SpawnRange { min: 1000, max: 1000 },
            ..CircuitConfig::default()
        }
    }

    fn emitter_at(x: f32, y: f32, direction: Direction, cfg: &CircuitConfig) -> TrailEmitter {
        let mut rng = fastrand::Rng::with_seed(3);
        let mut e = TrailEmitter::spawn(VIEW, cfg, &mut rng);
        e.position = Point::new(x, y);
        e.direction = direction;
        e.speed = 1.0;
        e
    }

    #[test]
    fn spawn_positions_are_whole_numbers() {
        let mut rng = fastrand::Rng::with_seed(11);
        let field = CircuitField::new(30, VIEW, CircuitConfig::default(), &mut rng);
        assert_eq!(field.len(), 30);
        for e in field.emitters() {
            assert_eq!(e.position.x.fract(), 0.0);
            assert_eq!(e.position.y.fract(), 0.0);
            assert!(e.history.is_empty());
            assert!((100..=300).contains(&e.life));
        }
    }

    #[test]
    fn moves_along_its_axis() {
        let cfg = steady();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut e = emitter_at(100.0, 100.0, Direction::Right, &cfg);
        e.update(VIEW, &cfg, &mut rng);
        assert_eq!(e.position, Point::new(101.0, 100.0));
        e.direction = Direction::Up;
        e.update(VIEW, &cfg, &mut rng);
        assert_eq!(e.position, Point::new(101.0, 99.0));
    }

    #[test]
    fn history_is_bounded_fifo() {
        let cfg = steady();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut e = emitter_at(10.0, 150.0, Direction::Right, &cfg);
        let max = cfg.history_len;

        for step in 0..=max {
            e.update(VIEW, &cfg, &mut rng);
            assert!(e.history.len() <= max);
            let oldest = 10.0 + (step + 1).saturating_sub(max) as f32;
            assert_eq!(e.history[0], Point::new(oldest, 150.0));
        }

        // Point (10, 150) was the first one recorded and is now gone.
        assert_eq!(e.history.len(), max);
        assert_eq!(e.history[0], Point::new(11.0, 150.0));
        assert_eq!(*e.history.back().unwrap(), Point::new(10.0 + max as f32, 150.0));
        for pair in e.history.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].x < pair[1].x);
        }
    }

    #[test]
    fn recycles_when_life_runs_out() {
        let cfg = steady();
        let mut rng = fastrand::Rng::with_seed(9);
        let mut e = emitter_at(200.0, 150.0, Direction::Left, &cfg);
        e.life = 1;
        e.update(VIEW, &cfg, &mut rng);
        assert_eq!(e.life, 1000);
        assert!(e.history.is_empty());
    }

    #[test]
    fn recycles_when_leaving_padded_bounds() {
        let cfg = steady();
        let mut rng = fastrand::Rng::with_seed(9);

        let mut e = emitter_at(405.0, 150.0, Direction::Right, &cfg);
        e.update(VIEW, &cfg, &mut rng);
        assert_eq!(e.position, Point::new(406.0, 150.0), "inside padding");

        let mut e = emitter_at(410.0, 150.0, Direction::Right, &cfg);
        e.update(VIEW, &cfg, &mut rng);
        assert!(e.history.is_empty());
        assert!(e.position.x <= 400.0);
    }

    #[test]
    fn population_is_constant() {
        let mut rng = fastrand::Rng::with_seed(21);
        let mut field = CircuitField::new(15, VIEW, CircuitConfig::default(), &mut rng);
        for _ in 0..1000 {
            field.update(&ctx(), &mut rng);
            assert_eq!(field.len(), 15);
            for e in field.emitters() {
                assert!(e.history.len() <= 20);
            }
        }
    }

    #[test]
    fn accent_hue_is_used_when_certain() {
        let cfg = CircuitConfig { accent_chance: 1.0, ..CircuitConfig::default() };
        let mut rng = fastrand::Rng::with_seed(2);
        let e = TrailEmitter::spawn(VIEW, &cfg, &mut rng);
        assert_eq!(e.hue, 190.0);

        let cfg = CircuitConfig { accent_hue: None, accent_chance: 1.0, ..CircuitConfig::default() };
        let e = TrailEmitter::spawn(VIEW, &cfg, &mut rng);
        assert!(e.hue == 30.0 || e.hue == 45.0);
    }

    #[test]
    fn draws_trail_before_head() {
        let cfg = steady();
        let mut rng = fastrand::Rng::with_seed(5);
        let mut e = emitter_at(100.0, 100.0, Direction::Down, &cfg);
        for _ in 0..3 {
            e.update(VIEW, &cfg, &mut rng);
        }

        let mut s = RecordingSurface::new();
        let mut scratch = Vec::new();
        e.draw(&mut s, &cfg, &mut scratch);

        assert_eq!(s.commands.len(), 4);
        let Command::Polyline { points, glow: None, .. } = &s.commands[0] else {
            panic!("expected plain trail first, got {:?}", s.commands[0])
        };
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point::new(100.0, 100.0));
        assert_eq!(points[3], Point::new(100.0, 103.0));
        assert!(matches!(s.commands[1], Command::Polyline { glow: Some(_), .. }));
        assert!(matches!(s.commands[2], Command::Circle { glow: None, .. }));
        let Command::Circle { glow: Some(glow), .. } = &s.commands[3] else {
            panic!("expected glowing head last")
        };
        assert_eq!(glow.blur, cfg.head_glow);
    }

    #[test]
    fn fresh_emitter_draws_only_its_head() {
        let cfg = steady();
        let e = emitter_at(50.0, 50.0, Direction::Left, &cfg);
        let mut s = RecordingSurface::new();
        e.draw(&mut s, &cfg, &mut Vec::new());
        assert_eq!(s.polylines().count(), 0);
        assert_eq!(s.circles().count(), 2);
    }
}
