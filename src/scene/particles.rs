use std::f32::consts::TAU;

use super::FrameContext;
use crate::color::Hsla;
use crate::config::ParticleConfig;
use crate::geometry::{Point, Viewport};
use crate::surface::Surface;

/// `tick * rate` reduced to one turn. Done in f64 so the pulse keeps
/// advancing long after an f32 tick would stop changing.
fn pulse_angle(tick: u64, rate: f32) -> f32 {
    (tick as f64 * rate as f64).rem_euclid(std::f64::consts::TAU) as f32
}

/// Ambient ember: drifts, wobbles on a small orbit, shies away from the
/// pointer and wraps around the screen edges.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Point,
    vx: f32,
    vy: f32,
    drift_x: f32,
    drift_y: f32,
    angle_x: f32,
    angle_y: f32,
    orbit_speed: f32,
    pub size: f32,
    base_size: f32,
    pulse_phase: f32,
    hue: f32,
    alpha: f32,
}

impl Particle {
    fn spawn(viewport: Viewport, cfg: &ParticleConfig, rng: &mut fastrand::Rng) -> Self {
        let base_size = cfg.base_size.sample(rng);
        let hue = if cfg.hues.is_empty() {
            30.0
        } else {
            cfg.hues[rng.usize(0..cfg.hues.len())]
        };

        Self {
            position: Point::new(rng.f32() * viewport.width, rng.f32() * viewport.height),
            vx: 0.0,
            vy: 0.0,
            drift_x: cfg.drift.sample(rng),
            drift_y: cfg.drift.sample(rng),
            angle_x: rng.f32() * TAU,
            angle_y: rng.f32() * TAU,
            orbit_speed: cfg.orbit_speed.sample(rng),
            size: base_size,
            base_size,
            pulse_phase: rng.f32() * TAU,
            hue,
            alpha: cfg.alpha.sample(rng),
        }
    }

    fn update(&mut self, ctx: &FrameContext, cfg: &ParticleConfig) {
        if let Some(pointer) = ctx.pointer {
            let dx = self.position.x - pointer.x;
            let dy = self.position.y - pointer.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > 0.0 && dist < cfg.repel_radius {
                let force = (cfg.repel_radius - dist) / cfg.repel_radius;
                self.vx += dx / dist * force * cfg.repel_strength;
                self.vy += dy / dist * force * cfg.repel_strength;
            }
        }

        self.vx *= cfg.damping;
        self.vy *= cfg.damping;

        self.angle_x = (self.angle_x + self.orbit_speed) % TAU;
        self.angle_y = (self.angle_y + self.orbit_speed) % TAU;

        self.position.x += self.drift_x + self.vx + self.angle_x.cos() * cfg.orbit_radius;
        self.position.y += self.drift_y + self.vy + self.angle_y.sin() * cfg.orbit_radius;

        let m = cfg.wrap_margin;
        let (w, h) = (ctx.viewport.width, ctx.viewport.height);
        if self.position.x < -m {
            self.position.x = w + m;
        } else if self.position.x > w + m {
            self.position.x = -m;
        }
        if self.position.y < -m {
            self.position.y = h + m;
        } else if self.position.y > h + m {
            self.position.y = -m;
        }

        let pulse = (pulse_angle(ctx.tick, cfg.pulse_rate) + self.pulse_phase).sin();
        self.size = (self.base_size + pulse * cfg.pulse_amplitude).max(0.0);
    }

    fn color(&self, cfg: &ParticleConfig) -> Hsla {
        Hsla::new(self.hue, cfg.saturation, cfg.lightness, self.alpha)
    }
}

/// Fixed population of [`Particle`]s plus the proximity web drawn between them.
pub struct ParticleField {
    particles: Vec<Particle>,
    config: ParticleConfig,
}

impl ParticleField {
    pub fn new(count: usize, viewport: Viewport, config: ParticleConfig, rng: &mut fastrand::Rng) -> Self {
        let particles = (0..count).map(|_| Particle::spawn(viewport, &config, rng)).collect();
        Self { particles, config }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn update(&mut self, ctx: &FrameContext) {
        for p in &mut self.particles {
            p.update(ctx, &self.config);
        }
    }

    /// Stroke alpha of the link between two particles `dist` apart, if they are linked.
    pub fn link_alpha(&self, dist: f32) -> Option<f32> {
        let threshold = self.config.link_distance;
        (dist < threshold).then(|| self.config.link_alpha * (1.0 - dist / threshold))
    }

    pub fn draw(&self, surface: &mut impl Surface) {
        let cfg = &self.config;

        for p in &self.particles {
            surface.fill_circle(p.position, p.size, p.color(cfg), None);
        }

        // O(n^2) over a population of at most a few hundred.
        for (i, a) in self.particles.iter().enumerate() {
            for b in &self.particles[i + 1..] {
                let dist = a.position.distance(b.position);
                if let Some(alpha) = self.link_alpha(dist) {
                    surface.stroke_polyline(
                        &[a.position, b.position],
                        cfg.link_width,
                        a.color(cfg).with_alpha(alpha),
                        None,
                    );
                }
            }
        }
    }
}
