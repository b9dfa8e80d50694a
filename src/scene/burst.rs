use std::f32::consts::TAU;

use crate::color::Hsla;
use crate::config::BurstConfig;
use crate::geometry::Point;
use crate::surface::Surface;

#[derive(Debug, Clone)]
pub struct BurstParticle {
    pub position: Point,
    pub vx: f32,
    pub vy: f32,
    pub life: i32,
    pub alpha: f32,
    pub size: f32,
    hue: f32,
}

impl BurstParticle {
    fn spawn(at: Point, cfg: &BurstConfig, rng: &mut fastrand::Rng) -> Self {
        let angle = rng.f32() * TAU;
        let speed = cfg.speed.sample(rng);

        Self {
            position: at,
            vx: angle.cos() * speed,
            vy: angle.sin() * speed,
            life: cfg.initial_life,
            alpha: 1.0,
            size: cfg.size.sample(rng),
            hue: cfg.hue.sample(rng),
        }
    }

    fn update(&mut self, cfg: &BurstConfig) {
        self.position.x += self.vx;
        self.position.y += self.vy;
        self.vx *= cfg.decay;
        self.vy *= cfg.decay;
        self.life -= cfg.life_step;
        self.alpha = self.life as f32 / cfg.initial_life as f32;
        self.size *= cfg.decay;
    }

    fn is_expired(&self) -> bool {
        self.life <= 0
    }
}

/// Transient explosion particles. Unlike the ambient fields these are
/// destroyed on expiry, so the population grows with every trigger.
pub struct BurstManager {
    particles: Vec<BurstParticle>,
    config: BurstConfig,
}

impl BurstManager {
    pub fn new(config: BurstConfig) -> Self {
        Self {
            particles: Vec::with_capacity(config.count),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[cfg(test)]
    pub fn particles(&self) -> &[BurstParticle] {
        &self.particles
    }

    /// Spawn one burst at `at`. Returns the number of particles added, which is
    /// less than the configured count only when a cap is set.
    pub fn trigger(&mut self, at: Point, rng: &mut fastrand::Rng) -> usize {
        let count = match self.config.cap {
            Some(cap) => self.config.count.min(cap.saturating_sub(self.particles.len())),
            None => self.config.count,
        };
        if count < self.config.count {
            log::debug!("burst capped: spawning {count} of {}", self.config.count);
        }

        let cfg = &self.config;
        self.particles.extend((0..count).map(|_| BurstParticle::spawn(at, cfg, rng)));
        count
    }

    pub fn update(&mut self) {
        let cfg = &self.config;
        self.particles.retain_mut(|p| {
            p.update(cfg);
            !p.is_expired()
        });
    }

    pub fn draw(&self, surface: &mut impl Surface) {
        let cfg = &self.config;
        for p in &self.particles {
            let color = Hsla::new(p.hue, cfg.saturation, cfg.lightness, p.alpha.clamp(0.0, 1.0));
            surface.fill_circle(p.position, p.size, color, None);
        }
    }
}
