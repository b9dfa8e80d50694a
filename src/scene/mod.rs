//! The animation engine: three layers driven by one per-frame callback.
//!
//! Every frame clears the surface, then updates and draws the ambient
//! [`ParticleField`], the [`CircuitField`] and the [`BurstManager`] in that
//! order before advancing the tick counter. Host input (resize, pointer,
//! trigger) only ever lands between frames.

use std::vec::Drain;

use crate::config::Config;
use crate::geometry::{Point, Viewport};
use crate::surface::Surface;

pub mod anchor;
pub mod burst;
pub mod circuit;
pub mod particles;

use anchor::AnchorLayout;
use burst::BurstManager;
use circuit::CircuitField;
use particles::ParticleField;

/// State shared by every layer, written only by host handlers between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub viewport: Viewport,
    pub anchor: Point,
    pub pointer: Option<Point>,
    pub tick: u64,
}

/// Signals for the audio/haptic layer, drained by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cue {
    Burst { at: Point, spawned: usize, live: usize },
}

pub struct Scene {
    ctx: FrameContext,
    layout: AnchorLayout,
    particles: ParticleField,
    circuit: CircuitField,
    bursts: BurstManager,
    rng: fastrand::Rng,
    cues: Vec<Cue>,
    running: bool,
}

impl Scene {
    /// Seed every layer for `viewport` and enter the running state.
    pub fn initialize(config: &Config, viewport: Viewport, mut rng: fastrand::Rng) -> Self {
        let tier = config.seed.tier_for(viewport.width);
        let layout = AnchorLayout::new(config.anchor.element);
        let anchor = layout.resolve(viewport);

        let particles = ParticleField::new(tier.particles, viewport, config.particles.clone(), &mut rng);
        let circuit = CircuitField::new(tier.emitters, viewport, config.circuit.clone(), &mut rng);
        let bursts = BurstManager::new(config.burst.clone());

        log::info!(
            "scene initialized: viewport={}x{} particles={} emitters={} anchor=({:.1}, {:.1})",
            viewport.width,
            viewport.height,
            particles.len(),
            circuit.len(),
            anchor.x,
            anchor.y
        );
        if layout.element_rect(viewport).is_none() {
            log::warn!("anchor element unavailable, using viewport centre");
        }

        Self {
            ctx: FrameContext {
                viewport,
                anchor,
                pointer: None,
                tick: 0,
            },
            layout,
            particles,
            circuit,
            bursts,
            rng,
            cues: Vec::new(),
            running: true,
        }
    }

    pub fn context(&self) -> &FrameContext {
        &self.ctx
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn emitter_count(&self) -> usize {
        self.circuit.len()
    }

    pub fn burst_count(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// New dimensions and anchor. Populations are kept as they are.
    pub fn resize(&mut self, viewport: Viewport) {
        self.ctx.viewport = viewport;
        self.ctx.anchor = self.layout.resolve(viewport);
        log::info!(
            "resize: viewport={}x{} anchor=({:.1}, {:.1})",
            viewport.width,
            viewport.height,
            self.ctx.anchor.x,
            self.ctx.anchor.y
        );
    }

    pub fn set_pointer(&mut self, pointer: Option<Point>) {
        self.ctx.pointer = pointer;
    }

    /// Spawn a burst at the current anchor. Returns the number of particles added.
    pub fn trigger(&mut self) -> usize {
        let at = self.ctx.anchor;
        let spawned = self.bursts.trigger(at, &mut self.rng);
        let live = self.bursts.len();
        log::info!("burst at ({:.1}, {:.1}): spawned={spawned} live={live}", at.x, at.y);
        self.cues.push(Cue::Burst { at, spawned, live });
        spawned
    }

    pub fn drain_cues(&mut self) -> Drain<'_, Cue> {
        self.cues.drain(..)
    }

    /// Stop the loop. Calling it again has no effect.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::info!("scene stopped at tick {}", self.ctx.tick);
        }
    }

    /// Advance and draw one frame. Returns `false` without touching
    /// anything once the scene has been stopped.
    pub fn frame(&mut self, surface: &mut impl Surface) -> bool {
        if !self.running {
            return false;
        }

        surface.clear(self.ctx.viewport.bounds());

        self.particles.update(&self.ctx);
        self.particles.draw(surface);

        self.circuit.update(&self.ctx, &mut self.rng);
        self.circuit.draw(surface);

        self.bursts.update();
        self.bursts.draw(surface);

        self.ctx.tick += 1;
        true
    }
}
