use serde::Deserialize;
use std::{fs, path::Path};

use crate::color::parse_hex_color;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SpawnRange<T> {
    pub min: T,
    pub max: T,
}

impl SpawnRange<f32> {
    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        self.min + rng.f32() * (self.max - self.min)
    }
}

impl SpawnRange<i32> {
    pub fn sample(&self, rng: &mut fastrand::Rng) -> i32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.i32(self.min..=self.max)
    }
}

impl<T: PartialOrd> SpawnRange<T> {
    fn is_inverted(&self) -> bool {
        self.min > self.max
    }
}

/// One row of the population table. `max_width: None` matches any width.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SeedTier {
    pub max_width: Option<f32>,
    pub particles: usize,
    pub emitters: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub tiers: Vec<SeedTier>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            tiers: vec![
                SeedTier { max_width: Some(480.0), particles: 40, emitters: 15 },
                SeedTier { max_width: Some(1024.0), particles: 80, emitters: 30 },
                SeedTier { max_width: None, particles: 120, emitters: 30 },
            ],
        }
    }
}

impl SeedConfig {
    /// First tier whose width limit lies above `width`.
    pub fn tier_for(&self, width: f32) -> SeedTier {
        self.tiers
            .iter()
            .find(|t| t.max_width.is_none_or(|max| width < max))
            .or(self.tiers.last())
            .copied()
            .unwrap_or(SeedTier { max_width: None, particles: 0, emitters: 0 })
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ParticleConfig {
    pub wrap_margin: f32,
    pub damping: f32,
    pub drift: SpawnRange<f32>,
    pub orbit_radius: f32,
    pub orbit_speed: SpawnRange<f32>,
    pub base_size: SpawnRange<f32>,
    pub pulse_amplitude: f32,
    pub pulse_rate: f32,
    pub alpha: SpawnRange<f32>,
    pub hues: Vec<f32>,
    pub saturation: f32,
    pub lightness: f32,
    pub repel_radius: f32,
    pub repel_strength: f32,
    pub link_distance: f32,
    pub link_alpha: f32,
    pub link_width: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            wrap_margin: 20.0,
            damping: 0.98,
            drift: SpawnRange { min: -0.3, max: 0.3 },
            orbit_radius: 0.35,
            orbit_speed: SpawnRange { min: 0.01, max: 0.03 },
            base_size: SpawnRange { min: 1.0, max: 3.0 },
            pulse_amplitude: 0.5,
            pulse_rate: 0.05,
            alpha: SpawnRange { min: 0.3, max: 0.8 },
            hues: vec![25.0, 35.0],
            saturation: 1.0,
            lightness: 0.6,
            repel_radius: 120.0,
            repel_strength: 0.6,
            link_distance: 100.0,
            link_alpha: 0.25,
            link_width: 0.5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CircuitConfig {
    pub history_len: usize,
    pub speed: SpawnRange<f32>,
    pub size: SpawnRange<f32>,
    pub life: SpawnRange<i32>,
    pub turn_chance: f32,
    pub bounds_padding: f32,
    pub hues: Vec<f32>,
    pub accent_hue: Option<f32>,
    pub accent_chance: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub trail_alpha: f32,
    pub trail_width: f32,
    pub trail_glow: f32,
    pub head_glow: f32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            history_len: 20,
            speed: SpawnRange { min: 1.0, max: 3.0 },
            size: SpawnRange { min: 1.5, max: 3.0 },
            life: SpawnRange { min: 100, max: 300 },
            turn_chance: 0.02,
            bounds_padding: 10.0,
            hues: vec![30.0, 45.0],
            accent_hue: Some(190.0),
            accent_chance: 0.05,
            saturation: 1.0,
            lightness: 0.55,
            trail_alpha: 0.4,
            trail_width: 1.0,
            trail_glow: 10.0,
            head_glow: 15.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BurstConfig {
    pub count: usize,
    pub speed: SpawnRange<f32>,
    pub size: SpawnRange<f32>,
    pub hue: SpawnRange<f32>,
    pub saturation: f32,
    pub lightness: f32,
    pub decay: f32,
    pub initial_life: i32,
    pub life_step: i32,
    /// Upper bound on live burst particles. `None` leaves growth unbounded.
    pub cap: Option<usize>,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: 80,
            speed: SpawnRange { min: 2.0, max: 8.0 },
            size: SpawnRange { min: 2.0, max: 5.0 },
            hue: SpawnRange { min: 20.0, max: 45.0 },
            saturation: 1.0,
            lightness: 0.6,
            decay: 0.95,
            initial_life: 100,
            life_step: 2,
            cap: None,
        }
    }
}

/// Rectangle in viewport fractions (0.0..=1.0 on both axes).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ElementRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnchorConfig {
    /// Layout box of the element bursts originate from.
    pub element: Option<ElementRect>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            element: Some(ElementRect { x: 0.4, y: 0.2, width: 0.2, height: 0.2 }),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Logical units per raster pixel.
    pub scale: f32,
    #[serde(rename = "bgColor")]
    pub bg_color: String,
    pub bell: bool,
    /// Seconds without pointer movement before the pointer counts as absent.
    pub pointer_timeout: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            scale: 8.0,
            bg_color: "0b0705".into(),
            bell: false,
            pointer_timeout: 2.0,
        }
    }
}

impl DisplayConfig {
    pub fn background(&self) -> (u8, u8, u8) {
        parse_hex_color(&self.bg_color).unwrap_or((0, 0, 0))
    }

    pub fn has_usable_scale(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0
    }

    pub fn has_usable_pointer_timeout(&self) -> bool {
        self.pointer_timeout.is_finite() && self.pointer_timeout >= 0.0
    }

    /// Put back the defaults for values the host cannot run with.
    pub fn reset_unusable(&mut self) {
        let defaults = Self::default();
        if !self.has_usable_scale() {
            self.scale = defaults.scale;
        }
        if !self.has_usable_pointer_timeout() {
            self.pointer_timeout = defaults.pointer_timeout;
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub seed: SeedConfig,
    pub particles: ParticleConfig,
    pub circuit: CircuitConfig,
    pub burst: BurstConfig,
    pub anchor: AnchorConfig,
    pub display: DisplayConfig,
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let data = fs::read_to_string(&path).map_err(|e| format!("read config: {e}"))?;
        toml::from_str(&data).map_err(|e| format!("parse TOML: {e}"))
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<String>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Non-fatal problems with the loaded values.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();

        if self.seed.tiers.is_empty() {
            w.push("seed.tiers is empty; nothing will be spawned".into());
        }
        let mut prev = f32::NEG_INFINITY;
        for (i, tier) in self.seed.tiers.iter().enumerate() {
            match tier.max_width {
                Some(max) if max <= prev => {
                    w.push(format!("seed.tiers[{i}].max_width {max} is not increasing"));
                }
                Some(max) => prev = max,
                None if i + 1 != self.seed.tiers.len() => {
                    w.push(format!("seed.tiers[{i}] has no max_width but is not the last tier"));
                }
                None => {}
            }
        }

        let p = &self.particles;
        if !(p.damping > 0.0 && p.damping <= 1.0) {
            w.push(format!("particles.damping {} outside (0, 1]", p.damping));
        }
        if p.wrap_margin < 0.0 {
            w.push(format!("particles.wrap_margin {} is negative", p.wrap_margin));
        }
        if p.link_distance <= 0.0 {
            w.push("particles.link_distance must be > 0".into());
        }
        if p.repel_radius <= 0.0 {
            w.push("particles.repel_radius must be > 0".into());
        }
        if p.hues.is_empty() {
            w.push("particles.hues is empty".into());
        }
        for (name, inverted) in [
            ("particles.drift", p.drift.is_inverted()),
            ("particles.orbit_speed", p.orbit_speed.is_inverted()),
            ("particles.base_size", p.base_size.is_inverted()),
            ("particles.alpha", p.alpha.is_inverted()),
        ] {
            if inverted {
                w.push(format!("{name} has min > max"));
            }
        }
        if p.base_size.min < p.pulse_amplitude {
            w.push("particles.pulse_amplitude exceeds smallest base_size; radius may go negative".into());
        }

        let c = &self.circuit;
        if c.history_len == 0 {
            w.push("circuit.history_len is 0; trails will not render".into());
        }
        if c.hues.is_empty() {
            w.push("circuit.hues is empty".into());
        }
        if !(0.0..=1.0).contains(&c.turn_chance) {
            w.push(format!("circuit.turn_chance {} outside [0, 1]", c.turn_chance));
        }
        if c.life.min <= 0 {
            w.push("circuit.life.min must be > 0".into());
        }
        for (name, inverted) in [
            ("circuit.speed", c.speed.is_inverted()),
            ("circuit.size", c.size.is_inverted()),
            ("circuit.life", c.life.is_inverted()),
        ] {
            if inverted {
                w.push(format!("{name} has min > max"));
            }
        }

        let b = &self.burst;
        if !(b.decay > 0.0 && b.decay <= 1.0) {
            w.push(format!("burst.decay {} outside (0, 1]", b.decay));
        }
        if b.initial_life <= 0 || b.life_step <= 0 {
            w.push("burst.initial_life and burst.life_step must be > 0".into());
        }
        if b.cap == Some(0) {
            w.push("burst.cap is 0; triggers will spawn nothing".into());
        }

        if let Some(el) = &self.anchor.element {
            if el.width <= 0.0 || el.height <= 0.0 {
                w.push("anchor.element has no area; the fallback anchor will be used".into());
            }
        }

        if !self.display.has_usable_scale() {
            w.push(format!("display.scale {} must be a finite number > 0", self.display.scale));
        }
        if !self.display.has_usable_pointer_timeout() {
            w.push(format!(
                "display.pointer_timeout {} must be a finite number >= 0",
                self.display.pointer_timeout
            ));
        }
        if parse_hex_color(&self.display.bg_color).is_none() {
            w.push(format!("display.bgColor '{}' is not RRGGBB", self.display.bg_color));
        }

        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_empty(), "{:?}", cfg.validate());
        assert_eq!(cfg.burst.count, 80);
        assert_eq!(cfg.particles.damping, 0.98);
        assert_eq!(cfg.particles.wrap_margin, 20.0);
        assert_eq!(cfg.particles.link_distance, 100.0);
    }

    #[test]
    fn tier_lookup_uses_breakpoints() {
        let seed = SeedConfig::default();
        assert_eq!(seed.tier_for(300.0).emitters, 15);
        assert_eq!(seed.tier_for(300.0).particles, 40);
        assert_eq!(seed.tier_for(480.0).emitters, 30);
        assert_eq!(seed.tier_for(800.0).particles, 80);
        assert_eq!(seed.tier_for(4000.0).particles, 120);
    }

    #[test]
    fn tier_lookup_falls_back_to_last_tier() {
        let seed = SeedConfig {
            tiers: vec![SeedTier { max_width: Some(100.0), particles: 5, emitters: 2 }],
        };
        assert_eq!(seed.tier_for(500.0).particles, 5);
        assert_eq!(SeedConfig { tiers: vec![] }.tier_for(500.0).particles, 0);
    }

    #[test]
    fn spawn_ranges_stay_in_bounds() {
        let mut rng = fastrand::Rng::with_seed(7);
        let f = SpawnRange { min: 2.0f32, max: 8.0 };
        let i = SpawnRange { min: 100, max: 300 };
        for _ in 0..1000 {
            let v = f.sample(&mut rng);
            assert!((2.0..=8.0).contains(&v));
            let n = i.sample(&mut rng);
            assert!((100..=300).contains(&n));
        }
        assert_eq!(SpawnRange { min: 5, max: 5 }.sample(&mut rng), 5);
    }

    #[test]
    fn validate_detects_warnings() {
        let mut cfg = Config::default();
        cfg.particles.damping = 1.5;
        cfg.burst.decay = 0.0;
        cfg.circuit.hues.clear();
        cfg.circuit.speed = SpawnRange { min: 4.0, max: 1.0 };
        cfg.display.bg_color = "nope".into();
        cfg.seed.tiers = vec![
            SeedTier { max_width: None, particles: 1, emitters: 1 },
            SeedTier { max_width: Some(10.0), particles: 1, emitters: 1 },
        ];
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("particles.damping")));
        assert!(warnings.iter().any(|w| w.contains("burst.decay")));
        assert!(warnings.iter().any(|w| w.contains("circuit.hues")));
        assert!(warnings.iter().any(|w| w.contains("circuit.speed")));
        assert!(warnings.iter().any(|w| w.contains("bgColor")));
        assert!(warnings.iter().any(|w| w.contains("not the last tier")));
    }

    #[test]
    fn oversized_pointer_timeout_is_flagged_and_reset() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[display]\npointer_timeout = 1e30\nscale = nan\n").unwrap();
        let mut cfg = Config::load_from_file(file.path()).unwrap();

        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("display.pointer_timeout")));
        assert!(warnings.iter().any(|w| w.contains("display.scale")));

        cfg.display.reset_unusable();
        assert_eq!(cfg.display.pointer_timeout, 2.0);
        assert_eq!(cfg.display.scale, 8.0);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn non_finite_display_values_are_unusable() {
        let mut display = DisplayConfig { pointer_timeout: f32::INFINITY, ..DisplayConfig::default() };
        assert!(!display.has_usable_pointer_timeout());
        display.pointer_timeout = -1.0;
        assert!(!display.has_usable_pointer_timeout());
        display.pointer_timeout = 0.0;
        assert!(display.has_usable_pointer_timeout());

        display.scale = f32::NAN;
        assert!(!display.has_usable_scale());
        display.scale = 0.5;
        assert!(display.has_usable_scale());
    }

    #[test]
    fn load_or_default_missing_file() {
        let (cfg, err) = Config::load_or_default("this/file/does/not/exist.toml");
        assert!(err.is_some());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_partial_file_keeps_other_defaults() {
        let sample = r#"
[burst]
count = 12
cap = 200

[particles]
hues = [10.0]

[display]
bgColor = "1a1b26"

[[seed.tiers]]
particles = 3
emitters = 2
"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample.as_bytes()).unwrap();
        let cfg = Config::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.burst.count, 12);
        assert_eq!(cfg.burst.cap, Some(200));
        assert_eq!(cfg.burst.decay, 0.95);
        assert_eq!(cfg.particles.hues, vec![10.0]);
        assert_eq!(cfg.particles.damping, 0.98);
        assert_eq!(cfg.display.background(), (0x1a, 0x1b, 0x26));
        assert_eq!(cfg.seed.tiers.len(), 1);
        assert_eq!(cfg.seed.tier_for(9999.0).particles, 3);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[burst\ncount = ").unwrap();
        let (cfg, err) = Config::load_or_default(file.path());
        assert!(err.unwrap().starts_with("parse TOML"));
        assert_eq!(cfg, Config::default());
    }
}
