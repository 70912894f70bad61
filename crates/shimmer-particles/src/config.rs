//! Engine configuration, loaded from TOML

use crate::emitter::{EmissionPolicy, Emitter};
use crate::force::Force;
use crate::governor::PerformanceConfig;
use crate::integrator::{Bounds, PointerForce};
use crate::palette;
use crate::render::RenderSettings;
use serde::{Deserialize, Serialize};
use shimmer_core::{Result, ShimmerError, Vec2};
use std::path::Path;

/// Hard ceiling on `max_particles`
pub const MAX_PARTICLES_LIMIT: usize = 100_000;

/// Visual effect switches. Only `glow` changes draw calls; the rest are
/// passed through to the host compositor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    pub bloom: bool,
    pub blur: bool,
    pub glow: bool,
    pub sparkle: bool,
}

/// Everything the host configures about an engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_particles: usize,
    pub physics_enabled: bool,
    /// Reserved; particles do not collide with each other
    pub collisions_enabled: bool,
    pub trails_enabled: bool,
    pub interactive: bool,
    pub color_scheme: String,
    pub speed_multiplier: f32,
    pub paused: bool,
    pub debug: bool,
    /// Pinhole camera distance used for perspective scaling
    pub perspective: f32,
    /// Seconds of travel a trail covers
    pub trail_length: f32,
    pub emission: EmissionPolicy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    pub bounds: Bounds,
    pub performance: PerformanceConfig,
    pub effects: Effects,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer_force: Option<PointerForce>,
    pub emitters: Vec<Emitter>,
    pub forces: Vec<Force>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_particles: 1000,
            physics_enabled: true,
            collisions_enabled: false,
            trails_enabled: false,
            interactive: false,
            color_scheme: "glass".to_string(),
            speed_multiplier: 1.0,
            paused: false,
            debug: false,
            perspective: 1000.0,
            trail_length: 0.1,
            emission: EmissionPolicy::Truncate,
            seed: None,
            bounds: Bounds::default(),
            performance: PerformanceConfig::default(),
            effects: Effects::default(),
            pointer_force: None,
            emitters: Vec::new(),
            forces: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ShimmerError::TomlParse(msg) => {
                ShimmerError::TomlParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The pointer force to use when interaction is on
    pub fn effective_pointer_force(&self) -> Option<PointerForce> {
        if self.interactive {
            Some(self.pointer_force.unwrap_or_default())
        } else {
            None
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            perspective: self.perspective,
            trail_length: self.trail_length,
            glow: self.effects.glow,
            culling: self.performance.culling,
            lod_distance: self.performance.lod_distance,
            viewport: Vec2::new(self.bounds.width, self.bounds.height),
            debug: self.debug,
        }
    }

    /// Clamp every degenerate value to the nearest usable one.
    /// Never fails; returns one message per adjustment.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let defaults = Self::default();

        if self.max_particles > MAX_PARTICLES_LIMIT {
            warnings.push(format!(
                "max_particles {} clamped to {}",
                self.max_particles, MAX_PARTICLES_LIMIT
            ));
            self.max_particles = MAX_PARTICLES_LIMIT;
        } else if self.max_particles == 0 {
            warnings.push("max_particles is 0; nothing will spawn".to_string());
        }

        if !self.speed_multiplier.is_finite() {
            warnings.push(format!("speed_multiplier {} reset to 1", self.speed_multiplier));
            self.speed_multiplier = 1.0;
        } else if self.speed_multiplier < 0.0 {
            warnings.push(format!("speed_multiplier {} clamped to 0", self.speed_multiplier));
            self.speed_multiplier = 0.0;
        }

        if !(self.bounds.width > 0.0) {
            warnings.push(format!("bounds.width {} reset to {}", self.bounds.width, defaults.bounds.width));
            self.bounds.width = defaults.bounds.width;
        }
        if !(self.bounds.height > 0.0) {
            warnings.push(format!("bounds.height {} reset to {}", self.bounds.height, defaults.bounds.height));
            self.bounds.height = defaults.bounds.height;
        }
        if !(self.bounds.depth >= 0.0) {
            warnings.push(format!("bounds.depth {} clamped to 0", self.bounds.depth));
            self.bounds.depth = 0.0;
        }

        if !(self.perspective > 0.0) {
            warnings.push(format!("perspective {} reset to {}", self.perspective, defaults.perspective));
            self.perspective = defaults.perspective;
        }
        // Bounds allow z down to -depth; the camera plane must stay behind that
        if self.perspective <= self.bounds.depth {
            let raised = self.bounds.depth * 2.0;
            warnings.push(format!(
                "perspective {} must exceed bounds.depth {}; raised to {}",
                self.perspective, self.bounds.depth, raised
            ));
            self.perspective = raised;
        }
        if !(self.trail_length >= 0.0) {
            warnings.push(format!("trail_length {} clamped to 0", self.trail_length));
            self.trail_length = 0.0;
        }

        if !palette::is_known_scheme(&self.color_scheme) {
            warnings.push(format!(
                "unknown color_scheme '{}'; using 'glass'",
                self.color_scheme
            ));
            self.color_scheme = defaults.color_scheme.clone();
        }

        if let Some(pf) = self.pointer_force.as_mut() {
            if !(pf.radius >= 0.0) {
                warnings.push(format!("pointer_force.radius {} clamped to 0", pf.radius));
                pf.radius = 0.0;
            }
        }

        for emitter in &mut self.emitters {
            warnings.extend(emitter.sanitize());
        }
        for force in &mut self.forces {
            warnings.extend(sanitize_force(force));
        }
        warnings
    }
}

/// Clamp a force's radius; negative radii reach nothing but the center
pub fn sanitize_force(force: &mut Force) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(radius) = force.radius {
        if !(radius >= 0.0) {
            warnings.push(format!("{}: radius {} clamped to 0", force.label(), radius));
            force.radius = Some(0.0);
        }
    }
    if !force.strength.is_finite() {
        warnings.push(format!("{}: strength {} reset to 0", force.label(), force.strength));
        force.strength = 0.0;
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Range;
    use crate::force::ForceKind;
    use crate::integrator::PointerMode;

    const SAMPLE: &str = r##"
max_particles = 500
trails_enabled = true
interactive = true
color_scheme = "aurora"
speed_multiplier = 1.5
debug = true
emission = "accumulate"
seed = 7

[bounds]
width = 1024
height = 768
depth = 100

[performance]
culling = true
lod_distance = 80

[effects]
glow = true
bloom = true

[pointer_force]
type = "attraction"
strength = 300
radius = 120

[[emitters]]
name = "fountain"
position = { x = 512, y = 700 }
rate = 60
angle = [-2.2, -0.9]
colors = ["#7cffcb"]

[[emitters]]
name = "drizzle"
position = { x = 100, y = 0 }
rate = 5
enabled = false

[[forces]]
type = "gravity"
strength = 98

[[forces]]
name = "well"
type = "attraction"
strength = 2000
position = { x = 512, y = 384 }
radius = 200
"##;

    #[test]
    fn parse_full_config() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.max_particles, 500);
        assert!(config.trails_enabled);
        assert_eq!(config.color_scheme, "aurora");
        assert_eq!(config.emission, EmissionPolicy::Accumulate);
        assert_eq!(config.seed, Some(7));
        assert!((config.bounds.width - 1024.0).abs() < 1e-6);
        assert!(config.performance.culling);
        assert!(config.effects.glow && config.effects.bloom && !config.effects.blur);

        let pf = config.effective_pointer_force().unwrap();
        assert_eq!(pf.mode, PointerMode::Attraction);
        assert!((pf.radius - 120.0).abs() < 1e-6);

        assert_eq!(config.emitters.len(), 2);
        assert_eq!(config.emitters[0].angle, Range::new(-2.2, -0.9));
        assert!(!config.emitters[1].enabled);

        assert_eq!(config.forces.len(), 2);
        assert_eq!(config.forces[1].kind, ForceKind::Attraction);
        assert_eq!(config.forces[1].radius, Some(200.0));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(config.effective_pointer_force().is_none());
    }

    #[test]
    fn interactive_without_pointer_force_uses_default() {
        let config = EngineConfig::from_toml_str("interactive = true").unwrap();
        assert_eq!(config.effective_pointer_force(), Some(PointerForce::default()));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = EngineConfig::from_toml_str("max_particles = \"lots\"").unwrap_err();
        assert!(matches!(err, ShimmerError::TomlParse(_)));
    }

    #[test]
    fn sanitize_clamps_everything() {
        let mut config = EngineConfig {
            max_particles: 1_000_000,
            speed_multiplier: -2.0,
            perspective: 0.0,
            color_scheme: "plaid".to_string(),
            bounds: Bounds {
                width: 0.0,
                height: 600.0,
                depth: -5.0,
            },
            forces: vec![Force::new(ForceKind::Attraction, 1.0).with_radius(-3.0)],
            emitters: vec![Emitter {
                rate: -1.0,
                ..Default::default()
            }],
            ..Default::default()
        };

        let warnings = config.sanitize();
        assert_eq!(config.max_particles, MAX_PARTICLES_LIMIT);
        assert_eq!(config.speed_multiplier, 0.0);
        assert_eq!(config.perspective, 1000.0);
        assert_eq!(config.color_scheme, "glass");
        assert_eq!(config.bounds.width, 800.0);
        assert_eq!(config.bounds.depth, 0.0);
        assert_eq!(config.forces[0].radius, Some(0.0));
        assert_eq!(config.emitters[0].rate, 0.0);
        assert_eq!(warnings.len(), 8);
    }

    #[test]
    fn perspective_is_raised_past_depth() {
        let mut config = EngineConfig {
            perspective: 100.0,
            bounds: Bounds {
                depth: 200.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let warnings = config.sanitize();
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.perspective, 400.0);
        assert!(config.perspective - config.bounds.depth > 0.0);
    }

    #[test]
    fn toml_round_trip_preserves_config() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let text = config.to_toml_string().unwrap();
        let reparsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, reparsed);
    }

    #[test]
    fn render_settings_follow_config() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        let settings = config.render_settings();
        assert!(settings.glow && settings.culling && settings.debug);
        assert_eq!(settings.viewport, Vec2::new(1024.0, 768.0));
        assert!((settings.lod_distance - 80.0).abs() < 1e-6);
    }
}
