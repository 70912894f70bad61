//! Emitter configuration and the manager that turns elapsed time into spawns

use crate::palette;
use crate::particle::{Particle, ParticleShape};
use crate::rand::RandomSource;
use serde::{Deserialize, Serialize};
use shimmer_core::{Color, IdAllocator, Vec3};
use std::f32::consts::TAU;

/// Closed sampling interval, written `[min, max]` in TOML
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut dyn RandomSource) -> f32 {
        rng.range(self.min, self.max)
    }

    fn ordered(&mut self) -> bool {
        if self.min > self.max {
            std::mem::swap(&mut self.min, &mut self.max);
            true
        } else {
            false
        }
    }
}

impl From<[f32; 2]> for Range {
    fn from(v: [f32; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<Range> for [f32; 2] {
    fn from(r: Range) -> Self {
        [r.min, r.max]
    }
}

/// Extra draws allowed per tick beyond free capacity, to absorb skipped draws
pub const SPAWN_RETRY_BUDGET: usize = 64;

/// Periodic extra spawns on top of the steady rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Burst {
    pub count: u32,
    /// Seconds between bursts
    pub interval: f32,
}

/// How fractional spawn credit is handled between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionPolicy {
    /// `floor(rate * dt)` per tick; fractional credit is discarded
    #[default]
    Truncate,
    /// Fractional credit carries over, so the long-run rate is exact
    Accumulate,
}

/// A spawn source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emitter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub position: Vec3,
    /// Particles per second
    pub rate: f32,
    /// Initial speed
    pub velocity: Range,
    /// Launch direction in radians, in the x-y plane
    pub angle: Range,
    pub size: Range,
    pub life: Range,
    /// Hex colors; empty means "use the engine color scheme"
    pub colors: Vec<String>,
    pub shape: ParticleShape,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst: Option<Burst>,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            name: None,
            position: Vec3::ZERO,
            rate: 10.0,
            velocity: Range::new(20.0, 60.0),
            angle: Range::new(0.0, TAU),
            size: Range::new(2.0, 6.0),
            life: Range::new(1.0, 3.0),
            colors: Vec::new(),
            shape: ParticleShape::Sphere,
            enabled: true,
            burst: None,
        }
    }
}

impl Emitter {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("emitter")
    }

    /// Clamp degenerate settings to the nearest usable value.
    /// Returns a description of every adjustment.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        let label = self.label().to_string();

        if !self.rate.is_finite() {
            warnings.push(format!("{label}: rate {} reset to 0", self.rate));
            self.rate = 0.0;
        } else if self.rate < 0.0 {
            warnings.push(format!("{label}: rate {} clamped to 0", self.rate));
            self.rate = 0.0;
        }
        for (field, range) in [
            ("velocity", &mut self.velocity),
            ("angle", &mut self.angle),
            ("size", &mut self.size),
            ("life", &mut self.life),
        ] {
            if range.ordered() {
                warnings.push(format!("{label}: {field} range was inverted; swapped"));
            }
        }
        if self.size.max <= 0.0 {
            warnings.push(format!("{label}: size range has no positive values; nothing will spawn"));
        } else if self.size.min <= 0.0 {
            warnings.push(format!("{label}: size range includes non-positive values; those draws are skipped"));
        }
        if self.life.max <= 0.0 {
            warnings.push(format!("{label}: life range has no positive values; nothing will spawn"));
        }
        if let Some(burst) = self.burst {
            if !(burst.interval > 0.0) {
                warnings.push(format!("{label}: burst interval must be positive; burst disabled"));
                self.burst = None;
            }
        }
        warnings
    }
}

/// Stable handle to a registered emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterHandle(pub u32);

/// Everything an emitter needs from the engine to spawn particles
pub struct SpawnContext<'a> {
    pub dt: f32,
    pub live_count: usize,
    pub max_particles: usize,
    pub trails: bool,
    pub policy: EmissionPolicy,
    pub rng: &'a mut dyn RandomSource,
    pub ids: &'a mut IdAllocator,
}

/// Runtime state for one emitter
pub struct EmitterState {
    pub handle: EmitterHandle,
    pub emitter: Emitter,
    palette: Vec<Color>,
    /// Fractional particle credit (accumulate policy only)
    carry: f32,
    /// Time since the last burst; None until the first burst fires
    burst_elapsed: Option<f32>,
}

impl EmitterState {
    pub fn new(handle: EmitterHandle, emitter: Emitter, color_scheme: &str) -> Self {
        let mut state = Self {
            handle,
            emitter,
            palette: Vec::new(),
            carry: 0.0,
            burst_elapsed: None,
        };
        state.refresh_palette(color_scheme);
        state
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn refresh_palette(&mut self, color_scheme: &str) {
        let (palette, rejected) = palette::resolve(&self.emitter.colors, color_scheme);
        for color in rejected {
            log::warn!(
                "[emitter] {}: ignoring malformed color '{}'",
                self.emitter.label(),
                color
            );
        }
        self.palette = palette;
    }

    /// Number of particles owed for this tick, before the capacity check
    fn due(&mut self, ctx: &SpawnContext<'_>) -> usize {
        let mut steady = self.emitter.rate.max(0.0) * ctx.dt;
        if !steady.is_finite() {
            log::debug!("[emitter] {}: non-finite rate; skipping steady emission", self.emitter.label());
            steady = 0.0;
        }
        let mut due = match ctx.policy {
            EmissionPolicy::Truncate => steady.floor() as usize,
            EmissionPolicy::Accumulate => {
                self.carry += steady;
                let whole = self.carry.floor();
                self.carry -= whole;
                whole as usize
            }
        };

        if let Some(burst) = self.emitter.burst {
            let fire = match self.burst_elapsed.as_mut() {
                None => {
                    self.burst_elapsed = Some(0.0);
                    true
                }
                Some(elapsed) => {
                    *elapsed += ctx.dt;
                    if *elapsed >= burst.interval {
                        *elapsed %= burst.interval;
                        true
                    } else {
                        false
                    }
                }
            };
            if fire {
                due = due.saturating_add(burst.count as usize);
            }
        }
        due
    }

    /// Whether the size and life ranges can yield a drawable particle at all
    fn can_produce(&self) -> bool {
        self.emitter.size.max > 0.0 && self.emitter.life.max > 0.0
    }

    /// Spawn this tick's particles into `out`, never letting
    /// `live_count + spawned` exceed `max_particles`. Returns the number spawned.
    ///
    /// Draws are capped at the free capacity plus [`SPAWN_RETRY_BUDGET`], so a
    /// huge rate with mostly degenerate draws cannot stall the tick.
    pub fn spawn_into(&mut self, ctx: &mut SpawnContext<'_>, out: &mut Vec<Particle>) -> usize {
        if !self.emitter.enabled {
            return 0;
        }

        let due = self.due(ctx);
        if !self.can_produce() {
            return 0;
        }
        let room = ctx.max_particles.saturating_sub(ctx.live_count);
        let attempts = due.min(room.saturating_add(SPAWN_RETRY_BUDGET));
        let mut spawned = 0;
        for _ in 0..attempts {
            if ctx.live_count + spawned >= ctx.max_particles {
                break;
            }
            if let Some(particle) = self.sample(ctx) {
                out.push(particle);
                spawned += 1;
            }
        }
        spawned
    }

    /// Spawn this tick's particles into a fresh list
    pub fn spawn(&mut self, ctx: &mut SpawnContext<'_>) -> Vec<Particle> {
        let mut out = Vec::new();
        self.spawn_into(ctx, &mut out);
        out
    }

    /// Draw one particle from the emitter's ranges; None when a draw is degenerate
    fn sample(&self, ctx: &mut SpawnContext<'_>) -> Option<Particle> {
        let e = &self.emitter;
        let speed = e.velocity.sample(ctx.rng);
        let angle = e.angle.sample(ctx.rng);
        let size = e.size.sample(ctx.rng);
        let life = e.life.sample(ctx.rng);
        let color = self.palette[ctx.rng.pick(self.palette.len())];
        let vz = ctx.rng.range(-1.0, 1.0);

        if !(size > 0.0) || !(life > 0.0) {
            return None;
        }

        let velocity = Vec3::new(angle.cos() * speed, angle.sin() * speed, vz);
        let mut particle = Particle::new(ctx.ids.next_id(), e.position, velocity, size, life);
        particle.color = color;
        particle.shape = e.shape;
        particle.trail_enabled = ctx.trails;
        Some(particle)
    }
}

/// Holds every emitter in registration order
#[derive(Default)]
pub struct EmitterManager {
    states: Vec<EmitterState>,
    next_handle: u32,
}

impl EmitterManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for an emitter that will be inserted later
    pub fn reserve_handle(&mut self) -> EmitterHandle {
        let handle = EmitterHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub fn add(&mut self, emitter: Emitter, color_scheme: &str) -> EmitterHandle {
        let handle = self.reserve_handle();
        self.insert(handle, emitter, color_scheme);
        handle
    }

    pub fn insert(&mut self, handle: EmitterHandle, mut emitter: Emitter, color_scheme: &str) {
        for warning in emitter.sanitize() {
            log::warn!("[emitter] {warning}");
        }
        self.states
            .push(EmitterState::new(handle, emitter, color_scheme));
    }

    pub fn remove(&mut self, handle: EmitterHandle) -> Option<Emitter> {
        let idx = self.states.iter().position(|s| s.handle == handle)?;
        Some(self.states.remove(idx).emitter)
    }

    /// Returns false if the handle is unknown
    pub fn set_enabled(&mut self, handle: EmitterHandle, enabled: bool) -> bool {
        match self.states.iter_mut().find(|s| s.handle == handle) {
            Some(state) => {
                state.emitter.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: EmitterHandle) -> Option<&Emitter> {
        self.states
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| &s.emitter)
    }

    pub fn find_by_name(&self, name: &str) -> Option<EmitterHandle> {
        self.states
            .iter()
            .find(|s| s.emitter.name.as_deref() == Some(name))
            .map(|s| s.handle)
    }

    /// Re-resolve every palette after a color scheme change
    pub fn set_color_scheme(&mut self, color_scheme: &str) {
        for state in &mut self.states {
            state.refresh_palette(color_scheme);
        }
    }

    pub fn states(&self) -> &[EmitterState] {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut [EmitterState] {
        &mut self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.states.iter().filter(|s| s.emitter.enabled).count()
    }
}
