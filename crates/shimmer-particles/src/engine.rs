//! The per-tick driver tying store, emitters, forces, reaper and renderer together

use crate::config::{sanitize_force, Effects, EngineConfig, MAX_PARTICLES_LIMIT};
use crate::emitter::{Emitter, EmitterHandle, EmitterManager, SpawnContext};
use crate::events::{Dispatcher, EngineCallbacks, EngineEvent};
use crate::force::{Force, ForceHandle, ForceRegistry};
use crate::governor::{Governor, Telemetry};
use crate::input::InputAdapter;
use crate::integrator::{self, PointerForce, StepParams};
use crate::lifecycle;
use crate::particle::{Particle, ParticleStore};
use crate::rand::{ParticleRng, RandomSource};
use crate::render::{DrawSurface, RenderStats, Renderer, ShapeRenderer};
use serde::Serialize;
use shimmer_core::{IdAllocator, ParticleId, Vec2};

/// A configuration edit, applied at the start of the next tick
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigChange {
    AddEmitter(EmitterHandle, Emitter),
    RemoveEmitter(EmitterHandle),
    SetEmitterEnabled(EmitterHandle, bool),
    AddForce(ForceHandle, Force),
    RemoveForce(ForceHandle),
    SetForceEnabled(ForceHandle, bool),
    SetPointerForce(Option<PointerForce>),
    SetInteractive(bool),
    SetPhysicsEnabled(bool),
    SetTrailsEnabled(bool),
    SetSpeedMultiplier(f32),
    SetMaxParticles(usize),
    SetColorScheme(String),
}

/// Read-only view of the engine after a tick
pub struct RenderableSnapshot<'a> {
    pub tick: u64,
    pub spawned: usize,
    pub expired: usize,
    pub paused: bool,
    pub telemetry: Telemetry,
    pub effects: Effects,
    store: &'a ParticleStore,
}

impl<'a> RenderableSnapshot<'a> {
    pub fn particles(&self) -> impl Iterator<Item = &'a Particle> {
        self.store.iter()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Owned copy, for serialization
    pub fn to_frame(&self) -> Frame {
        Frame {
            tick: self.tick,
            spawned: self.spawned,
            expired: self.expired,
            paused: self.paused,
            telemetry: self.telemetry,
            effects: self.effects,
            particles: self.store.iter().cloned().collect(),
        }
    }
}

/// Owned, serializable snapshot of one tick
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    pub tick: u64,
    pub spawned: usize,
    pub expired: usize,
    pub paused: bool,
    pub telemetry: Telemetry,
    pub effects: Effects,
    pub particles: Vec<Particle>,
}

/// A particle simulation instance.
///
/// The host owns the loop: it calls [`advance`](Self::advance) once per frame
/// with the elapsed time, forwards pointer events, and draws with
/// [`render`](Self::render). Within a tick, spawning precedes integration,
/// integration precedes aging, and aging precedes rendering.
pub struct ParticleEngine {
    config: EngineConfig,
    store: ParticleStore,
    emitters: EmitterManager,
    forces: ForceRegistry,
    renderer: Renderer,
    governor: Governor,
    input: InputAdapter,
    dispatcher: Dispatcher,
    rng: Box<dyn RandomSource>,
    ids: IdAllocator,
    pending: Vec<ConfigChange>,
    spawn_buffer: Vec<Particle>,
    force_hits: Vec<Vec<ParticleId>>,
    clock: f64,
    tick: u64,
    last_spawned: usize,
    last_expired: usize,
}

impl ParticleEngine {
    /// Build an engine; the RNG is seeded from `config.seed` when set
    pub fn new(config: EngineConfig) -> Self {
        let rng: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(ParticleRng::new(seed)),
            None => Box::new(ParticleRng::from_entropy()),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(mut config: EngineConfig, rng: Box<dyn RandomSource>) -> Self {
        for warning in config.sanitize() {
            log::warn!("[config] {warning}");
        }

        let mut emitters = EmitterManager::new();
        for emitter in std::mem::take(&mut config.emitters) {
            emitters.add(emitter, &config.color_scheme);
        }
        let mut forces = ForceRegistry::new();
        for force in std::mem::take(&mut config.forces) {
            forces.add(force);
        }

        log::info!(
            "[engine] {} emitter(s), {} force(s), capacity {}",
            emitters.len(),
            forces.len(),
            config.max_particles
        );

        Self {
            store: ParticleStore::new(config.max_particles),
            emitters,
            forces,
            renderer: Renderer::new(config.render_settings()),
            governor: Governor::new(config.max_particles, config.performance),
            input: InputAdapter::default(),
            dispatcher: Dispatcher::new(),
            rng,
            ids: IdAllocator::new(),
            pending: Vec::new(),
            spawn_buffer: Vec::new(),
            force_hits: Vec::new(),
            clock: 0.0,
            tick: 0,
            last_spawned: 0,
            last_expired: 0,
            config,
        }
    }

    /// Advance the simulation by `dt` seconds and return the resulting state
    pub fn advance(&mut self, dt: f32) -> RenderableSnapshot<'_> {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            log::debug!("[engine] ignoring non-positive dt {dt}");
            0.0
        };

        self.apply_pending();
        self.tick += 1;
        self.clock += dt as f64;
        self.last_spawned = 0;
        self.last_expired = 0;

        if !self.config.paused {
            self.last_spawned = self.spawn(dt);
            self.integrate(dt);
            self.last_expired = lifecycle::reap(&mut self.store, dt, self.config.speed_multiplier);
        }

        self.governor.record_frame(self.clock);
        self.snapshot()
    }

    fn spawn(&mut self, dt: f32) -> usize {
        let max_particles = self.governor.max_particles().min(self.store.capacity());
        let mut total = 0;

        for state in self.emitters.states_mut() {
            if !self.governor.can_spawn(self.store.len()) {
                break;
            }
            let mut ctx = SpawnContext {
                dt,
                live_count: self.store.len(),
                max_particles,
                trails: self.config.trails_enabled,
                policy: self.config.emission,
                rng: self.rng.as_mut(),
                ids: &mut self.ids,
            };
            let spawned = state.spawn_into(&mut ctx, &mut self.spawn_buffer);
            for particle in self.spawn_buffer.drain(..) {
                if self.store.insert(particle).is_none() {
                    log::debug!("[engine] store full; dropping spawned particle");
                }
            }
            if spawned > 0 {
                total += spawned;
                self.dispatcher.emitter_triggered(&state.emitter, spawned);
            }
        }
        total
    }

    fn integrate(&mut self, dt: f32) {
        let physics = self.config.physics_enabled;
        let pointer = if self.config.interactive {
            self.input.pointer().zip(self.config.effective_pointer_force())
        } else {
            None
        };
        let params = StepParams {
            dt,
            speed_multiplier: self.config.speed_multiplier,
            bounds: self.config.bounds,
            physics_enabled: physics,
            pointer,
        };

        self.force_hits.resize_with(self.forces.len(), Vec::new);
        for hits in &mut self.force_hits {
            hits.clear();
        }

        for particle in self.store.iter_mut() {
            let id = particle.id;
            integrator::step(particle, self.forces.forces(), &params, |idx| {
                self.force_hits[idx].push(id)
            });
        }

        if physics {
            for (force, hits) in self.forces.forces().zip(&self.force_hits) {
                if force.enabled {
                    self.dispatcher.force_applied(force, hits);
                }
            }
        }
    }

    fn apply_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        for change in std::mem::take(&mut self.pending) {
            self.apply_change(change);
        }
    }

    fn apply_change(&mut self, change: ConfigChange) {
        match change {
            ConfigChange::AddEmitter(handle, emitter) => {
                self.emitters.insert(handle, emitter, &self.config.color_scheme);
            }
            ConfigChange::RemoveEmitter(handle) => {
                if self.emitters.remove(handle).is_none() {
                    log::warn!("[engine] remove: unknown emitter {handle:?}");
                }
            }
            ConfigChange::SetEmitterEnabled(handle, enabled) => {
                if !self.emitters.set_enabled(handle, enabled) {
                    log::warn!("[engine] enable: unknown emitter {handle:?}");
                }
            }
            ConfigChange::AddForce(handle, mut force) => {
                for warning in sanitize_force(&mut force) {
                    log::warn!("[config] {warning}");
                }
                self.forces.insert(handle, force);
            }
            ConfigChange::RemoveForce(handle) => {
                if self.forces.remove(handle).is_none() {
                    log::warn!("[engine] remove: unknown force {handle:?}");
                }
            }
            ConfigChange::SetForceEnabled(handle, enabled) => {
                if !self.forces.set_enabled(handle, enabled) {
                    log::warn!("[engine] enable: unknown force {handle:?}");
                }
            }
            ConfigChange::SetPointerForce(force) => self.config.pointer_force = force,
            ConfigChange::SetInteractive(on) => self.config.interactive = on,
            ConfigChange::SetPhysicsEnabled(on) => self.config.physics_enabled = on,
            ConfigChange::SetTrailsEnabled(on) => self.config.trails_enabled = on,
            ConfigChange::SetSpeedMultiplier(speed) => {
                if speed.is_finite() && speed >= 0.0 {
                    self.config.speed_multiplier = speed;
                } else {
                    log::warn!("[config] ignoring speed_multiplier {speed}");
                }
            }
            ConfigChange::SetMaxParticles(max) => {
                let max = max.min(MAX_PARTICLES_LIMIT);
                self.config.max_particles = max;
                self.governor.set_max_particles(max);
                let evicted = self.store.set_capacity(max);
                if evicted > 0 {
                    log::info!("[engine] capacity now {max}; evicted {evicted} particle(s)");
                }
            }
            ConfigChange::SetColorScheme(name) => {
                let mut probe = EngineConfig {
                    color_scheme: name,
                    ..Default::default()
                };
                for warning in probe.sanitize() {
                    log::warn!("[config] {warning}");
                }
                self.emitters.set_color_scheme(&probe.color_scheme);
                self.config.color_scheme = probe.color_scheme;
            }
        }
    }

    /// Queue a change for the next tick boundary
    pub fn queue_change(&mut self, change: ConfigChange) {
        self.pending.push(change);
    }

    pub fn add_emitter(&mut self, emitter: Emitter) -> EmitterHandle {
        let handle = self.emitters.reserve_handle();
        self.queue_change(ConfigChange::AddEmitter(handle, emitter));
        handle
    }

    pub fn remove_emitter(&mut self, handle: EmitterHandle) {
        self.queue_change(ConfigChange::RemoveEmitter(handle));
    }

    pub fn set_emitter_enabled(&mut self, handle: EmitterHandle, enabled: bool) {
        self.queue_change(ConfigChange::SetEmitterEnabled(handle, enabled));
    }

    pub fn add_force(&mut self, force: Force) -> ForceHandle {
        let handle = self.forces.reserve_handle();
        self.queue_change(ConfigChange::AddForce(handle, force));
        handle
    }

    pub fn remove_force(&mut self, handle: ForceHandle) {
        self.queue_change(ConfigChange::RemoveForce(handle));
    }

    pub fn set_force_enabled(&mut self, handle: ForceHandle, enabled: bool) {
        self.queue_change(ConfigChange::SetForceEnabled(handle, enabled));
    }

    pub fn set_pointer_force(&mut self, force: Option<PointerForce>) {
        self.queue_change(ConfigChange::SetPointerForce(force));
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.queue_change(ConfigChange::SetInteractive(interactive));
    }

    pub fn set_speed_multiplier(&mut self, speed: f32) {
        self.queue_change(ConfigChange::SetSpeedMultiplier(speed));
    }

    pub fn set_max_particles(&mut self, max: usize) {
        self.queue_change(ConfigChange::SetMaxParticles(max));
    }

    pub fn set_color_scheme(&mut self, name: impl Into<String>) {
        self.queue_change(ConfigChange::SetColorScheme(name.into()));
    }

    /// Freeze spawning, integration and aging; rendering continues
    pub fn set_paused(&mut self, paused: bool) {
        self.config.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.config.paused
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
        self.renderer.settings.debug = debug;
    }

    pub fn set_effects(&mut self, effects: Effects) {
        self.config.effects = effects;
        self.renderer.settings.glow = effects.glow;
    }

    pub fn set_custom_shape(&mut self, renderer: Box<dyn ShapeRenderer>) {
        self.renderer.set_custom_shape(renderer);
    }

    pub fn add_listener(&mut self, listener: Box<dyn EngineCallbacks>) {
        self.dispatcher.add_listener(listener);
    }

    /// Queue events for [`drain_events`](Self::drain_events)
    pub fn set_event_recording(&mut self, enabled: bool) {
        self.dispatcher.set_recording(enabled);
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.dispatcher.drain()
    }

    /// Where the simulation surface sits in host pixel space
    pub fn set_surface_offset(&mut self, x: f32, y: f32) {
        self.input.set_surface_offset(Vec2::new(x, y));
    }

    pub fn pointer_moved(&mut self, host_x: f32, host_y: f32) {
        self.input.pointer_moved(host_x, host_y);
    }

    pub fn pointer_left(&mut self) {
        self.input.pointer_left();
    }

    /// Hit-test a host click; fires `on_particle_clicked` for the closest hit
    pub fn click(&mut self, host_x: f32, host_y: f32) -> Option<ParticleId> {
        let point = self.input.to_simulation(host_x, host_y);
        let id = self.renderer.hit_test(self.store.iter(), point)?;
        if let Some(particle) = self.store.find(id) {
            self.dispatcher.particle_clicked(particle);
        }
        Some(id)
    }

    /// Draw the current particle set and, in debug mode, the telemetry overlay
    pub fn render(&self, surface: &mut dyn DrawSurface) -> RenderStats {
        let telemetry = self.telemetry();
        self.renderer.draw(self.store.iter(), Some(&telemetry), surface)
    }

    pub fn snapshot(&self) -> RenderableSnapshot<'_> {
        RenderableSnapshot {
            tick: self.tick,
            spawned: self.last_spawned,
            expired: self.last_expired,
            paused: self.config.paused,
            telemetry: self.telemetry(),
            effects: self.config.effects,
            store: &self.store,
        }
    }

    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            fps: self.governor.fps(),
            frame_count: self.governor.frame_count(),
            live_particles: self.store.len(),
            enabled_emitters: self.emitters.enabled_count(),
            total_emitters: self.emitters.len(),
            enabled_forces: self.forces.enabled_count(),
            total_forces: self.forces.len(),
        }
    }

    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.store.iter()
    }

    pub fn emitters(&self) -> &EmitterManager {
        &self.emitters
    }

    pub fn forces(&self) -> &ForceRegistry {
        &self.forces
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Current settings with the live emitter and force lists folded back in
    pub fn to_config(&self) -> EngineConfig {
        EngineConfig {
            emitters: self
                .emitters
                .states()
                .iter()
                .map(|s| s.emitter.clone())
                .collect(),
            forces: self.forces.forces().cloned().collect(),
            ..self.config.clone()
        }
    }
}
