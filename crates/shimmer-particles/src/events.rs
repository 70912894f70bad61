//! Host callbacks and the optional event queue
//!
//! Listeners are invoked synchronously inside the tick. A listener that returns
//! an error is logged and skipped; the tick and every other listener carry on.

use crate::emitter::Emitter;
use crate::force::Force;
use crate::particle::Particle;
use serde::Serialize;
use shimmer_core::{ParticleId, Result};

/// Notifications an engine delivers to its host
pub trait EngineCallbacks {
    /// An emitter spawned at least one particle this tick
    fn on_emitter_trigger(&mut self, _emitter: &Emitter, _spawned: usize) -> Result<()> {
        Ok(())
    }

    /// A click landed on a particle
    fn on_particle_clicked(&mut self, _particle: &Particle) -> Result<()> {
        Ok(())
    }

    /// Once per tick per enabled force, with the particles it acted on
    fn on_force_applied(&mut self, _force: &Force, _affected: &[ParticleId]) -> Result<()> {
        Ok(())
    }
}

/// Queued form of the callbacks, for hosts that poll
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    EmitterTriggered {
        emitter: String,
        spawned: usize,
    },
    ParticleClicked {
        id: ParticleId,
    },
    ForceApplied {
        force: String,
        affected: usize,
    },
}

/// A simple event queue the engine pushes to and the host drains
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    /// Drain all events from the bus, returning them
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// Registered listeners plus the optional queue
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Box<dyn EngineCallbacks>>,
    bus: Option<EventBus>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn EngineCallbacks>) {
        self.listeners.push(listener);
    }

    /// Start or stop queueing events
    pub fn set_recording(&mut self, enabled: bool) {
        match (enabled, self.bus.is_some()) {
            (true, false) => self.bus = Some(EventBus::new()),
            (false, true) => self.bus = None,
            _ => {}
        }
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        self.bus.as_mut().map(EventBus::drain).unwrap_or_default()
    }

    fn each<F>(&mut self, callback: &str, mut call: F)
    where
        F: FnMut(&mut dyn EngineCallbacks) -> Result<()>,
    {
        for (idx, listener) in self.listeners.iter_mut().enumerate() {
            if let Err(e) = call(listener.as_mut()) {
                log::error!("[callbacks] listener {idx} failed in {callback}: {e}");
            }
        }
    }

    pub fn emitter_triggered(&mut self, emitter: &Emitter, spawned: usize) {
        self.each("on_emitter_trigger", |l| l.on_emitter_trigger(emitter, spawned));
        if let Some(bus) = self.bus.as_mut() {
            bus.push(EngineEvent::EmitterTriggered {
                emitter: emitter.label().to_string(),
                spawned,
            });
        }
    }

    pub fn particle_clicked(&mut self, particle: &Particle) {
        self.each("on_particle_clicked", |l| l.on_particle_clicked(particle));
        if let Some(bus) = self.bus.as_mut() {
            bus.push(EngineEvent::ParticleClicked { id: particle.id });
        }
    }

    pub fn force_applied(&mut self, force: &Force, affected: &[ParticleId]) {
        self.each("on_force_applied", |l| l.on_force_applied(force, affected));
        if let Some(bus) = self.bus.as_mut() {
            bus.push(EngineEvent::ForceApplied {
                force: force.label().to_string(),
                affected: affected.len(),
            });
        }
    }
}
