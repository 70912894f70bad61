//! Shimmer Particles - tick-driven 2.5D particle engine
//!
//! Provides a single-threaded particle simulation with:
//! - Emitters that turn elapsed time into spawns, with seedable sampling
//! - Gravity, wind, attraction, repulsion and vortex force fields
//! - Semi-implicit Euler integration inside reflective bounds
//! - Slot arena with a free-list, so warmed-up ticks never allocate particles
//! - Perspective rendering to any `DrawSurface`, with glow, trails and a debug overlay
//! - Pointer interaction, click hit-testing, and host callbacks

pub mod config;
pub mod emitter;
pub mod engine;
pub mod events;
pub mod force;
pub mod governor;
pub mod input;
pub mod integrator;
pub mod lifecycle;
pub mod palette;
pub mod particle;
pub mod rand;
pub mod render;

pub use config::{Effects, EngineConfig};
pub use emitter::{Burst, EmissionPolicy, Emitter, EmitterHandle, Range};
pub use engine::{ConfigChange, Frame, ParticleEngine, RenderableSnapshot};
pub use events::{EngineCallbacks, EngineEvent};
pub use force::{Force, ForceHandle, ForceKind};
pub use governor::{PerformanceConfig, Telemetry};
pub use integrator::{Bounds, PointerForce, PointerMode};
pub use particle::{Particle, ParticleShape, ParticleStore};
pub use rand::{ParticleRng, RandAdapter, RandomSource};
pub use render::{CommandRecorder, DrawCommand, DrawSurface, ShapePrimitive, ShapeRenderer};
