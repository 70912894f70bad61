//! Particle aging and eviction

use crate::particle::{Particle, ParticleStore};

/// Outcome of aging a particle by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Alive,
    Expired,
}

/// Age a particle by `dt * speed_multiplier`.
///
/// Opacity tracks `life / max_life` for survivors; expired particles are left
/// untouched apart from their life so the caller can drop them.
pub fn age(particle: &mut Particle, dt: f32, speed_multiplier: f32) -> Fate {
    particle.life -= dt * speed_multiplier;
    if particle.life <= 0.0 {
        return Fate::Expired;
    }
    particle.opacity = particle.life / particle.max_life;
    Fate::Alive
}

/// Age every particle in the store and evict the expired ones.
/// Returns the number evicted.
pub fn reap(store: &mut ParticleStore, dt: f32, speed_multiplier: f32) -> usize {
    store.retain_mut(|p| age(p, dt, speed_multiplier) == Fate::Alive)
}
