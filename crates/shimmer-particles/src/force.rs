//! Force field descriptors, the per-type force laws, and the ordered registry

use crate::particle::Particle;
use serde::{Deserialize, Serialize};
use shimmer_core::Vec3;

/// Kind of environmental influence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceKind {
    #[default]
    Gravity,
    Wind,
    Attraction,
    Repulsion,
    Vortex,
}

impl ForceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForceKind::Gravity => "gravity",
            ForceKind::Wind => "wind",
            ForceKind::Attraction => "attraction",
            ForceKind::Repulsion => "repulsion",
            ForceKind::Vortex => "vortex",
        }
    }
}

/// An environmental force, as configured by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Force {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ForceKind,
    pub strength: f32,
    pub position: Vec3,
    /// Unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    pub enabled: bool,
}

impl Default for Force {
    fn default() -> Self {
        Self {
            name: None,
            kind: ForceKind::Gravity,
            strength: 0.0,
            position: Vec3::ZERO,
            radius: None,
            enabled: true,
        }
    }
}

impl Force {
    pub fn new(kind: ForceKind, strength: f32) -> Self {
        Self {
            kind,
            strength,
            ..Default::default()
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display label for logs and the debug overlay
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.as_str())
    }

    /// Whether a particle at `position` lies inside this force's radius
    pub fn reaches(&self, position: Vec3) -> bool {
        match self.radius {
            Some(radius) => (position - self.position).length() <= radius,
            None => true,
        }
    }
}

/// Velocity change pulling toward the center of an inverse-distance field.
///
/// `offset` is `particle - center`. The `+ 1` keeps the law finite at the center,
/// where the direction itself collapses to zero.
pub fn inverse_distance_pull(offset: Vec3, scaled_strength: f32) -> Vec3 {
    let dist = offset.length();
    offset.normalized() * (-scaled_strength / (dist + 1.0))
}

/// Apply one force to a particle's velocity for a tick of `dt`.
///
/// Returns whether the particle was affected (enabled and within radius).
pub fn apply_force(particle: &mut Particle, force: &Force, dt: f32, speed_multiplier: f32) -> bool {
    if !force.enabled || !force.reaches(particle.position) {
        return false;
    }

    let s = force.strength * dt * speed_multiplier;
    let offset = particle.position - force.position;
    match force.kind {
        ForceKind::Gravity => particle.velocity.y += s,
        ForceKind::Wind => particle.velocity.x += s,
        ForceKind::Attraction => particle.velocity += inverse_distance_pull(offset, s),
        ForceKind::Repulsion => particle.velocity += -inverse_distance_pull(offset, s),
        ForceKind::Vortex => {
            let theta = offset.y.atan2(offset.x);
            particle.velocity.x += -theta.sin() * s;
            particle.velocity.y += theta.cos() * s;
        }
    }
    true
}

/// Stable handle to a registered force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForceHandle(pub u32);

/// Ordered collection of forces; application order is insertion order
#[derive(Default)]
pub struct ForceRegistry {
    forces: Vec<(ForceHandle, Force)>,
    next_handle: u32,
}

impl ForceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a handle for a force that will be inserted later
    pub fn reserve_handle(&mut self) -> ForceHandle {
        let handle = ForceHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    pub fn add(&mut self, force: Force) -> ForceHandle {
        let handle = self.reserve_handle();
        self.insert(handle, force);
        handle
    }

    pub fn insert(&mut self, handle: ForceHandle, force: Force) {
        self.forces.push((handle, force));
    }

    pub fn remove(&mut self, handle: ForceHandle) -> Option<Force> {
        let idx = self.forces.iter().position(|(h, _)| *h == handle)?;
        Some(self.forces.remove(idx).1)
    }

    /// Returns false if the handle is unknown
    pub fn set_enabled(&mut self, handle: ForceHandle, enabled: bool) -> bool {
        match self.get_mut(handle) {
            Some(force) => {
                force.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, handle: ForceHandle) -> Option<&Force> {
        self.forces
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, f)| f)
    }

    pub fn get_mut(&mut self, handle: ForceHandle) -> Option<&mut Force> {
        self.forces
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, f)| f)
    }

    pub fn find_by_name(&self, name: &str) -> Option<ForceHandle> {
        self.forces
            .iter()
            .find(|(_, f)| f.name.as_deref() == Some(name))
            .map(|(h, _)| *h)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ForceHandle, &Force)> {
        self.forces.iter().map(|(h, f)| (*h, f))
    }

    pub fn forces(&self) -> impl Iterator<Item = &Force> {
        self.forces.iter().map(|(_, f)| f)
    }

    pub fn len(&self) -> usize {
        self.forces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.forces.iter().filter(|(_, f)| f.enabled).count()
    }
}
