//! Semi-implicit Euler integration with reflective bounds

use crate::force::{apply_force, inverse_distance_pull, Force};
use crate::particle::Particle;
use serde::{Deserialize, Serialize};
use shimmer_core::{Vec2, Vec3};

/// Fraction of speed kept (and inverted) on a wall bounce
pub const RESTITUTION: f32 = 0.8;
/// Per-tick multiplicative drag
pub const VELOCITY_DAMPING: f32 = 0.99;

/// Box particles are confined to: `[0, width] x [0, height] x [-depth, depth]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            depth: 200.0,
        }
    }
}

impl Bounds {
    pub fn contains(&self, p: Vec3) -> bool {
        (0.0..=self.width).contains(&p.x)
            && (0.0..=self.height).contains(&p.y)
            && (-self.depth..=self.depth).contains(&p.z)
    }
}

/// Pointer interaction mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerMode {
    #[default]
    Attraction,
    Repulsion,
}

/// Force exerted by the host pointer on nearby particles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerForce {
    #[serde(rename = "type")]
    pub mode: PointerMode,
    pub strength: f32,
    pub radius: f32,
}

impl Default for PointerForce {
    fn default() -> Self {
        Self {
            mode: PointerMode::Repulsion,
            strength: 500.0,
            radius: 100.0,
        }
    }
}

/// Per-tick integration settings
#[derive(Debug, Clone, Copy)]
pub struct StepParams {
    pub dt: f32,
    pub speed_multiplier: f32,
    pub bounds: Bounds,
    /// When false, environmental and pointer forces are skipped
    pub physics_enabled: bool,
    /// Pointer position (simulation space) and its force, when interaction is live
    pub pointer: Option<(Vec2, PointerForce)>,
}

/// Advance one particle by `dt`.
///
/// `on_affected` is called with the index (in `forces` order) of every
/// environmental force that acted on the particle.
pub fn step<'f, I, F>(particle: &mut Particle, forces: I, params: &StepParams, mut on_affected: F)
where
    I: IntoIterator<Item = &'f Force>,
    F: FnMut(usize),
{
    let scale = params.dt * params.speed_multiplier;

    if params.physics_enabled {
        for (idx, force) in forces.into_iter().enumerate() {
            if apply_force(particle, force, params.dt, params.speed_multiplier) {
                on_affected(idx);
            }
        }

        if let Some((pointer, pf)) = params.pointer {
            apply_pointer(particle, pointer, &pf, scale);
        }
    }

    particle.position += particle.velocity * scale;

    let b = params.bounds;
    reflect(&mut particle.position.x, &mut particle.velocity.x, 0.0, b.width);
    reflect(&mut particle.position.y, &mut particle.velocity.y, 0.0, b.height);
    reflect(&mut particle.position.z, &mut particle.velocity.z, -b.depth, b.depth);

    particle.velocity *= VELOCITY_DAMPING;
}

/// Planar inverse-distance impulse from the pointer; the pointer has no depth
fn apply_pointer(particle: &mut Particle, pointer: Vec2, force: &PointerForce, scale: f32) {
    let offset = Vec3::new(particle.position.x - pointer.x, particle.position.y - pointer.y, 0.0);
    if offset.length() > force.radius {
        return;
    }
    let pull = inverse_distance_pull(offset, force.strength * scale);
    match force.mode {
        PointerMode::Attraction => particle.velocity += pull,
        PointerMode::Repulsion => particle.velocity += -pull,
    }
}

fn reflect(pos: &mut f32, vel: &mut f32, min: f32, max: f32) {
    if *pos < min {
        *pos = min;
        *vel = -*vel * RESTITUTION;
    } else if *pos > max {
        *pos = max;
        *vel = -*vel * RESTITUTION;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::ForceKind;
    use shimmer_core::ParticleId;

    fn params(dt: f32) -> StepParams {
        StepParams {
            dt,
            speed_multiplier: 1.0,
            bounds: Bounds {
                width: 100.0,
                height: 100.0,
                depth: 50.0,
            },
            physics_enabled: true,
            pointer: None,
        }
    }

    fn particle_at(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
        Particle::new(
            ParticleId(1),
            Vec3::new(x, y, 0.0),
            Vec3::new(vx, vy, 0.0),
            4.0,
            1.0,
        )
    }

    #[test]
    fn free_flight_moves_then_damps() {
        let mut p = particle_at(10.0, 10.0, 10.0, 0.0);
        step(&mut p, std::iter::empty::<&Force>(), &params(0.5), |_| {});
        assert!((p.position.x - 15.0).abs() < 1e-5);
        assert!((p.velocity.x - 9.9).abs() < 1e-5);
    }

    #[test]
    fn wall_bounce_inverts_and_clamps() {
        let mut p = particle_at(95.0, 50.0, 100.0, 0.0);
        step(&mut p, std::iter::empty::<&Force>(), &params(0.1), |_| {});
        assert_eq!(p.position.x, 100.0);
        assert!((p.velocity.x - (-100.0 * RESTITUTION * VELOCITY_DAMPING)).abs() < 1e-3);

        let mut p = particle_at(1.0, 1.0, -50.0, -50.0);
        p.velocity.z = -1000.0;
        step(&mut p, std::iter::empty::<&Force>(), &params(0.1), |_| {});
        assert_eq!(p.position.x, 0.0);
        assert_eq!(p.position.y, 0.0);
        assert_eq!(p.position.z, -50.0);
        assert!(p.velocity.x > 0.0 && p.velocity.y > 0.0 && p.velocity.z > 0.0);
    }

    #[test]
    fn forces_report_affected_indices() {
        let forces = vec![
            Force::new(ForceKind::Gravity, 10.0),
            Force::new(ForceKind::Attraction, 10.0)
                .at(Vec3::new(90.0, 90.0, 0.0))
                .with_radius(5.0),
            Force::new(ForceKind::Wind, 10.0),
        ];
        let mut p = particle_at(10.0, 10.0, 0.0, 0.0);
        let mut hits = Vec::new();
        step(&mut p, &forces, &params(0.1), |i| hits.push(i));
        assert_eq!(hits, vec![0, 2]);
    }

    #[test]
    fn physics_disabled_skips_forces() {
        let forces = vec![Force::new(ForceKind::Gravity, 1000.0)];
        let mut p = particle_at(50.0, 50.0, 0.0, 0.0);
        let mut params = params(0.1);
        params.physics_enabled = false;
        step(&mut p, &forces, &params, |_| panic!("no force should apply"));
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.position, Vec3::new(50.0, 50.0, 0.0));
    }

    #[test]
    fn pointer_repels_within_radius() {
        let mut params = params(0.1);
        params.pointer = Some((
            Vec2::new(40.0, 50.0),
            PointerForce {
                mode: PointerMode::Repulsion,
                strength: 100.0,
                radius: 20.0,
            },
        ));

        let mut near = particle_at(50.0, 50.0, 0.0, 0.0);
        step(&mut near, std::iter::empty::<&Force>(), &params, |_| {});
        assert!(near.velocity.x > 0.0);

        let mut far = particle_at(90.0, 50.0, 0.0, 0.0);
        step(&mut far, std::iter::empty::<&Force>(), &params, |_| {});
        assert_eq!(far.velocity, Vec3::ZERO);
    }

    #[test]
    fn pointer_attracts_within_radius() {
        let mut params = params(0.1);
        params.pointer = Some((
            Vec2::new(40.0, 50.0),
            PointerForce {
                mode: PointerMode::Attraction,
                strength: 100.0,
                radius: 20.0,
            },
        ));

        let mut near = particle_at(50.0, 50.0, 0.0, 0.0);
        step(&mut near, std::iter::empty::<&Force>(), &params, |_| {});
        // s = 10, dist = 10, then one damping step
        assert!((near.velocity.x + 10.0 / 11.0 * VELOCITY_DAMPING).abs() < 1e-5);
        assert!(near.velocity.y.abs() < 1e-6);
    }

    #[test]
    fn speed_multiplier_scales_motion() {
        let mut p = particle_at(10.0, 10.0, 10.0, 0.0);
        let mut params = params(0.1);
        params.speed_multiplier = 2.0;
        step(&mut p, std::iter::empty::<&Force>(), &params, |_| {});
        assert!((p.position.x - 12.0).abs() < 1e-5);
    }
}
