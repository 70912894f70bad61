//! Particle records and the slot arena that owns them

use serde::{Deserialize, Serialize};
use shimmer_core::{Color, ParticleId, Vec3};

/// Drawable shape of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleShape {
    #[default]
    Sphere,
    Square,
    Triangle,
    Star,
    /// Drawn by a host-registered shape strategy
    Custom,
}

/// One simulated entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    pub id: ParticleId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Nominal diameter
    pub size: f32,
    pub life: f32,
    pub max_life: f32,
    /// Always `life / max_life`
    pub opacity: f32,
    pub color: Color,
    pub shape: ParticleShape,
    pub mass: f32,
    pub charge: f32,
    pub trail_enabled: bool,
}

impl Particle {
    /// A freshly spawned particle at full life
    pub fn new(id: ParticleId, position: Vec3, velocity: Vec3, size: f32, life: f32) -> Self {
        Self {
            id,
            position,
            velocity,
            size,
            life,
            max_life: life,
            opacity: 1.0,
            color: Color::WHITE,
            shape: ParticleShape::Sphere,
            mass: default_mass(size),
            charge: 0.0,
            trail_enabled: false,
        }
    }

    /// Normalized remaining life in [0, 1]
    pub fn life_ratio(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// Mass proportional to the particle's area
pub fn default_mass(size: f32) -> f32 {
    size * size * 0.01
}

/// Index of a slot in the [`ParticleStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotIndex(pub u32);

/// Fixed-capacity particle arena.
///
/// Slots are allocated once up front; dead slots go onto a free-list and are
/// reused by the next insert (lowest slot first), so a warmed-up store never
/// allocates during a tick.
/// Iteration visits live slots in slot order, which keeps ticks deterministic.
pub struct ParticleStore {
    slots: Vec<Option<Particle>>,
    free: Vec<u32>,
    live: usize,
}

impl ParticleStore {
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            free: Self::full_free_list(capacity),
            live: 0,
        }
    }

    // Reversed so that `pop` hands out slot 0 first
    fn full_free_list(capacity: usize) -> Vec<u32> {
        (0..capacity as u32).rev().collect()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Insert a particle into a free slot. Returns None if the store is full.
    pub fn insert(&mut self, particle: Particle) -> Option<SlotIndex> {
        let idx = self.free.pop()?;
        self.slots[idx as usize] = Some(particle);
        self.live += 1;
        Some(SlotIndex(idx))
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&Particle> {
        self.slots.get(slot.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut Particle> {
        self.slots.get_mut(slot.0 as usize).and_then(Option::as_mut)
    }

    /// Find a live particle by id
    pub fn find(&self, id: ParticleId) -> Option<&Particle> {
        self.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Keep particles for which `keep` returns true, freeing the rest.
    /// Returns the number of particles removed.
    pub fn retain_mut<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&mut Particle) -> bool,
    {
        let mut removed = 0;
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            let Some(particle) = slot.as_mut() else {
                continue;
            };
            if !keep(particle) {
                *slot = None;
                self.free.push(idx as u32);
                removed += 1;
            }
        }
        if removed > 0 {
            // Highest index first, so `pop` keeps handing out the lowest free slot
            self.free.sort_unstable_by(|a, b| b.cmp(a));
        }
        self.live -= removed;
        removed
    }

    /// Grow or shrink the arena. Shrinking evicts particles in the dropped slots
    /// and returns how many were evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        let old = self.slots.len();
        if capacity == old {
            return 0;
        }

        let mut evicted = 0;
        if capacity > old {
            self.slots.resize_with(capacity, || None);
        } else {
            evicted = self.slots[capacity..].iter().filter(|s| s.is_some()).count();
            self.slots.truncate(capacity);
            self.live -= evicted;
        }

        // Rebuild so the lowest free slot is handed out first
        self.free = (0..capacity as u32)
            .rev()
            .filter(|&i| self.slots[i as usize].is_none())
            .collect();
        evicted
    }
}
