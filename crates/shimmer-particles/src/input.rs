//! Host pointer events into simulation space

use shimmer_core::Vec2;

/// Translates host-surface pixels into simulation coordinates and caches the
/// latest pointer position for the integrator.
#[derive(Debug, Clone, Default)]
pub struct InputAdapter {
    /// Host-space position of the simulation surface's top-left corner
    offset: Vec2,
    pointer: Option<Vec2>,
}

impl InputAdapter {
    pub fn new(offset: Vec2) -> Self {
        Self {
            offset,
            pointer: None,
        }
    }

    pub fn set_surface_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn surface_offset(&self) -> Vec2 {
        self.offset
    }

    pub fn to_simulation(&self, host_x: f32, host_y: f32) -> Vec2 {
        Vec2::new(host_x, host_y) - self.offset
    }

    /// Handle a host pointer-move event
    pub fn pointer_moved(&mut self, host_x: f32, host_y: f32) {
        self.pointer = Some(self.to_simulation(host_x, host_y));
    }

    /// The pointer left the surface; interaction stops until it returns
    pub fn pointer_left(&mut self) {
        self.pointer = None;
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }
}
