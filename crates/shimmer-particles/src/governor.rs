//! Particle cap and frame-rate telemetry

use serde::{Deserialize, Serialize};

/// Frames per frame-rate sample
pub const FPS_SAMPLE_FRAMES: u32 = 60;

/// Rendering-side performance knobs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub culling: bool,
    pub lod_distance: f32,
    pub target_fps: f32,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            culling: false,
            lod_distance: 500.0,
            target_fps: 60.0,
        }
    }
}

/// Snapshot of engine counters for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Telemetry {
    pub fps: f32,
    pub frame_count: u64,
    pub live_particles: usize,
    pub enabled_emitters: usize,
    pub total_emitters: usize,
    pub enabled_forces: usize,
    pub total_forces: usize,
}

/// Enforces the particle cap and measures frame rate
#[derive(Debug, Clone)]
pub struct Governor {
    max_particles: usize,
    pub performance: PerformanceConfig,
    frame_count: u64,
    window_start: Option<f64>,
    window_frames: u32,
    fps: f32,
}

impl Governor {
    pub fn new(max_particles: usize, performance: PerformanceConfig) -> Self {
        Self {
            max_particles,
            performance,
            frame_count: 0,
            window_start: None,
            window_frames: 0,
            fps: 0.0,
        }
    }

    pub fn max_particles(&self) -> usize {
        self.max_particles
    }

    pub fn set_max_particles(&mut self, max_particles: usize) {
        self.max_particles = max_particles;
    }

    pub fn can_spawn(&self, current_count: usize) -> bool {
        current_count < self.max_particles
    }

    /// Record a frame at `timestamp` seconds. The frame rate is re-measured
    /// every [`FPS_SAMPLE_FRAMES`] frames.
    pub fn record_frame(&mut self, timestamp: f64) {
        self.frame_count += 1;
        let Some(start) = self.window_start else {
            self.window_start = Some(timestamp);
            return;
        };

        self.window_frames += 1;
        if self.window_frames >= FPS_SAMPLE_FRAMES {
            let elapsed = timestamp - start;
            if elapsed > 0.0 {
                self.fps = (self.window_frames as f64 / elapsed) as f32;
                if self.below_target() {
                    log::debug!(
                        "[governor] {:.1} fps, below target {:.0}",
                        self.fps,
                        self.performance.target_fps
                    );
                }
            }
            self.window_start = Some(timestamp);
            self.window_frames = 0;
        }
    }

    /// Last measured frame rate; zero until the first sample completes
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the measured rate has dropped under the configured target
    pub fn below_target(&self) -> bool {
        self.fps > 0.0 && self.fps < self.performance.target_fps
    }
}
