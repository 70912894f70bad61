//! Shimmer Core - Foundational types for the Shimmer particle engine
//!
//! This crate provides the core types that all other Shimmer crates depend on:
//! - `ParticleId` - Engine-local particle identifiers
//! - `Vec2`, `Vec3` - Spatial types
//! - `Color` - RGBA colors with hex parsing
//! - Error types and Result alias

mod error;
mod id;
mod types;

pub use error::{Result, ShimmerError};
pub use id::{IdAllocator, ParticleId};
pub use types::{Color, Vec2, Vec3};
