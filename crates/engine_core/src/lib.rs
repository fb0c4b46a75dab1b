//! Core engine types shared by the world seam and the aerial AI.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Entity and dimension identifiers
//! - Tick-based time management
//! - Common component types
//! - The world error taxonomy

pub mod components;
pub mod error;
pub mod ids;
pub mod time;

pub use components::*;
pub use error::*;
pub use ids::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{IVec3, Vec3};
