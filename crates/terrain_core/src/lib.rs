//! Core types shared by the Morphscape terrain crates.
//!
//! This crate provides the foundational types used across the pipeline:
//! - Grid specification and validation
//! - Vertex colors
//! - The library error type
//! - Deterministic seed derivation

pub mod color;
pub mod error;
pub mod grid_spec;
pub mod seed;

pub use color::*;
pub use error::*;
pub use grid_spec::*;
pub use seed::*;

// Re-export commonly used types
pub use glam::{Vec2, Vec3, Vec4};
