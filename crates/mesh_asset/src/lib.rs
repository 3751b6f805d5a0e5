//! Materializes finished terrain buffers into static meshes and stores them.

pub mod mesh;
pub mod preview;
pub mod sink;
pub mod vertex;

pub use mesh::*;
pub use preview::*;
pub use sink::*;
pub use vertex::*;
