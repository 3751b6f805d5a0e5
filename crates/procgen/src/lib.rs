//! Procedural terrain generation: grid, features, heights, erosion and colors.

pub mod colorize;
pub mod erosion;
pub mod features;
pub mod grid;
pub mod heightfield;
pub mod terrain;

pub use colorize::*;
pub use erosion::*;
pub use features::*;
pub use grid::*;
pub use heightfield::*;
pub use terrain::*;
