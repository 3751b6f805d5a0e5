//! Grid specification for the regular terrain lattice.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, TerrainError, TerrainResult};

/// Size and spacing of a square terrain grid.
///
/// `size` counts cells per axis, so the grid has `size + 1` vertices per side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    /// Number of cells per axis.
    pub size: u32,
    /// Distance between neighboring vertices in world units.
    pub spacing: f32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            size: 100,
            spacing: 100.0,
        }
    }
}

impl GridSpec {
    /// Largest size whose vertex indices all fit in a `u32`.
    pub const MAX_SIZE: u32 = u16::MAX as u32;

    pub fn new(size: u32, spacing: f32) -> Self {
        Self { size, spacing }
    }

    /// Reject an unusable grid before anything is allocated for it.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.size < 1 {
            return Err(TerrainError::invalid_config("grid size must be at least 1"));
        }
        if self.size > Self::MAX_SIZE {
            return Err(TerrainError::invalid_config(format!(
                "grid size {} exceeds the u32 index limit of {}",
                self.size,
                Self::MAX_SIZE
            )));
        }
        ensure_finite("grid spacing", self.spacing)?;
        if self.spacing <= 0.0 {
            return Err(TerrainError::invalid_config(format!(
                "grid spacing must be positive, got {}",
                self.spacing
            )));
        }
        Ok(())
    }

    /// Vertices per side (`size + 1`).
    #[inline]
    pub fn side(&self) -> usize {
        self.size as usize + 1
    }

    /// Total vertex count, `(size + 1)^2`.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.side() * self.side()
    }

    /// Total index count, `6 * size^2`.
    #[inline]
    pub fn index_count(&self) -> usize {
        6 * self.size as usize * self.size as usize
    }

    /// World-space edge length of the terrain.
    pub fn extent(&self) -> f32 {
        self.size as f32 * self.spacing
    }
}
