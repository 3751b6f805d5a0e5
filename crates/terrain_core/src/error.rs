//! Error type for terrain builds.

use thiserror::Error;

/// Errors raised by terrain generation. Every variant is detected before any
/// buffer is allocated, so a failed build never publishes partial state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    /// A grid, feature or erosion parameter is out of range.
    #[error("invalid terrain config: {0}")]
    InvalidConfig(String),
    /// Buffers handed to the mesh layer disagree in length or reference
    /// vertices that do not exist.
    #[error("invalid mesh buffers: {0}")]
    InvalidBuffers(String),
}

impl TerrainError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn invalid_buffers(msg: impl Into<String>) -> Self {
        Self::InvalidBuffers(msg.into())
    }
}

/// Shorthand result for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// Reject non-finite values with a message naming the parameter.
pub fn ensure_finite(name: &str, value: f32) -> TerrainResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TerrainError::invalid_config(format!("{name} must be finite, got {value}")))
    }
}
