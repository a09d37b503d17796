//! # Terrain Error Types
//!
//! Only contract violations and store failures end up here. Geometry that
//! misses the buffer is a no-op, not an error.

use thiserror::Error;

use crate::buffer::VoxelBuffer;

/// Errors that can occur while building, loading or committing a buffer.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// Requested bounds are empty, inverted or not finite on some axis.
    #[error("invalid bounds on {axis} axis: min {min} must be below max {max}")]
    InvalidBounds {
        /// Axis name (`x`, `y` or `z`).
        axis: &'static str,
        /// Requested minimum.
        min: f32,
        /// Requested maximum.
        max: f32,
    },

    /// Requested buffer would hold more cells than the configured budget.
    #[error("buffer too large: {cells} cells exceeds limit of {limit}")]
    TooManyCells {
        /// Cells the bounds would need.
        cells: usize,
        /// Configured `max_cells`.
        limit: usize,
    },

    /// A store returned arrays that do not cover the requested region.
    #[error("region size mismatch: expected {expected} cells, got {actual}")]
    RegionMismatch {
        /// Cell count of the region.
        expected: usize,
        /// Length the store returned.
        actual: usize,
    },

    /// The backing store only supports writes.
    #[error("backing store does not support region reads")]
    ReadUnsupported,

    /// Backend-specific failure reported by a store implementation.
    #[error("backing store failure: {0}")]
    Store(String),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Snapshot bytes failed decompression or validation.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(&'static str),

    /// File operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for terrain operations.
pub type TerrainResult<T> = Result<T, TerrainError>;

/// A [`VoxelBuffer::flush`] the store rejected.
///
/// Carries the buffer back untouched so the commit can be retried.
#[derive(Error, Debug)]
#[error("flush failed: {source}")]
pub struct FlushError {
    source: TerrainError,
    buffer: Box<VoxelBuffer>,
}

impl FlushError {
    pub(crate) fn new(source: TerrainError, buffer: VoxelBuffer) -> Self {
        Self {
            source,
            buffer: Box::new(buffer),
        }
    }

    /// What the store reported.
    #[must_use]
    pub fn error(&self) -> &TerrainError {
        &self.source
    }

    /// The buffer, with every edit still in place.
    #[must_use]
    pub fn into_buffer(self) -> VoxelBuffer {
        *self.buffer
    }
}

impl From<FlushError> for TerrainError {
    fn from(err: FlushError) -> Self {
        err.source
    }
}
