//! # Buffer Configuration
//!
//! Tunables for the compositor and the buffer, loaded once per generation
//! pass. Every key is optional in TOML; missing keys take their defaults.
//!
//! ```toml
//! angular_bins = 144
//! smoothing_passes = 2
//! noise_seed = 7
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TerrainError, TerrainResult};

/// Configuration for a [`VoxelBuffer`](crate::VoxelBuffer).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Angular bins per layer when precomputing contour radii.
    pub angular_bins: usize,
    /// Neighbour-average passes applied to each raw height field.
    pub smoothing_passes: u32,
    /// Upper bound on cells a single buffer may allocate.
    pub max_cells: usize,
    /// Seed for noise painting and mixing.
    pub noise_seed: u64,
    /// Margin (world units) added on every side by `carve_doorway`.
    pub doorway_margin: f32,
}

impl BufferConfig {
    /// Default angular resolution: 72 bins, 5 degrees each.
    pub const DEFAULT_ANGULAR_BINS: usize = 72;

    /// Fewest bins that still resolve a quad footprint.
    pub const MIN_ANGULAR_BINS: usize = 8;

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] on malformed TOML or
    /// out-of-range values.
    pub fn from_toml_str(text: &str) -> TerrainResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| TerrainError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Io`] if the file cannot be read, otherwise as
    /// [`BufferConfig::from_toml_str`].
    pub fn from_toml_file(path: &Path) -> TerrainResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidConfig`] naming the first bad key.
    pub fn validate(&self) -> TerrainResult<()> {
        if self.angular_bins < Self::MIN_ANGULAR_BINS {
            return Err(TerrainError::InvalidConfig(format!(
                "angular_bins must be at least {}, got {}",
                Self::MIN_ANGULAR_BINS,
                self.angular_bins
            )));
        }
        if self.max_cells == 0 {
            return Err(TerrainError::InvalidConfig(
                "max_cells must be positive".into(),
            ));
        }
        if !self.doorway_margin.is_finite() || self.doorway_margin < 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "doorway_margin must be finite and non-negative, got {}",
                self.doorway_margin
            )));
        }
        Ok(())
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            angular_bins: Self::DEFAULT_ANGULAR_BINS,
            smoothing_passes: 1,
            // 64M cells, ~384MB of arrays
            max_cells: 1 << 26,
            noise_seed: 0x5EED_0F57_7A7A_0001,
            doorway_margin: 1.0,
        }
    }
}
