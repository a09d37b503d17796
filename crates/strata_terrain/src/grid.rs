//! # Grid Mapping
//!
//! Pure conversions between world space and the voxel index space of a
//! buffer.
//!
//! ## Conventions
//!
//! - Indices are 0-based; ranges are half-open.
//! - A cell belongs to a world interval when its **center** lies inside the
//!   interval (inclusive, with a tiny tolerance against float noise).
//! - Bounds are always snapped outward, so a requested region is never
//!   truncated.

use std::ops::Range;

use strata_shared::constants::INV_VOXEL_SIZE;
use strata_shared::{Vec3, VOXEL_SIZE};

use crate::error::{TerrainError, TerrainResult};

/// Tolerance, in voxels, when testing a cell center against an interval end.
const CENTER_TOLERANCE: f32 = 1e-4;

/// Rounds `v` down to the voxel grid.
#[inline]
#[must_use]
pub fn snap_down(v: f32) -> f32 {
    (v * INV_VOXEL_SIZE).floor() * VOXEL_SIZE
}

/// Rounds `v` up to the voxel grid.
#[inline]
#[must_use]
pub fn snap_up(v: f32) -> f32 {
    (v * INV_VOXEL_SIZE).ceil() * VOXEL_SIZE
}

/// Converts the world interval `[world_min, world_max]` to the range of cells
/// whose centers fall inside it, clamped to `0..extent`.
///
/// Returns `None` when no cell of the buffer qualifies; callers treat that as
/// a no-op.
#[must_use]
pub fn index_range(
    world_min: f32,
    world_max: f32,
    buf_min: f32,
    extent: usize,
) -> Option<Range<usize>> {
    if world_min.is_nan() || world_max.is_nan() || world_min > world_max || extent == 0 {
        return None;
    }
    let lo = ((world_min - buf_min) * INV_VOXEL_SIZE - 0.5 - CENTER_TOLERANCE).ceil();
    let hi = ((world_max - buf_min) * INV_VOXEL_SIZE - 0.5 + CENTER_TOLERANCE).floor() + 1.0;

    let start = lo.max(0.0);
    let end = hi.min(extent as f32);
    if start >= end {
        return None;
    }
    Some(start as usize..end as usize)
}

/// Index of the cell containing world coordinate `w`. May lie outside the
/// buffer; negative values mean below `buf_min`.
#[inline]
#[must_use]
pub fn world_to_index(w: f32, buf_min: f32) -> i64 {
    ((w - buf_min) * INV_VOXEL_SIZE).floor() as i64
}

/// Index of the highest cell whose lower face lies strictly below `w`.
///
/// Grid arithmetic only, so it holds at elevations where `w` minus a small
/// epsilon rounds back to `w`.
#[inline]
#[must_use]
pub fn last_index_below(w: f32, buf_min: f32) -> i64 {
    ((w - buf_min) * INV_VOXEL_SIZE).ceil() as i64 - 1
}

/// World coordinate of the **center** of cell `i`.
#[inline]
#[must_use]
pub fn index_to_world(i: usize, buf_min: f32) -> f32 {
    buf_min + (i as f32 + 0.5) * VOXEL_SIZE
}

/// World coordinate of the lower face of cell `i`.
#[inline]
#[must_use]
pub fn cell_bottom(i: usize, buf_min: f32) -> f32 {
    buf_min + i as f32 * VOXEL_SIZE
}

/// A grid-snapped world box and its voxel extents.
///
/// This is the unit both bulk store operations are parameterized by.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    min: Vec3,
    max: Vec3,
    dims: [usize; 3],
}

impl Region {
    /// Snaps `[world_min, world_max]` outward to the grid.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::InvalidBounds`] if `world_max` is not strictly
    /// greater than `world_min` on every axis, or a coordinate is not finite.
    pub fn snapped(world_min: Vec3, world_max: Vec3) -> TerrainResult<Self> {
        let axes = [
            ("x", world_min.x, world_max.x),
            ("y", world_min.y, world_max.y),
            ("z", world_min.z, world_max.z),
        ];
        for (axis, min, max) in axes {
            if !(min.is_finite() && max.is_finite()) || max <= min {
                return Err(TerrainError::InvalidBounds { axis, min, max });
            }
        }

        let min = Vec3::new(
            snap_down(world_min.x),
            snap_down(world_min.y),
            snap_down(world_min.z),
        );
        let max = Vec3::new(
            snap_up(world_max.x),
            snap_up(world_max.y),
            snap_up(world_max.z),
        );
        let extent = |lo: f32, hi: f32| ((hi - lo) * INV_VOXEL_SIZE).round() as usize;

        Ok(Self {
            min,
            max,
            dims: [
                extent(min.x, max.x),
                extent(min.y, max.y),
                extent(min.z, max.z),
            ],
        })
    }

    /// Snapped lower corner.
    #[inline]
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Snapped upper corner.
    #[inline]
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Cell counts along x, y, z.
    #[inline]
    #[must_use]
    pub const fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Voxel edge length the region is gridded at.
    #[inline]
    #[must_use]
    pub const fn voxel_size(&self) -> f32 {
        VOXEL_SIZE
    }

    /// Total number of cells (saturating).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.dims[0].saturating_mul(self.dims[1]).saturating_mul(self.dims[2])
    }

    /// Flat row-major index: `x + sx * (y + sy * z)`.
    #[inline]
    #[must_use]
    pub const fn linear_index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.dims[0] * (y + self.dims[1] * z)
    }

    /// Returns true if `(x, y, z)` addresses a cell of this region.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.dims[0] && y < self.dims[1] && z < self.dims[2]
    }

    /// World-space center of a cell.
    #[inline]
    #[must_use]
    pub fn cell_center(&self, x: usize, y: usize, z: usize) -> Vec3 {
        Vec3::new(
            index_to_world(x, self.min.x),
            index_to_world(y, self.min.y),
            index_to_world(z, self.min.z),
        )
    }

    /// The cell containing a world point, if it lies inside the region.
    #[must_use]
    pub fn cell_of(&self, world: Vec3) -> Option<[usize; 3]> {
        let x = world_to_index(world.x, self.min.x);
        let y = world_to_index(world.y, self.min.y);
        let z = world_to_index(world.z, self.min.z);
        let in_axis = |i: i64, n: usize| i >= 0 && (i as u64) < n as u64;
        if in_axis(x, self.dims[0]) && in_axis(y, self.dims[1]) && in_axis(z, self.dims[2]) {
            Some([x as usize, y as usize, z as usize])
        } else {
            None
        }
    }

    /// Cell ranges of an axis-aligned world box, or `None` if any axis misses.
    #[must_use]
    pub fn ranges_for_box(&self, lo: Vec3, hi: Vec3) -> Option<[Range<usize>; 3]> {
        Some([
            index_range(lo.x, hi.x, self.min.x, self.dims[0])?,
            index_range(lo.y, hi.y, self.min.y, self.dims[1])?,
            index_range(lo.z, hi.z, self.min.z, self.dims[2])?,
        ])
    }
}
