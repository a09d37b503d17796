//! # Feature Rasterization
//!
//! Writes height fields into the buffer with sub-voxel precision.
//!
//! - [`VoxelBuffer::fill_feature`]: raise a surface from ground level.
//! - [`VoxelBuffer::carve_feature`]: reinterpret the rise as a normalized
//!   depth and clear a basin below ground level.
//! - [`VoxelBuffer::fill_from_height_field`]: fill the whole buffer from a
//!   caller-merged [`ColumnHeights`] grid, plus optional water.
//!
//! Partial top (or bottom) cells carry fractional occupancy so surfaces
//! stay smooth at voxel scale.

use strata_shared::{PlanarPoint, VOXEL_SIZE};
use tracing::{debug, trace};

use crate::buffer::VoxelBuffer;
use crate::grid::{cell_bottom, index_range, last_index_below, world_to_index};
use crate::height_field::{compute_with_stack, HeightField, HeightFieldRequest, LayerStack};
use crate::layer::Layer;
use crate::material::Material;

/// Profile peaks below this make `carve_feature` a no-op.
const MIN_CARVE_PROFILE: f32 = 1e-4;

/// Carve depths below this leave a column untouched.
const MIN_CARVE_DEPTH: f32 = 1e-4;

/// A full-buffer grid of surface elevations, one per `(x, z)` column.
///
/// Feature fields can be merged into it with [`ColumnHeights::merge_max`]
/// before a single [`VoxelBuffer::fill_from_height_field`].
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnHeights {
    sx: usize,
    sz: usize,
    heights: Vec<f32>,
}

impl ColumnHeights {
    /// An `sx` by `sz` grid with every column at `height`.
    #[must_use]
    pub fn new(sx: usize, sz: usize, height: f32) -> Self {
        Self {
            sx,
            sz,
            heights: vec![height; sx * sz],
        }
    }

    /// A grid matching `buffer`'s columns, every column at `height`.
    #[must_use]
    pub fn for_buffer(buffer: &VoxelBuffer, height: f32) -> Self {
        let [sx, _, sz] = buffer.dims();
        Self::new(sx, sz, height)
    }

    /// Columns along x and z.
    #[must_use]
    pub fn dims(&self) -> [usize; 2] {
        [self.sx, self.sz]
    }

    /// Height of column `(x, z)`.
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        (x < self.sx && z < self.sz).then(|| self.heights[x + self.sx * z])
    }

    /// Sets column `(x, z)`; out-of-range columns are ignored.
    pub fn set(&mut self, x: usize, z: usize, height: f32) -> bool {
        if x >= self.sx || z >= self.sz {
            return false;
        }
        self.heights[x + self.sx * z] = height;
        true
    }

    /// Raises every column covered by `field` to at least its height.
    pub fn merge_max(&mut self, field: &HeightField) {
        for (x, z, h) in field.iter() {
            if x < self.sx && z < self.sz {
                let slot = &mut self.heights[x + self.sx * z];
                *slot = slot.max(h);
            }
        }
    }
}

impl VoxelBuffer {
    /// Smoothed surface of a feature over the buffer columns it can reach,
    /// without writing anything.
    ///
    /// Returns `None` for an empty or degenerate stack, or when the
    /// feature's footprint misses the buffer.
    #[must_use]
    pub fn feature_heights(
        &self,
        layers: &[Layer],
        ground_y: f32,
        feather: f32,
    ) -> Option<HeightField> {
        let Some(stack) = LayerStack::new(layers, self.config.angular_bins) else {
            debug!(layers = layers.len(), "feature skipped: no base contour");
            return None;
        };
        let feather = if feather.is_finite() {
            feather.max(0.0)
        } else {
            0.0
        };
        let base_r = stack.base_max_radius();
        if base_r <= 0.0 {
            debug!("feature skipped: zero base radius");
            return None;
        }

        // Vertex bounds, widened to the sampled radius
        let center = stack.center();
        let (lo, hi) = layers.first().and_then(Layer::bounds)?;
        let min = PlanarPoint::new(
            lo.x.min(center.x - base_r) - feather,
            lo.z.min(center.z - base_r) - feather,
        );
        let max = PlanarPoint::new(
            hi.x.max(center.x + base_r) + feather,
            hi.z.max(center.z + base_r) + feather,
        );

        let origin = self.region.min();
        let [sx, _, sz] = self.region.dims();
        let (Some(x_range), Some(z_range)) = (
            index_range(min.x, max.x, origin.x, sx),
            index_range(min.z, max.z, origin.z, sz),
        ) else {
            debug!(?min, ?max, "feature skipped: outside buffer");
            return None;
        };

        let request = HeightFieldRequest {
            layers,
            ground_y,
            feather,
            x_range,
            z_range,
            origin: PlanarPoint::new(origin.x, origin.z),
            angular_bins: self.config.angular_bins,
            smoothing_passes: self.config.smoothing_passes,
        };
        Some(compute_with_stack(&stack, &request))
    }

    /// Raises a feature from `ground_y`.
    ///
    /// Every column whose surface is above ground is filled from the ground
    /// cell up; the top cell gets the fractional remainder unless it already
    /// holds more.
    pub fn fill_feature(
        &mut self,
        layers: &[Layer],
        ground_y: f32,
        material: Material,
        feather: f32,
    ) -> usize {
        let Some(field) = self.feature_heights(layers, ground_y, feather) else {
            return 0;
        };

        let mut columns = 0;
        let mut cells = 0;
        for (x, z, surface_y) in field.iter() {
            if surface_y > ground_y {
                columns += 1;
                cells += self.fill_column(x, z, ground_y, surface_y, material);
            }
        }
        trace!(columns, cells, "filled feature");
        cells
    }

    /// Carves a basin up to `depth` below `ground_y`.
    ///
    /// The feature's rise above ground, normalized by its peak, scales
    /// `depth` per column. The deepest cell of each column keeps fractional
    /// occupancy for a smooth floor.
    pub fn carve_feature(
        &mut self,
        layers: &[Layer],
        ground_y: f32,
        depth: f32,
        feather: f32,
    ) -> usize {
        let Some(field) = self.feature_heights(layers, ground_y, feather) else {
            return 0;
        };
        let peak = field.peak_rise();
        if peak <= MIN_CARVE_PROFILE || depth.is_nan() || depth <= 0.0 {
            debug!(peak, depth, "feature carve skipped: negligible profile");
            return 0;
        }

        let mut columns = 0;
        let mut cells = 0;
        for (x, z, h) in field.iter() {
            let carve = ((h - ground_y) / peak).clamp(0.0, 1.0) * depth;
            if carve <= MIN_CARVE_DEPTH {
                continue;
            }
            columns += 1;
            cells += self.carve_column(x, z, ground_y - carve, ground_y);
        }
        trace!(columns, cells, "carved feature");
        cells
    }

    /// Fills every column from the bottom of the buffer up to its terrain
    /// height, then pours `water_material` into empty cells up to the water
    /// level wherever it is above the terrain.
    pub fn fill_from_height_field(
        &mut self,
        terrain: &ColumnHeights,
        water: Option<&ColumnHeights>,
        material: Material,
        water_material: Material,
    ) -> usize {
        let [sx, _, sz] = self.region.dims();
        let floor_y = self.region.min().y;
        let mut cells = 0;

        for z in 0..sz {
            for x in 0..sx {
                let Some(surface_y) = terrain.get(x, z) else {
                    continue;
                };
                cells += self.fill_column(x, z, floor_y, surface_y, material);

                if let Some(level) = water.and_then(|w| w.get(x, z)) {
                    if level > surface_y {
                        cells += self.pour_column(x, z, surface_y, level, water_material);
                    }
                }
            }
        }
        trace!(cells, "filled from height field");
        cells
    }

    /// Solid fill of column `(x, z)` from the cell containing `from_y` up to
    /// `surface_y`, with a fractional top cell.
    fn fill_column(
        &mut self,
        x: usize,
        z: usize,
        from_y: f32,
        surface_y: f32,
        material: Material,
    ) -> usize {
        let min_y = self.region.min().y;
        let sy = self.region.dims()[1];
        let start = world_to_index(from_y, min_y).max(0) as usize;

        let mut touched = 0;
        for y in start..sy {
            let bottom = cell_bottom(y, min_y);
            if bottom >= surface_y {
                break;
            }
            let i = self.region.linear_index(x, y, z);
            let fraction = ((surface_y - bottom) / VOXEL_SIZE).min(1.0);
            if fraction >= 1.0 {
                self.materials[i] = material;
                self.occupancy[i] = 1.0;
                touched += 1;
            } else if fraction > self.occupancy[i] {
                self.materials[i] = material;
                self.occupancy[i] = fraction;
                touched += 1;
            }
        }
        touched
    }

    /// Fills only empty cells of column `(x, z)` between `from_y` and
    /// `level`, with a fractional top.
    fn pour_column(
        &mut self,
        x: usize,
        z: usize,
        from_y: f32,
        level: f32,
        material: Material,
    ) -> usize {
        let min_y = self.region.min().y;
        let sy = self.region.dims()[1];
        let start = world_to_index(from_y, min_y).max(0) as usize;

        let mut touched = 0;
        for y in start..sy {
            let bottom = cell_bottom(y, min_y);
            if bottom >= level {
                break;
            }
            let i = self.region.linear_index(x, y, z);
            if self.occupancy[i] > 0.0 {
                continue;
            }
            self.materials[i] = material;
            self.occupancy[i] = ((level - bottom) / VOXEL_SIZE).min(1.0);
            touched += 1;
        }
        touched
    }

    /// Clears column `(x, z)` from `bottom_y` up to `top_y`, leaving cells
    /// that start at or above `top_y` alone. The cell straddling `bottom_y`
    /// keeps only the solid part beneath it.
    fn carve_column(&mut self, x: usize, z: usize, bottom_y: f32, top_y: f32) -> usize {
        let min_y = self.region.min().y;
        let sy = self.region.dims()[1] as i64;
        let last = last_index_below(top_y, min_y).min(sy - 1);
        if last < 0 {
            return 0;
        }
        let first = world_to_index(bottom_y, min_y).max(0);

        let mut touched = 0;
        for y in first..=last {
            let y = y as usize;
            let cell_y = cell_bottom(y, min_y);
            let i = self.region.linear_index(x, y, z);
            if cell_y >= bottom_y {
                self.materials[i] = Material::EMPTY;
                self.occupancy[i] = 0.0;
            } else {
                let kept = self.occupancy[i].min((bottom_y - cell_y) / VOXEL_SIZE);
                self.occupancy[i] = kept;
                if kept <= 0.0 {
                    self.materials[i] = Material::EMPTY;
                }
            }
            touched += 1;
        }
        touched
    }
}
