//! # Secondary-Material Painting
//!
//! Noise-gated material swaps. Painting never changes occupancy: only cells
//! that are already solid take the new material, so paint can't conjure
//! floating voxels out of air.
//!
//! Noise is sampled at cell centers divided by a feature `scale` (world
//! units), remapped to `[0, 1]`, and compared against a `threshold`; a cell
//! is painted when its noise is strictly above it. A negative threshold
//! paints every solid cell, a threshold of 1 paints none.

use serde::{Deserialize, Serialize};
use strata_shared::{Pose, Vec3, VOXEL_SIZE};

use crate::buffer::{visit_box, VoxelBuffer};
use crate::material::Material;
use crate::rooms::Room;

/// Noise gate shared by the mixing operations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseMix {
    /// Feature size in world units.
    pub scale: f32,
    /// Cells whose noise exceeds this in `[0, 1]` are painted.
    pub threshold: f32,
}

impl Default for NoiseMix {
    fn default() -> Self {
        Self {
            scale: 16.0,
            threshold: 0.5,
        }
    }
}

/// Options for [`VoxelBuffer::paint_noise`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoisePaint {
    /// Room whose walls are painted.
    pub room: Room,
    /// Wall thickness around the interior.
    pub shell_thickness: f32,
    /// Material scattered through the walls.
    pub material: Material,
    /// Noise gate.
    pub mix: NoiseMix,
    /// Fractal octaves (at least 1).
    pub octaves: u32,
}

impl VoxelBuffer {
    /// Scatters `options.material` through the solid cells of a room's
    /// shell, leaving the interior alone.
    pub fn paint_noise(&mut self, options: &NoisePaint) -> usize {
        let NoisePaint {
            room,
            shell_thickness,
            material,
            mix,
            octaves,
        } = *options;
        let Some(inv_scale) = inverse_scale(mix.scale) else {
            return 0;
        };
        let Self {
            region,
            materials,
            occupancy,
            noise,
            ..
        } = self;
        let size = room.padded(shell_thickness);
        visit_box(region, room.pose, size, |i, center| {
            if occupancy[i] <= 0.0 || room.contains(center) {
                return false;
            }
            let (x, y, z) = noise_coords(center, inv_scale);
            let n = noise.octaved3(x, y, z, octaves, 0.5, 2.0);
            if (n + 1.0) * 0.5 <= f64::from(mix.threshold) {
                return false;
            }
            materials[i] = material;
            true
        })
    }

    /// Repaints the slab directly beneath a room's floor.
    ///
    /// The slab covers the room footprint and is at least one voxel thick.
    pub fn paint_floor(&mut self, room: &Room, material: Material, thickness: f32) -> usize {
        let thickness = thickness.max(VOXEL_SIZE);
        let mut pose = room.pose;
        pose.position.y = room.floor_y() - thickness * 0.5;
        let size = Vec3::new(room.dims.x.abs(), thickness, room.dims.z.abs());

        let Self {
            region,
            materials,
            occupancy,
            ..
        } = self;
        visit_box(region, pose, size, |i, _| {
            if occupancy[i] <= 0.0 {
                return false;
            }
            materials[i] = material;
            true
        })
    }

    /// Paints 2D noise patches (varying over x and z only) into the solid
    /// cells of a box.
    pub fn mix_patches(
        &mut self,
        pose: Pose,
        size: Vec3,
        material: Material,
        mix: NoiseMix,
    ) -> usize {
        let Some(inv_scale) = inverse_scale(mix.scale) else {
            return 0;
        };
        let Self {
            region,
            materials,
            occupancy,
            noise,
            ..
        } = self;
        visit_box(region, pose, size, |i, center| {
            if occupancy[i] <= 0.0 {
                return false;
            }
            let (x, _, z) = noise_coords(center, inv_scale);
            if noise.sample_unit(x, z) <= f64::from(mix.threshold) {
                return false;
            }
            materials[i] = material;
            true
        })
    }

    /// Paints 3D noise blobs into the solid cells of a box.
    pub fn mix_block(
        &mut self,
        pose: Pose,
        size: Vec3,
        material: Material,
        mix: NoiseMix,
    ) -> usize {
        let Some(inv_scale) = inverse_scale(mix.scale) else {
            return 0;
        };
        let Self {
            region,
            materials,
            occupancy,
            noise,
            ..
        } = self;
        visit_box(region, pose, size, |i, center| {
            if occupancy[i] <= 0.0 {
                return false;
            }
            let (x, y, z) = noise_coords(center, inv_scale);
            if noise.sample3_unit(x, y, z) <= f64::from(mix.threshold) {
                return false;
            }
            materials[i] = material;
            true
        })
    }
}

fn inverse_scale(scale: f32) -> Option<f32> {
    (scale.is_finite() && scale > 0.0).then_some(scale.recip())
}

/// Cell center in noise space.
fn noise_coords(center: Vec3, inv_scale: f32) -> (f64, f64, f64) {
    let p = center * inv_scale;
    (f64::from(p.x), f64::from(p.y), f64::from(p.z))
}
