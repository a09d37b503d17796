//! Room-shaped composite operations.
//!
//! Each one pads the room box and delegates to the block primitives.

use serde::{Deserialize, Serialize};
use strata_shared::{Pose, Vec3};

use crate::buffer::VoxelBuffer;
use crate::material::Material;

/// An interior volume: a posed box whose pose is the box center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Center and orientation.
    pub pose: Pose,
    /// Interior width, height and depth.
    pub dims: Vec3,
}

impl Room {
    /// Axis-aligned room centered on `position`.
    #[must_use]
    pub const fn new(position: Vec3, dims: Vec3) -> Self {
        Self {
            pose: Pose::at(position),
            dims,
        }
    }

    /// Room with an explicit pose.
    #[must_use]
    pub const fn with_pose(pose: Pose, dims: Vec3) -> Self {
        Self { pose, dims }
    }

    /// Interior dims grown by `gap` on every side.
    #[must_use]
    pub fn padded(&self, gap: f32) -> Vec3 {
        self.dims.abs() + Vec3::splat(2.0 * gap.max(0.0))
    }

    /// Returns true if `world` lies inside the interior box.
    #[must_use]
    pub fn contains(&self, world: Vec3) -> bool {
        let local = self.pose.to_local(world).abs();
        let half = self.dims.abs() * 0.5;
        local.x <= half.x && local.y <= half.y && local.z <= half.z
    }

    /// World elevation of the interior floor, for axis-aligned rooms.
    #[must_use]
    pub fn floor_y(&self) -> f32 {
        self.pose.position.y - self.dims.y.abs() * 0.5
    }
}

impl VoxelBuffer {
    /// Fills the room box padded by `gap` with `material`.
    pub fn fill_shell(&mut self, room: &Room, gap: f32, material: Material) -> usize {
        self.fill_block(room.pose, room.padded(gap), material)
    }

    /// Clears the room box padded by `gap`.
    pub fn clear_shell(&mut self, room: &Room, gap: f32) -> usize {
        self.carve_block(room.pose, room.padded(gap))
    }

    /// Clears exactly the room interior.
    pub fn carve_interior(&mut self, room: &Room) -> usize {
        self.carve_block(room.pose, room.dims)
    }

    /// Carves a fixture clearance grown by the configured doorway margin.
    pub fn carve_doorway(&mut self, pose: Pose, size: Vec3) -> usize {
        let margin = self.config.doorway_margin;
        self.carve_margin(pose, size, margin)
    }

    /// Carves a box grown by `margin` on every side.
    pub fn carve_margin(&mut self, pose: Pose, size: Vec3, margin: f32) -> usize {
        let grown = size.abs() + Vec3::splat(2.0 * margin.max(0.0));
        self.carve_block(pose, grown)
    }
}
