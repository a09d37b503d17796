//! # Grid Constants
//!
//! Values baked into every buffer and every store region.
//!
//! **CRITICAL:** the backing store is written at this resolution. Changing it
//! changes the meaning of every region already committed.

/// Edge length of one voxel, in world units.
pub const VOXEL_SIZE: f32 = 4.0;

/// Reciprocal of [`VOXEL_SIZE`], for the hot index conversions.
pub const INV_VOXEL_SIZE: f32 = 1.0 / VOXEL_SIZE;
