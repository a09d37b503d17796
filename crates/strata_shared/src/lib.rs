//! # Strata Shared
//!
//! Value geometry used by the terrain write engine and by the code that
//! feeds it (room layout, contour generators).
//!
//! Everything here is `Copy`, has no shared mutable state and no
//! dependency on the voxel buffer itself.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::VOXEL_SIZE;
pub use math::{PlanarPoint, Pose, Quaternion, Vec3};
