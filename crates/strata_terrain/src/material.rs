//! Material tags and the (material, occupancy) cell pair.
//!
//! Materials come from the host's palette. The engine never interprets
//! them beyond "empty or not".

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Opaque material identifier.
#[repr(transparent)]
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
pub struct Material(pub u16);

impl Material {
    /// No material - air.
    pub const EMPTY: Self = Self(0);

    /// Creates a material tag from a palette id.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns true if this is the empty material.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One cell of a buffer: what it is made of and how full it is.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Voxel {
    /// Material tag.
    pub material: Material,
    /// Fill fraction in `[0, 1]`.
    pub occupancy: f32,
}

impl Voxel {
    /// Empty cell.
    pub const EMPTY: Self = Self {
        material: Material::EMPTY,
        occupancy: 0.0,
    };

    /// Creates a cell, clamping occupancy into `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn new(material: Material, occupancy: f32) -> Self {
        Self {
            material,
            occupancy: clamp_occupancy(occupancy),
        }
    }

    /// Fully solid cell of `material`.
    #[inline]
    #[must_use]
    pub const fn solid(material: Material) -> Self {
        Self {
            material,
            occupancy: 1.0,
        }
    }

    /// Returns true if nothing occupies this cell.
    #[inline]
    #[must_use]
    pub fn is_air(self) -> bool {
        self.occupancy <= 0.0
    }
}

/// Clamps an occupancy into `[0, 1]`, mapping NaN to 0.
#[inline]
#[must_use]
pub fn clamp_occupancy(occupancy: f32) -> f32 {
    if occupancy.is_nan() {
        0.0
    } else {
        occupancy.clamp(0.0, 1.0)
    }
}
