//! # Height-Field Compositor
//!
//! Turns an ordered stack of contour layers into a continuous surface
//! height per voxel column.
//!
//! ## Algorithm
//!
//! 1. Center all radial math on the vertex average of the base layer.
//! 2. Pre-sample every layer's radial profile into angular bins.
//! 3. Per column, normalize the distance to the center by the base radius
//!    at that angle:
//!    - beyond `1 + feather / base_radius`: ground level
//!    - in the feather ring: smoothstep from the base top down to ground
//!    - inside: smoothstep between the two layers whose normalized radii
//!      bracket the column, or the innermost top if inside every layer
//! 4. Smooth with a plus-shaped neighbour average that ignores columns at
//!    ground level.
//!
//! The parameterization gives one continuous profile per angle, so layer
//! boundaries never show up as concentric rings.

use std::ops::Range;

use strata_shared::PlanarPoint;

use crate::grid::index_to_world;
use crate::layer::Layer;
use crate::profile::{AngularBins, RadialProfile};

/// Base radii below this are degenerate.
const MIN_BASE_RADIUS: f32 = 1e-4;

/// Layers whose normalized radii differ by less than this are one edge.
const MIN_LAYER_SPAN: f32 = 1e-6;

/// Cubic ease `t^2 (3 - 2t)`, with `t` clamped to `[0, 1]`.
#[inline]
#[must_use]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Per-layer radii and tops, precomputed once per feature call.
#[derive(Clone, Debug)]
pub struct LayerStack {
    center: PlanarPoint,
    radii: Vec<AngularBins>,
    tops: Vec<f32>,
}

impl LayerStack {
    /// Precomputes `layers` at `bins` angular bins.
    ///
    /// Returns `None` when there are no layers or the base layer has no
    /// vertices.
    #[must_use]
    pub fn new(layers: &[Layer], bins: usize) -> Option<Self> {
        let center = layers.first()?.centroid()?;
        let radii = layers
            .iter()
            .map(|layer| RadialProfile::new(&layer.vertices, center))
            .map(|profile| AngularBins::sample(&profile, bins))
            .collect();
        let tops = layers.iter().map(Layer::top_y).collect();
        Some(Self {
            center,
            radii,
            tops,
        })
    }

    /// Center all radii are measured from.
    #[must_use]
    pub fn center(&self) -> PlanarPoint {
        self.center
    }

    /// Largest sampled radius of the base layer.
    #[must_use]
    pub fn base_max_radius(&self) -> f32 {
        self.radii.first().map_or(0.0, AngularBins::max_radius)
    }

    /// Base layer radius at `angle`.
    #[must_use]
    pub fn base_radius_at(&self, angle: f32) -> f32 {
        self.radii.first().map_or(0.0, |bins| bins.radius_at(angle))
    }

    /// Top elevation of each layer, base first.
    #[must_use]
    pub fn tops(&self) -> &[f32] {
        &self.tops
    }

    /// Raw (unsmoothed) surface elevation of the column through `point`.
    #[must_use]
    pub fn surface_at(&self, point: PlanarPoint, ground_y: f32, feather: f32) -> f32 {
        let (Some(base), Some(&base_top)) = (self.radii.first(), self.tops.first()) else {
            return ground_y;
        };
        let dist = point.distance(self.center);
        let angle = point.angle_from(self.center);

        let base_r = base.radius_at(angle);
        if base_r <= MIN_BASE_RADIUS {
            return ground_y;
        }
        let norm_dist = dist / base_r;
        let feather_norm = feather.max(0.0) / base_r;

        if norm_dist > 1.0 + feather_norm {
            return ground_y;
        }
        if norm_dist > 1.0 {
            // feather_norm > 0 here
            let t = 1.0 - (norm_dist - 1.0) / feather_norm;
            return ground_y + (base_top - ground_y) * smoothstep(t);
        }

        // Walk outer to inner until a layer no longer contains the column
        let mut outer_r = 1.0;
        let mut outer_top = base_top;
        for (bins, &top) in self.radii.iter().zip(&self.tops).skip(1) {
            let norm_r = bins.radius_at(angle) / base_r;
            if norm_dist <= norm_r {
                outer_r = norm_r;
                outer_top = top;
                continue;
            }
            let span = outer_r - norm_r;
            if span <= MIN_LAYER_SPAN {
                return top;
            }
            let t = (outer_r - norm_dist) / span;
            return outer_top + (top - outer_top) * smoothstep(t);
        }
        outer_top
    }
}

/// Inputs of one height-field computation.
#[derive(Clone, Debug)]
pub struct HeightFieldRequest<'a> {
    /// Contours, base first.
    pub layers: &'a [Layer],
    /// Ground elevation outside the feature.
    pub ground_y: f32,
    /// Width of the feather ring outside the base contour.
    pub feather: f32,
    /// Buffer column range along x.
    pub x_range: Range<usize>,
    /// Buffer column range along z.
    pub z_range: Range<usize>,
    /// World x/z of the buffer's min corner.
    pub origin: PlanarPoint,
    /// Angular bins per layer.
    pub angular_bins: usize,
    /// Neighbour smoothing passes.
    pub smoothing_passes: u32,
}

/// Resolved surface elevations over a sub-rectangle of buffer columns.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    x_range: Range<usize>,
    z_range: Range<usize>,
    ground_y: f32,
    heights: Vec<f32>,
}

impl HeightField {
    /// A field over the given column ranges, flat at `ground_y`.
    #[must_use]
    pub fn flat(x_range: Range<usize>, z_range: Range<usize>, ground_y: f32) -> Self {
        let len = x_range.len() * z_range.len();
        Self {
            x_range,
            z_range,
            ground_y,
            heights: vec![ground_y; len],
        }
    }

    /// Buffer column range along x.
    #[must_use]
    pub fn x_range(&self) -> Range<usize> {
        self.x_range.clone()
    }

    /// Buffer column range along z.
    #[must_use]
    pub fn z_range(&self) -> Range<usize> {
        self.z_range.clone()
    }

    /// Ground elevation the field was computed against.
    #[must_use]
    pub fn ground_y(&self) -> f32 {
        self.ground_y
    }

    /// Height of buffer column `(x, z)`, if it lies inside the field.
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        if !self.x_range.contains(&x) || !self.z_range.contains(&z) {
            return None;
        }
        let w = self.x_range.len();
        let i = (x - self.x_range.start) + w * (z - self.z_range.start);
        Some(self.heights[i])
    }

    /// `(x, z, height)` for every column, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let w = self.x_range.len().max(1);
        self.heights.iter().enumerate().map(move |(i, &h)| {
            (self.x_range.start + i % w, self.z_range.start + i / w, h)
        })
    }

    /// Largest rise above ground across the field (0 when flat).
    #[must_use]
    pub fn peak_rise(&self) -> f32 {
        let rises = self.heights.iter().map(|&h| h - self.ground_y);
        rises.fold(0.0, f32::max)
    }

    /// One plus-kernel pass: each raised column moves toward the average of
    /// its raised neighbours with self weight 4.
    ///
    /// Columns at or below ground are neither moved nor counted, so a
    /// plateau surrounded by ground stays exactly flat.
    pub fn smooth(&mut self) {
        let w = self.x_range.len();
        let d = self.z_range.len();
        let ground = self.ground_y;
        let src = self.heights.clone();

        for lz in 0..d {
            for lx in 0..w {
                let i = lx + w * lz;
                let h = src[i];
                if h <= ground {
                    continue;
                }
                let neighbours = [
                    (lx > 0).then(|| i - 1),
                    (lx + 1 < w).then(|| i + 1),
                    (lz > 0).then(|| i - w),
                    (lz + 1 < d).then(|| i + w),
                ];
                let (sum, count) = neighbours
                    .into_iter()
                    .flatten()
                    .map(|n| src[n])
                    .filter(|&n| n > ground)
                    .fold((0.0, 0u32), |(sum, count), n| (sum + (n - h), count + 1));
                if count > 0 {
                    self.heights[i] = h + sum / (4 + count) as f32;
                }
            }
        }
    }
}

/// Evaluates and smooths the surface of a layer stack over a column range.
///
/// Returns `None` for an empty stack or a base layer without vertices.
#[must_use]
pub fn compute_height_field(request: &HeightFieldRequest<'_>) -> Option<HeightField> {
    let stack = LayerStack::new(request.layers, request.angular_bins)?;
    Some(compute_with_stack(&stack, request))
}

/// Same as [`compute_height_field`] with a precomputed stack.
#[must_use]
pub fn compute_with_stack(stack: &LayerStack, request: &HeightFieldRequest<'_>) -> HeightField {
    let mut field = HeightField::flat(
        request.x_range.clone(),
        request.z_range.clone(),
        request.ground_y,
    );
    let w = field.x_range.len();

    for (lz, z) in request.z_range.clone().enumerate() {
        let wz = index_to_world(z, request.origin.z);
        for (lx, x) in request.x_range.clone().enumerate() {
            let wx = index_to_world(x, request.origin.x);
            let point = PlanarPoint::new(wx, wz);
            let height = stack.surface_at(point, request.ground_y, request.feather);
            field.heights[lx + w * lz] = height;
        }
    }

    for _ in 0..request.smoothing_passes {
        field.smooth();
    }
    field
}
