//! Contour layers - the caller's description of a raised feature or basin.

use serde::{Deserialize, Serialize};
use strata_shared::PlanarPoint;

/// One horizontal cross-section of a feature.
///
/// Layer 0 of a stack is the widest (base) contour; later layers are
/// narrower for a raised feature, or deeper for a carved basin.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Base elevation of this contour.
    pub elevation_y: f32,
    /// Height added on top of `elevation_y` at this contour's radius.
    pub height: f32,
    /// Ordered vertices of a simple polygon footprint in the XZ plane.
    pub vertices: Vec<PlanarPoint>,
}

impl Layer {
    /// Creates a layer.
    #[must_use]
    pub fn new(elevation_y: f32, height: f32, vertices: Vec<PlanarPoint>) -> Self {
        Self {
            elevation_y,
            height,
            vertices,
        }
    }

    /// Surface elevation this contour anchors: `elevation_y + height`.
    #[inline]
    #[must_use]
    pub fn top_y(&self) -> f32 {
        self.elevation_y + self.height
    }

    /// Vertex average, or `None` for an empty contour.
    #[must_use]
    pub fn centroid(&self) -> Option<PlanarPoint> {
        if self.vertices.is_empty() {
            return None;
        }
        let n = self.vertices.len() as f32;
        let sum = |(sx, sz): (f32, f32), v: &PlanarPoint| (sx + v.x, sz + v.z);
        let (sx, sz) = self.vertices.iter().fold((0.0, 0.0), sum);
        Some(PlanarPoint::new(sx / n, sz / n))
    }

    /// Axis-aligned bounds of the vertices as `(min, max)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(PlanarPoint, PlanarPoint)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                PlanarPoint::new(lo.x.min(v.x), lo.z.min(v.z)),
                PlanarPoint::new(hi.x.max(v.x), hi.z.max(v.z)),
            )
        }))
    }
}
