//! # Radial Profile Sampler
//!
//! Describes a polygon contour as "radius at angle" around a center.
//!
//! Radius between two vertices is interpolated linearly in angle, which
//! stays finite and monotonic where a ray/edge intersection would blow up
//! (rays collinear with an edge, rays through a vertex).
//!
//! ## Angle Convention
//!
//! Angles come from `atan2(dz, dx)` and live in `(-PI, PI]`. Bin `b` of `n`
//! sits at `-PI + b * TAU / n`.

use std::f32::consts::{PI, TAU};

use strata_shared::PlanarPoint;

/// Spans narrower than this are treated as a single angle.
const MIN_ANGLE_SPAN: f32 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq)]
struct RadialSample {
    angle: f32,
    radius: f32,
}

/// A polygon's vertices in polar form around a center, sorted by angle.
#[derive(Clone, Debug, Default)]
pub struct RadialProfile {
    samples: Vec<RadialSample>,
}

impl RadialProfile {
    /// Builds the profile of `vertices` around `center`.
    #[must_use]
    pub fn new(vertices: &[PlanarPoint], center: PlanarPoint) -> Self {
        let mut samples: Vec<RadialSample> = vertices
            .iter()
            .map(|v| RadialSample {
                angle: v.angle_from(center),
                radius: v.distance(center),
            })
            .collect();
        samples.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        Self { samples }
    }

    /// Number of vertices in the profile.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the profile has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Radius of the contour at `angle`.
    ///
    /// Empty profiles have radius 0 everywhere, single-vertex profiles are
    /// circles.
    #[must_use]
    pub fn radius_at(&self, angle: f32) -> f32 {
        match self.samples.as_slice() {
            [] => 0.0,
            [only] => only.radius,
            samples => {
                // First sample strictly past the query
                let next = samples.partition_point(|s| s.angle <= angle);
                if next > 0 && next < samples.len() {
                    return interpolate(samples[next - 1], samples[next], angle);
                }

                // No bracket in one pass: wrap across the -PI/PI seam
                let last = samples[samples.len() - 1];
                let first = samples[0];
                let wrapped_first = RadialSample {
                    angle: first.angle + TAU,
                    radius: first.radius,
                };
                let query = if angle < first.angle {
                    angle + TAU
                } else {
                    angle
                };
                interpolate(last, wrapped_first, query)
            }
        }
    }
}

fn interpolate(a: RadialSample, b: RadialSample, angle: f32) -> f32 {
    let span = b.angle - a.angle;
    let t = if span > MIN_ANGLE_SPAN {
        ((angle - a.angle) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    a.radius + (b.radius - a.radius) * t
}

/// A profile pre-sampled at a fixed number of evenly spaced angles.
///
/// Built once per layer so per-column lookups cost two reads and a lerp.
#[derive(Clone, Debug)]
pub struct AngularBins {
    radii: Vec<f32>,
    step: f32,
}

impl AngularBins {
    /// Samples `profile` at `count` angles (at least one).
    #[must_use]
    pub fn sample(profile: &RadialProfile, count: usize) -> Self {
        let count = count.max(1);
        let step = TAU / count as f32;
        let radii = (0..count).map(|b| profile.radius_at(-PI + b as f32 * step)).collect();
        Self { radii, step }
    }

    /// Number of bins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// Always false; there is at least one bin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Sampled radii, bin 0 first.
    #[must_use]
    pub fn radii(&self) -> &[f32] {
        &self.radii
    }

    /// Largest sampled radius.
    #[must_use]
    pub fn max_radius(&self) -> f32 {
        self.radii.iter().copied().fold(0.0, f32::max)
    }

    /// Radius at `angle`, interpolated between the two neighbouring bins.
    #[must_use]
    pub fn radius_at(&self, angle: f32) -> f32 {
        let n = self.radii.len();
        let pos = (angle + PI) / self.step;
        let floor = pos.floor();
        let frac = pos - floor;
        let i0 = (floor as i64).rem_euclid(n as i64) as usize;
        let i1 = (i0 + 1) % n;
        self.radii[i0] + (self.radii[i1] - self.radii[i0]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(half: f32) -> Vec<PlanarPoint> {
        vec![
            PlanarPoint::new(-half, -half),
            PlanarPoint::new(half, -half),
            PlanarPoint::new(half, half),
            PlanarPoint::new(-half, half),
        ]
    }

    #[test]
    fn test_profile_sorted_by_angle() {
        let profile = RadialProfile::new(&square(10.0), PlanarPoint::ZERO);
        assert_eq!(profile.len(), 4);
        let angles: Vec<f32> = profile.samples.iter().map(|s| s.angle).collect();
        assert!(
            angles.windows(2).all(|w| w[0] <= w[1]),
            "angles not sorted: {angles:?}"
        );
    }

    #[test]
    fn test_radius_at_vertices_is_exact() {
        let vertices = [
            PlanarPoint::new(10.0, 0.0),
            PlanarPoint::new(0.0, 5.0),
            PlanarPoint::new(-8.0, 0.0),
            PlanarPoint::new(0.0, -3.0),
        ];
        let profile = RadialProfile::new(&vertices, PlanarPoint::ZERO);
        assert_eq!(profile.radius_at(0.0), 10.0);
        let quarter = std::f32::consts::FRAC_PI_2;
        assert!((profile.radius_at(quarter) - 5.0).abs() < 1e-5);
        assert!((profile.radius_at(-quarter) - 3.0).abs() < 1e-5);
        assert!((profile.radius_at(PI) - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_interpolation_is_monotonic_between_vertices() {
        let vertices = [
            PlanarPoint::new(10.0, 0.0),
            PlanarPoint::new(0.0, 20.0),
            PlanarPoint::new(-10.0, 0.0),
            PlanarPoint::new(0.0, -10.0),
        ];
        let profile = RadialProfile::new(&vertices, PlanarPoint::ZERO);
        let mut previous = profile.radius_at(0.0);
        for step in 1..=90 {
            let angle = (step as f32).to_radians();
            let r = profile.radius_at(angle);
            assert!(
                r >= previous,
                "radius fell from {previous} to {r} at {step} deg"
            );
            assert!(r.is_finite());
            previous = r;
        }
        assert!((previous - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_wraps_across_seam() {
        let polar = |r: f32, deg: f32| {
            let (s, c) = deg.to_radians().sin_cos();
            PlanarPoint::new(r * c, r * s)
        };
        let vertices = [polar(10.0, 170.0), polar(20.0, -170.0), polar(15.0, 0.0)];
        let profile = RadialProfile::new(&vertices, PlanarPoint::ZERO);

        // Exactly halfway between 170 deg (r=10) and -170 deg (r=20)
        let r = profile.radius_at(PI);
        assert!((r - 15.0).abs() < 1e-3, "seam radius {r}");
        let r = profile.radius_at(-PI + 1e-4);
        assert!((r - 15.0).abs() < 1e-2, "seam radius from below {r}");
    }

    #[test]
    fn test_degenerate_profiles() {
        let empty = RadialProfile::new(&[], PlanarPoint::ZERO);
        assert!(empty.is_empty());
        assert_eq!(empty.radius_at(1.0), 0.0);

        let single = RadialProfile::new(&[PlanarPoint::new(3.0, 4.0)], PlanarPoint::ZERO);
        assert_eq!(single.radius_at(-2.0), 5.0);
        assert_eq!(single.radius_at(2.5), 5.0);
    }

    #[test]
    fn test_bins_match_profile_at_bin_angles() {
        let profile = RadialProfile::new(&square(10.0), PlanarPoint::ZERO);
        let bins = AngularBins::sample(&profile, 72);
        assert_eq!(bins.len(), 72);
        assert!(!bins.is_empty());

        // Four equal-radius vertices interpolate to a circle
        let corner = 10.0 * std::f32::consts::SQRT_2;
        for (b, r) in bins.radii().iter().enumerate() {
            assert!((r - corner).abs() < 1e-3, "bin {b} radius {r}");
        }
        assert!((bins.radius_at(0.3) - corner).abs() < 1e-3);
        assert!((bins.max_radius() - corner).abs() < 1e-3);
    }

    #[test]
    fn test_bins_wrap_between_last_and_first() {
        let vertices = [
            PlanarPoint::new(10.0, 0.0),
            PlanarPoint::new(0.0, 10.0),
            PlanarPoint::new(-30.0, 0.0),
            PlanarPoint::new(0.0, -10.0),
        ];
        let profile = RadialProfile::new(&vertices, PlanarPoint::ZERO);
        let bins = AngularBins::sample(&profile, 8);

        // Bin 0 sits at -PI where the radius is 30
        assert!((bins.radii()[0] - 30.0).abs() < 1e-3);
        assert!((bins.radius_at(PI) - 30.0).abs() < 1e-3);
        // Between bin 7 (3PI/4) and bin 0 (PI): halfway from 20 to 30
        let r = bins.radius_at(7.0 * PI / 8.0);
        assert!((r - 25.0).abs() < 1e-2, "wrapped bin radius {r}");
    }
}
