//! Fabricated road segments.
//!
//! A synthetic segment stands in for road that the real network does not
//! have: the last mile from a field to the nearest road, or an entire route
//! when no network is loaded.  Its geometry is a straight line in degree
//! space, densified so consumers get waypoints at roughly the same spacing
//! as real road geometry.

use agro_core::{GeoPoint, SurfaceType};

/// Default spacing between synthetic waypoints, metres.
pub const DEFAULT_POINT_SPACING_M: f64 = 200.0;

/// One typed piece of a resolved route.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteSegment {
    /// Ordered waypoints, first to last.
    pub points: Vec<GeoPoint>,
    pub surface: SurfaceType,
    /// `true` if fabricated, `false` if drawn from the road network.
    pub synthetic: bool,
    /// Length of this segment in metres.
    pub distance_m: f64,
}

impl RouteSegment {
    pub fn start(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }
}

/// Fabricate a segment from `from` to `to`.
///
/// The geometry has `floor(d / spacing) + 1` equal steps, so every step is
/// shorter than `spacing_m` and the segment always has at least two points
/// (both endpoints, even when they coincide).  `distance_m` is the
/// great-circle distance between the endpoints.
pub fn synthetic_segment(
    from: GeoPoint,
    to: GeoPoint,
    surface: SurfaceType,
    spacing_m: f64,
) -> RouteSegment {
    let distance_m = from.distance_m(to);
    let spacing_m = if spacing_m.is_finite() && spacing_m > 0.0 {
        spacing_m
    } else {
        DEFAULT_POINT_SPACING_M
    };

    let steps = if distance_m.is_finite() {
        (distance_m / spacing_m).floor() as usize + 1
    } else {
        1
    };

    let mut points = Vec::with_capacity(steps + 1);
    points.push(from);
    for i in 1..steps {
        points.push(from.lerp(to, i as f64 / steps as f64));
    }
    points.push(to);

    RouteSegment { points, surface, synthetic: true, distance_m }
}
