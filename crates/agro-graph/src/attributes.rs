//! Edge-attribute derivation: speed, surface, and rain-accessibility bands.
//!
//! # Bands
//!
//! | Situation                                  | Speed (km/h) |
//! |--------------------------------------------|--------------|
//! | parcel→center, network, arterial paved     | 60–80        |
//! | parcel→center, network, other paved        | 40–60        |
//! | parcel→center, network, gravel / dirt      | 30–55        |
//! | parcel→center, stitched                    | 50–70        |
//! | trunk, network or stitched                 | 60–80        |
//! | trunk, favorable fallback (center→plant)   | 50–70        |
//! | trunk, favorable fallback (direct)         | 55–70        |
//! | straight line < 5 km                       | 40–60        |
//! | straight line < 15 km                      | 35–55        |
//! | straight line ≥ 15 km                      | 30–50        |
//!
//! Rain accessibility: paved 0.85–1.0, gravel 0.50–0.85, dirt 0.20–0.60.
//! Trunk edges use 0.90–1.0 whatever their surface.
//!
//! Every draw goes through the caller's [`BuildRng`], one draw per attribute
//! in a fixed order (surface if needed, speed, accessibility).

use agro_core::{BuildRng, SurfaceType};
use agro_spatial::RoadClass;

use crate::config::TrunkSurfacePolicy;
use crate::model::ConnectionKind;

/// Inclusive-exclusive numeric range `lo .. hi`.
pub type Band = (f64, f64);

const ARTERIAL_SPEED:  Band = (60.0, 80.0);
const LOCAL_SPEED:     Band = (40.0, 60.0);
const UNPAVED_SPEED:   Band = (30.0, 55.0);
const STITCHED_SPEED:  Band = (50.0, 70.0);
const TRUNK_SPEED:     Band = (60.0, 80.0);
const TRUNK_FALLBACK_SPEED:  Band = (50.0, 70.0);
const DIRECT_FALLBACK_SPEED: Band = (55.0, 70.0);
const TRUNK_RAIN: Band = (0.90, 1.0);

/// How the route behind an edge was obtained.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Tier {
    /// Resolved through the road network (possibly with access splices).
    Network { class: Option<RoadClass>, surface: SurfaceType },
    /// Stitched through the endpoints' precomputed road snaps.
    Stitched { surface: SurfaceType },
    /// Straight-line estimate; the surface is drawn here.
    StraightLine,
}

/// Attributes drawn for one edge.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct DrawnAttributes {
    pub surface: SurfaceType,
    pub speed_kmh: f64,
    pub rain_accessibility: f64,
}

/// Rain-accessibility band of a surface.
pub fn rain_band(surface: SurfaceType) -> Band {
    match surface {
        SurfaceType::Paved  => (0.85, 1.0),
        SurfaceType::Gravel => (0.50, 0.85),
        SurfaceType::Dirt   => (0.20, 0.60),
    }
}

/// Surface weights and speed band for a straight-line estimate.  Short hops
/// lean paved, long ones mixed.
pub fn straight_line_profile(distance_km: f64) -> (&'static [(SurfaceType, f64)], Band) {
    const NEAR: [(SurfaceType, f64); 2] = [(SurfaceType::Paved, 0.7), (SurfaceType::Gravel, 0.3)];
    const MID: [(SurfaceType, f64); 3] =
        [(SurfaceType::Paved, 0.5), (SurfaceType::Gravel, 0.3), (SurfaceType::Dirt, 0.2)];
    const FAR: [(SurfaceType, f64); 3] =
        [(SurfaceType::Paved, 0.4), (SurfaceType::Gravel, 0.4), (SurfaceType::Dirt, 0.2)];

    if distance_km < 5.0 {
        (&NEAR, (40.0, 60.0))
    } else if distance_km < 15.0 {
        (&MID, (35.0, 55.0))
    } else {
        (&FAR, (30.0, 50.0))
    }
}

/// Draw the surface, speed, and rain accessibility of one edge.
pub fn draw_attributes(
    rng: &mut BuildRng,
    kind: ConnectionKind,
    tier: Tier,
    distance_km: f64,
    policy: TrunkSurfacePolicy,
) -> DrawnAttributes {
    let (surface, speed_band) = match (kind.is_trunk(), tier) {
        (false, Tier::Network { class, surface }) => (surface, network_speed(class, surface)),
        (false, Tier::Stitched { surface }) => (surface, STITCHED_SPEED),
        (true, Tier::Network { surface, .. } | Tier::Stitched { surface }) => (surface, TRUNK_SPEED),
        (false, Tier::StraightLine) => banded_draw(rng, distance_km),
        (true, Tier::StraightLine) => match policy {
            TrunkSurfacePolicy::DistanceBanded => banded_draw(rng, distance_km),
            TrunkSurfacePolicy::Favorable if kind == ConnectionKind::ParcelToPlant => {
                (SurfaceType::Paved, DIRECT_FALLBACK_SPEED)
            }
            TrunkSurfacePolicy::Favorable => {
                let table = [(SurfaceType::Paved, 0.9), (SurfaceType::Gravel, 0.1)];
                let surface = rng.pick_weighted(&table).unwrap_or(SurfaceType::Paved);
                (surface, TRUNK_FALLBACK_SPEED)
            }
        },
    };

    let speed_kmh = draw(rng, speed_band);
    let rain = if kind.is_trunk() { TRUNK_RAIN } else { rain_band(surface) };
    let rain_accessibility = draw(rng, rain);

    DrawnAttributes { surface, speed_kmh, rain_accessibility }
}

/// Speed band for a parcel→center route that came from the road network.
fn network_speed(class: Option<RoadClass>, surface: SurfaceType) -> Band {
    match (surface, class) {
        (SurfaceType::Paved, Some(c)) if c.is_arterial() => ARTERIAL_SPEED,
        (SurfaceType::Paved, _) => LOCAL_SPEED,
        _ => UNPAVED_SPEED,
    }
}

fn banded_draw(rng: &mut BuildRng, distance_km: f64) -> (SurfaceType, Band) {
    let (table, speed) = straight_line_profile(distance_km);
    let surface = rng.pick_weighted(table).unwrap_or(SurfaceType::Dirt);
    (surface, speed)
}

#[inline]
fn draw(rng: &mut BuildRng, (lo, hi): Band) -> f64 {
    if lo < hi { rng.gen_range(lo..hi) } else { lo }
}
