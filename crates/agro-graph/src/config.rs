//! Graph-construction and query tunables.

use agro_spatial::ResolverConfig;

use crate::{GraphError, GraphResult};

/// How trunk edges (center→plant, parcel→plant direct) pick a surface when
/// neither a network route nor a stitched route is available.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrunkSurfacePolicy {
    /// Assume a high-grade haul road whatever the distance: center→plant is
    /// paved 90 % / gravel 10 %, direct edges are always paved.
    #[default]
    Favorable,
    /// Use the same distance-banded table as parcel→center edges.
    DistanceBanded,
}

/// Every tunable of graph construction and route queries.
///
/// `Default` reproduces the reference constants.  With the `serde` feature
/// any subset of fields can be given in a config file; missing fields take
/// their default.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphConfig {
    /// Master seed.  The same seed and node set always produce identical
    /// edges.
    pub seed: u64,

    /// Parcel→center fan-out is drawn uniformly from
    /// `min_connections ..= max_connections`, capped by the number of centers.
    pub min_connections: usize,
    pub max_connections: usize,

    /// Base transport cost per km per tonne on parcel→center edges and ad-hoc
    /// queries.  Default: 0.15.
    pub fuel_cost_per_km: f64,

    /// Base transport cost per km per tonne on trunk edges.  Default: 0.12.
    pub trunk_cost_per_km: f64,

    /// Parcels larger than this (hectares) are eligible for a direct edge to
    /// the plant.  Default: 100.
    pub large_parcel_area_ha: f64,

    /// Maximum number of eligible parcels given a direct edge.  Default: 5.
    pub direct_parcel_sample: usize,

    /// Fallback surface rule for trunk edges.
    pub trunk_surface_policy: TrunkSurfacePolicy,

    /// Assumed speed for ad-hoc queries over paved routes, km/h.
    pub query_paved_speed_kmh: f64,

    /// Assumed speed for ad-hoc queries over gravel or dirt routes, km/h.
    pub query_unpaved_speed_kmh: f64,

    /// Speed multiplier for ad-hoc routes containing synthetic segments.
    pub synthetic_speed_factor: f64,

    /// Rain accessibility reported by ad-hoc queries over paved routes.
    pub query_paved_rain_accessibility: f64,

    /// Rain accessibility reported by ad-hoc queries over gravel or dirt.
    pub query_unpaved_rain_accessibility: f64,

    /// Access-splice threshold and synthetic point spacing.
    pub resolver: ResolverConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            seed:                             42,
            min_connections:                  2,
            max_connections:                  3,
            fuel_cost_per_km:                 0.15,
            trunk_cost_per_km:                0.12,
            large_parcel_area_ha:             100.0,
            direct_parcel_sample:             5,
            trunk_surface_policy:             TrunkSurfacePolicy::Favorable,
            query_paved_speed_kmh:            60.0,
            query_unpaved_speed_kmh:          45.0,
            synthetic_speed_factor:           0.75,
            query_paved_rain_accessibility:   0.9,
            query_unpaved_rain_accessibility: 0.5,
            resolver:                         ResolverConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Reject configurations the builder cannot honour.
    pub fn validate(&self) -> GraphResult<()> {
        if self.min_connections == 0 {
            return Err(GraphError::Config("min_connections must be at least 1".into()));
        }
        if self.min_connections > self.max_connections {
            return Err(GraphError::Config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        let positive = [
            ("fuel_cost_per_km", self.fuel_cost_per_km),
            ("trunk_cost_per_km", self.trunk_cost_per_km),
            ("query_paved_speed_kmh", self.query_paved_speed_kmh),
            ("query_unpaved_speed_kmh", self.query_unpaved_speed_kmh),
            ("synthetic_speed_factor", self.synthetic_speed_factor),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GraphError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        let accessibility = [
            ("query_paved_rain_accessibility", self.query_paved_rain_accessibility),
            ("query_unpaved_rain_accessibility", self.query_unpaved_rain_accessibility),
        ];
        for (name, value) in accessibility {
            if !(value > 0.0 && value <= 1.0) {
                return Err(GraphError::Config(format!("{name} must be in (0, 1], got {value}")));
            }
        }
        Ok(())
    }
}
