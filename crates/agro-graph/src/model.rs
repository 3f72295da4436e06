//! Supply-chain nodes and edges.
//!
//! Nodes are keyed by their string ids.  Role-specific attributes live in the
//! [`NodeKind`] payload so a parcel can never be asked for a truck count.

use std::str::FromStr;

use agro_core::{GeoPoint, SurfaceType};
use agro_spatial::ResolvedRoute;

use crate::GraphError;

// ── Nodes ─────────────────────────────────────────────────────────────────────

/// Role of a node in the supply chain.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeRole {
    Parcel,
    CollectionCenter,
    ProcessingPlant,
}

impl NodeRole {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRole::Parcel           => "parcel",
            NodeRole::CollectionCenter => "collection_center",
            NodeRole::ProcessingPlant  => "processing_plant",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeRole {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parcel"            => Ok(NodeRole::Parcel),
            "collection_center" => Ok(NodeRole::CollectionCenter),
            "processing_plant"  => Ok(NodeRole::ProcessingPlant),
            other => Err(GraphError::Parse(format!(
                "invalid role {other:?}: expected parcel, collection_center, or processing_plant"
            ))),
        }
    }
}

/// A farmed land unit.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParcelAttrs {
    pub crop: String,
    pub area_ha: f64,
    /// Production estimate recorded with the parcel, tonnes.  Used whenever
    /// no yield prediction is available.
    pub nominal_production_t: f64,
    pub storage_capacity_t: f64,
    pub cold_room: bool,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CenterAttrs {
    pub capacity_t: f64,
    pub cold_chain: bool,
    pub trucks: u32,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlantAttrs {
    pub throughput_t_per_day: f64,
    pub requires_cold_chain: bool,
}

/// Role plus role-specific attributes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Parcel(ParcelAttrs),
    CollectionCenter(CenterAttrs),
    ProcessingPlant(PlantAttrs),
}

/// A supply-chain node.  Immutable once the graph is built.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: String,
    pub position: GeoPoint,
    pub kind: NodeKind,
}

impl Node {
    pub fn parcel(id: impl Into<String>, position: GeoPoint, attrs: ParcelAttrs) -> Self {
        Self { id: id.into(), position, kind: NodeKind::Parcel(attrs) }
    }

    pub fn center(id: impl Into<String>, position: GeoPoint, attrs: CenterAttrs) -> Self {
        Self { id: id.into(), position, kind: NodeKind::CollectionCenter(attrs) }
    }

    pub fn plant(id: impl Into<String>, position: GeoPoint, attrs: PlantAttrs) -> Self {
        Self { id: id.into(), position, kind: NodeKind::ProcessingPlant(attrs) }
    }

    pub fn role(&self) -> NodeRole {
        match self.kind {
            NodeKind::Parcel(_)           => NodeRole::Parcel,
            NodeKind::CollectionCenter(_) => NodeRole::CollectionCenter,
            NodeKind::ProcessingPlant(_)  => NodeRole::ProcessingPlant,
        }
    }

    /// Parcel attributes, or `None` for centers and the plant.
    pub fn parcel_attrs(&self) -> Option<&ParcelAttrs> {
        match &self.kind {
            NodeKind::Parcel(p) => Some(p),
            _ => None,
        }
    }
}

// ── Edges ─────────────────────────────────────────────────────────────────────

/// Which tier of the supply chain an edge connects.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ConnectionKind {
    ParcelToCenter,
    CenterToPlant,
    ParcelToPlant,
}

impl ConnectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionKind::ParcelToCenter => "parcel_center",
            ConnectionKind::CenterToPlant  => "center_plant",
            ConnectionKind::ParcelToPlant  => "parcel_plant_direct",
        }
    }

    /// `true` for the high-grade haul tiers.
    #[inline]
    pub fn is_trunk(self) -> bool {
        !matches!(self, ConnectionKind::ParcelToCenter)
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed supply-chain connection with derived transport attributes.
///
/// `distance_m` is always the resolved route's own distance, so the route's
/// segment distances sum to it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub origin:      String,
    pub destination: String,
    pub kind:        ConnectionKind,

    pub distance_m:  f64,
    pub distance_km: f64,
    /// Assigned average speed, km/h.
    pub speed_kmh:   f64,
    pub time_min:    f64,
    /// Transport cost per tonne.
    pub cost_per_t:  f64,
    pub surface:     SurfaceType,
    /// Usability under rain, in (0, 1].
    pub rain_accessibility: f64,
    /// `true` if any part of the route came from the road network.
    pub real_route:  bool,

    pub route:       ResolvedRoute,
}

impl Edge {
    #[inline]
    pub fn has_synthetic_segments(&self) -> bool {
        self.route.has_synthetic_segments()
    }
}

/// Travel time in minutes for `distance_km` at `speed_kmh`.
#[inline]
pub(crate) fn travel_minutes(distance_km: f64, speed_kmh: f64) -> f64 {
    if speed_kmh > 0.0 { distance_km / speed_kmh * 60.0 } else { 0.0 }
}
