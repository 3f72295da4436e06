//! Nearest-road-point lookup.

use agro_core::{GeoPoint, VertexId};

use crate::network::RoadNetwork;

/// A query point snapped onto the road network.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RoadSnap {
    /// Closest road vertex.
    pub vertex: VertexId,
    /// Position of that vertex.
    pub position: GeoPoint,
    /// Great-circle distance from the query point to `position`, metres.
    pub distance_m: f64,
}

/// Find the road vertex closest to `pos`.
///
/// Returns `None` when no network is loaded, the network is empty, or the
/// query cannot be answered (non-finite coordinate).  Callers treat `None` as
/// the signal to fall back to synthetic routing; it is never an error.
pub fn locate_nearest(network: Option<&RoadNetwork>, pos: GeoPoint) -> Option<RoadSnap> {
    let network = network?;
    let vertex = network.nearest_vertex(pos)?;
    let position = network.position(vertex)?;
    Some(RoadSnap {
        vertex,
        position,
        distance_m: pos.distance_m(position),
    })
}
