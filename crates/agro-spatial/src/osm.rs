//! OSM PBF loader, enabled with the `osm` Cargo feature.
//!
//! # Usage
//!
//! ```ignore
//! use agro_spatial::osm::PbfNetwork;
//! use agro_spatial::acquire_network;
//!
//! let network = acquire_network(&PbfNetwork::new("yuma_county.osm.pbf"));
//! ```
//!
//! # What is loaded
//!
//! Only drivable `highway=*` ways are included (see [`is_drivable`]).
//! Footways, buildings, POIs, and relations are ignored.  One-way roads add
//! a single directed edge; two-way roads add both directions.  Edge length
//! is the haversine distance between consecutive way nodes.
//!
//! # Memory note
//!
//! The loader buffers every OSM node position in a `HashMap<i64, GeoPoint>`
//! for the first pass, because ways reference nodes by OSM id.  The map is
//! freed before the R-tree is built.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use osmpbf::{Element, ElementReader};

use agro_core::{GeoPoint, VertexId};

use crate::network::{RoadClass, RoadNetwork, RoadNetworkBuilder};
use crate::provider::NetworkProvider;
use crate::{SpatialError, SpatialResult};

// ── Provider ──────────────────────────────────────────────────────────────────

/// Network read from an OSM PBF extract.
pub struct PbfNetwork {
    pub path: PathBuf,
}

impl PbfNetwork {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl NetworkProvider for PbfNetwork {
    fn name(&self) -> &str {
        "osm-pbf"
    }

    fn load(&self) -> SpatialResult<RoadNetwork> {
        load_from_pbf(&self.path)
    }
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Load a road network from an OSM PBF file.
///
/// # Errors
///
/// Returns [`SpatialError::Osm`] on open or parse errors.
pub fn load_from_pbf(path: &Path) -> SpatialResult<RoadNetwork> {
    // ── Phase 1: collect all OSM nodes + road ways in one sequential pass ──
    let reader = ElementReader::from_path(path).map_err(|e| SpatialError::Osm(e.to_string()))?;

    let mut all_nodes: HashMap<i64, GeoPoint> = HashMap::new();
    let mut road_ways: Vec<OsmWay> = Vec::new();

    reader
        .for_each(|elem| match elem {
            Element::Node(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::DenseNode(n) => {
                all_nodes.insert(n.id(), GeoPoint::new(n.lat(), n.lon()));
            }
            Element::Way(w) => {
                // Collect tags eagerly so &str lifetimes don't escape the closure.
                let tags: Vec<(&str, &str)> = w.tags().collect();
                let highway = tags
                    .iter()
                    .find(|(k, _)| *k == "highway")
                    .map(|(_, v)| *v);

                if let Some(highway) = highway.filter(|h| is_drivable(h)) {
                    road_ways.push(OsmWay {
                        refs:   w.refs().collect(),
                        class:  RoadClass::from_highway(highway),
                        oneway: is_oneway(highway, &tags),
                    });
                }
            }
            _ => {}
        })
        .map_err(|e| SpatialError::Osm(e.to_string()))?;

    // ── Phase 2: identify road-referenced node IDs ────────────────────────
    let road_node_ids: HashSet<i64> = road_ways
        .iter()
        .flat_map(|w| w.refs.iter().copied())
        .collect();

    // ── Phase 3: build network ────────────────────────────────────────────
    let mut builder = RoadNetworkBuilder::with_capacity(
        road_node_ids.len(),
        road_node_ids.len() * 2,
    );

    // Sorted so vertex numbering is reproducible across runs.
    let mut ordered: Vec<i64> = road_node_ids.into_iter().collect();
    ordered.sort_unstable();

    let mut osm_to_vertex: HashMap<i64, VertexId> = HashMap::with_capacity(ordered.len());
    for osm_id in ordered {
        if let Some(&pos) = all_nodes.get(&osm_id) {
            osm_to_vertex.insert(osm_id, builder.add_vertex(pos));
        }
    }

    drop(all_nodes);

    for way in &road_ways {
        for window in way.refs.windows(2) {
            if let (Some(&from), Some(&to)) =
                (osm_to_vertex.get(&window[0]), osm_to_vertex.get(&window[1]))
            {
                let len_m = builder.vertex_pos(from).distance_m(builder.vertex_pos(to));
                builder.add_directed_edge(from, to, len_m, way.class);
                if !way.oneway {
                    builder.add_directed_edge(to, from, len_m, way.class);
                }
            }
        }
    }

    Ok(builder.build())
}

// ── Internal types ────────────────────────────────────────────────────────────

struct OsmWay {
    refs:   Vec<i64>,
    class:  RoadClass,
    oneway: bool,
}

// ── Tag helpers ───────────────────────────────────────────────────────────────

/// `false` for `highway` values a loaded truck cannot use.
fn is_drivable(highway: &str) -> bool {
    !matches!(
        highway,
        "footway" | "path" | "cycleway" | "pedestrian" | "steps" | "bridleway"
            | "corridor" | "proposed" | "construction" | "platform"
    )
}

/// Determine whether a way should be treated as one-way.
///
/// Motorways and motorway links are implicitly one-way in OSM convention.
fn is_oneway(highway: &str, tags: &[(&str, &str)]) -> bool {
    let explicit = tags.iter().any(|(k, v)| {
        *k == "oneway" && matches!(*v, "yes" | "1" | "true")
    });
    let implicit = matches!(highway, "motorway" | "motorway_link");
    explicit || implicit
}
