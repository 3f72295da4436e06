//! Road-network providers.
//!
//! A provider either hands over a complete [`RoadNetwork`] or reports why it
//! cannot.  [`acquire_network`] turns any failure into "no network", which
//! leaves the engine fully usable on synthetic routes.
//!
//! # CSV format
//!
//! Two files.  Vertex ids are the source dataset's own integers.
//!
//! ```csv
//! id,lat,lon
//! 1001,32.6927,-114.6277
//! 1002,32.7010,-114.6100
//! ```
//!
//! ```csv
//! from,to,length_m,highway,oneway
//! 1001,1002,1850.0,primary,false
//! 1002,1003,,service,true
//! ```
//!
//! An empty `length_m` is filled with the haversine distance between the
//! endpoints; an empty `oneway` means two-way.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use agro_core::{GeoPoint, VertexId};

use crate::network::{RoadClass, RoadNetwork, RoadNetworkBuilder};
use crate::{SpatialError, SpatialResult};

// ── Provider trait ────────────────────────────────────────────────────────────

/// Source of a real road network.
pub trait NetworkProvider {
    /// Short label for log lines.
    fn name(&self) -> &str;

    /// Load the network.  Called once at startup.
    fn load(&self) -> SpatialResult<RoadNetwork>;
}

/// Load a network from `provider`, degrading to `None` on failure.
///
/// An empty network is also reported as `None`.
pub fn acquire_network(provider: &dyn NetworkProvider) -> Option<Arc<RoadNetwork>> {
    match provider.load() {
        Ok(network) if network.is_empty() => {
            warn!(provider = provider.name(), "road network is empty; using synthetic routes");
            None
        }
        Ok(network) => {
            info!(
                provider = provider.name(),
                vertices = network.vertex_count(),
                edges = network.edge_count(),
                "road network loaded"
            );
            Some(Arc::new(network))
        }
        Err(err) => {
            warn!(provider = provider.name(), %err, "road network unavailable; using synthetic routes");
            None
        }
    }
}

// ── CSV provider ──────────────────────────────────────────────────────────────

/// Network stored as a vertex CSV and an edge CSV.
pub struct CsvNetwork {
    pub vertices: PathBuf,
    pub edges:    PathBuf,
}

impl CsvNetwork {
    pub fn new(vertices: impl Into<PathBuf>, edges: impl Into<PathBuf>) -> Self {
        Self { vertices: vertices.into(), edges: edges.into() }
    }
}

impl NetworkProvider for CsvNetwork {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self) -> SpatialResult<RoadNetwork> {
        load_network_csv(&self.vertices, &self.edges)
    }
}

#[derive(Deserialize)]
struct VertexRecord {
    id:  i64,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from:     i64,
    to:       i64,
    length_m: Option<f64>,
    highway:  String,
    oneway:   Option<bool>,
}

/// Load a network from two CSV files.
pub fn load_network_csv(vertices: &Path, edges: &Path) -> SpatialResult<RoadNetwork> {
    let vertices = std::fs::File::open(vertices)?;
    let edges = std::fs::File::open(edges)?;
    load_network_readers(vertices, edges)
}

/// Like [`load_network_csv`] but accepts any `Read` sources.
pub fn load_network_readers<V: Read, E: Read>(vertices: V, edges: E) -> SpatialResult<RoadNetwork> {
    let mut builder = RoadNetworkBuilder::new();
    let mut ext_to_id: HashMap<i64, VertexId> = HashMap::new();

    for row in csv::Reader::from_reader(vertices).deserialize::<VertexRecord>() {
        let row = row?;
        if ext_to_id.contains_key(&row.id) {
            return Err(SpatialError::Parse(format!("duplicate vertex id {}", row.id)));
        }
        let id = builder.add_vertex(GeoPoint::new(row.lat, row.lon));
        ext_to_id.insert(row.id, id);
    }

    for row in csv::Reader::from_reader(edges).deserialize::<EdgeRecord>() {
        let row = row?;
        let lookup = |ext: i64| {
            ext_to_id
                .get(&ext)
                .copied()
                .ok_or_else(|| SpatialError::Parse(format!("edge references unknown vertex {ext}")))
        };
        let (from, to) = (lookup(row.from)?, lookup(row.to)?);
        let length_m = row
            .length_m
            .unwrap_or_else(|| builder.vertex_pos(from).distance_m(builder.vertex_pos(to)));
        let class = RoadClass::from_highway(&row.highway);

        if row.oneway.unwrap_or(false) {
            builder.add_directed_edge(from, to, length_m, class);
        } else {
            builder.add_road(from, to, length_m, class);
        }
    }

    Ok(builder.build())
}
