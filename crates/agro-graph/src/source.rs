//! CSV node loader.
//!
//! # CSV format
//!
//! One row per node.  Columns not used by a row's role may be left empty.
//!
//! ```csv
//! id,role,lat,lon,crop,area_ha,production_t,storage_t,cold_room,capacity_t,cold_chain,trucks,throughput_t_day
//! PARCEL_001,parcel,32.61,-114.70,oranges,120.5,340.0,102.0,true,,,,
//! CENTER_01,collection_center,32.66,-114.55,,,,,,1500.0,true,4,
//! PLANT_01,processing_plant,32.69,-114.63,,,,,,,true,,5000
//! ```
//!
//! Required per role:
//!
//! | Role                | Required columns                       |
//! |---------------------|----------------------------------------|
//! | `parcel`            | `area_ha`, `production_t`              |
//! | `collection_center` | `capacity_t`                           |
//! | `processing_plant`  | `throughput_t_day`                     |
//!
//! Missing optional columns default to: crop `"unknown"`, storage 30 % of
//! production, booleans `false`, trucks 0.
//!
//! A second, optional file carries agronomic readings per parcel:
//!
//! ```csv
//! parcel_id,vegetation_index,soil_moisture_pct,mean_temperature_c
//! PARCEL_001,0.72,41.0,29.5
//! ```

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use agro_core::GeoPoint;

use crate::model::{CenterAttrs, Node, NodeRole, ParcelAttrs, PlantAttrs};
use crate::predict::AgronomicReadings;
use crate::{GraphError, GraphResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    id:               String,
    role:             String,
    lat:              f64,
    lon:              f64,
    crop:             Option<String>,
    area_ha:          Option<f64>,
    production_t:     Option<f64>,
    storage_t:        Option<f64>,
    cold_room:        Option<bool>,
    capacity_t:       Option<f64>,
    cold_chain:       Option<bool>,
    trucks:           Option<u32>,
    throughput_t_day: Option<f64>,
}

#[derive(Deserialize)]
struct ReadingRecord {
    parcel_id:          String,
    vegetation_index:   f64,
    soil_moisture_pct:  f64,
    mean_temperature_c: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load nodes from a CSV file, in file order.
pub fn load_nodes_csv(path: &Path) -> GraphResult<Vec<Node>> {
    let file = std::fs::File::open(path)?;
    load_nodes_reader(file)
}

/// Like [`load_nodes_csv`] but accepts any `Read` source.
pub fn load_nodes_reader<R: Read>(reader: R) -> GraphResult<Vec<Node>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut nodes = Vec::new();
    for result in csv_reader.deserialize::<NodeRecord>() {
        nodes.push(to_node(result?)?);
    }
    Ok(nodes)
}

/// Load agronomic readings keyed by parcel id.
pub fn load_readings_csv(path: &Path) -> GraphResult<HashMap<String, AgronomicReadings>> {
    let file = std::fs::File::open(path)?;
    load_readings_reader(file)
}

/// Like [`load_readings_csv`] but accepts any `Read` source.  A parcel listed
/// twice keeps its last row.
pub fn load_readings_reader<R: Read>(reader: R) -> GraphResult<HashMap<String, AgronomicReadings>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut out = HashMap::new();
    for result in csv_reader.deserialize::<ReadingRecord>() {
        let row = result?;
        out.insert(row.parcel_id, AgronomicReadings {
            vegetation_index:   row.vegetation_index,
            soil_moisture_pct:  row.soil_moisture_pct,
            mean_temperature_c: row.mean_temperature_c,
        });
    }
    Ok(out)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn to_node(r: NodeRecord) -> GraphResult<Node> {
    if !(r.lat.is_finite() && r.lon.is_finite()) {
        return Err(GraphError::Parse(format!("node {:?}: non-finite coordinate", r.id)));
    }
    let position = GeoPoint::new(r.lat, r.lon);

    let node = match r.role.parse::<NodeRole>()? {
        NodeRole::Parcel => {
            let area_ha = required(&r.id, "area_ha", r.area_ha)?;
            let production = required(&r.id, "production_t", r.production_t)?;
            Node::parcel(r.id, position, ParcelAttrs {
                crop:                 r.crop.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| "unknown".into()),
                area_ha,
                nominal_production_t: production,
                storage_capacity_t:   r.storage_t.unwrap_or(production * 0.3),
                cold_room:            r.cold_room.unwrap_or(false),
            })
        }
        NodeRole::CollectionCenter => {
            let capacity_t = required(&r.id, "capacity_t", r.capacity_t)?;
            Node::center(r.id, position, CenterAttrs {
                capacity_t,
                cold_chain: r.cold_chain.unwrap_or(false),
                trucks:     r.trucks.unwrap_or(0),
            })
        }
        NodeRole::ProcessingPlant => {
            let throughput = required(&r.id, "throughput_t_day", r.throughput_t_day)?;
            Node::plant(r.id, position, PlantAttrs {
                throughput_t_per_day: throughput,
                requires_cold_chain:  r.cold_chain.unwrap_or(false),
            })
        }
    };
    Ok(node)
}

fn required(id: &str, column: &str, value: Option<f64>) -> GraphResult<f64> {
    value.ok_or_else(|| GraphError::Parse(format!("node {id:?}: missing {column}")))
}
