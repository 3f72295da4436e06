//! Seeded node set for Yuma County, Arizona.
//!
//! 25 orange parcels and 5 collection centers scattered uniformly over the
//! county's farm belt, plus one processing plant within ~10 km of Yuma.

use std::collections::HashMap;

use agro_core::{BuildRng, GeoPoint};
use agro_graph::{AgronomicReadings, CenterAttrs, Node, ParcelAttrs, PlantAttrs};

pub const PARCEL_COUNT: usize = 25;
pub const CENTER_COUNT: usize = 5;

const MIN_LAT: f64 = 32.3;
const MAX_LAT: f64 = 33.0;
const MIN_LON: f64 = -115.0;
const MAX_LON: f64 = -114.2;
const CENTER: GeoPoint = GeoPoint { lat: 32.6927, lon: -114.6277 };

fn random_point(rng: &mut BuildRng) -> GeoPoint {
    GeoPoint::new(rng.gen_range(MIN_LAT..MAX_LAT), rng.gen_range(MIN_LON..MAX_LON))
}

/// Generate the node set.  Same seed, same nodes.
pub fn generate(seed: u64) -> Vec<Node> {
    let mut rng = BuildRng::new(seed);
    let mut nodes = Vec::with_capacity(PARCEL_COUNT + CENTER_COUNT + 1);

    for i in 1..=PARCEL_COUNT {
        let position = random_point(&mut rng);
        let production: f64 = rng.gen_range(50.0..500.0);
        nodes.push(Node::parcel(format!("PARCEL_{i:03}"), position, ParcelAttrs {
            crop:                 "oranges".into(),
            area_ha:              rng.gen_range(10.0..200.0),
            nominal_production_t: production,
            storage_capacity_t:   production * 0.3,
            cold_room:            rng.gen_bool(0.3),
        }));
    }

    for i in 1..=CENTER_COUNT {
        let position = random_point(&mut rng);
        nodes.push(Node::center(format!("CENTER_{i:02}"), position, CenterAttrs {
            capacity_t: rng.gen_range(500.0..2_000.0),
            cold_chain: rng.gen_bool(0.8),
            trucks:     rng.gen_range(2..8),
        }));
    }

    let plant = GeoPoint::new(
        CENTER.lat + rng.gen_range(-0.1..0.1),
        CENTER.lon + rng.gen_range(-0.1..0.1),
    );
    nodes.push(Node::plant("PLANT_01", plant, PlantAttrs {
        throughput_t_per_day: 5_000.0,
        requires_cold_chain:  true,
    }));

    nodes
}

/// Field readings for every parcel in `nodes`.
pub fn readings(seed: u64, nodes: &[Node]) -> HashMap<String, AgronomicReadings> {
    // Offset so readings don't replay the node stream.
    let mut rng = BuildRng::new(seed.wrapping_add(1));
    nodes
        .iter()
        .filter(|n| n.parcel_attrs().is_some())
        .map(|n| {
            let r = AgronomicReadings {
                vegetation_index:   rng.gen_range(0.3..0.9),
                soil_moisture_pct:  rng.gen_range(20.0..60.0),
                mean_temperature_c: rng.gen_range(25.0..35.0),
            };
            (n.id.clone(), r)
        })
        .collect()
}
