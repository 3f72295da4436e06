//! yuma: orange supply chain of Yuma County, Arizona.
//!
//! Generates a seeded set of parcels, collection centers, and one processing
//! plant, builds the supply graph (optionally over a real road network), and
//! prints route rankings and yield priorities.
//!
//! ```text
//! yuma [-c graph.json] [--network vertices.csv edges.csv | --pbf county.osm.pbf] [-o dir]
//! ```
//!
//! Logging is controlled by `RUST_LOG` (default `info`).

mod nodes;


use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agro_graph::{Criterion, GraphBuilder, GraphConfig, LinearYieldModel, NodeRole, write_edges_csv};
use agro_spatial::{CsvNetwork, RoadNetwork, acquire_network};

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "yuma", about = "Build and query the Yuma County orange supply graph")]
struct Args {
    /// JSON file overriding any `GraphConfig` field
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Road network as a vertices CSV and an edges CSV
    #[arg(long, num_args = 2, value_names = ["VERTICES", "EDGES"])]
    network: Option<Vec<PathBuf>>,

    /// OSM PBF extract (needs the `osm` feature)
    #[arg(long, conflicts_with = "network")]
    pbf: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "output/yuma")]
    out: PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<GraphConfig> {
    let Some(path) = path else {
        return Ok(GraphConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(feature = "osm")]
fn pbf_network(path: &Path) -> Option<std::sync::Arc<RoadNetwork>> {
    acquire_network(&agro_spatial::osm::PbfNetwork::new(path))
}

#[cfg(not(feature = "osm"))]
fn pbf_network(path: &Path) -> Option<std::sync::Arc<RoadNetwork>> {
    tracing::warn!(path = %path.display(), "built without the `osm` feature; ignoring --pbf");
    None
}

// ── Yield model ───────────────────────────────────────────────────────────────

/// Hand-tuned stand-in for a fitted regression.
fn yield_model() -> LinearYieldModel {
    LinearYieldModel::new(20.0)
        .weight("area_ha", 1.9)
        .weight("cold_room", 15.0)
        .weight("vegetation_index", 120.0)
        .weight("soil_moisture_pct", 0.8)
        .weight("mean_rain_accessibility", 30.0)
        .weight("mean_center_distance_km", -1.2)
        .category("crop", "oranges", 10.0)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    println!("=== yuma: agricultural supply chain ===");
    println!(
        "Parcels: {}  |  Centers: {}  |  Seed: {}",
        nodes::PARCEL_COUNT,
        nodes::CENTER_COUNT,
        config.seed
    );
    println!();

    // 1. Road network (optional).
    let network = match (args.network.as_deref(), &args.pbf) {
        (Some([vertices, edges]), _) => acquire_network(&CsvNetwork::new(vertices, edges)),
        (Some(other), _) => bail!("--network takes two files, got {}", other.len()),
        (None, Some(pbf)) => pbf_network(pbf),
        (None, None) => None,
    };
    match &network {
        Some(n) => println!("Road network: {} vertices, {} edges", n.vertex_count(), n.edge_count()),
        None => println!("Road network: none (all routes synthetic)"),
    }

    // 2. Nodes and agronomic readings.
    let node_set = nodes::generate(config.seed);
    let readings = nodes::readings(config.seed, &node_set);

    // 3. Build.
    let t0 = Instant::now();
    let engine = GraphBuilder::new(config, node_set)
        .network(network)
        .predictor(yield_model())
        .readings(readings)
        .build()?;
    let graph = engine.graph();
    println!(
        "Graph: {} nodes, {} edges ({} on real roads) in {:.3} s",
        graph.node_count(),
        graph.edge_count(),
        graph.real_route_count(),
        t0.elapsed().as_secs_f64()
    );
    println!();

    // 4. Rankings for the first parcel.
    let Some(first) = graph.nodes_with_role(NodeRole::Parcel).next() else {
        bail!("no parcels generated");
    };
    for (criterion, rain) in [(Criterion::Cost, false), (Criterion::Time, false), (Criterion::Cost, true)] {
        let ranked = engine.rank_outgoing(&first.id, criterion, rain)?;
        println!(
            "Routes from {} by {}{}:",
            first.id,
            criterion.as_str(),
            if rain { " (rain)" } else { "" }
        );
        println!(
            "  {:<12} {:>10} {:>8} {:>8} {:>10} {:>6} {:<7}",
            "Destination", "Weight", "km", "min", "Cost", "Rain", "Surface"
        );
        for r in &ranked {
            println!(
                "  {:<12} {:>10.2} {:>8.2} {:>8.1} {:>10.2} {:>6.2} {:<7}",
                r.destination, r.weight, r.distance_km, r.time_min, r.total_cost,
                r.rain_accessibility, r.surface
            );
        }
        println!();
    }

    // 5. Ad-hoc query to the plant.
    let route = engine.resolve(&first.id, "PLANT_01")?;
    println!(
        "{} → PLANT_01: {:.2} km, {:.1} min, {} route, {} waypoints",
        first.id,
        route.distance_km,
        route.time_min,
        route.kind.as_str(),
        route.geometry.len()
    );
    println!();

    // 6. Yield priorities.
    println!("{:<12} {:>10} {:>10} {:>8}", "Parcel", "Nominal t", "Expected t", "t/ha");
    println!("{}", "-".repeat(44));
    for p in engine.prioritize_parcels(10) {
        println!(
            "{:<12} {:>10.1} {:>10.1} {:>8.2}",
            p.parcel_id, p.nominal_t, p.expected_t, p.yield_per_ha
        );
    }
    println!();

    // 7. Output.
    let out = args.out;
    std::fs::create_dir_all(&out)?;
    write_edges_csv(&out.join("edges.csv"), graph.edges())?;

    let nodes_json: Vec<serde_json::Value> = graph
        .nodes()
        .iter()
        .map(|n| json!({ "id": n.id, "role": n.role().as_str(), "lat": n.position.lat, "lon": n.position.lon }))
        .collect();
    let estimates = serde_json::to_value(engine.production_estimates())?;
    let summary = json!({ "nodes": nodes_json, "production": estimates });
    std::fs::write(out.join("graph.json"), serde_json::to_string_pretty(&summary)?)?;

    info!(dir = %out.display(), "wrote edges.csv and graph.json");
    Ok(())
}
