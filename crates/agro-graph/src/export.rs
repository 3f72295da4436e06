//! CSV edge export for the presentation layer.
//!
//! Non-finite numbers are written as they are; sanitising them is the
//! consumer's job.

use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::GraphResult;
use crate::model::Edge;

const HEADER: [&str; 12] = [
    "origin",
    "destination",
    "kind",
    "distance_km",
    "time_min",
    "cost_per_t",
    "surface",
    "speed_kmh",
    "rain_accessibility",
    "real_route",
    "has_synthetic_segments",
    "segments",
];

/// Write `edges` to a CSV file at `path`, creating or truncating it.
pub fn write_edges_csv(path: &Path, edges: &[Edge]) -> GraphResult<()> {
    write_edges(Writer::from_path(path)?, edges)
}

/// Write `edges` as CSV to any `Write` sink.
pub fn write_edges_writer<W: Write>(sink: W, edges: &[Edge]) -> GraphResult<()> {
    write_edges(Writer::from_writer(sink), edges)
}

fn write_edges<W: Write>(mut out: Writer<W>, edges: &[Edge]) -> GraphResult<()> {
    out.write_record(HEADER)?;
    for e in edges {
        out.write_record(&[
            e.origin.clone(),
            e.destination.clone(),
            e.kind.as_str().to_string(),
            format!("{:.3}", e.distance_km),
            format!("{:.2}", e.time_min),
            format!("{:.4}", e.cost_per_t),
            e.surface.as_str().to_string(),
            format!("{:.1}", e.speed_kmh),
            format!("{:.3}", e.rain_accessibility),
            (e.real_route as u8).to_string(),
            (e.has_synthetic_segments() as u8).to_string(),
            e.route.segments().len().to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}
