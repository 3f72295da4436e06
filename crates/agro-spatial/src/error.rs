//! Spatial-subsystem error type.

use thiserror::Error;

use agro_core::VertexId;

/// Errors produced by `agro-spatial`.
///
/// None of these escape [`RouteResolver::resolve`](crate::RouteResolver::resolve):
/// the resolver maps every one of them to a synthetic route.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: VertexId, to: VertexId },

    #[error("vertex {0} not found in network")]
    VertexNotFound(VertexId),

    #[error("network parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "osm")]
    #[error("OSM parse error: {0}")]
    Osm(String),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
