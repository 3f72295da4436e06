//! `agro-graph`: the multi-tier supply-chain graph and its query engine.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                       |
//! |----------------|----------------------------------------------------------------|
//! | [`model`]      | `Node`, `NodeKind`, `NodeRole`, `Edge`, `ConnectionKind`       |
//! | [`config`]     | `GraphConfig`, `TrunkSurfacePolicy`                            |
//! | [`attributes`] | speed / surface / rain-accessibility bands and draws           |
//! | [`builder`]    | `GraphBuilder` (parcel→center, center→plant, direct edges)     |
//! | [`graph`]      | `SupplyGraph` (nodes + CSR outgoing edges)                     |
//! | [`engine`]     | `SupplyChainEngine`: `resolve`, `rank_outgoing`, production    |
//! | [`predict`]    | `YieldPredictor` trait, features, `NominalYield`, `LinearYieldModel` |
//! | [`source`]     | CSV node and agronomic-reading loaders                         |
//! | [`export`]     | CSV edge writer                                                |
//! | [`error`]      | `GraphError`, `GraphResult<T>`                                 |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                      |
//! |------------|-------------------------------------------------------------|
//! | `parallel` | Resolve candidate routes on Rayon's pool.                  |
//! | `serde`    | Derives `Serialize`/`Deserialize` on config and model types.|

pub mod attributes;
pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod graph;
pub mod model;
pub mod predict;
pub mod source;

#[cfg(test)]
mod tests;

pub use builder::GraphBuilder;
pub use config::{GraphConfig, TrunkSurfacePolicy};
pub use engine::{Criterion, ParcelPriority, ProductionEstimate, RankedRoute, RouteDescriptor, SupplyChainEngine};
pub use error::{GraphError, GraphResult};
pub use export::{write_edges_csv, write_edges_writer};
pub use graph::SupplyGraph;
pub use model::{CenterAttrs, ConnectionKind, Edge, Node, NodeKind, NodeRole, ParcelAttrs, PlantAttrs};
pub use predict::{
    AgronomicReadings, FeatureMap, FeatureValue, LinearYieldModel, NominalYield, ParcelFeatures,
    PredictError, YieldPredictor,
};
pub use source::{load_nodes_csv, load_nodes_reader, load_readings_csv, load_readings_reader};
