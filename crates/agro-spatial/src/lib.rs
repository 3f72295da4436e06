//! `agro-spatial`: road network, nearest-vertex snapping, and route
//! resolution.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`network`]   | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`, `RoadClass` |
//! | [`locate`]    | `RoadSnap`, `locate_nearest`                               |
//! | [`synthetic`] | `RouteSegment`, `synthetic_segment`                        |
//! | [`router`]    | `Router` trait, `RoadPath`, `DijkstraRouter`              |
//! | [`resolver`]  | `RouteResolver`, `ResolvedRoute`, `ResolverConfig`        |
//! | [`provider`]  | `NetworkProvider`, `CsvNetwork`, `acquire_network`        |
//! | [`osm`]       | `load_from_pbf`, `PbfNetwork` (feature = `"osm"` only)    |
//! | [`error`]     | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `osm`   | Enables OSM PBF loading via the `osmpbf` crate.             |
//! | `serde` | Derives `Serialize`/`Deserialize` on core types.            |

pub mod error;
pub mod locate;
pub mod network;
pub mod provider;
pub mod resolver;
pub mod router;
pub mod synthetic;

#[cfg(feature = "osm")]
pub mod osm;


pub use error::{SpatialError, SpatialResult};
pub use locate::{RoadSnap, locate_nearest};
pub use network::{RoadClass, RoadNetwork, RoadNetworkBuilder};
pub use provider::{CsvNetwork, NetworkProvider, acquire_network};
pub use resolver::{NetworkRoute, ResolvedRoute, ResolverConfig, RouteKind, RouteResolver};
pub use router::{DijkstraRouter, RoadPath, Router};
pub use synthetic::{RouteSegment, synthetic_segment};
