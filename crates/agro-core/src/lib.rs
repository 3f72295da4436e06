//! `agro-core`: foundational types for the `agro_twin` supply-chain engine.
//!
//! Every other `agro-*` crate depends on this one.  It has no `agro-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VertexId`, `RoadEdgeId`                              |
//! | [`geo`]         | `GeoPoint`, haversine distance, interpolation         |
//! | [`surface`]     | `SurfaceType` (paved / gravel / dirt)                 |
//! | [`rng`]         | `BuildRng` (single seeded generator)                  |
//! | [`error`]       | `AgroError`                                           |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod surface;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::AgroError;
pub use geo::{EARTH_RADIUS_M, GeoPoint};
pub use ids::{RoadEdgeId, VertexId};
pub use rng::BuildRng;
pub use surface::SurfaceType;
