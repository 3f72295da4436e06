//! Shared error type.
//!
//! Sub-crates define their own error enums and may wrap `AgroError` as one
//! variant via `From`.

use thiserror::Error;

/// Errors raised by `agro-core` parsing helpers.
#[derive(Debug, Error)]
pub enum AgroError {
    #[error("unknown surface type {0:?}: expected \"paved\", \"gravel\", or \"dirt\"")]
    UnknownSurface(String),
}
