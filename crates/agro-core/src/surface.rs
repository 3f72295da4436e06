//! Road-surface classification shared by the resolver and the graph builder.

use std::str::FromStr;

use crate::AgroError;

/// Physical surface of a road or route, ordered from best to worst.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SurfaceType {
    Paved,
    Gravel,
    /// Default for anything fabricated or unclassified.
    #[default]
    Dirt,
}

impl SurfaceType {
    pub const ALL: [SurfaceType; 3] = [SurfaceType::Paved, SurfaceType::Gravel, SurfaceType::Dirt];

    /// Human-readable label, useful for CSV column values.
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceType::Paved  => "paved",
            SurfaceType::Gravel => "gravel",
            SurfaceType::Dirt   => "dirt",
        }
    }

    /// Multiplier applied to the per-km fuel cost on this surface.
    #[inline]
    pub fn cost_penalty(self) -> f64 {
        match self {
            SurfaceType::Paved  => 1.0,
            SurfaceType::Gravel => 1.1,
            SurfaceType::Dirt   => 1.3,
        }
    }
}

impl std::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceType {
    type Err = AgroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paved"  => Ok(SurfaceType::Paved),
            "gravel" => Ok(SurfaceType::Gravel),
            "dirt"   => Ok(SurfaceType::Dirt),
            other    => Err(AgroError::UnknownSurface(other.to_string())),
        }
    }
}
