//! Yield-prediction seam.
//!
//! The engine never trains or embeds a model.  It derives a [`FeatureMap`]
//! for a parcel from the graph plus any externally supplied agronomic
//! readings, and hands it to a [`YieldPredictor`].  Tests plug in
//! deterministic models; production code plugs in whatever regression
//! service it has.
//!
//! # Feature names
//!
//! | Name                      | Kind        | Source                                  |
//! |---------------------------|-------------|-----------------------------------------|
//! | `crop`                    | categorical | parcel record                           |
//! | `area_ha`                 | numeric     | parcel record                           |
//! | `cold_room`               | numeric 0/1 | parcel record                           |
//! | `nominal_production_t`    | numeric     | parcel record                           |
//! | `route_count`             | numeric     | outgoing edges                          |
//! | `mean_center_distance_km` | numeric     | parcel→center edges                     |
//! | `mean_rain_accessibility` | numeric     | outgoing edges                          |
//! | `mean_cost_per_t`         | numeric     | outgoing edges                          |
//! | `vegetation_index`        | numeric     | agronomic readings (optional)           |
//! | `soil_moisture_pct`       | numeric     | agronomic readings (optional)           |
//! | `mean_temperature_c`      | numeric     | agronomic readings (optional)           |

use std::collections::BTreeMap;

use thiserror::Error;

// ── Features ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Category(_) => None,
        }
    }
}

/// Named features.  Ordered so iteration is reproducible.
pub type FeatureMap = BTreeMap<String, FeatureValue>;

/// Field measurements the engine does not compute itself.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgronomicReadings {
    pub vegetation_index: f64,
    pub soil_moisture_pct: f64,
    pub mean_temperature_c: f64,
}

/// Predictor inputs for one parcel.
#[derive(Clone, Debug, PartialEq)]
pub struct ParcelFeatures {
    pub crop: String,
    pub area_ha: f64,
    pub cold_room: bool,
    pub nominal_production_t: f64,
    pub route_count: usize,
    /// Zero when the parcel has no parcel→center edge.
    pub mean_center_distance_km: f64,
    /// Zero when the parcel has no outgoing edge.
    pub mean_rain_accessibility: f64,
    pub mean_cost_per_t: f64,
    pub readings: Option<AgronomicReadings>,
}

impl ParcelFeatures {
    pub fn to_feature_map(&self) -> FeatureMap {
        let mut map = FeatureMap::new();
        let mut num = |name: &str, v: f64| {
            map.insert(name.to_string(), FeatureValue::Number(v));
        };
        num("area_ha", self.area_ha);
        num("cold_room", if self.cold_room { 1.0 } else { 0.0 });
        num("nominal_production_t", self.nominal_production_t);
        num("route_count", self.route_count as f64);
        num("mean_center_distance_km", self.mean_center_distance_km);
        num("mean_rain_accessibility", self.mean_rain_accessibility);
        num("mean_cost_per_t", self.mean_cost_per_t);
        if let Some(r) = self.readings {
            num("vegetation_index", r.vegetation_index);
            num("soil_moisture_pct", r.soil_moisture_pct);
            num("mean_temperature_c", r.mean_temperature_c);
        }
        map.insert("crop".to_string(), FeatureValue::Category(self.crop.clone()));
        map
    }
}

// ── Predictor trait ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("missing feature {0:?}")]
    MissingFeature(String),

    #[error("feature {0:?} is not numeric")]
    NotNumeric(String),

    #[error("prediction model failed: {0}")]
    Model(String),
}

/// Production estimate for one parcel, tonnes.
///
/// Must be synchronous and side-effect free.  Callers clamp the result to
/// be non-negative and treat errors as "no estimate".
pub trait YieldPredictor: Send + Sync {
    fn predict(&self, features: &FeatureMap) -> Result<f64, PredictError>;
}

// ── Implementations ───────────────────────────────────────────────────────────

/// Echoes the parcel's recorded production.
pub struct NominalYield;

impl YieldPredictor for NominalYield {
    fn predict(&self, features: &FeatureMap) -> Result<f64, PredictError> {
        numeric(features, "nominal_production_t")
    }
}

/// `intercept + Σ weight · feature`, with one-hot weights for categories.
///
/// ```
/// use agro_graph::predict::{FeatureMap, FeatureValue, LinearYieldModel, YieldPredictor};
///
/// let model = LinearYieldModel::new(10.0)
///     .weight("area_ha", 2.0)
///     .category("crop", "oranges", 5.0);
///
/// let mut f = FeatureMap::new();
/// f.insert("area_ha".into(), FeatureValue::Number(3.0));
/// f.insert("crop".into(), FeatureValue::Category("oranges".into()));
/// assert_eq!(model.predict(&f).unwrap(), 21.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearYieldModel {
    pub intercept: f64,
    /// Numeric feature weights.  A weighted feature missing from the input
    /// is an error.
    pub weights: BTreeMap<String, f64>,
    /// `(feature, value) → weight`; contributes only when the category
    /// matches.
    pub categories: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LinearYieldModel {
    pub fn new(intercept: f64) -> Self {
        Self { intercept, ..Self::default() }
    }

    pub fn weight(mut self, feature: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(feature.into(), weight);
        self
    }

    pub fn category(mut self, feature: impl Into<String>, value: impl Into<String>, weight: f64) -> Self {
        self.categories
            .entry(feature.into())
            .or_default()
            .insert(value.into(), weight);
        self
    }
}

impl YieldPredictor for LinearYieldModel {
    fn predict(&self, features: &FeatureMap) -> Result<f64, PredictError> {
        let mut total = self.intercept;
        for (name, w) in &self.weights {
            total += w * numeric(features, name)?;
        }
        for (name, table) in &self.categories {
            if let Some(FeatureValue::Category(value)) = features.get(name) {
                total += table.get(value).copied().unwrap_or(0.0);
            }
        }
        Ok(total)
    }
}

fn numeric(features: &FeatureMap, name: &str) -> Result<f64, PredictError> {
    features
        .get(name)
        .ok_or_else(|| PredictError::MissingFeature(name.to_string()))?
        .as_number()
        .ok_or_else(|| PredictError::NotNumeric(name.to_string()))
}
