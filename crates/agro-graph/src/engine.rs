//! Route queries, ranking, and production estimates over a built graph.
//!
//! # Usage
//!
//! ```rust,ignore
//! let engine = GraphBuilder::new(GraphConfig::default(), nodes)
//!     .network(acquire_network(&provider))
//!     .predictor(model)
//!     .build()?;
//!
//! let route = engine.resolve("PARCEL_001", "PLANT_01")?;
//! let ranked = engine.rank_outgoing("PARCEL_001", Criterion::Cost, true)?;
//! ```
//!
//! Every query takes `&self`; an engine can be shared across threads once
//! built.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use agro_core::{GeoPoint, SurfaceType};
use agro_spatial::{DijkstraRouter, ResolvedRoute, RoadNetwork, RouteKind, RouteResolver, Router};

use crate::config::GraphConfig;
use crate::graph::SupplyGraph;
use crate::model::{ConnectionKind, NodeRole, travel_minutes};
use crate::predict::{AgronomicReadings, ParcelFeatures, YieldPredictor};
use crate::{GraphError, GraphResult};

// ── Ranking criterion ─────────────────────────────────────────────────────────

/// What [`SupplyChainEngine::rank_outgoing`] minimises.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Criterion {
    /// Unit cost × production estimate of the origin.
    Cost,
    Time,
    Distance,
    /// Reciprocal of rain accessibility.
    Accessibility,
}

impl Criterion {
    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Cost          => "cost",
            Criterion::Time          => "time",
            Criterion::Distance      => "distance",
            Criterion::Accessibility => "accessibility",
        }
    }
}

impl FromStr for Criterion {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost"          => Ok(Criterion::Cost),
            "time"          => Ok(Criterion::Time),
            "distance"      => Ok(Criterion::Distance),
            "accessibility" => Ok(Criterion::Accessibility),
            other           => Err(GraphError::UnknownCriterion(other.to_string())),
        }
    }
}

// ── Query results ─────────────────────────────────────────────────────────────

/// Answer to an ad-hoc [`SupplyChainEngine::resolve`] query.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RouteDescriptor {
    pub origin: String,
    pub destination: String,
    pub kind: RouteKind,
    pub distance_m: f64,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub time_min: f64,
    pub cost_per_t: f64,
    pub surface: SurfaceType,
    pub rain_accessibility: f64,
    pub real_route: bool,
    pub has_synthetic_segments: bool,
    /// Joined geometry of every segment, without duplicate join points.
    pub geometry: Vec<GeoPoint>,
    pub route: ResolvedRoute,
}

/// One outgoing edge scored by [`SupplyChainEngine::rank_outgoing`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RankedRoute {
    pub destination: String,
    pub kind: ConnectionKind,
    /// Smaller is better.
    pub weight: f64,
    pub distance_km: f64,
    pub time_min: f64,
    pub cost_per_t: f64,
    /// `cost_per_t × production_estimate_t`.
    pub total_cost: f64,
    pub rain_accessibility: f64,
    pub surface: SurfaceType,
    pub production_estimate_t: f64,
}

/// Recorded vs estimated production of one parcel.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProductionEstimate {
    pub parcel_id: String,
    pub position: GeoPoint,
    pub nominal_t: f64,
    /// Prediction when available, otherwise `nominal_t`.
    pub estimate_t: f64,
    pub predicted: bool,
}

/// A parcel ranked by expected yield.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ParcelPriority {
    pub parcel_id: String,
    pub position: GeoPoint,
    pub area_ha: f64,
    pub nominal_t: f64,
    pub expected_t: f64,
    pub yield_per_ha: f64,
}

// ── Engine ────────────────────────────────────────────────────────────────────

/// An explicitly owned supply-chain model: the built graph, the resolver it
/// was built with, and the optional yield predictor.
///
/// Build one with [`GraphBuilder`](crate::GraphBuilder).
pub struct SupplyChainEngine<R: Router = DijkstraRouter> {
    graph:     SupplyGraph,
    resolver:  RouteResolver<R>,
    config:    GraphConfig,
    predictor: Option<Box<dyn YieldPredictor>>,
    readings:  HashMap<String, AgronomicReadings>,
}

impl<R: Router> SupplyChainEngine<R> {
    pub(crate) fn from_parts(
        graph:     SupplyGraph,
        resolver:  RouteResolver<R>,
        config:    GraphConfig,
        predictor: Option<Box<dyn YieldPredictor>>,
        readings:  HashMap<String, AgronomicReadings>,
    ) -> Self {
        Self { graph, resolver, config, predictor, readings }
    }

    pub fn graph(&self) -> &SupplyGraph {
        &self.graph
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn resolver(&self) -> &RouteResolver<R> {
        &self.resolver
    }

    /// The road network in use, if any.
    pub fn network(&self) -> Option<&RoadNetwork> {
        self.resolver.network()
    }

    // ── Route queries ─────────────────────────────────────────────────────

    /// Resolve a route between two nodes' coordinates.
    ///
    /// Speed and rain accessibility are the configured paved/unpaved
    /// defaults; speed is scaled down when the route contains synthetic
    /// segments.
    pub fn resolve(&self, from: &str, to: &str) -> GraphResult<RouteDescriptor> {
        let origin = self.graph.node(from)?;
        let destination = self.graph.node(to)?;
        let route = self.resolver.resolve(origin.position, destination.position);

        let surface = route.surface();
        let paved = surface == SurfaceType::Paved;
        let mut speed_kmh = if paved {
            self.config.query_paved_speed_kmh
        } else {
            self.config.query_unpaved_speed_kmh
        };
        if route.has_synthetic_segments() {
            speed_kmh *= self.config.synthetic_speed_factor;
        }

        let distance_km = route.distance_km();
        Ok(RouteDescriptor {
            origin: origin.id.clone(),
            destination: destination.id.clone(),
            kind: route.kind(),
            distance_m: route.distance_m(),
            distance_km,
            speed_kmh,
            time_min: travel_minutes(distance_km, speed_kmh),
            cost_per_t: distance_km * self.config.fuel_cost_per_km,
            surface,
            rain_accessibility: if paved {
                self.config.query_paved_rain_accessibility
            } else {
                self.config.query_unpaved_rain_accessibility
            },
            real_route: route.is_real_route(),
            has_synthetic_segments: route.has_synthetic_segments(),
            geometry: route.geometry(),
            route,
        })
    }

    /// Score and sort every outgoing edge of `id`, ascending by weight.
    ///
    /// With `rain_adjust` every weight is further divided by the edge's rain
    /// accessibility, whatever the criterion.  Ties keep edge order.
    pub fn rank_outgoing(
        &self,
        id: &str,
        criterion: Criterion,
        rain_adjust: bool,
    ) -> GraphResult<Vec<RankedRoute>> {
        let edges = self.graph.outgoing(id)?;
        let production = match self.graph.node(id)?.role() {
            NodeRole::Parcel => self.production_estimate(id)?,
            // Centers and the plant carry no production; weigh per tonne.
            _ => 1.0,
        };

        let mut ranked: Vec<RankedRoute> = edges
            .iter()
            .map(|e| {
                let accessibility = e.rain_accessibility.max(f64::MIN_POSITIVE);
                let mut weight = match criterion {
                    Criterion::Cost          => e.cost_per_t * production,
                    Criterion::Time          => e.time_min,
                    Criterion::Distance      => e.distance_km,
                    Criterion::Accessibility => 1.0 / accessibility,
                };
                if rain_adjust {
                    weight /= accessibility;
                }
                RankedRoute {
                    destination: e.destination.clone(),
                    kind: e.kind,
                    weight,
                    distance_km: e.distance_km,
                    time_min: e.time_min,
                    cost_per_t: e.cost_per_t,
                    total_cost: e.cost_per_t * production,
                    rain_accessibility: e.rain_accessibility,
                    surface: e.surface,
                    production_estimate_t: production,
                }
            })
            .collect();

        ranked.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        Ok(ranked)
    }

    // ── Production ────────────────────────────────────────────────────────

    /// Predictor inputs for parcel `id`.
    pub fn parcel_features(&self, id: &str) -> GraphResult<ParcelFeatures> {
        let node = self.graph.node(id)?;
        let attrs = node
            .parcel_attrs()
            .ok_or_else(|| GraphError::NotAParcel(id.to_string()))?;
        let edges = self.graph.outgoing(id)?;

        let center_km: Vec<f64> = edges
            .iter()
            .filter(|e| e.kind == ConnectionKind::ParcelToCenter)
            .map(|e| e.distance_km)
            .collect();

        Ok(ParcelFeatures {
            crop: attrs.crop.clone(),
            area_ha: attrs.area_ha,
            cold_room: attrs.cold_room,
            nominal_production_t: attrs.nominal_production_t,
            route_count: edges.len(),
            mean_center_distance_km: mean(center_km.iter().copied()),
            mean_rain_accessibility: mean(edges.iter().map(|e| e.rain_accessibility)),
            mean_cost_per_t: mean(edges.iter().map(|e| e.cost_per_t)),
            readings: self.readings.get(id).copied(),
        })
    }

    /// Predicted production of parcel `id`, tonnes, clamped to be
    /// non-negative.
    ///
    /// `Ok(None)` when no predictor is installed or it fails; the failure is
    /// logged, never propagated.
    pub fn predict_production(&self, id: &str) -> GraphResult<Option<f64>> {
        let features = self.parcel_features(id)?;
        let Some(predictor) = self.predictor.as_deref() else {
            return Ok(None);
        };

        match predictor.predict(&features.to_feature_map()) {
            Ok(value) if value.is_finite() => Ok(Some(value.max(0.0))),
            Ok(value) => {
                warn!(parcel = id, value, "non-finite yield prediction; using nominal production");
                Ok(None)
            }
            Err(err) => {
                warn!(parcel = id, %err, "yield predictor failed; using nominal production");
                Ok(None)
            }
        }
    }

    /// Prediction for parcel `id`, or its nominal production.
    pub fn production_estimate(&self, id: &str) -> GraphResult<f64> {
        match self.predict_production(id)? {
            Some(value) => Ok(value),
            None => self.nominal_production(id),
        }
    }

    /// Recorded vs estimated production of every parcel, in input order.
    pub fn production_estimates(&self) -> Vec<ProductionEstimate> {
        self.graph
            .nodes_with_role(NodeRole::Parcel)
            .filter_map(|node| {
                let attrs = node.parcel_attrs()?;
                let predicted = self.predict_production(&node.id).ok().flatten();
                Some(ProductionEstimate {
                    parcel_id: node.id.clone(),
                    position: node.position,
                    nominal_t: attrs.nominal_production_t,
                    estimate_t: predicted.unwrap_or(attrs.nominal_production_t),
                    predicted: predicted.is_some(),
                })
            })
            .collect()
    }

    /// The `top_n` parcels by predicted yield, highest first.
    ///
    /// Parcels without a prediction are left out, so the list is empty when
    /// no predictor is installed.
    pub fn prioritize_parcels(&self, top_n: usize) -> Vec<ParcelPriority> {
        let mut out: Vec<ParcelPriority> = self
            .graph
            .nodes_with_role(NodeRole::Parcel)
            .filter_map(|node| {
                let attrs = node.parcel_attrs()?;
                let expected_t = self.predict_production(&node.id).ok().flatten()?;
                let yield_per_ha = if attrs.area_ha > 0.0 { expected_t / attrs.area_ha } else { 0.0 };
                Some(ParcelPriority {
                    parcel_id: node.id.clone(),
                    position: node.position,
                    area_ha: attrs.area_ha,
                    nominal_t: attrs.nominal_production_t,
                    expected_t,
                    yield_per_ha,
                })
            })
            .collect();

        out.sort_by(|a, b| b.expected_t.total_cmp(&a.expected_t));
        out.truncate(top_n);
        out
    }

    fn nominal_production(&self, id: &str) -> GraphResult<f64> {
        self.graph
            .node(id)?
            .parcel_attrs()
            .map(|p| p.nominal_production_t)
            .ok_or_else(|| GraphError::NotAParcel(id.to_string()))
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}
