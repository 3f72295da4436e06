//! Fluent builder for constructing a [`SupplyChainEngine`].
//!
//! # Construction order
//!
//! 1. Validate config and nodes (unique ids, exactly one plant).
//! 2. Snap every node onto the road network once (skipped without one).
//! 3. Resolve every parcel→center and center→plant candidate route.  This is
//!    the expensive step and runs on Rayon with the `parallel` feature.
//! 4. Draw attributes on the builder's thread: parcels in input order, then
//!    centers, then the direct-edge sample.
//!
//! Step 4 is the only consumer of randomness, so a fixed seed gives the same
//! edges with or without `parallel`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use agro_core::BuildRng;
use agro_spatial::{DijkstraRouter, ResolvedRoute, RoadNetwork, RoadSnap, RouteResolver, Router};

use crate::attributes::{Tier, draw_attributes};
use crate::config::GraphConfig;
use crate::engine::SupplyChainEngine;
use crate::graph::{SupplyGraph, index_nodes};
use crate::model::{ConnectionKind, Edge, Node, NodeKind, NodeRole, travel_minutes};
use crate::predict::{AgronomicReadings, YieldPredictor};
use crate::{GraphError, GraphResult};

/// Fluent builder for [`SupplyChainEngine<R>`].
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                        |
/// |--------------------|--------------------------------|
/// | `.network(n)`      | none: every route synthetic    |
/// | `.router(r)`       | [`DijkstraRouter`]             |
/// | `.predictor(p)`    | none: nominal production       |
/// | `.readings(m)`     | none                           |
///
/// # Example
///
/// ```rust,ignore
/// let engine = GraphBuilder::new(GraphConfig::default(), nodes)
///     .network(acquire_network(&CsvNetwork::new("v.csv", "e.csv")))
///     .predictor(LinearYieldModel::new(50.0).weight("area_ha", 1.8))
///     .build()?;
/// ```
pub struct GraphBuilder<R: Router = DijkstraRouter> {
    config:    GraphConfig,
    nodes:     Vec<Node>,
    network:   Option<Arc<RoadNetwork>>,
    router:    R,
    predictor: Option<Box<dyn YieldPredictor>>,
    readings:  HashMap<String, AgronomicReadings>,
}

impl GraphBuilder<DijkstraRouter> {
    pub fn new(config: GraphConfig, nodes: Vec<Node>) -> Self {
        Self {
            config,
            nodes,
            network:   None,
            router:    DijkstraRouter,
            predictor: None,
            readings:  HashMap::new(),
        }
    }
}

impl<R: Router> GraphBuilder<R> {
    /// Supply the road network.  `None` keeps the engine fully synthetic.
    pub fn network(mut self, network: Option<Arc<RoadNetwork>>) -> Self {
        self.network = network;
        self
    }

    /// Replace the routing algorithm.
    pub fn router<R2: Router>(self, router: R2) -> GraphBuilder<R2> {
        GraphBuilder {
            config:    self.config,
            nodes:     self.nodes,
            network:   self.network,
            router,
            predictor: self.predictor,
            readings:  self.readings,
        }
    }

    pub fn predictor(mut self, predictor: impl YieldPredictor + 'static) -> Self {
        self.predictor = Some(Box::new(predictor));
        self
    }

    /// Agronomic readings keyed by parcel id, passed through to the predictor.
    pub fn readings(mut self, readings: HashMap<String, AgronomicReadings>) -> Self {
        self.readings = readings;
        self
    }

    /// Validate inputs, build every edge, and return a ready-to-query engine.
    pub fn build(self) -> GraphResult<SupplyChainEngine<R>> {
        self.config.validate()?;
        index_nodes(&self.nodes)?;

        let nodes = self.nodes;
        let plants = indices_with_role(&nodes, NodeRole::ProcessingPlant);
        let &[plant] = plants.as_slice() else {
            return Err(GraphError::PlantCount(plants.len()));
        };
        let parcels = indices_with_role(&nodes, NodeRole::Parcel);
        let centers = indices_with_role(&nodes, NodeRole::CollectionCenter);

        let resolver = RouteResolver::with_router(self.network, self.router, self.config.resolver.clone());
        let snaps: Vec<Option<RoadSnap>> = nodes.iter().map(|n| resolver.locate(n.position)).collect();
        let ctx = Context { resolver: &resolver, nodes: &nodes, snaps: &snaps };

        // ── Resolve candidate routes ──────────────────────────────────────
        let parcel_pairs: Vec<(usize, usize)> = parcels
            .iter()
            .flat_map(|&p| centers.iter().map(move |&c| (p, c)))
            .collect();
        let mut parcel_routes = ctx.resolve_all(&parcel_pairs).into_iter();

        let center_pairs: Vec<(usize, usize)> = centers.iter().map(|&c| (c, plant)).collect();
        let center_routes = ctx.resolve_all(&center_pairs);

        // ── Draw attributes ───────────────────────────────────────────────
        let mut rng = BuildRng::new(self.config.seed);
        let mut edges = Vec::new();

        for &p in &parcels {
            let mut candidates: Vec<(usize, Resolution)> = centers
                .iter()
                .copied()
                .zip(parcel_routes.by_ref().take(centers.len()))
                .collect();
            if candidates.is_empty() {
                warn!(parcel = %nodes[p].id, "no collection centers; parcel left unconnected");
                continue;
            }
            candidates.sort_by(|a, b| a.1.distance_m().total_cmp(&b.1.distance_m()));

            let hi = self.config.max_connections.min(candidates.len());
            let lo = self.config.min_connections.min(hi);
            let count = rng.gen_range(lo..=hi);

            for (c, resolution) in candidates.into_iter().take(count) {
                edges.push(ctx.edge(&mut rng, &self.config, ConnectionKind::ParcelToCenter, p, c, resolution));
            }
        }

        for (&c, resolution) in centers.iter().zip(center_routes) {
            edges.push(ctx.edge(&mut rng, &self.config, ConnectionKind::CenterToPlant, c, plant, resolution));
        }

        let large: Vec<usize> = parcels
            .iter()
            .copied()
            .filter(|&p| match &nodes[p].kind {
                NodeKind::Parcel(attrs) => attrs.area_ha > self.config.large_parcel_area_ha,
                _ => false,
            })
            .collect();
        let direct_pairs: Vec<(usize, usize)> = rng
            .sample_indices(large.len(), self.config.direct_parcel_sample)
            .into_iter()
            .map(|i| (large[i], plant))
            .collect();
        let direct_routes = ctx.resolve_all(&direct_pairs);
        for (&(p, _), resolution) in direct_pairs.iter().zip(direct_routes) {
            edges.push(ctx.edge(&mut rng, &self.config, ConnectionKind::ParcelToPlant, p, plant, resolution));
        }

        let graph = SupplyGraph::new(nodes, edges)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            real_routes = graph.real_route_count(),
            network = resolver.network().is_some(),
            "supply graph built"
        );

        Ok(SupplyChainEngine::from_parts(graph, resolver, self.config, self.predictor, self.readings))
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Outcome of resolving one candidate connection.
enum Resolution {
    /// The resolver reached the road network.
    Network(ResolvedRoute),
    /// Routed through both endpoints' precomputed snaps.
    Stitched(ResolvedRoute),
    /// No road route; great-circle distance only.
    StraightLine { distance_m: f64 },
}

impl Resolution {
    fn distance_m(&self) -> f64 {
        match self {
            Resolution::Network(r) | Resolution::Stitched(r) => r.distance_m(),
            Resolution::StraightLine { distance_m } => *distance_m,
        }
    }
}

/// Borrowed state shared by every resolution and edge derivation.
struct Context<'a, R: Router> {
    resolver: &'a RouteResolver<R>,
    nodes:    &'a [Node],
    snaps:    &'a [Option<RoadSnap>],
}

impl<R: Router> Context<'_, R> {
    fn resolve(&self, from: usize, to: usize) -> Resolution {
        let (origin, destination) = (self.nodes[from].position, self.nodes[to].position);
        let route = self.resolver.resolve(origin, destination);
        if route.is_real_route() {
            return Resolution::Network(route);
        }

        if let (Some(a), Some(b)) = (self.snaps[from], self.snaps[to]) {
            if let Some(route) = self.resolver.stitch(origin, a, destination, b) {
                debug!(from = %self.nodes[from].id, to = %self.nodes[to].id, "stitched through snapped vertices");
                return Resolution::Stitched(route);
            }
        }

        debug!(from = %self.nodes[from].id, to = %self.nodes[to].id, "straight-line estimate");
        Resolution::StraightLine { distance_m: origin.distance_m(destination) }
    }

    /// Resolve every `(from, to)` pair, preserving order.
    fn resolve_all(&self, pairs: &[(usize, usize)]) -> Vec<Resolution> {
        #[cfg(not(feature = "parallel"))]
        {
            pairs.iter().map(|&(from, to)| self.resolve(from, to)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            pairs.par_iter().map(|&(from, to)| self.resolve(from, to)).collect()
        }
    }

    /// Draw attributes and assemble the edge `from → to`.
    fn edge(
        &self,
        rng: &mut BuildRng,
        config: &GraphConfig,
        kind: ConnectionKind,
        from: usize,
        to: usize,
        resolution: Resolution,
    ) -> Edge {
        let (origin, destination) = (&self.nodes[from], &self.nodes[to]);
        let distance_km = resolution.distance_m() / 1_000.0;

        let tier = match &resolution {
            Resolution::Network(r) => Tier::Network { class: r.road_class(), surface: r.surface() },
            Resolution::Stitched(r) => Tier::Stitched { surface: r.surface() },
            Resolution::StraightLine { .. } => Tier::StraightLine,
        };
        let drawn = draw_attributes(rng, kind, tier, distance_km, config.trunk_surface_policy);

        let route = match resolution {
            Resolution::Network(r) | Resolution::Stitched(r) => r,
            Resolution::StraightLine { .. } => {
                self.resolver.synthetic_with_surface(origin.position, destination.position, drawn.surface)
            }
        };

        let base_cost = if kind.is_trunk() { config.trunk_cost_per_km } else { config.fuel_cost_per_km };
        Edge {
            origin:             origin.id.clone(),
            destination:        destination.id.clone(),
            kind,
            distance_m:         route.distance_m(),
            distance_km:        route.distance_km(),
            speed_kmh:          drawn.speed_kmh,
            time_min:           travel_minutes(route.distance_km(), drawn.speed_kmh),
            cost_per_t:         route.distance_km() * base_cost * drawn.surface.cost_penalty(),
            surface:            drawn.surface,
            rain_accessibility: drawn.rain_accessibility,
            real_route:         route.is_real_route(),
            route,
        }
    }
}

fn indices_with_role(nodes: &[Node], role: NodeRole) -> Vec<usize> {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.role() == role)
        .map(|(i, _)| i)
        .collect()
}
