//! Unit tests for agro-graph.
//!
//! Fixtures are hand-built node sets around Yuma, AZ.  Most tests run without
//! a road network; the `with_network` module lays a small road chain through
//! the same nodes, and `sparse_network` splits it in two just off the nodes.

#[cfg(test)]
mod helpers {
    use std::sync::Arc;

    use agro_core::GeoPoint;
    use agro_spatial::{RoadClass, RoadNetwork, RoadNetworkBuilder};

    use crate::{
        CenterAttrs, GraphBuilder, GraphConfig, Node, ParcelAttrs, PlantAttrs, SupplyChainEngine,
    };

    pub fn parcel(id: &str, lat: f64, lon: f64, area_ha: f64, production_t: f64) -> Node {
        Node::parcel(id, GeoPoint::new(lat, lon), ParcelAttrs {
            crop:                 "oranges".into(),
            area_ha,
            nominal_production_t: production_t,
            storage_capacity_t:   production_t * 0.3,
            cold_room:            false,
        })
    }

    pub fn center(id: &str, lat: f64, lon: f64) -> Node {
        Node::center(id, GeoPoint::new(lat, lon), CenterAttrs {
            capacity_t: 1_200.0,
            cold_chain: true,
            trucks:     4,
        })
    }

    pub fn plant(id: &str, lat: f64, lon: f64) -> Node {
        Node::plant(id, GeoPoint::new(lat, lon), PlantAttrs {
            throughput_t_per_day: 5_000.0,
            requires_cold_chain:  true,
        })
    }

    /// 3 parcels, 2 centers, 1 plant.  `P3` is the only parcel over 100 ha.
    pub fn scenario() -> Vec<Node> {
        vec![
            parcel("P1", 32.60, -114.70, 40.0, 120.0),
            parcel("P2", 32.75, -114.50, 80.0, 300.0),
            parcel("P3", 32.90, -114.30, 150.0, 450.0),
            center("C1", 32.65, -114.60),
            center("C2", 32.85, -114.40),
            plant("PLANT", 32.69, -114.63),
        ]
    }

    pub fn engine() -> SupplyChainEngine {
        GraphBuilder::new(GraphConfig::default(), scenario()).build().unwrap()
    }

    /// A primary road chaining every scenario node, vertices placed exactly
    /// on the nodes so every resolution is a clean network route.
    pub fn scenario_network() -> Arc<RoadNetwork> {
        let mut b = RoadNetworkBuilder::new();
        let order = ["P1", "C1", "PLANT", "P2", "C2", "P3"];
        let nodes = scenario();
        let ids: Vec<_> = order
            .iter()
            .map(|id| {
                let n = nodes.iter().find(|n| n.id == *id).unwrap();
                b.add_vertex(n.position)
            })
            .collect();
        for w in ids.windows(2) {
            let len = b.vertex_pos(w[0]).distance_m(b.vertex_pos(w[1]));
            b.add_road(w[0], w[1], len, RoadClass::Primary);
        }
        Arc::new(b.build())
    }
}

// ── Graph construction ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use agro_core::SurfaceType;

    use crate::{ConnectionKind, GraphBuilder, GraphConfig, GraphError, NodeRole};

    #[test]
    fn scenario_without_network() {
        let engine = super::helpers::engine();
        let graph = engine.graph();

        for parcel in graph.nodes_with_role(NodeRole::Parcel) {
            let to_centers = graph
                .outgoing(&parcel.id)
                .unwrap()
                .iter()
                .filter(|e| e.kind == ConnectionKind::ParcelToCenter)
                .count();
            assert!((2..=2).contains(&to_centers), "{} has {to_centers}", parcel.id);
        }
        for center in graph.nodes_with_role(NodeRole::CollectionCenter) {
            let out = graph.outgoing(&center.id).unwrap();
            assert_eq!(out.len(), 1);
            assert_eq!(out[0].destination, "PLANT");
            assert_eq!(out[0].kind, ConnectionKind::CenterToPlant);
        }
        for e in graph.edges() {
            assert!(!e.real_route);
            assert!(SurfaceType::ALL.contains(&e.surface));
        }
    }

    #[test]
    fn direct_edges_only_for_large_parcels() {
        let engine = super::helpers::engine();
        let direct: Vec<_> = engine
            .graph()
            .edges()
            .iter()
            .filter(|e| e.kind == ConnectionKind::ParcelToPlant)
            .collect();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].origin, "P3");
        assert_eq!(direct[0].surface, SurfaceType::Paved); // favorable fallback
    }

    #[test]
    fn edge_invariants() {
        let engine = super::helpers::engine();
        for e in engine.graph().edges() {
            assert!(e.distance_m >= 0.0);
            assert!(engine.graph().contains(&e.origin));
            assert!(engine.graph().contains(&e.destination));
            assert!(e.rain_accessibility > 0.0 && e.rain_accessibility <= 1.0);
            assert!((e.distance_km * 1_000.0 - e.distance_m).abs() < 1e-6);

            let seg_sum: f64 = e.route.segments().iter().map(|s| s.distance_m).sum();
            let tolerance = (e.distance_m / 10_000.0).max(1e-6);
            assert!((seg_sum - e.distance_m).abs() <= tolerance);

            let penalty = e.surface.cost_penalty();
            let base = if e.kind.is_trunk() { 0.12 } else { 0.15 };
            assert!((e.cost_per_t - e.distance_km * base * penalty).abs() < 1e-9);
            assert!((e.time_min - e.distance_km / e.speed_kmh * 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn parcels_connect_to_nearest_centers_first() {
        let mut config = GraphConfig::default();
        config.min_connections = 1;
        config.max_connections = 1;
        let engine = GraphBuilder::new(config, super::helpers::scenario()).build().unwrap();
        let out = engine.graph().outgoing("P1").unwrap();
        assert_eq!(out[0].destination, "C1");
        let out = engine.graph().outgoing("P3").unwrap();
        assert_eq!(out[0].destination, "C2");
    }

    #[test]
    fn deterministic_for_fixed_seed() {
        let a = super::helpers::engine();
        let b = super::helpers::engine();
        assert_eq!(a.graph().edges(), b.graph().edges());
    }

    #[test]
    fn fan_out_capped_by_center_count() {
        let mut nodes = super::helpers::scenario();
        nodes.retain(|n| n.id != "C2");
        let engine = GraphBuilder::new(GraphConfig::default(), nodes).build().unwrap();
        for id in ["P1", "P2"] {
            assert_eq!(engine.graph().outgoing(id).unwrap().len(), 1);
        }
    }

    #[test]
    fn no_centers_leaves_parcels_unconnected() {
        let mut nodes = super::helpers::scenario();
        nodes.retain(|n| n.role() != NodeRole::CollectionCenter);
        let engine = GraphBuilder::new(GraphConfig::default(), nodes).build().unwrap();
        assert!(engine.graph().outgoing("P1").unwrap().is_empty());
        // P3 still gets its direct edge.
        assert_eq!(engine.graph().edge_count(), 1);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut nodes = super::helpers::scenario();
        nodes.push(super::helpers::center("C1", 32.0, -114.0));
        let err = GraphBuilder::new(GraphConfig::default(), nodes).build().err().unwrap();
        assert!(matches!(err, GraphError::DuplicateNode(id) if id == "C1"));
    }

    #[test]
    fn exactly_one_plant_required() {
        let mut nodes = super::helpers::scenario();
        nodes.retain(|n| n.role() != NodeRole::ProcessingPlant);
        let err = GraphBuilder::new(GraphConfig::default(), nodes).build().err().unwrap();
        assert!(matches!(err, GraphError::PlantCount(0)));

        let mut nodes = super::helpers::scenario();
        nodes.push(super::helpers::plant("PLANT_2", 32.7, -114.6));
        let err = GraphBuilder::new(GraphConfig::default(), nodes).build().err().unwrap();
        assert!(matches!(err, GraphError::PlantCount(2)));
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = GraphConfig::default();
        config.min_connections = 4;
        let err = GraphBuilder::new(config, super::helpers::scenario()).build().err().unwrap();
        assert!(matches!(err, GraphError::Config(_)));
    }
}

// ── Construction over a road network ──────────────────────────────────────────

#[cfg(test)]
mod with_network {
    use agro_core::SurfaceType;
    use agro_spatial::RouteKind;

    use crate::{ConnectionKind, GraphBuilder, GraphConfig};

    #[test]
    fn every_edge_uses_the_network() {
        let network = super::helpers::scenario_network();
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .network(Some(network))
            .build()
            .unwrap();

        assert!(engine.network().is_some());
        assert_eq!(engine.graph().real_route_count(), engine.graph().edge_count());
        for e in engine.graph().edges() {
            assert_eq!(e.route.kind(), RouteKind::Real);
            assert_eq!(e.surface, SurfaceType::Paved);
            // Primary is arterial: 60–80 km/h on every tier.
            assert!((60.0..80.0).contains(&e.speed_kmh), "{}", e.speed_kmh);
            if e.kind.is_trunk() {
                assert!(e.rain_accessibility >= 0.9);
            }
        }
    }

    #[test]
    fn network_distance_follows_the_road() {
        let network = super::helpers::scenario_network();
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .network(Some(network))
            .build()
            .unwrap();

        // P1 → C1 is the first hop of the chain, so road and straight-line
        // distance agree; P1 → C2 detours through PLANT and P2.
        let out = engine.graph().outgoing("P1").unwrap();
        let c1 = out.iter().find(|e| e.destination == "C1").unwrap();
        let straight = engine.graph().node("P1").unwrap().position
            .distance_m(engine.graph().node("C1").unwrap().position);
        assert!((c1.distance_m - straight).abs() < 1e-6);

        if let Some(c2) = out.iter().find(|e| e.destination == "C2") {
            let straight = engine.graph().node("P1").unwrap().position
                .distance_m(engine.graph().node("C2").unwrap().position);
            assert!(c2.distance_m > straight);
            assert_eq!(c2.kind, ConnectionKind::ParcelToCenter);
        }
    }
}

// ── Construction over a sparse road network ───────────────────────────────────

#[cfg(test)]
mod sparse_network {
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use agro_core::{GeoPoint, VertexId};
    use agro_spatial::{
        DijkstraRouter, RoadClass, RoadNetwork, RoadNetworkBuilder, RoadPath, RouteKind, Router,
        SpatialError, SpatialResult,
    };

    use crate::{Edge, GraphBuilder, GraphConfig};

    /// Roughly 110 m north of `pos`: far enough to need an access splice.
    fn off_road(pos: GeoPoint) -> GeoPoint {
        GeoPoint::new(pos.lat + 0.001, pos.lon)
    }

    /// Two disconnected primary roads: P1–C1–PLANT–P2 and C2–P3.  Every
    /// vertex sits just off its node.
    fn split_network() -> Arc<RoadNetwork> {
        let nodes = super::helpers::scenario();
        let mut b = RoadNetworkBuilder::new();
        for chain in [&["P1", "C1", "PLANT", "P2"][..], &["C2", "P3"][..]] {
            let ids: Vec<_> = chain
                .iter()
                .map(|id| {
                    let n = nodes.iter().find(|n| n.id == *id).unwrap();
                    b.add_vertex(off_road(n.position))
                })
                .collect();
            for w in ids.windows(2) {
                let len = b.vertex_pos(w[0]).distance_m(b.vertex_pos(w[1]));
                b.add_road(w[0], w[1], len, RoadClass::Primary);
            }
        }
        Arc::new(b.build())
    }

    fn edge<'a>(edges: &'a [Edge], from: &str, to: &str) -> &'a Edge {
        edges
            .iter()
            .find(|e| e.origin == from && e.destination == to)
            .unwrap_or_else(|| panic!("no edge {from} -> {to}"))
    }

    fn assert_segments_sum_to_distance(e: &Edge) {
        let sum: f64 = e.route.segments().iter().map(|s| s.distance_m).sum();
        // 1 m per 10 km of route.
        let tolerance = 1e-6 + e.distance_km * 0.1;
        assert!(
            (sum - e.distance_m).abs() <= tolerance,
            "{} -> {}: segments {sum} vs edge {}",
            e.origin,
            e.destination,
            e.distance_m
        );
    }

    #[test]
    fn same_component_is_spliced_other_component_is_straight_line() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .network(Some(split_network()))
            .build()
            .unwrap();
        let edges = engine.graph().edges();

        for (from, to) in [("P1", "C1"), ("P3", "C2"), ("C1", "PLANT")] {
            let e = edge(edges, from, to);
            assert_eq!(e.route.kind(), RouteKind::Spliced, "{from} -> {to}");
            assert!(e.real_route);
            assert!(e.has_synthetic_segments());
            let segments = e.route.segments();
            assert_eq!(segments.len(), 3);
            assert!(segments[0].synthetic && !segments[1].synthetic && segments[2].synthetic);
            assert_eq!(segments[0].points.first(), engine.graph().node(from).ok().map(|n| &n.position));
            assert_eq!(segments[2].points.last(), engine.graph().node(to).ok().map(|n| &n.position));
        }

        for (from, to) in [("P1", "C2"), ("P3", "C1"), ("C2", "PLANT"), ("P3", "PLANT")] {
            let e = edge(edges, from, to);
            assert_eq!(e.route.kind(), RouteKind::Synthetic, "{from} -> {to}");
            assert!(!e.real_route);
            assert_eq!(e.route.surface(), e.surface);
            let straight = engine.graph().node(from).unwrap().position
                .distance_m(engine.graph().node(to).unwrap().position);
            assert!((e.distance_m - straight).abs() < 1e-6);
        }

        let spliced = edges.iter().filter(|e| e.route.kind() == RouteKind::Spliced).count();
        assert_eq!(engine.graph().real_route_count(), spliced);
        for e in edges {
            assert_segments_sum_to_distance(e);
        }
    }

    /// Fails the first request for each vertex pair, as a network backend
    /// with transient errors would.
    #[derive(Default)]
    struct FirstAttemptFails {
        seen:  Mutex<HashSet<(VertexId, VertexId)>>,
        calls: AtomicUsize,
    }

    impl Router for FirstAttemptFails {
        fn route(&self, network: &RoadNetwork, from: VertexId, to: VertexId) -> SpatialResult<RoadPath> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            if self.seen.lock().unwrap().insert((from, to)) {
                return Err(SpatialError::NoRoute { from, to });
            }
            DijkstraRouter.route(network, from, to)
        }
    }

    #[test]
    fn stitched_through_snaps_when_first_query_fails() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .network(Some(split_network()))
            .router(FirstAttemptFails::default())
            .build()
            .unwrap();
        let edges = engine.graph().edges();

        // Same component: the retry through the snapped vertices succeeds.
        for (from, to) in [("P1", "C1"), ("P3", "C2"), ("C1", "PLANT")] {
            let e = edge(edges, from, to);
            assert_eq!(e.route.kind(), RouteKind::Spliced, "{from} -> {to}");
            assert!(e.real_route);
        }
        // Across components the retry fails too.
        assert_eq!(edge(edges, "P1", "C2").route.kind(), RouteKind::Synthetic);

        // Every candidate pair was asked twice: once by the resolver, once
        // when stitching.
        let candidates = 3 * 2 + 2 + 1;
        assert_eq!(engine.resolver().router().calls.load(Ordering::Relaxed), 2 * candidates);

        for e in edges {
            assert_segments_sum_to_distance(e);
        }
    }
}

// ── Route queries ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod resolve {
    use agro_core::SurfaceType;
    use agro_spatial::RouteKind;

    use crate::{GraphBuilder, GraphConfig, GraphError};

    #[test]
    fn missing_nodes_are_not_found() {
        let engine = super::helpers::engine();
        let err = engine.resolve("DOES_NOT_EXIST", "ALSO_MISSING").unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(id) if id == "DOES_NOT_EXIST"));
        let err = engine.resolve("P1", "ALSO_MISSING").unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(id) if id == "ALSO_MISSING"));
    }

    #[test]
    fn synthetic_query_defaults() {
        let engine = super::helpers::engine();
        let r = engine.resolve("P1", "PLANT").unwrap();

        assert_eq!(r.kind, RouteKind::Synthetic);
        assert!(!r.real_route);
        assert!(r.has_synthetic_segments);
        assert_eq!(r.surface, SurfaceType::Dirt);
        assert!((r.speed_kmh - 45.0 * 0.75).abs() < 1e-9);
        assert!((r.time_min - r.distance_km / r.speed_kmh * 60.0).abs() < 1e-9);
        assert!((r.cost_per_t - r.distance_km * 0.15).abs() < 1e-9);
        assert_eq!(r.rain_accessibility, 0.5);
        assert_eq!(r.geometry.first(), Some(&engine.graph().node("P1").unwrap().position));
        assert_eq!(r.geometry.last(), Some(&engine.graph().node("PLANT").unwrap().position));
    }

    #[test]
    fn same_node_is_zero_length() {
        let engine = super::helpers::engine();
        let r = engine.resolve("C1", "C1").unwrap();
        assert!(r.distance_m.abs() < 1e-9);
        assert_eq!(r.time_min, 0.0);
    }

    #[test]
    fn network_query_is_paved_full_speed() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .network(Some(super::helpers::scenario_network()))
            .build()
            .unwrap();
        let r = engine.resolve("P1", "C1").unwrap();
        assert_eq!(r.kind, RouteKind::Real);
        assert_eq!(r.surface, SurfaceType::Paved);
        assert_eq!(r.speed_kmh, 60.0);
        assert_eq!(r.rain_accessibility, 0.9);
    }

    #[test]
    fn query_rain_accessibility_is_configurable() {
        let config = GraphConfig {
            query_paved_rain_accessibility: 0.95,
            query_unpaved_rain_accessibility: 0.35,
            ..GraphConfig::default()
        };
        let synthetic = GraphBuilder::new(config.clone(), super::helpers::scenario()).build().unwrap();
        assert_eq!(synthetic.resolve("P1", "PLANT").unwrap().rain_accessibility, 0.35);

        let paved = GraphBuilder::new(config, super::helpers::scenario())
            .network(Some(super::helpers::scenario_network()))
            .build()
            .unwrap();
        assert_eq!(paved.resolve("P1", "C1").unwrap().rain_accessibility, 0.95);

        for bad in [0.0, 1.5, f64::NAN] {
            let config = GraphConfig { query_unpaved_rain_accessibility: bad, ..GraphConfig::default() };
            let err = GraphBuilder::new(config, super::helpers::scenario()).build().err().unwrap();
            assert!(matches!(err, GraphError::Config(_)));
        }
    }
}

// ── Ranking ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ranking {
    use crate::{Criterion, GraphError, LinearYieldModel, GraphBuilder, GraphConfig};

    #[test]
    fn missing_node_is_not_found() {
        let engine = super::helpers::engine();
        let criterion = "cost".parse::<Criterion>().unwrap();
        let err = engine.rank_outgoing("DOES_NOT_EXIST", criterion, false).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(_)));
    }

    #[test]
    fn unknown_criterion() {
        let err = "speed".parse::<Criterion>().unwrap_err();
        assert!(matches!(err, GraphError::UnknownCriterion(c) if c == "speed"));
        assert_eq!(" Time ".parse::<Criterion>().unwrap(), Criterion::Time);
    }

    #[test]
    fn sorted_ascending_for_every_criterion() {
        let engine = super::helpers::engine();
        for criterion in [Criterion::Cost, Criterion::Time, Criterion::Distance, Criterion::Accessibility] {
            for rain in [false, true] {
                let ranked = engine.rank_outgoing("P3", criterion, rain).unwrap();
                assert_eq!(ranked.len(), engine.graph().outgoing("P3").unwrap().len());
                for w in ranked.windows(2) {
                    assert!(w[0].weight <= w[1].weight);
                }
            }
        }
    }

    #[test]
    fn least_accessible_ranks_last() {
        let engine = super::helpers::engine();
        let ranked = engine.rank_outgoing("P3", Criterion::Accessibility, false).unwrap();
        let worst = ranked
            .iter()
            .map(|r| r.rain_accessibility)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(ranked.last().unwrap().rain_accessibility, worst);
        for r in &ranked {
            assert!((r.weight - 1.0 / r.rain_accessibility).abs() < 1e-12);
        }
    }

    #[test]
    fn rain_adjust_divides_by_accessibility() {
        let engine = super::helpers::engine();
        let plain = engine.rank_outgoing("P2", Criterion::Time, false).unwrap();
        let wet = engine.rank_outgoing("P2", Criterion::Time, true).unwrap();
        for r in &wet {
            let dry = plain.iter().find(|p| p.destination == r.destination).unwrap();
            assert!((r.weight - dry.weight / r.rain_accessibility).abs() < 1e-9);
        }
    }

    #[test]
    fn cost_uses_nominal_without_predictor() {
        let engine = super::helpers::engine();
        for r in engine.rank_outgoing("P2", Criterion::Cost, false).unwrap() {
            assert_eq!(r.production_estimate_t, 300.0);
            assert!((r.weight - r.cost_per_t * 300.0).abs() < 1e-9);
            assert_eq!(r.total_cost, r.weight);
        }
    }

    #[test]
    fn cost_uses_prediction_when_available() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(LinearYieldModel::new(0.0).weight("area_ha", 2.0))
            .build()
            .unwrap();
        for r in engine.rank_outgoing("P2", Criterion::Cost, false).unwrap() {
            assert_eq!(r.production_estimate_t, 160.0);
        }
    }

    #[test]
    fn center_weights_are_per_tonne() {
        let engine = super::helpers::engine();
        let ranked = engine.rank_outgoing("C1", Criterion::Cost, false).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].weight, ranked[0].cost_per_t);
    }
}

// ── Yield prediction ──────────────────────────────────────────────────────────

#[cfg(test)]
mod predict {
    use std::collections::HashMap;

    use crate::{
        AgronomicReadings, FeatureMap, FeatureValue, GraphBuilder, GraphConfig, GraphError,
        LinearYieldModel, NominalYield, PredictError, YieldPredictor,
    };

    struct Broken;

    impl YieldPredictor for Broken {
        fn predict(&self, _: &FeatureMap) -> Result<f64, PredictError> {
            Err(PredictError::Model("offline".into()))
        }
    }

    #[test]
    fn no_predictor_means_no_prediction() {
        let engine = super::helpers::engine();
        assert_eq!(engine.predict_production("P1").unwrap(), None);
        assert_eq!(engine.production_estimate("P1").unwrap(), 120.0);
    }

    #[test]
    fn non_parcel_is_rejected() {
        let engine = super::helpers::engine();
        assert!(matches!(engine.predict_production("C1"), Err(GraphError::NotAParcel(_))));
        assert!(matches!(engine.predict_production("NOPE"), Err(GraphError::NodeNotFound(_))));
    }

    #[test]
    fn nominal_yield_echoes_record() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(NominalYield)
            .build()
            .unwrap();
        assert_eq!(engine.predict_production("P3").unwrap(), Some(450.0));
    }

    #[test]
    fn negative_predictions_clamp_to_zero() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(LinearYieldModel::new(-50.0))
            .build()
            .unwrap();
        assert_eq!(engine.predict_production("P1").unwrap(), Some(0.0));
    }

    #[test]
    fn predictor_failure_falls_back_to_nominal() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(Broken)
            .build()
            .unwrap();
        assert_eq!(engine.predict_production("P2").unwrap(), None);
        assert_eq!(engine.production_estimate("P2").unwrap(), 300.0);
    }

    #[test]
    fn features_summarise_outgoing_edges() {
        let engine = super::helpers::engine();
        let f = engine.parcel_features("P3").unwrap();
        let out = engine.graph().outgoing("P3").unwrap();

        assert_eq!(f.route_count, out.len());
        assert_eq!(f.route_count, 3); // two centers + direct
        let centers: Vec<f64> = out.iter().filter(|e| !e.kind.is_trunk()).map(|e| e.distance_km).collect();
        let expected = centers.iter().sum::<f64>() / centers.len() as f64;
        assert!((f.mean_center_distance_km - expected).abs() < 1e-9);
        assert!(f.readings.is_none());

        let map = f.to_feature_map();
        assert_eq!(map.get("crop"), Some(&FeatureValue::Category("oranges".into())));
        assert_eq!(map.get("route_count"), Some(&FeatureValue::Number(3.0)));
        assert!(!map.contains_key("vegetation_index"));
    }

    #[test]
    fn readings_reach_the_predictor() {
        let readings = HashMap::from([(
            "P1".to_string(),
            AgronomicReadings { vegetation_index: 0.8, soil_moisture_pct: 40.0, mean_temperature_c: 30.0 },
        )]);
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(LinearYieldModel::new(0.0).weight("vegetation_index", 100.0))
            .readings(readings)
            .build()
            .unwrap();
        let p1 = engine.predict_production("P1").unwrap().unwrap();
        assert!((p1 - 80.0).abs() < 1e-9);
        // P2 has no readings: the weighted feature is missing.
        assert_eq!(engine.predict_production("P2").unwrap(), None);
    }

    #[test]
    fn linear_model_categories() {
        let model = LinearYieldModel::new(1.0).category("crop", "oranges", 9.0);
        let mut f = FeatureMap::new();
        f.insert("crop".into(), FeatureValue::Category("lemons".into()));
        assert_eq!(model.predict(&f).unwrap(), 1.0);
        f.insert("crop".into(), FeatureValue::Category("oranges".into()));
        assert_eq!(model.predict(&f).unwrap(), 10.0);
    }

    #[test]
    fn linear_model_rejects_categorical_weight() {
        let model = LinearYieldModel::new(0.0).weight("crop", 1.0);
        let mut f = FeatureMap::new();
        f.insert("crop".into(), FeatureValue::Category("oranges".into()));
        assert!(matches!(model.predict(&f), Err(PredictError::NotNumeric(_))));
    }
}

// ── Production summaries ──────────────────────────────────────────────────────

#[cfg(test)]
mod production {
    use crate::{GraphBuilder, GraphConfig, LinearYieldModel};

    #[test]
    fn estimates_cover_every_parcel() {
        let engine = super::helpers::engine();
        let estimates = engine.production_estimates();
        let ids: Vec<_> = estimates.iter().map(|e| e.parcel_id.as_str()).collect();
        assert_eq!(ids, ["P1", "P2", "P3"]);
        for e in &estimates {
            assert!(!e.predicted);
            assert_eq!(e.estimate_t, e.nominal_t);
        }
    }

    #[test]
    fn prioritize_is_descending_and_truncated() {
        let engine = GraphBuilder::new(GraphConfig::default(), super::helpers::scenario())
            .predictor(LinearYieldModel::new(0.0).weight("nominal_production_t", 1.0))
            .build()
            .unwrap();
        let top = engine.prioritize_parcels(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].parcel_id, "P3");
        assert_eq!(top[1].parcel_id, "P2");
        assert!((top[0].yield_per_ha - 450.0 / 150.0).abs() < 1e-9);

        assert!(engine.production_estimates().iter().all(|e| e.predicted));
    }

    #[test]
    fn prioritize_without_predictor_is_empty() {
        let engine = super::helpers::engine();
        assert!(engine.prioritize_parcels(10).is_empty());
    }
}

// ── Attribute bands ───────────────────────────────────────────────────────────

#[cfg(test)]
mod attributes {
    use agro_core::{BuildRng, SurfaceType};
    use agro_spatial::RoadClass;

    use crate::attributes::{Tier, draw_attributes, rain_band, straight_line_profile};
    use crate::{ConnectionKind, TrunkSurfacePolicy};

    #[test]
    fn rain_bands_degrade_with_surface() {
        let mid = |s| {
            let (lo, hi) = rain_band(s);
            (lo + hi) / 2.0
        };
        assert!(mid(SurfaceType::Paved) > mid(SurfaceType::Gravel));
        assert!(mid(SurfaceType::Gravel) > mid(SurfaceType::Dirt));
    }

    #[test]
    fn straight_line_bands() {
        assert_eq!(straight_line_profile(4.9).1, (40.0, 60.0));
        assert_eq!(straight_line_profile(5.0).1, (35.0, 55.0));
        assert_eq!(straight_line_profile(15.0).1, (30.0, 50.0));
        // Short hops never draw dirt.
        assert!(straight_line_profile(1.0).0.iter().all(|(s, _)| *s != SurfaceType::Dirt));
    }

    #[test]
    fn draws_stay_in_band() {
        let mut rng = BuildRng::new(7);
        for _ in 0..200 {
            let a = draw_attributes(
                &mut rng,
                ConnectionKind::ParcelToCenter,
                Tier::StraightLine,
                20.0,
                TrunkSurfacePolicy::Favorable,
            );
            let (lo, hi) = rain_band(a.surface);
            assert!(a.rain_accessibility >= lo && a.rain_accessibility < hi);
            assert!((30.0..50.0).contains(&a.speed_kmh));
        }
    }

    #[test]
    fn network_speed_by_class() {
        let mut rng = BuildRng::new(7);
        let local = Tier::Network { class: Some(RoadClass::Residential), surface: SurfaceType::Paved };
        let a = draw_attributes(&mut rng, ConnectionKind::ParcelToCenter, local, 3.0, TrunkSurfacePolicy::Favorable);
        assert!((40.0..60.0).contains(&a.speed_kmh));

        let gravel = Tier::Network { class: Some(RoadClass::Service), surface: SurfaceType::Gravel };
        let a = draw_attributes(&mut rng, ConnectionKind::ParcelToCenter, gravel, 3.0, TrunkSurfacePolicy::Favorable);
        assert!((30.0..55.0).contains(&a.speed_kmh));
        assert_eq!(a.surface, SurfaceType::Gravel);
    }

    #[test]
    fn trunk_fallback_policies() {
        let mut rng = BuildRng::new(11);
        for _ in 0..50 {
            let a = draw_attributes(
                &mut rng,
                ConnectionKind::ParcelToPlant,
                Tier::StraightLine,
                40.0,
                TrunkSurfacePolicy::Favorable,
            );
            assert_eq!(a.surface, SurfaceType::Paved);
            assert!((55.0..70.0).contains(&a.speed_kmh));
            assert!(a.rain_accessibility >= 0.9);

            let b = draw_attributes(
                &mut rng,
                ConnectionKind::CenterToPlant,
                Tier::StraightLine,
                40.0,
                TrunkSurfacePolicy::Favorable,
            );
            assert_ne!(b.surface, SurfaceType::Dirt);
            assert!((50.0..70.0).contains(&b.speed_kmh));

            let c = draw_attributes(
                &mut rng,
                ConnectionKind::CenterToPlant,
                Tier::StraightLine,
                40.0,
                TrunkSurfacePolicy::DistanceBanded,
            );
            assert!((30.0..50.0).contains(&c.speed_kmh));
        }
    }

    #[test]
    fn trunk_rain_band_ignores_surface() {
        let mut rng = BuildRng::new(3);
        let mut gravel = 0;
        for _ in 0..500 {
            let a = draw_attributes(
                &mut rng,
                ConnectionKind::CenterToPlant,
                Tier::StraightLine,
                40.0,
                TrunkSurfacePolicy::Favorable,
            );
            if a.surface == SurfaceType::Gravel {
                gravel += 1;
            }
            assert!(a.rain_accessibility >= 0.9, "{:?} trunk edge drew {}", a.surface, a.rain_accessibility);
        }
        assert!(gravel > 0);

        for surface in [SurfaceType::Gravel, SurfaceType::Dirt] {
            let network = Tier::Network { class: Some(RoadClass::Track), surface };
            let stitched = Tier::Stitched { surface };
            for tier in [network, stitched] {
                for kind in [ConnectionKind::CenterToPlant, ConnectionKind::ParcelToPlant] {
                    let a = draw_attributes(&mut rng, kind, tier, 12.0, TrunkSurfacePolicy::Favorable);
                    assert_eq!(a.surface, surface);
                    assert!(a.rain_accessibility >= 0.9);
                }
            }
        }
    }
}

// ── CSV loading and export ────────────────────────────────────────────────────

#[cfg(test)]
mod csv_io {
    use crate::{
        GraphBuilder, GraphConfig, GraphError, NodeKind, NodeRole, load_nodes_csv, load_nodes_reader,
        load_readings_reader, write_edges_csv, write_edges_writer,
    };

    const NODES: &str = "\
id,role,lat,lon,crop,area_ha,production_t,storage_t,cold_room,capacity_t,cold_chain,trucks,throughput_t_day
P1,parcel,32.60,-114.70,oranges,120.5,340.0,,true,,,,
C1,collection_center,32.66,-114.55,,,,,,1500.0,true,4,
PLANT,processing_plant,32.69,-114.63,,,,,,,true,,5000
";

    #[test]
    fn loads_every_role() {
        let nodes = load_nodes_reader(NODES.as_bytes()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].role(), NodeRole::Parcel);
        let p = nodes[0].parcel_attrs().unwrap();
        assert_eq!(p.crop, "oranges");
        assert!(p.cold_room);
        assert!((p.storage_capacity_t - 102.0).abs() < 1e-9);
        match &nodes[1].kind {
            NodeKind::CollectionCenter(c) => assert_eq!(c.trucks, 4),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(nodes[2].role(), NodeRole::ProcessingPlant);
    }

    #[test]
    fn missing_required_column_is_parse_error() {
        let csv = "id,role,lat,lon,crop,area_ha,production_t,storage_t,cold_room,capacity_t,cold_chain,trucks,throughput_t_day\n\
                   C1,collection_center,32.66,-114.55,,,,,,,,,\n";
        let err = load_nodes_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GraphError::Parse(_)));
    }

    #[test]
    fn bad_role_is_parse_error() {
        let csv = "id,role,lat,lon,crop,area_ha,production_t,storage_t,cold_room,capacity_t,cold_chain,trucks,throughput_t_day\n\
                   X,warehouse,32.66,-114.55,,,,,,,,,\n";
        assert!(matches!(load_nodes_reader(csv.as_bytes()), Err(GraphError::Parse(_))));
    }

    #[test]
    fn readings_by_parcel() {
        let csv = "parcel_id,vegetation_index,soil_moisture_pct,mean_temperature_c\nP1,0.7,41.0,29.5\n";
        let readings = load_readings_reader(csv.as_bytes()).unwrap();
        assert_eq!(readings["P1"].soil_moisture_pct, 41.0);
    }

    #[test]
    fn export_writes_header_and_rows() {
        let engine = super::helpers::engine();
        let mut buf = Vec::new();
        write_edges_writer(&mut buf, engine.graph().edges()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("origin,destination,kind,distance_km"));
        assert_eq!(lines.count(), engine.graph().edge_count());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let nodes_path = dir.path().join("nodes.csv");
        std::fs::write(&nodes_path, NODES).unwrap();

        let nodes = load_nodes_csv(&nodes_path).unwrap();
        let engine = GraphBuilder::new(GraphConfig::default(), nodes).build().unwrap();

        let edges_path = dir.path().join("edges.csv");
        write_edges_csv(&edges_path, engine.graph().edges()).unwrap();
        let text = std::fs::read_to_string(&edges_path).unwrap();
        // P1→C1, C1→PLANT, P1→PLANT (120.5 ha is over the direct threshold).
        assert_eq!(text.lines().count(), 1 + 3);
        assert!(text.contains("parcel_plant_direct"));
    }
}
