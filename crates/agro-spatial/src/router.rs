//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! [`RouteResolver`](crate::RouteResolver) calls routing via the [`Router`]
//! trait, so applications can swap in A*, contraction hierarchies, or a
//! remote routing service without touching resolution logic.
//!
//! # Cost units
//!
//! Paths minimise **physical length**.  Dijkstra keys are integer
//! millimetres so the heap has a total order and tie-breaking is
//! deterministic; the reported `length_m` is the exact `f64` sum of edge
//! lengths.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use agro_core::{RoadEdgeId, VertexId};

use crate::network::RoadNetwork;
use crate::{SpatialError, SpatialResult};

// ── RoadPath ──────────────────────────────────────────────────────────────────

/// The result of a routing query: the start vertex, the edges to traverse in
/// order, and their total length.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadPath {
    pub origin: VertexId,
    pub edges: Vec<RoadEdgeId>,
    pub length_m: f64,
}

impl RoadPath {
    /// Vertex sequence from origin to destination (`edges.len() + 1` long).
    pub fn vertices(&self, network: &RoadNetwork) -> Vec<VertexId> {
        let mut out = Vec::with_capacity(self.edges.len() + 1);
        out.push(self.origin);
        out.extend(self.edges.iter().map(|e| network.edge_to[e.index()]));
        out
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so one resolver can serve
/// concurrent queries and Rayon workers during graph construction.
pub trait Router: Send + Sync {
    /// Compute the shortest path from `from` to `to`.
    ///
    /// `from == to` yields an empty (trivial) path.  An unreachable
    /// destination yields [`SpatialError::NoRoute`], which callers treat as
    /// an expected outcome on sparse networks rather than a failure.
    fn route(&self, network: &RoadNetwork, from: VertexId, to: VertexId) -> SpatialResult<RoadPath>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra's algorithm over the CSR road graph, weighted by
/// `edge_length_m`.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn route(&self, network: &RoadNetwork, from: VertexId, to: VertexId) -> SpatialResult<RoadPath> {
        dijkstra(network, from, to)
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

#[inline]
fn edge_cost_mm(network: &RoadNetwork, edge: RoadEdgeId) -> u64 {
    (network.edge_length_m[edge.index()] * 1_000.0).round() as u64
}

fn dijkstra(network: &RoadNetwork, from: VertexId, to: VertexId) -> SpatialResult<RoadPath> {
    for v in [from, to] {
        if !network.contains(v) {
            return Err(SpatialError::VertexNotFound(v));
        }
    }

    if from == to {
        return Ok(RoadPath { origin: from, edges: vec![], length_m: 0.0 });
    }

    let n = network.vertex_count();
    // dist[v] = best known cost (mm) to reach v.
    let mut dist      = vec![u64::MAX; n];
    // prev_edge[v] = RoadEdgeId that reached v; INVALID for unreached vertices.
    let mut prev_edge = vec![RoadEdgeId::INVALID; n];

    dist[from.index()] = 0;

    // Min-heap: (cost, vertex). Reverse makes BinaryHeap (max) behave as min-heap.
    // Secondary key VertexId ensures deterministic tie-breaking.
    let mut heap: BinaryHeap<Reverse<(u64, VertexId)>> = BinaryHeap::new();
    heap.push(Reverse((0, from)));

    while let Some(Reverse((cost, vertex))) = heap.pop() {
        if vertex == to {
            return Ok(reconstruct(network, prev_edge, from, to));
        }

        // Skip stale heap entries.
        if cost > dist[vertex.index()] {
            continue;
        }

        for edge in network.out_edges(vertex) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost.saturating_add(edge_cost_mm(network, edge));

            if new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev_edge[neighbor.index()] = edge;
                heap.push(Reverse((new_cost, neighbor)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(
    network: &RoadNetwork,
    prev_edge: Vec<RoadEdgeId>,
    from: VertexId,
    to: VertexId,
) -> RoadPath {
    let mut edges = Vec::new();
    let mut cur = to;
    while cur != from {
        let e = prev_edge[cur.index()];
        if e == RoadEdgeId::INVALID {
            break;
        }
        edges.push(e);
        cur = network.edge_from[e.index()];
    }
    edges.reverse();
    let length_m = edges.iter().map(|e| network.edge_length_m[e.index()]).sum();
    RoadPath { origin: from, edges, length_m }
}
