//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `VertexId v`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_from[ vertex_out_start[v] .. vertex_out_start[v+1] ]
//! ```
//!
//! All edge arrays (`edge_from`, `edge_to`, `edge_length_m`, `edge_class`)
//! are sorted by source vertex and indexed by `RoadEdgeId`.  Iteration over a
//! vertex's outgoing edges is therefore a contiguous memory scan.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) holds every vertex as a point on the unit sphere.
//! Chord length there is monotonic in great-circle distance, so the R-tree's
//! Euclidean nearest neighbour is also the haversine nearest neighbour at any
//! latitude.
//!
//! A built network is immutable.  Share it between resolvers and threads as
//! `Arc<RoadNetwork>`; every query takes `&self`.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use agro_core::{GeoPoint, RoadEdgeId, SurfaceType, VertexId};

// ── Road classes ──────────────────────────────────────────────────────────────

/// Road class in the OSM `highway=*` vocabulary.
///
/// Variants are ordered from highest to lowest grade; `*_link` ramps fold
/// into their parent class.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Unclassified,
    Service,
    Track,
    Other,
}

impl RoadClass {
    /// Map an OSM `highway` tag value to a class.  Unknown values become
    /// [`RoadClass::Other`] rather than being dropped.
    pub fn from_highway(tag: &str) -> RoadClass {
        let tag = tag.trim();
        let base = tag.strip_suffix("_link").unwrap_or(tag);
        match base {
            "motorway"     => RoadClass::Motorway,
            "trunk"        => RoadClass::Trunk,
            "primary"      => RoadClass::Primary,
            "secondary"    => RoadClass::Secondary,
            "tertiary"     => RoadClass::Tertiary,
            "residential"  => RoadClass::Residential,
            "unclassified" => RoadClass::Unclassified,
            "service"      => RoadClass::Service,
            "track"        => RoadClass::Track,
            _              => RoadClass::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadClass::Motorway     => "motorway",
            RoadClass::Trunk        => "trunk",
            RoadClass::Primary      => "primary",
            RoadClass::Secondary    => "secondary",
            RoadClass::Tertiary     => "tertiary",
            RoadClass::Residential  => "residential",
            RoadClass::Unclassified => "unclassified",
            RoadClass::Service      => "service",
            RoadClass::Track        => "track",
            RoadClass::Other        => "other",
        }
    }

    /// Surface implied by the class.
    pub fn surface(self) -> SurfaceType {
        match self {
            RoadClass::Motorway
            | RoadClass::Trunk
            | RoadClass::Primary
            | RoadClass::Secondary
            | RoadClass::Tertiary
            | RoadClass::Residential => SurfaceType::Paved,
            RoadClass::Unclassified | RoadClass::Service => SurfaceType::Gravel,
            RoadClass::Track | RoadClass::Other => SurfaceType::Dirt,
        }
    }

    /// `true` for motorway-grade through roads (motorway … secondary).
    #[inline]
    pub fn is_arterial(self) -> bool {
        self <= RoadClass::Secondary
    }
}

impl std::fmt::Display for RoadClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── R-tree vertex entry ───────────────────────────────────────────────────────

/// Entry stored in the R-tree: the vertex position on the unit sphere plus
/// its `VertexId`.
#[derive(Clone)]
struct VertexEntry {
    point: [f64; 3],
    id: VertexId,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 3]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    /// Squared chord length on the unit sphere.
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        let dz = self.point[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for snapping.
///
/// All fields are `pub` for direct indexed access on hot paths.  Do not
/// construct directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── Vertex data ───────────────────────────────────────────────────────
    /// Geographic position of each vertex.  Indexed by `VertexId`.
    pub vertex_pos: Vec<GeoPoint>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Outgoing edges of vertex `v` are at RoadEdgeIds
    /// `vertex_out_start[v] .. vertex_out_start[v+1]`.
    /// Length = `vertex_count + 1`.
    pub vertex_out_start: Vec<u32>,

    // ── Edge data (indexed by RoadEdgeId = position in sorted order) ──────
    /// Source vertex of each edge.  Needed to walk `prev_edge` back during
    /// path reconstruction.
    pub edge_from: Vec<VertexId>,

    /// Destination vertex of each edge.
    pub edge_to: Vec<VertexId>,

    /// Physical length of each edge in metres.  Used as Dijkstra cost.
    pub edge_length_m: Vec<f64>,

    /// Road class of each edge.
    pub edge_class: Vec<RoadClass>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<VertexEntry>,
}

impl RoadNetwork {
    /// Construct an empty network with no vertices or edges.
    ///
    /// Every snap against it returns `None`, so resolvers holding it behave
    /// exactly as if no network were loaded.
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().build()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertex_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, vertex: VertexId) -> bool {
        vertex.index() < self.vertex_pos.len()
    }

    /// Position of `vertex`, or `None` if it is out of range.
    #[inline]
    pub fn position(&self, vertex: VertexId) -> Option<GeoPoint> {
        self.vertex_pos.get(vertex.index()).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `RoadEdgeId`s of all outgoing edges from `vertex`.
    ///
    /// This is a contiguous index range; no heap allocation.
    #[inline]
    pub fn out_edges(&self, vertex: VertexId) -> impl Iterator<Item = RoadEdgeId> + '_ {
        let start = self.vertex_out_start[vertex.index()] as usize;
        let end   = self.vertex_out_start[vertex.index() + 1] as usize;
        (start..end).map(|i| RoadEdgeId(i as u32))
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the vertex with the smallest great-circle distance to `pos`.
    ///
    /// Returns `None` if the network has no vertices or `pos` is not a
    /// finite coordinate.
    pub fn nearest_vertex(&self, pos: GeoPoint) -> Option<VertexId> {
        if !(pos.lat.is_finite() && pos.lon.is_finite()) {
            return None;
        }
        self.spatial_idx
            .nearest_neighbor(&pos.to_unit_vector())
            .map(|e| e.id)
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// The builder accepts vertices and directed edges in any order.  `build()`
/// sorts edges by source vertex, constructs the CSR arrays, and bulk-loads
/// the R-tree.
///
/// # Example
///
/// ```
/// use agro_core::GeoPoint;
/// use agro_spatial::{RoadClass, RoadNetworkBuilder};
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_vertex(GeoPoint::new(32.69, -114.62));
/// let c = b.add_vertex(GeoPoint::new(32.70, -114.61));
/// b.add_road(a, c, 1_450.0, RoadClass::Primary);
/// let net = b.build();
/// assert_eq!(net.vertex_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    vertices:  Vec<GeoPoint>,
    raw_edges: Vec<RawEdge>,
}

struct RawEdge {
    from:     VertexId,
    to:       VertexId,
    length_m: f64,
    class:    RoadClass,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self { vertices: Vec::new(), raw_edges: Vec::new() }
    }

    /// Pre-allocate for the expected number of vertices and edges to reduce
    /// reallocations when bulk-loading from OSM or CSV.
    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            vertices:  Vec::with_capacity(vertices),
            raw_edges: Vec::with_capacity(edges),
        }
    }

    /// Add a road vertex and return its `VertexId` (sequential from 0).
    pub fn add_vertex(&mut self, pos: GeoPoint) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(pos);
        id
    }

    /// Add a **directed** edge from `from` to `to`.
    ///
    /// `length_m` is the physical length in metres; negative or non-finite
    /// values are clamped to zero so Dijkstra costs stay well-formed.
    pub fn add_directed_edge(&mut self, from: VertexId, to: VertexId, length_m: f64, class: RoadClass) {
        let length_m = if length_m.is_finite() { length_m.max(0.0) } else { 0.0 };
        self.raw_edges.push(RawEdge { from, to, length_m, class });
    }

    /// Convenience: add edges in **both directions** for an undirected road
    /// segment (the common case for most OSM road types).
    pub fn add_road(&mut self, a: VertexId, b: VertexId, length_m: f64, class: RoadClass) {
        self.add_directed_edge(a, b, length_m, class);
        self.add_directed_edge(b, a, length_m, class);
    }

    /// Look up the position of a vertex added earlier (used by loaders to
    /// compute edge lengths between adjacent way vertices).
    pub fn vertex_pos(&self, id: VertexId) -> GeoPoint {
        self.vertices[id.index()]
    }

    pub fn vertex_count(&self) -> usize { self.vertices.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Consume the builder and produce a [`RoadNetwork`].
    ///
    /// Edges referencing vertices that were never added are dropped.
    ///
    /// Time complexity: O(E log E) for edge sort + O(N log N) for R-tree bulk
    /// load, where N = vertices, E = edges.
    pub fn build(self) -> RoadNetwork {
        let vertex_count = self.vertices.len();

        // Sort edges by source vertex for CSR construction.  Stable so that
        // parallel edges keep insertion order.
        let mut raw: Vec<RawEdge> = self
            .raw_edges
            .into_iter()
            .filter(|e| e.from.index() < vertex_count && e.to.index() < vertex_count)
            .collect();
        raw.sort_by_key(|e| e.from.0);
        let edge_count = raw.len();

        let edge_from:     Vec<VertexId>  = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<VertexId>  = raw.iter().map(|e| e.to).collect();
        let edge_length_m: Vec<f64>       = raw.iter().map(|e| e.length_m).collect();
        let edge_class:    Vec<RoadClass> = raw.iter().map(|e| e.class).collect();

        // Build CSR row pointer (vertex_out_start).
        let mut vertex_out_start = vec![0u32; vertex_count + 1];
        for e in &raw {
            vertex_out_start[e.from.index() + 1] += 1;
        }
        for i in 1..=vertex_count {
            vertex_out_start[i] += vertex_out_start[i - 1];
        }
        debug_assert_eq!(vertex_out_start[vertex_count] as usize, edge_count);

        // Bulk-load R-tree for O(N log N) construction (faster than N inserts).
        let entries: Vec<VertexEntry> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, &pos)| VertexEntry {
                point: pos.to_unit_vector(),
                id: VertexId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            vertex_pos: self.vertices,
            vertex_out_start,
            edge_from,
            edge_to,
            edge_length_m,
            edge_class,
            spatial_idx,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
