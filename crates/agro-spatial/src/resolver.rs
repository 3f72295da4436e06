//! Route resolution: real road network where possible, synthetic otherwise.
//!
//! # Resolution tiers
//!
//! ```text
//! origin ──access──▶ nearest vertex ══road path══▶ nearest vertex ──access──▶ destination
//! ```
//!
//! 1. No network, an empty network, or a failed snap → fully synthetic route.
//! 2. Both ends snapped and the road graph connects them → a network route.
//!    Ends further than `access_threshold_m` from their vertex get a
//!    synthetic access segment spliced on.
//! 3. The vertices are disconnected → partial work is discarded and a fully
//!    synthetic route is returned.
//!
//! [`RouteResolver::resolve`] never fails.  The confidence level travels in
//! the [`ResolvedRoute`] variant instead.

use std::sync::Arc;

use tracing::debug;

use agro_core::{GeoPoint, SurfaceType, VertexId};

use crate::locate::{RoadSnap, locate_nearest};
use crate::network::{RoadClass, RoadNetwork};
use crate::router::{DijkstraRouter, RoadPath, Router};
use crate::synthetic::{DEFAULT_POINT_SPACING_M, RouteSegment, synthetic_segment};

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tunables for [`RouteResolver`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResolverConfig {
    /// An endpoint further than this from its nearest vertex gets a
    /// synthetic access segment.  Default: 10 m.
    pub access_threshold_m: f64,
    /// Waypoint spacing of synthetic segments.  Default: 200 m.
    pub point_spacing_m: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            access_threshold_m: 10.0,
            point_spacing_m:    DEFAULT_POINT_SPACING_M,
        }
    }
}

// ── Resolved routes ───────────────────────────────────────────────────────────

/// Confidence level of a [`ResolvedRoute`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteKind {
    /// Entirely on the road network.
    Real,
    /// Road network plus at least one synthetic access segment.
    Spliced,
    /// Fabricated end to end.
    Synthetic,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::Real      => "real",
            RouteKind::Spliced   => "spliced",
            RouteKind::Synthetic => "synthetic",
        }
    }
}

/// A route that touches the road network.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkRoute {
    /// Access segment (optional), road segment, access segment (optional).
    pub segments: Vec<RouteSegment>,
    /// Road vertices traversed, first to last.
    pub vertices: Vec<VertexId>,
    /// Class carrying the most road length; `None` for a zero-hop path.
    pub road_class: Option<RoadClass>,
    /// Surface of the road portion.
    pub surface: SurfaceType,
    /// Sum of all segment distances, metres.
    pub distance_m: f64,
}

/// Output of [`RouteResolver::resolve`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolvedRoute {
    Real(NetworkRoute),
    Spliced(NetworkRoute),
    Synthetic(RouteSegment),
}

impl ResolvedRoute {
    pub fn kind(&self) -> RouteKind {
        match self {
            ResolvedRoute::Real(_)      => RouteKind::Real,
            ResolvedRoute::Spliced(_)   => RouteKind::Spliced,
            ResolvedRoute::Synthetic(_) => RouteKind::Synthetic,
        }
    }

    /// `true` if any part of the route came from the road network.
    #[inline]
    pub fn is_real_route(&self) -> bool {
        !matches!(self, ResolvedRoute::Synthetic(_))
    }

    /// `true` if any segment is fabricated.
    #[inline]
    pub fn has_synthetic_segments(&self) -> bool {
        !matches!(self, ResolvedRoute::Real(_))
    }

    pub fn distance_m(&self) -> f64 {
        match self {
            ResolvedRoute::Real(r) | ResolvedRoute::Spliced(r) => r.distance_m,
            ResolvedRoute::Synthetic(s) => s.distance_m,
        }
    }

    #[inline]
    pub fn distance_km(&self) -> f64 {
        self.distance_m() / 1_000.0
    }

    pub fn surface(&self) -> SurfaceType {
        match self {
            ResolvedRoute::Real(r) | ResolvedRoute::Spliced(r) => r.surface,
            ResolvedRoute::Synthetic(s) => s.surface,
        }
    }

    pub fn road_class(&self) -> Option<RoadClass> {
        match self {
            ResolvedRoute::Real(r) | ResolvedRoute::Spliced(r) => r.road_class,
            ResolvedRoute::Synthetic(_) => None,
        }
    }

    pub fn segments(&self) -> &[RouteSegment] {
        match self {
            ResolvedRoute::Real(r) | ResolvedRoute::Spliced(r) => &r.segments,
            ResolvedRoute::Synthetic(s) => std::slice::from_ref(s),
        }
    }

    pub fn vertices(&self) -> &[VertexId] {
        match self {
            ResolvedRoute::Real(r) | ResolvedRoute::Spliced(r) => &r.vertices,
            ResolvedRoute::Synthetic(_) => &[],
        }
    }

    /// Full geometry: segment points concatenated, with the shared point at
    /// each join emitted once.
    pub fn geometry(&self) -> Vec<GeoPoint> {
        let mut out = Vec::new();
        for seg in self.segments() {
            extend_geometry(&mut out, &seg.points);
        }
        out
    }
}

fn extend_geometry(dst: &mut Vec<GeoPoint>, points: &[GeoPoint]) {
    match (dst.last(), points.first()) {
        (Some(last), Some(first)) if last == first => dst.extend_from_slice(&points[1..]),
        _ => dst.extend_from_slice(points),
    }
}

// ── RouteResolver ─────────────────────────────────────────────────────────────

/// Resolves coordinate pairs into [`ResolvedRoute`]s.
///
/// Holds an optional shared road network.  All methods take `&self`, so one
/// resolver serves any number of concurrent callers.
pub struct RouteResolver<R: Router = DijkstraRouter> {
    network: Option<Arc<RoadNetwork>>,
    router:  R,
    config:  ResolverConfig,
}

impl RouteResolver<DijkstraRouter> {
    /// Resolver using [`DijkstraRouter`] and default tunables.
    pub fn new(network: Option<Arc<RoadNetwork>>) -> Self {
        Self::with_router(network, DijkstraRouter, ResolverConfig::default())
    }

    /// Resolver with no network: every route is synthetic.
    pub fn synthetic_only() -> Self {
        Self::new(None)
    }
}

impl<R: Router> RouteResolver<R> {
    pub fn with_router(network: Option<Arc<RoadNetwork>>, router: R, config: ResolverConfig) -> Self {
        // An empty network is indistinguishable from none; drop it so the
        // fast path skips snapping.
        let network = network.filter(|n| !n.is_empty());
        Self { network, router, config }
    }

    pub fn network(&self) -> Option<&RoadNetwork> {
        self.network.as_deref()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    /// Snap `pos` onto the network.  `None` if no network is loaded.
    pub fn locate(&self, pos: GeoPoint) -> Option<RoadSnap> {
        locate_nearest(self.network(), pos)
    }

    /// Fully synthetic dirt route.
    pub fn synthetic(&self, origin: GeoPoint, destination: GeoPoint) -> ResolvedRoute {
        self.synthetic_with_surface(origin, destination, SurfaceType::Dirt)
    }

    /// Fully synthetic route with an explicit surface label.
    pub fn synthetic_with_surface(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        surface: SurfaceType,
    ) -> ResolvedRoute {
        ResolvedRoute::Synthetic(synthetic_segment(
            origin,
            destination,
            surface,
            self.config.point_spacing_m,
        ))
    }

    /// Resolve a route from `origin` to `destination`.  Never fails.
    pub fn resolve(&self, origin: GeoPoint, destination: GeoPoint) -> ResolvedRoute {
        if origin == destination {
            return self.synthetic(origin, destination);
        }
        let Some(network) = self.network() else {
            return self.synthetic(origin, destination);
        };
        let (Some(from), Some(to)) = (
            locate_nearest(Some(network), origin),
            locate_nearest(Some(network), destination),
        ) else {
            debug!(%origin, %destination, "snap failed; synthetic route");
            return self.synthetic(origin, destination);
        };

        self.compose(network, origin, from, destination, to, self.config.access_threshold_m)
            .unwrap_or_else(|| self.synthetic(origin, destination))
    }

    /// Route through two pre-computed snaps, always splicing access segments
    /// for any non-zero access distance.
    ///
    /// Returns `None` if no network is loaded or the snapped vertices are
    /// disconnected.
    pub fn stitch(
        &self,
        origin: GeoPoint,
        from: RoadSnap,
        destination: GeoPoint,
        to: RoadSnap,
    ) -> Option<ResolvedRoute> {
        let network = self.network()?;
        self.compose(network, origin, from, destination, to, 0.0)
    }

    fn compose(
        &self,
        network: &RoadNetwork,
        origin: GeoPoint,
        from: RoadSnap,
        destination: GeoPoint,
        to: RoadSnap,
        threshold_m: f64,
    ) -> Option<ResolvedRoute> {
        let path = match self.router.route(network, from.vertex, to.vertex) {
            Ok(path) => path,
            Err(err) => {
                debug!(%origin, %destination, %err, "no road path; synthetic route");
                return None;
            }
        };

        let mut segments = Vec::with_capacity(3);
        if from.distance_m > threshold_m {
            segments.push(self.access_segment(origin, from.position));
        }

        let vertices = path.vertices(network);
        let road_class = dominant_class(network, &path);
        let surface = road_class.map_or(SurfaceType::Dirt, RoadClass::surface);
        let points = vertices
            .iter()
            .filter_map(|&v| network.position(v))
            .collect();
        segments.push(RouteSegment {
            points,
            surface,
            synthetic: false,
            distance_m: path.length_m,
        });

        if to.distance_m > threshold_m {
            segments.push(self.access_segment(to.position, destination));
        }

        let distance_m = segments.iter().map(|s| s.distance_m).sum();
        let spliced = segments.iter().any(|s| s.synthetic);
        let route = NetworkRoute { segments, vertices, road_class, surface, distance_m };

        Some(if spliced {
            ResolvedRoute::Spliced(route)
        } else {
            ResolvedRoute::Real(route)
        })
    }

    fn access_segment(&self, from: GeoPoint, to: GeoPoint) -> RouteSegment {
        synthetic_segment(from, to, SurfaceType::Dirt, self.config.point_spacing_m)
    }
}

/// Road class carrying the greatest total length along `path`.  Ties go to
/// the higher-grade class.
fn dominant_class(network: &RoadNetwork, path: &RoadPath) -> Option<RoadClass> {
    let mut totals: Vec<(RoadClass, f64)> = Vec::new();
    for e in &path.edges {
        let class = network.edge_class[e.index()];
        let len = network.edge_length_m[e.index()];
        match totals.iter_mut().find(|(c, _)| *c == class) {
            Some((_, total)) => *total += len,
            None => totals.push((class, len)),
        }
    }
    totals
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(class, _)| class)
}
