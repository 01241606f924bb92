//! Immutable road-network topology.

use smallvec::SmallVec;

use tarmac_core::{EdgeId, NodeId, RouteId};

use crate::error::NetworkError;

/// A junction between edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    /// Human-readable name ("merge_junction", "ring_bottom_left", …).
    pub name: String,
}

/// A directed road segment between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Human-readable name ("inflow_highway", "bottom", …).
    pub name: String,
    /// Node this edge starts at.
    pub from: NodeId,
    /// Node this edge ends at.
    pub to: NodeId,
    /// Length in meters. Strictly positive.
    pub length: f64,
    /// Speed limit in m/s. Strictly positive and finite.
    pub speed_limit: f64,
    /// Number of lanes. At least one.
    pub lanes: u8,
}

/// A connected sequence of edges a vehicle follows.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Human-readable name ("ring", "highway", "merge", …).
    pub name: String,
    /// Edge sequence in driving order. Consecutive edges share a node.
    pub edges: SmallVec<[EdgeId; 8]>,
}

/// Immutable static topology for one scenario class.
///
/// Validated exhaustively at construction; every query after that is
/// infallible for in-range IDs. A network is shared read-only across
/// all components of one environment instance (`Arc<Network>`), and its
/// derived constants (`max_speed`, `total_length`, per-edge absolute
/// start offsets) are the normalizers the observation encoder uses —
/// they depend only on topology, never on live state, which is what
/// keeps observation-space shape stable across resets.
#[derive(Debug)]
pub struct Network {
    name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    routes: Vec<Route>,
    /// Absolute start offset of each edge, in network iteration order.
    edge_starts: Vec<f64>,
    total_length: f64,
    max_speed: f64,
}

impl Network {
    /// Validate and construct a network.
    ///
    /// # Errors
    ///
    /// Returns a [`NetworkError`] for an empty edge set, dangling node
    /// references, non-positive lengths or speed limits, zero-lane
    /// edges, and empty or disconnected routes.
    pub fn new(
        name: impl Into<String>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        routes: Vec<Route>,
    ) -> Result<Self, NetworkError> {
        if edges.is_empty() {
            return Err(NetworkError::NoEdges);
        }

        for (i, edge) in edges.iter().enumerate() {
            let id = EdgeId(i as u32);
            if edge.from.0 as usize >= nodes.len() || edge.to.0 as usize >= nodes.len() {
                return Err(NetworkError::DanglingNode { edge: id });
            }
            if !(edge.length > 0.0) || !edge.length.is_finite() {
                return Err(NetworkError::NonPositiveLength {
                    edge: id,
                    length: edge.length,
                });
            }
            if !(edge.speed_limit > 0.0) || !edge.speed_limit.is_finite() {
                return Err(NetworkError::InvalidSpeedLimit {
                    edge: id,
                    speed_limit: edge.speed_limit,
                });
            }
            if edge.lanes == 0 {
                return Err(NetworkError::NoLanes { edge: id });
            }
        }

        for (i, route) in routes.iter().enumerate() {
            let id = RouteId(i as u32);
            if route.edges.is_empty() {
                return Err(NetworkError::EmptyRoute { route: id });
            }
            for &e in &route.edges {
                if e.0 as usize >= edges.len() {
                    return Err(NetworkError::UnknownRouteEdge { route: id, edge: e });
                }
            }
            for (at, pair) in route.edges.windows(2).enumerate() {
                let prev = &edges[pair[0].0 as usize];
                let next = &edges[pair[1].0 as usize];
                if prev.to != next.from {
                    return Err(NetworkError::DisconnectedRoute {
                        route: id,
                        at: at + 1,
                    });
                }
            }
        }

        let mut edge_starts = Vec::with_capacity(edges.len());
        let mut cursor = 0.0;
        for edge in &edges {
            edge_starts.push(cursor);
            cursor += edge.length;
        }
        let max_speed = edges
            .iter()
            .map(|e| e.speed_limit)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            name: name.into(),
            nodes,
            edges,
            routes,
            edge_starts,
            total_length: cursor,
            max_speed,
        })
    }

    /// The network's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Look up a route.
    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(id.0 as usize)
    }

    /// Find an edge by name.
    pub fn edge_by_name(&self, name: &str) -> Option<EdgeId> {
        self.edges
            .iter()
            .position(|e| e.name == name)
            .map(|i| EdgeId(i as u32))
    }

    /// Find a route by name.
    pub fn route_by_name(&self, name: &str) -> Option<RouteId> {
        self.routes
            .iter()
            .position(|r| r.name == name)
            .map(|i| RouteId(i as u32))
    }

    /// All edges, in ID order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All routes, in ID order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Length of one edge, in meters.
    pub fn edge_length(&self, id: EdgeId) -> Option<f64> {
        self.edge(id).map(|e| e.length)
    }

    /// Speed limit of one edge, in m/s.
    pub fn speed_limit(&self, id: EdgeId) -> Option<f64> {
        self.edge(id).map(|e| e.speed_limit)
    }

    /// The highest speed limit anywhere in the network.
    ///
    /// Observation normalizer: ego and relative speeds are scaled by
    /// this.
    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Total driveable length (sum of edge lengths), in meters.
    ///
    /// Observation normalizer: gaps and positions are scaled by this.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// The widest lane count of any edge.
    pub fn max_lanes(&self) -> u8 {
        self.edges.iter().map(|e| e.lanes).max().unwrap_or(1)
    }

    /// Absolute position of a point `offset` meters into `edge`,
    /// measured against the network-wide edge concatenation.
    pub fn absolute_position(&self, edge: EdgeId, offset: f64) -> Option<f64> {
        self.edge_starts
            .get(edge.0 as usize)
            .map(|start| start + offset)
    }

    /// Total length of a route, in meters.
    pub fn route_length(&self, id: RouteId) -> Option<f64> {
        let route = self.route(id)?;
        Some(
            route
                .edges
                .iter()
                .map(|&e| self.edges[e.0 as usize].length)
                .sum(),
        )
    }

    /// Whether a route closes on itself (last edge ends where the
    /// first begins). Vehicles on cyclic routes wrap instead of
    /// leaving the network.
    pub fn route_is_cyclic(&self, id: RouteId) -> Option<bool> {
        let route = self.route(id)?;
        let first = &self.edges[route.edges[0].0 as usize];
        let last = &self.edges[route.edges[route.edges.len() - 1].0 as usize];
        Some(last.to == first.from)
    }

    /// Map a distance along a route to `(edge, offset_on_edge)`.
    ///
    /// On cyclic routes the distance wraps modulo the route length; on
    /// open routes a distance past the end returns `None` (the vehicle
    /// has left the network).
    pub fn route_locate(&self, id: RouteId, distance: f64) -> Option<(EdgeId, f64)> {
        let route = self.route(id)?;
        let route_len = self.route_length(id)?;
        let cyclic = self.route_is_cyclic(id)?;

        let mut dist = if cyclic {
            distance.rem_euclid(route_len)
        } else if distance > route_len || distance < 0.0 {
            return None;
        } else {
            distance
        };

        for &e in &route.edges {
            let len = self.edges[e.0 as usize].length;
            if dist < len {
                return Some((e, dist));
            }
            dist -= len;
        }
        // Floating-point slack at the very end of an open route.
        let last = *route.edges.last().expect("validated non-empty");
        Some((last, self.edges[last.0 as usize].length))
    }
}
