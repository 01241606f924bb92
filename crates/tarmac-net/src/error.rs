//! Validation errors for networks and scenarios.

use std::error::Error;
use std::fmt;

use tarmac_core::{EdgeId, RouteId};

/// Errors detected while constructing a [`Network`](crate::Network).
#[derive(Clone, Debug, PartialEq)]
pub enum NetworkError {
    /// A network needs at least one edge.
    NoEdges,
    /// An edge references a node index that does not exist.
    DanglingNode {
        /// The offending edge.
        edge: EdgeId,
    },
    /// Edge length must be strictly positive.
    NonPositiveLength {
        /// The offending edge.
        edge: EdgeId,
        /// The rejected value.
        length: f64,
    },
    /// Edge speed limit must be strictly positive and finite.
    InvalidSpeedLimit {
        /// The offending edge.
        edge: EdgeId,
        /// The rejected value.
        speed_limit: f64,
    },
    /// An edge must have at least one lane.
    NoLanes {
        /// The offending edge.
        edge: EdgeId,
    },
    /// A route must contain at least one edge.
    EmptyRoute {
        /// The offending route.
        route: RouteId,
    },
    /// A route references an edge index that does not exist.
    UnknownRouteEdge {
        /// The offending route.
        route: RouteId,
        /// The missing edge.
        edge: EdgeId,
    },
    /// Consecutive route edges do not share a node.
    DisconnectedRoute {
        /// The offending route.
        route: RouteId,
        /// Position in the edge sequence where continuity breaks
        /// (the edge at `at` does not start where edge `at - 1` ends).
        at: usize,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEdges => write!(f, "network has no edges"),
            Self::DanglingNode { edge } => {
                write!(f, "edge {edge} references a nonexistent node")
            }
            Self::NonPositiveLength { edge, length } => {
                write!(f, "edge {edge} has non-positive length {length}")
            }
            Self::InvalidSpeedLimit { edge, speed_limit } => {
                write!(f, "edge {edge} has invalid speed limit {speed_limit}")
            }
            Self::NoLanes { edge } => write!(f, "edge {edge} has zero lanes"),
            Self::EmptyRoute { route } => write!(f, "route {route} has no edges"),
            Self::UnknownRouteEdge { route, edge } => {
                write!(f, "route {route} references nonexistent edge {edge}")
            }
            Self::DisconnectedRoute { route, at } => {
                write!(f, "route {route} is disconnected at position {at}")
            }
        }
    }
}

impl Error for NetworkError {}

/// Errors detected while building a [`Scenario`](crate::Scenario).
#[derive(Clone, Debug, PartialEq)]
pub enum ScenarioError {
    /// The placement template names no vehicles at all.
    NoVehicles,
    /// The placement references a route the network does not define.
    UnknownRoute {
        /// The missing route.
        route: RouteId,
    },
    /// Departure spacing must be strictly positive.
    NonPositiveSpacing {
        /// The rejected value.
        spacing: f64,
    },
    /// Position jitter must be non-negative and smaller than spacing.
    InvalidJitter {
        /// The rejected value.
        jitter: f64,
    },
    /// Departure speed must be non-negative and finite.
    InvalidDepartSpeed {
        /// The rejected value.
        speed: f64,
    },
    /// The route cannot hold the requested vehicle count at the
    /// requested spacing.
    Overcrowded {
        /// Route length in meters.
        route_length: f64,
        /// Length needed for the placement.
        required: f64,
    },
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoVehicles => write!(f, "placement has zero vehicles"),
            Self::UnknownRoute { route } => write!(f, "unknown route {route}"),
            Self::NonPositiveSpacing { spacing } => {
                write!(f, "spacing must be positive, got {spacing}")
            }
            Self::InvalidJitter { jitter } => {
                write!(f, "jitter must be in [0, spacing), got {jitter}")
            }
            Self::InvalidDepartSpeed { speed } => {
                write!(f, "depart speed must be non-negative and finite, got {speed}")
            }
            Self::Overcrowded {
                route_length,
                required,
            } => write!(
                f,
                "route of {route_length} m cannot hold a placement needing {required} m"
            ),
        }
    }
}

impl Error for ScenarioError {}
