//! Strongly-typed identifiers shared across the workspace.

use std::fmt;
use std::sync::Arc;

/// Stable logical identifier for a tracked vehicle.
///
/// Allocated by the fleet registry from a monotonic counter when the
/// simulator first reports a vehicle, and never reused for the lifetime
/// of that registry — a departed vehicle's ID stays retired even if the
/// simulator later recycles its native ID. All layers above the registry
/// (environment core, observation encoding, reward policies) address
/// vehicles exclusively by `VehicleId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u64> for VehicleId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// The simulator's own identifier for a vehicle.
///
/// Opaque to everything above the fleet registry. Backed by `Arc<str>`
/// so per-step diffing can clone it freely; ordered lexicographically,
/// which is the emission order of registry deltas.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeId(pub Arc<str>);

impl NativeId {
    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NativeId {
    fn from(v: &str) -> Self {
        Self(Arc::from(v))
    }
}

impl From<String> for NativeId {
    fn from(v: String) -> Self {
        Self(Arc::from(v.as_str()))
    }
}

/// Monotonically increasing simulation time counter.
///
/// Incremented by exactly one for each `advance_time()` on the kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TickId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies an edge (directed road segment) within a network.
///
/// Edges are registered at network construction and assigned sequential
/// IDs: `EdgeId(n)` is the n-th edge of the network definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u32> for EdgeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a node (junction) within a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a route (connected edge sequence) within a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub u32);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u32> for RouteId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
