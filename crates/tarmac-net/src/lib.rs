//! Road-network topology, routes, and scenario construction.
//!
//! A [`Network`] is the immutable static topology for one scenario
//! class: nodes, directed edges with length/speed-limit/lane-count, and
//! routes (connected edge sequences). A [`Scenario`] pairs a shared
//! network with a concrete initial vehicle placement, built
//! deterministically from a [`ScenarioConfig`] — the same config always
//! reconstructs an identical scenario, which is what makes episode
//! resets reproducible.
//!
//! The [`builders`] module provides the two canonical network families:
//! a closed single-route ring and an open highway-with-on-ramp merge.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builders;
pub mod error;
pub mod network;
pub mod scenario;

pub use builders::{merge_network, ring_network};
pub use error::{NetworkError, ScenarioError};
pub use network::{Edge, Network, Node, Route};
pub use scenario::{Placement, PlacementSpec, Scenario, ScenarioConfig};
