//! Test transports and trace builders for Tarmac development.
//!
//! [`ScriptedTransport`] replays a canned frame sequence so tests can
//! stage exact churn, collision, and failure timings.
//! [`KinematicTransport`] is a minimal deterministic point-mass
//! simulator over a real [`tarmac_net::Scenario`], so engine-level
//! tests and examples can exercise the full control loop without an
//! external process.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod kinematic;
mod scripted;

pub use kinematic::KinematicTransport;
pub use scripted::{FrameBuilder, ScriptedTransport};
