//! Entity registry: stable vehicle identity over a churning population.
//!
//! The simulator reports a flat set of native IDs each tick; vehicles
//! enter and leave at every step boundary. [`FleetRegistry`] reconciles
//! consecutive reports into explicit enter/leave/update events keyed by
//! stable logical [`VehicleId`]s, so upper layers never index into "the
//! current vehicle list" positionally — positions shift under churn,
//! logical IDs do not.
//!
//! [`FleetSnapshot`] is an owned, immutable copy of the live population
//! at one tick. Reward policies and episode bookkeeping read snapshots
//! only, which keeps them pure functions of explicit inputs.
//!
//! [`VehicleId`]: tarmac_core::VehicleId

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod registry;
pub mod snapshot;

pub use registry::{FleetDelta, FleetRegistry, VehicleRecord};
pub use snapshot::FleetSnapshot;
