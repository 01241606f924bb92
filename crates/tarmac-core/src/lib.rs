//! Core types for the Tarmac traffic-RL framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Tarmac workspace:
//! identifiers, vehicle kinematic state, orders and receipts, raw step
//! reports, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod order;
pub mod report;
pub mod state;

pub use error::{EnvError, KernelError, TransportError};
pub use id::{EdgeId, NativeId, NodeId, RouteId, TickId, VehicleId};
pub use order::{LaneChange, OrderDropReason, OrderOp, Receipt, VehicleOrder};
pub use report::StepReport;
pub use state::{VehicleKind, VehicleKinematics};
