//! Kernel interface: the capability layer over an external traffic
//! simulator.
//!
//! The external microsimulator is a blocking, stateful, singleton
//! resource. [`SimKernel`] owns exactly one [`Transport`] (one
//! simulator process/connection) and exposes the four capabilities
//! upper layers are allowed to use: `reset`, `apply_command`,
//! `advance_time`, `query`. Orders issued between two advances are
//! buffered by [`OrderBuffer`] and handed to the transport as one
//! atomic batch with the next advance — nothing trickles to the wire
//! early.
//!
//! A transport failure is fatal: the kernel latches into a poisoned
//! state, every subsequent call fails with `SimulatorUnavailable`, and
//! only `reset()` (a fresh launch) clears the latch. There is no retry
//! logic here; a hung or crashed simulator must surface to training
//! code, not be papered over.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod kernel;
pub mod transport;

pub use buffer::OrderBuffer;
pub use kernel::{AdvanceResult, SimKernel};
pub use transport::Transport;
