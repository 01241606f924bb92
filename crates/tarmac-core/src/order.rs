//! Vehicle orders, lane-change directions, and receipts.
//!
//! An order is a single command addressed to one vehicle, buffered by
//! the kernel between two time advances and applied atomically with the
//! next one. Every submitted order produces exactly one [`Receipt`],
//! whether it was applied or dropped — entity-churn races surface as
//! receipts, never as step failures.

use crate::id::{NativeId, RouteId, TickId};

/// Lane-change direction relative to driving direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaneChange {
    /// Move one lane to the left.
    Left,
    /// Keep the current lane.
    Stay,
    /// Move one lane to the right.
    Right,
}

/// The operation an order performs on its target vehicle.
#[derive(Clone, Debug, PartialEq)]
pub enum OrderOp {
    /// Apply a longitudinal acceleration for the next tick, in m/s².
    ///
    /// Negative values brake. The environment core clamps the value to
    /// the configured action bounds before the order reaches the kernel.
    Accelerate {
        /// Signed acceleration in m/s².
        accel: f64,
    },
    /// Set the target speed directly, in m/s.
    SetSpeed {
        /// Desired speed; the simulator ramps to it subject to its own
        /// dynamics.
        speed: f64,
    },
    /// Request a lane change.
    ChangeLane {
        /// Direction of the change.
        direction: LaneChange,
    },
    /// Replace the vehicle's remaining route.
    Reroute {
        /// The new route; must start on the vehicle's current edge.
        route: RouteId,
    },
}

/// An order addressed to a vehicle by its simulator-native ID.
///
/// Orders are resolved from logical IDs to native IDs by the
/// environment core before submission; the kernel and transport layers
/// never see logical IDs. `arrival_seq` is assigned by the order buffer
/// from a monotonic counter and is the final tiebreaker in the
/// deterministic drain order `(target, arrival_seq)`.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleOrder {
    /// The vehicle this order targets.
    pub target: NativeId,
    /// The operation to perform.
    pub op: OrderOp,
    /// Tick at which the order was issued (the tick *before* the
    /// advance that applies it).
    pub issued_at: TickId,
    /// Monotonic arrival sequence number, set by the order buffer.
    pub arrival_seq: u64,
}

/// Why an order was dropped instead of applied.
///
/// `UnknownVehicle` and `Uncontrolled` are produced above the kernel,
/// where vehicles are addressed by logical ID; `BufferFull` comes from
/// the kernel's own buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDropReason {
    /// The order buffer was at capacity.
    BufferFull,
    /// The target vehicle is not live (left the network since the
    /// action was computed, or never existed). Absorbed locally per
    /// the churn invariant.
    UnknownVehicle {
        /// The stale target.
        target: crate::id::VehicleId,
    },
    /// The target is a background vehicle without control authority.
    Uncontrolled {
        /// The rejected target.
        target: crate::id::VehicleId,
    },
}

impl std::fmt::Display for OrderDropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferFull => write!(f, "order buffer full"),
            Self::UnknownVehicle { target } => write!(f, "vehicle {target} is not live"),
            Self::Uncontrolled { target } => {
                write!(f, "vehicle {target} is not under RL control")
            }
        }
    }
}

/// Outcome of one submitted order.
///
/// An order is *accepted* when it enters the buffer and *applied* when
/// an advance carries it to the simulator; `applied_tick` is set only
/// then. Dropped orders are never accepted and carry a reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Whether the order was accepted into the buffer.
    pub accepted: bool,
    /// The tick whose advance applied the order, if it has been applied.
    pub applied_tick: Option<TickId>,
    /// Why the order was dropped, if it was.
    pub reason: Option<OrderDropReason>,
    /// Index of this order within the submitted batch.
    pub order_index: usize,
}

impl Receipt {
    /// Receipt for an order accepted but not yet applied.
    pub fn pending(order_index: usize) -> Self {
        Self {
            accepted: true,
            applied_tick: None,
            reason: None,
            order_index,
        }
    }

    /// Receipt for an order applied at `tick`.
    pub fn applied(order_index: usize, tick: TickId) -> Self {
        Self {
            accepted: true,
            applied_tick: Some(tick),
            reason: None,
            order_index,
        }
    }

    /// Receipt for an order dropped for `reason`.
    pub fn dropped(order_index: usize, reason: OrderDropReason) -> Self {
        Self {
            accepted: false,
            applied_tick: None,
            reason: Some(reason),
            order_index,
        }
    }

    /// Whether the order reached the simulator.
    pub fn is_applied(&self) -> bool {
        self.applied_tick.is_some()
    }
}
