//! The opaque wire boundary to the simulator process.

use tarmac_core::{StepReport, TransportError, VehicleOrder};
use tarmac_net::Scenario;

/// Adapter over one external simulator process.
///
/// The wire format is the simulator's own business; implementors
/// translate between it and [`StepReport`]/[`VehicleOrder`]. Calls are
/// synchronous and may block on inter-process communication — a
/// transport must never be shared across threads (each environment
/// instance owns its own).
///
/// The tick IDs a transport stamps on its reports are advisory; the
/// kernel overwrites them with its own counter so that world time
/// advances by exactly one per `advance_time()` regardless of the
/// simulator's internal clock granularity.
pub trait Transport {
    /// (Re)start the simulator with a scenario and return the initial
    /// state: every vehicle placed, nothing moved yet.
    ///
    /// Called once per episode. A failure here means the episode never
    /// starts.
    fn launch(&mut self, scenario: &Scenario) -> Result<StepReport, TransportError>;

    /// Apply `orders` atomically and advance the simulation by one
    /// internal tick, returning the post-tick state.
    ///
    /// Orders addressed to vehicles the simulator no longer knows are
    /// ignored at the wire — stale-target filtering already happened
    /// above, and a race past that filter is the simulator's to absorb.
    fn advance(&mut self, orders: &[VehicleOrder]) -> Result<StepReport, TransportError>;

    /// Release the simulator process/connection.
    ///
    /// Called on drop paths; best-effort, so it cannot fail.
    fn teardown(&mut self) {}
}
