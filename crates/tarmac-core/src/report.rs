//! Raw per-tick reports from the simulator transport.

use indexmap::IndexMap;

use crate::id::{NativeId, TickId};
use crate::state::VehicleKinematics;

/// Everything the simulator reports about one tick.
///
/// The `vehicles` map contains every vehicle live in the network after
/// the tick, keyed by native ID. Arrivals and departures are *not*
/// flagged here — the fleet registry derives both by diffing
/// consecutive reports, so all transports get identical churn
/// semantics regardless of what their wire protocol exposes.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StepReport {
    /// Simulation time after the tick.
    pub tick: TickId,
    /// All live vehicles, keyed by native ID.
    pub vehicles: IndexMap<NativeId, VehicleKinematics>,
    /// Collision pairs observed during the tick (unioned across kernel
    /// sub-steps). Order within a pair is not meaningful.
    pub collisions: Vec<(NativeId, NativeId)>,
}

impl StepReport {
    /// An empty report at `tick`.
    pub fn empty(tick: TickId) -> Self {
        Self {
            tick,
            vehicles: IndexMap::new(),
            collisions: Vec::new(),
        }
    }

    /// Whether any collision was reported this tick.
    pub fn has_collision(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Look up one vehicle's kinematics.
    pub fn get(&self, id: &NativeId) -> Option<&VehicleKinematics> {
        self.vehicles.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{EdgeId, RouteId};
    use crate::state::{VehicleKind, VehicleKinematics};

    #[test]
    fn empty_report_has_no_vehicles() {
        let r = StepReport::empty(TickId(3));
        assert_eq!(r.tick, TickId(3));
        assert!(r.vehicles.is_empty());
        assert!(!r.has_collision());
    }

    #[test]
    fn get_returns_inserted_vehicle() {
        let mut r = StepReport::empty(TickId(0));
        let id = NativeId::from("av_0");
        r.vehicles.insert(
            id.clone(),
            VehicleKinematics::at_rest(VehicleKind::Controlled, EdgeId(0), RouteId(0)),
        );
        assert!(r.get(&id).is_some());
        assert!(r.get(&NativeId::from("av_1")).is_none());
    }
}
