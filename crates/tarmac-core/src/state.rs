//! Vehicle kind and per-tick kinematic state.

use crate::id::{EdgeId, NativeId, RouteId};

/// Whether a vehicle is RL-actuated or simulator-driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    /// The environment core may issue orders to this vehicle.
    Controlled,
    /// Driven by the simulator's built-in behavioral model; orders
    /// addressed to it are dropped with an `Uncontrolled` receipt.
    Background,
}

impl VehicleKind {
    /// Whether this kind accepts orders.
    pub fn is_controlled(self) -> bool {
        matches!(self, VehicleKind::Controlled)
    }
}

/// Kinematic state of one vehicle at one tick, as reported by the
/// simulator transport.
///
/// Neighbour references (`leader`, `follower`) carry the simulator's
/// native IDs together with the bumper-to-bumper gap in meters; the
/// fleet registry resolves them to logical IDs when it ingests the
/// report. `None` means the neighbour is not visible to the simulator.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleKinematics {
    /// Control authority class.
    pub kind: VehicleKind,
    /// Edge the vehicle currently occupies.
    pub edge: EdgeId,
    /// Lane index on that edge (0 = rightmost).
    pub lane: u8,
    /// Longitudinal position along the edge, in meters from its start.
    pub lane_pos: f64,
    /// Current speed in m/s.
    pub speed: f64,
    /// The route this vehicle follows.
    pub route: RouteId,
    /// Distance driven along the route so far, in meters.
    pub route_progress: f64,
    /// Vehicle immediately ahead in the same lane, with gap in meters.
    pub leader: Option<(NativeId, f64)>,
    /// Vehicle immediately behind in the same lane, with gap in meters.
    pub follower: Option<(NativeId, f64)>,
}

impl VehicleKinematics {
    /// A stationary vehicle at the start of an edge, with no neighbours.
    ///
    /// Convenience constructor for transports and tests; fields are
    /// meant to be adjusted with struct update syntax.
    pub fn at_rest(kind: VehicleKind, edge: EdgeId, route: RouteId) -> Self {
        Self {
            kind,
            edge,
            lane: 0,
            lane_pos: 0.0,
            speed: 0.0,
            route,
            route_progress: 0.0,
            leader: None,
            follower: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_rest_is_stationary() {
        let k = VehicleKinematics::at_rest(VehicleKind::Controlled, EdgeId(2), RouteId(0));
        assert_eq!(k.speed, 0.0);
        assert_eq!(k.edge, EdgeId(2));
        assert!(k.leader.is_none());
        assert!(k.kind.is_controlled());
    }

    #[test]
    fn background_is_not_controlled() {
        assert!(!VehicleKind::Background.is_controlled());
    }
}
