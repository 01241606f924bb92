//! Deterministic point-mass reference simulator.

use std::sync::Arc;

use indexmap::IndexMap;

use tarmac_core::{
    NativeId, OrderOp, StepReport, TickId, TransportError, VehicleKind, VehicleKinematics,
    VehicleOrder,
};
use tarmac_kernel::Transport;
use tarmac_net::{Network, Scenario};

/// Cruise acceleration for background vehicles, m/s².
const CRUISE_ACCEL: f64 = 0.5;

/// One simulated vehicle.
#[derive(Clone, Debug)]
struct SimVehicle {
    kind: VehicleKind,
    route: tarmac_core::RouteId,
    lane: u8,
    route_offset: f64,
    speed: f64,
    /// Acceleration ordered for the next tick, if any.
    ordered_accel: Option<f64>,
}

/// A minimal deterministic traffic simulator over a scenario.
///
/// Not a physics engine — just enough motion for the control loop to
/// be exercised end to end: background vehicles cruise toward the
/// current speed limit, controlled vehicles integrate ordered
/// accelerations, vehicles on open routes leave at the end, vehicles
/// closer than `collision_gap` on the same lane collide and are both
/// removed. Everything is pure arithmetic over the previous state, so
/// two runs fed the same orders produce identical reports.
#[derive(Debug)]
pub struct KinematicTransport {
    dt: f64,
    collision_gap: f64,
    network: Option<Arc<Network>>,
    vehicles: IndexMap<NativeId, SimVehicle>,
}

impl KinematicTransport {
    /// A simulator stepping `dt` seconds per advance.
    pub fn new(dt: f64) -> Self {
        Self {
            dt,
            collision_gap: 1.0,
            network: None,
            vehicles: IndexMap::new(),
        }
    }

    /// Override the rear-end collision gap threshold, in meters.
    pub fn with_collision_gap(mut self, gap: f64) -> Self {
        self.collision_gap = gap;
        self
    }

    fn build_report(&self, collisions: Vec<(NativeId, NativeId)>) -> StepReport {
        let network = self.network.as_ref().expect("launched");
        let mut report = StepReport::empty(TickId(0));

        // Per (route, lane) column sorted by offset, for neighbours.
        let mut columns: IndexMap<(u32, u8), Vec<(NativeId, f64, f64)>> = IndexMap::new();
        for (native, v) in &self.vehicles {
            columns
                .entry((v.route.0, v.lane))
                .or_default()
                .push((native.clone(), v.route_offset, v.speed));
        }
        for column in columns.values_mut() {
            column.sort_by(|a, b| a.1.total_cmp(&b.1));
        }

        for (native, v) in &self.vehicles {
            let (edge, lane_pos) = network
                .route_locate(v.route, v.route_offset)
                .unwrap_or_else(|| {
                    // Only reachable for vehicles at the exact route end.
                    let route = &network.routes()[v.route.0 as usize];
                    let last = *route.edges.last().expect("routes are non-empty");
                    (last, network.edge_length(last).unwrap_or(0.0))
                });

            let column = &columns[&(v.route.0, v.lane)];
            let idx = column
                .iter()
                .position(|(n, _, _)| n == native)
                .expect("vehicle is in its own column");
            let cyclic = network.route_is_cyclic(v.route) == Some(true);
            let route_len = network.route_length(v.route).unwrap_or(0.0);

            let leader = if idx + 1 < column.len() {
                let (n, off, _) = &column[idx + 1];
                Some((n.clone(), off - v.route_offset))
            } else if cyclic && column.len() > 1 {
                let (n, off, _) = &column[0];
                Some((n.clone(), route_len - v.route_offset + off))
            } else {
                None
            };
            let follower = if idx > 0 {
                let (n, off, _) = &column[idx - 1];
                Some((n.clone(), v.route_offset - off))
            } else if cyclic && column.len() > 1 {
                let (n, off, _) = &column[column.len() - 1];
                Some((n.clone(), v.route_offset + route_len - off))
            } else {
                None
            };

            report.vehicles.insert(
                native.clone(),
                VehicleKinematics {
                    kind: v.kind,
                    edge,
                    lane: v.lane,
                    lane_pos,
                    speed: v.speed,
                    route: v.route,
                    route_progress: v.route_offset,
                    leader,
                    follower,
                },
            );
        }
        report.collisions = collisions;
        report
    }
}

impl Transport for KinematicTransport {
    fn launch(&mut self, scenario: &Scenario) -> Result<StepReport, TransportError> {
        self.network = Some(Arc::clone(scenario.network()));
        self.vehicles.clear();
        for p in scenario.placements() {
            self.vehicles.insert(
                p.native.clone(),
                SimVehicle {
                    kind: p.kind,
                    route: p.route,
                    lane: p.lane,
                    route_offset: p.route_offset,
                    speed: p.speed,
                    ordered_accel: None,
                },
            );
        }
        Ok(self.build_report(Vec::new()))
    }

    fn advance(&mut self, orders: &[VehicleOrder]) -> Result<StepReport, TransportError> {
        let network = self
            .network
            .clone()
            .ok_or_else(|| TransportError::Protocol {
                reason: "advance before launch".into(),
            })?;

        // Orders addressed to unknown vehicles are ignored at the wire.
        for order in orders {
            let Some(v) = self.vehicles.get_mut(&order.target) else {
                continue;
            };
            match &order.op {
                OrderOp::Accelerate { accel } => v.ordered_accel = Some(*accel),
                OrderOp::SetSpeed { speed } => {
                    v.speed = speed.max(0.0);
                    v.ordered_accel = None;
                }
                OrderOp::ChangeLane { direction } => {
                    let lanes = network
                        .edge(
                            network
                                .route_locate(v.route, v.route_offset)
                                .map(|(e, _)| e)
                                .unwrap_or(tarmac_core::EdgeId(0)),
                        )
                        .map(|e| e.lanes)
                        .unwrap_or(1);
                    v.lane = match direction {
                        tarmac_core::LaneChange::Left => (v.lane + 1).min(lanes - 1),
                        tarmac_core::LaneChange::Right => v.lane.saturating_sub(1),
                        tarmac_core::LaneChange::Stay => v.lane,
                    };
                }
                OrderOp::Reroute { route } => {
                    if network.route(*route).is_some() {
                        v.route = *route;
                        v.route_offset = 0.0;
                    }
                }
            }
        }

        // Integrate motion.
        let mut departed: Vec<NativeId> = Vec::new();
        for (native, v) in &mut self.vehicles {
            let limit = network
                .route_locate(v.route, v.route_offset)
                .and_then(|(e, _)| network.speed_limit(e))
                .unwrap_or(0.0);
            let accel = match (v.kind, v.ordered_accel.take()) {
                (VehicleKind::Controlled, Some(a)) => a,
                (VehicleKind::Controlled, None) => 0.0,
                // Background vehicles cruise toward the limit.
                (VehicleKind::Background, _) => {
                    if v.speed < limit {
                        CRUISE_ACCEL
                    } else {
                        0.0
                    }
                }
            };
            v.speed = (v.speed + accel * self.dt).clamp(0.0, limit.max(v.speed));
            v.route_offset += v.speed * self.dt;

            let cyclic = network.route_is_cyclic(v.route) == Some(true);
            let route_len = network.route_length(v.route).unwrap_or(f64::MAX);
            if cyclic {
                v.route_offset = v.route_offset.rem_euclid(route_len);
            } else if v.route_offset >= route_len {
                departed.push(native.clone());
            }
        }
        for native in &departed {
            self.vehicles.shift_remove(native);
        }

        // Rear-end collisions: same route+lane, closer than the gap.
        let mut collisions: Vec<(NativeId, NativeId)> = Vec::new();
        let mut columns: IndexMap<(u32, u8), Vec<(NativeId, f64)>> = IndexMap::new();
        for (native, v) in &self.vehicles {
            columns
                .entry((v.route.0, v.lane))
                .or_default()
                .push((native.clone(), v.route_offset));
        }
        for column in columns.values_mut() {
            column.sort_by(|a, b| a.1.total_cmp(&b.1));
            for pair in column.windows(2) {
                if pair[1].1 - pair[0].1 < self.collision_gap {
                    collisions.push((pair[0].0.clone(), pair[1].0.clone()));
                }
            }
        }
        for (a, b) in &collisions {
            self.vehicles.shift_remove(a);
            self.vehicles.shift_remove(b);
        }

        Ok(self.build_report(collisions))
    }
}
