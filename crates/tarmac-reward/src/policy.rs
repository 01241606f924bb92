//! Policy variants and their evaluation.

use indexmap::IndexMap;

use tarmac_core::VehicleId;
use tarmac_fleet::FleetSnapshot;
use tarmac_net::Network;

/// Why an episode terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DoneReason {
    /// The step horizon was reached.
    HorizonReached,
    /// Two vehicles collided.
    Collision,
    /// The whole network fell below the gridlock speed floor.
    Gridlock,
}

/// One state transition, as the policy sees it.
///
/// Everything a policy may read is in here; policies hold no state of
/// their own.
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    /// Fleet state before the step.
    pub before: &'a FleetSnapshot,
    /// Fleet state after the step.
    pub after: &'a FleetSnapshot,
    /// Static topology (normalizing constants).
    pub network: &'a Network,
    /// 1-based index of the step that produced `after`.
    pub step: u64,
    /// Configured episode horizon in steps.
    pub horizon: u64,
}

/// Reward shapings.
///
/// Each variant is one of the named shapings the original highway
/// environments train with; all are evaluated over the *after*
/// snapshot (plus the *before* snapshot where churn matters).
#[derive(Clone, Debug, PartialEq)]
pub enum RewardKind {
    /// Closeness of the whole fleet to a target speed:
    /// `max(0, ‖target‖ − ‖v − target‖) / ‖target‖` over all live
    /// vehicles. Zero on collision.
    DesiredVelocity {
        /// Target speed, m/s.
        target: f64,
    },
    /// [`DesiredVelocity`](RewardKind::DesiredVelocity) plus a penalty
    /// for controlled vehicles tailgating below a minimum time
    /// headway. Zero on collision.
    DesiredVelocityHeadway {
        /// Target speed, m/s.
        target: f64,
        /// Smallest acceptable time headway, seconds.
        min_time_headway: f64,
        /// Weight of the velocity term.
        velocity_weight: f64,
        /// Weight of the headway penalty term.
        headway_weight: f64,
    },
    /// Mean speed of all live vehicles, optionally normalized by the
    /// network max speed. Zero on collision.
    AverageSpeed {
        /// Divide by the network's max speed.
        normalized: bool,
    },
    /// Vehicles that completed their route this step (departures that
    /// were not collision removals).
    Outflow,
    /// A constant, typically a small negative step penalty.
    Constant {
        /// The per-step reward.
        value: f64,
    },
}

/// Termination conditions. The horizon check is part of every variant;
/// the scenario-specific condition differs.
#[derive(Clone, Debug, PartialEq)]
pub enum TerminationKind {
    /// Terminate on the horizon only.
    HorizonOnly,
    /// Terminate on any collision, or the horizon.
    Collision,
    /// Terminate when every live vehicle is below `speed_floor`, or on
    /// the horizon. Single-snapshot predicate; spawn transients should
    /// be covered by warmup steps, not by a patience window (which
    /// would be hidden state).
    Gridlock {
        /// Speed floor, m/s.
        speed_floor: f64,
    },
}

/// Result of one policy evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Judgment {
    /// Scalar reward for the step.
    pub reward: f64,
    /// Set when the episode is over, with the distinguishing cause.
    pub done: Option<DoneReason>,
}

/// A reward shaping paired with a termination condition.
#[derive(Clone, Debug, PartialEq)]
pub struct Policy {
    /// The reward shaping.
    pub reward: RewardKind,
    /// The termination condition.
    pub termination: TerminationKind,
}

impl Policy {
    /// Ring-road default: track the target speed, end on collision.
    pub fn desired_velocity(target: f64) -> Self {
        Self {
            reward: RewardKind::DesiredVelocity { target },
            termination: TerminationKind::Collision,
        }
    }

    /// Evaluate the scalar (single-agent) judgment for a transition.
    pub fn evaluate(&self, t: &Transition<'_>) -> Judgment {
        Judgment {
            reward: self.global_reward(t),
            done: self.termination(t),
        }
    }

    /// Evaluate per-agent rewards for every live controlled vehicle,
    /// plus the shared done signal.
    ///
    /// Agents that left during the step are omitted — their keys
    /// disappear from the map rather than carrying a terminal filler
    /// value.
    pub fn evaluate_per_agent(
        &self,
        t: &Transition<'_>,
    ) -> (IndexMap<VehicleId, f64>, Option<DoneReason>) {
        let mut rewards = IndexMap::new();
        for id in t.after.controlled_ids() {
            rewards.insert(id, self.agent_reward(t, id));
        }
        (rewards, self.termination(t))
    }

    fn termination(&self, t: &Transition<'_>) -> Option<DoneReason> {
        match &self.termination {
            TerminationKind::HorizonOnly => {}
            TerminationKind::Collision => {
                if t.after.has_collision() {
                    return Some(DoneReason::Collision);
                }
            }
            TerminationKind::Gridlock { speed_floor } => {
                let stuck = !t.after.is_empty()
                    && t.after
                        .vehicles
                        .values()
                        .all(|r| r.state.speed < *speed_floor);
                if stuck {
                    return Some(DoneReason::Gridlock);
                }
            }
        }
        if t.step >= t.horizon {
            Some(DoneReason::HorizonReached)
        } else {
            None
        }
    }

    fn global_reward(&self, t: &Transition<'_>) -> f64 {
        match &self.reward {
            RewardKind::DesiredVelocity { target } => desired_velocity(t.after, *target),
            RewardKind::DesiredVelocityHeadway {
                target,
                min_time_headway,
                velocity_weight,
                headway_weight,
            } => {
                if t.after.has_collision() {
                    return 0.0;
                }
                let ids = t.after.controlled_ids();
                if ids.is_empty() {
                    return 0.0;
                }
                let total: f64 = ids
                    .iter()
                    .map(|&id| {
                        shaped_agent_reward(
                            t.after,
                            id,
                            *target,
                            *min_time_headway,
                            *velocity_weight,
                            *headway_weight,
                        )
                    })
                    .sum();
                total / ids.len() as f64
            }
            RewardKind::AverageSpeed { normalized } => {
                if t.after.has_collision() {
                    return 0.0;
                }
                let mean = t.after.mean_speed();
                if *normalized {
                    mean / t.network.max_speed()
                } else {
                    mean
                }
            }
            RewardKind::Outflow => outflow(t),
            RewardKind::Constant { value } => *value,
        }
    }

    fn agent_reward(&self, t: &Transition<'_>, id: VehicleId) -> f64 {
        match &self.reward {
            // System-level shapings hand every agent the shared value.
            RewardKind::DesiredVelocity { .. }
            | RewardKind::AverageSpeed { .. }
            | RewardKind::Outflow
            | RewardKind::Constant { .. } => self.global_reward(t),
            RewardKind::DesiredVelocityHeadway {
                target,
                min_time_headway,
                velocity_weight,
                headway_weight,
            } => {
                if t.after.has_collision() {
                    return 0.0;
                }
                shaped_agent_reward(
                    t.after,
                    id,
                    *target,
                    *min_time_headway,
                    *velocity_weight,
                    *headway_weight,
                )
            }
        }
    }
}

/// Fleet closeness to a target speed, in `[0, 1]`.
///
/// `max(0, max_cost − ‖v − target‖₂) / max_cost` with
/// `max_cost = ‖(target, …, target)‖₂ = target·√n`. Zero on
/// collision or an empty network.
fn desired_velocity(after: &FleetSnapshot, target: f64) -> f64 {
    if after.has_collision() || after.is_empty() || target <= 0.0 {
        return 0.0;
    }
    let n = after.len() as f64;
    let cost: f64 = after
        .vehicles
        .values()
        .map(|r| (r.state.speed - target).powi(2))
        .sum::<f64>()
        .sqrt();
    let max_cost = target * n.sqrt();
    ((max_cost - cost).max(0.0)) / max_cost
}

/// Velocity term plus tailgating penalty for one agent.
fn shaped_agent_reward(
    after: &FleetSnapshot,
    id: VehicleId,
    target: f64,
    min_time_headway: f64,
    velocity_weight: f64,
    headway_weight: f64,
) -> f64 {
    let velocity_term = desired_velocity(after, target);

    let mut headway_penalty = 0.0;
    if let Some(record) = after.get(id) {
        if let Some((_, gap)) = record.leader {
            if record.state.speed > 0.0 && min_time_headway > 0.0 {
                let time_headway = (gap / record.state.speed).max(0.0);
                headway_penalty =
                    ((time_headway - min_time_headway) / min_time_headway).min(0.0);
            }
        }
    }

    (velocity_weight * velocity_term + headway_weight * headway_penalty).max(0.0)
}

/// Departures this step that were not collision removals.
fn outflow(t: &Transition<'_>) -> f64 {
    let collided: Vec<VehicleId> = t
        .after
        .collisions
        .iter()
        .flat_map(|&(a, b)| [a, b])
        .collect();
    t.before
        .vehicles
        .keys()
        .filter(|id| !t.after.vehicles.contains_key(*id) && !collided.contains(id))
        .count() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tarmac_core::{
        EdgeId, NativeId, RouteId, TickId, VehicleKind, VehicleKinematics,
    };
    use tarmac_fleet::VehicleRecord;
    use tarmac_net::ring_network;

    fn record(id: u64, native: &str, kind: VehicleKind, speed: f64) -> VehicleRecord {
        VehicleRecord {
            id: VehicleId(id),
            native: NativeId::from(native),
            kind,
            state: VehicleKinematics {
                speed,
                ..VehicleKinematics::at_rest(kind, EdgeId(0), RouteId(0))
            },
            leader: None,
            follower: None,
            entered_at: TickId(0),
        }
    }

    fn snapshot_of(tick: u64, records: Vec<VehicleRecord>) -> FleetSnapshot {
        let mut vehicles = IndexMap::new();
        for r in records {
            vehicles.insert(r.id, r);
        }
        FleetSnapshot {
            tick: TickId(tick),
            vehicles,
            collisions: vec![],
        }
    }

    fn transition<'a>(
        before: &'a FleetSnapshot,
        after: &'a FleetSnapshot,
        network: &'a Network,
        step: u64,
        horizon: u64,
    ) -> Transition<'a> {
        Transition {
            before,
            after,
            network,
            step,
            horizon,
        }
    }

    // ── desired velocity ─────────────────────────────────────

    #[test]
    fn desired_velocity_is_one_at_target() {
        let after = snapshot_of(
            1,
            vec![
                record(0, "a", VehicleKind::Background, 5.0),
                record(1, "b", VehicleKind::Background, 5.0),
            ],
        );
        assert!((desired_velocity(&after, 5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn desired_velocity_is_zero_at_standstill() {
        let after = snapshot_of(1, vec![record(0, "a", VehicleKind::Background, 0.0)]);
        assert_eq!(desired_velocity(&after, 5.0), 0.0);
    }

    #[test]
    fn desired_velocity_zero_on_collision() {
        let mut after = snapshot_of(
            1,
            vec![
                record(0, "a", VehicleKind::Background, 5.0),
                record(1, "b", VehicleKind::Background, 5.0),
            ],
        );
        after.collisions = vec![(VehicleId(0), VehicleId(1))];
        assert_eq!(desired_velocity(&after, 5.0), 0.0);
    }

    // ── headway shaping ──────────────────────────────────────

    #[test]
    fn tailgating_is_penalized() {
        let net = ring_network(200.0, 1, 10.0);
        let mut av = record(0, "av_0", VehicleKind::Controlled, 5.0);
        // 5 m gap at 5 m/s → 1 s headway, below the 2 s minimum.
        av.leader = Some((VehicleId(1), 5.0));
        let lead = record(1, "human_0", VehicleKind::Background, 5.0);
        let before = snapshot_of(0, vec![]);
        let after = snapshot_of(1, vec![av, lead]);

        let policy = Policy {
            reward: RewardKind::DesiredVelocityHeadway {
                target: 5.0,
                min_time_headway: 2.0,
                velocity_weight: 1.0,
                headway_weight: 0.5,
            },
            termination: TerminationKind::Collision,
        };
        let tailgating = policy
            .evaluate(&transition(&before, &after, &net, 1, 100))
            .reward;

        // Same fleet, comfortable 20 m gap → 4 s headway, no penalty.
        let mut av = record(0, "av_0", VehicleKind::Controlled, 5.0);
        av.leader = Some((VehicleId(1), 20.0));
        let lead = record(1, "human_0", VehicleKind::Background, 5.0);
        let after_ok = snapshot_of(1, vec![av, lead]);
        let comfortable = policy
            .evaluate(&transition(&before, &after_ok, &net, 1, 100))
            .reward;

        assert!(tailgating < comfortable);
        assert!((comfortable - 1.0).abs() < 1e-12);
    }

    // ── average speed and constants ──────────────────────────

    #[test]
    fn average_speed_normalizes_by_max_speed() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let after = snapshot_of(1, vec![record(0, "a", VehicleKind::Background, 5.0)]);
        let policy = Policy {
            reward: RewardKind::AverageSpeed { normalized: true },
            termination: TerminationKind::HorizonOnly,
        };
        let j = policy.evaluate(&transition(&before, &after, &net, 1, 100));
        assert!((j.reward - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_reward_ignores_state() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let after = snapshot_of(1, vec![]);
        let policy = Policy {
            reward: RewardKind::Constant { value: -0.1 },
            termination: TerminationKind::HorizonOnly,
        };
        let j = policy.evaluate(&transition(&before, &after, &net, 1, 100));
        assert_eq!(j.reward, -0.1);
    }

    // ── outflow ──────────────────────────────────────────────

    #[test]
    fn outflow_counts_departures_not_collisions() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(
            0,
            vec![
                record(0, "a", VehicleKind::Background, 5.0),
                record(1, "b", VehicleKind::Background, 5.0),
                record(2, "c", VehicleKind::Background, 5.0),
            ],
        );
        // a finished its route; b was removed by a collision with c.
        let mut after = snapshot_of(1, vec![record(2, "c", VehicleKind::Background, 5.0)]);
        after.collisions = vec![(VehicleId(1), VehicleId(2))];

        let policy = Policy {
            reward: RewardKind::Outflow,
            termination: TerminationKind::HorizonOnly,
        };
        let j = policy.evaluate(&transition(&before, &after, &net, 1, 100));
        assert_eq!(j.reward, 1.0);
    }

    // ── termination ──────────────────────────────────────────

    #[test]
    fn horizon_fires_exactly_at_horizon() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let after = snapshot_of(1, vec![record(0, "a", VehicleKind::Background, 5.0)]);
        let policy = Policy::desired_velocity(5.0);

        let at_4 = policy.evaluate(&transition(&before, &after, &net, 4, 5));
        assert_eq!(at_4.done, None);
        let at_5 = policy.evaluate(&transition(&before, &after, &net, 5, 5));
        assert_eq!(at_5.done, Some(DoneReason::HorizonReached));
    }

    #[test]
    fn collision_terminates_before_horizon() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let mut after = snapshot_of(
            1,
            vec![
                record(0, "a", VehicleKind::Background, 5.0),
                record(1, "b", VehicleKind::Background, 5.0),
            ],
        );
        after.collisions = vec![(VehicleId(0), VehicleId(1))];
        let policy = Policy::desired_velocity(5.0);
        let j = policy.evaluate(&transition(&before, &after, &net, 1, 100));
        assert_eq!(j.done, Some(DoneReason::Collision));
        assert_eq!(j.reward, 0.0);
    }

    #[test]
    fn gridlock_requires_everyone_below_floor() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let policy = Policy {
            reward: RewardKind::AverageSpeed { normalized: false },
            termination: TerminationKind::Gridlock { speed_floor: 0.5 },
        };

        let moving = snapshot_of(
            1,
            vec![
                record(0, "a", VehicleKind::Background, 0.1),
                record(1, "b", VehicleKind::Background, 3.0),
            ],
        );
        let j = policy.evaluate(&transition(&before, &moving, &net, 1, 100));
        assert_eq!(j.done, None);

        let stuck = snapshot_of(
            1,
            vec![
                record(0, "a", VehicleKind::Background, 0.1),
                record(1, "b", VehicleKind::Background, 0.2),
            ],
        );
        let j = policy.evaluate(&transition(&before, &stuck, &net, 1, 100));
        assert_eq!(j.done, Some(DoneReason::Gridlock));
    }

    // ── per-agent mapping ────────────────────────────────────

    #[test]
    fn per_agent_covers_live_controlled_only() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(0, vec![]);
        let after = snapshot_of(
            1,
            vec![
                record(0, "av_0", VehicleKind::Controlled, 5.0),
                record(1, "human_0", VehicleKind::Background, 5.0),
                record(2, "av_1", VehicleKind::Controlled, 5.0),
            ],
        );
        let policy = Policy::desired_velocity(5.0);
        let (rewards, done) = policy.evaluate_per_agent(&transition(&before, &after, &net, 1, 100));
        assert_eq!(done, None);
        assert_eq!(rewards.len(), 2);
        assert!(rewards.contains_key(&VehicleId(0)));
        assert!(rewards.contains_key(&VehicleId(2)));
        assert!(!rewards.contains_key(&VehicleId(1)));
    }

    // ── bounds ───────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn desired_velocity_stays_in_unit_interval(
                speeds in prop::collection::vec(0.0f64..40.0, 1..16),
                target in 0.1f64..30.0,
            ) {
                let records = speeds
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| {
                        record(i as u64, &format!("veh_{i}"), VehicleKind::Background, s)
                    })
                    .collect();
                let after = snapshot_of(1, records);
                let r = desired_velocity(&after, target);
                prop_assert!((0.0..=1.0).contains(&r), "reward {r} out of range");
            }
        }
    }

    // ── determinism ──────────────────────────────────────────

    #[test]
    fn identical_transitions_yield_bit_identical_rewards() {
        let net = ring_network(200.0, 1, 10.0);
        let before = snapshot_of(
            0,
            vec![
                record(0, "av_0", VehicleKind::Controlled, 3.7),
                record(1, "human_0", VehicleKind::Background, 4.1),
            ],
        );
        let mut av = record(0, "av_0", VehicleKind::Controlled, 3.9);
        av.leader = Some((VehicleId(1), 7.3));
        let after = snapshot_of(1, vec![av, record(1, "human_0", VehicleKind::Background, 4.4)]);

        let policy = Policy {
            reward: RewardKind::DesiredVelocityHeadway {
                target: 5.0,
                min_time_headway: 1.0,
                velocity_weight: 1.0,
                headway_weight: 0.2,
            },
            termination: TerminationKind::Collision,
        };
        let a = policy.evaluate(&transition(&before, &after, &net, 1, 10));
        let b = policy.evaluate(&transition(&before, &after, &net, 1, 10));
        assert_eq!(a.reward.to_bits(), b.reward.to_bits());

        let (ra, _) = policy.evaluate_per_agent(&transition(&before, &after, &net, 1, 10));
        let (rb, _) = policy.evaluate_per_agent(&transition(&before, &after, &net, 1, 10));
        for (id, v) in &ra {
            assert_eq!(v.to_bits(), rb[id].to_bits());
        }
    }
}
