//! Diff-based vehicle registry with stable logical IDs.

use indexmap::IndexMap;

use tarmac_core::{NativeId, StepReport, TickId, VehicleId, VehicleKind, VehicleKinematics};

/// One live vehicle as the registry tracks it.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleRecord {
    /// Stable logical ID.
    pub id: VehicleId,
    /// The simulator's identifier for this vehicle.
    pub native: NativeId,
    /// Control authority class.
    pub kind: VehicleKind,
    /// Kinematic state from the most recent report.
    pub state: VehicleKinematics,
    /// Leader resolved to a logical ID, with gap in meters. `None` if
    /// the simulator reports no leader or the leader left this tick.
    pub leader: Option<(VehicleId, f64)>,
    /// Follower resolved to a logical ID, with gap in meters.
    pub follower: Option<(VehicleId, f64)>,
    /// Tick at which this vehicle first appeared.
    pub entered_at: TickId,
}

/// Churn events produced by one [`FleetRegistry::apply_report`] call.
///
/// Each list is sorted ascending by the vehicles' *native* IDs, so two
/// registries fed the same simulator trace emit identical deltas —
/// required for reproducible observation vectors, not for physics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FleetDelta {
    /// Vehicles that appeared this tick (fresh logical IDs).
    pub entered: Vec<VehicleId>,
    /// Vehicles that left this tick (logical IDs now retired).
    pub left: Vec<VehicleId>,
    /// Vehicles present both before and after.
    pub updated: Vec<VehicleId>,
}

/// Tracks the live vehicle set across ticks.
///
/// Logical-ID policy: IDs come from a monotonic counter and are never
/// reused for the lifetime of the registry, even if the simulator
/// recycles a native ID after its vehicle departs. The native↔logical
/// mapping is registry-internal; everything above addresses vehicles by
/// logical ID only.
#[derive(Debug, Default)]
pub struct FleetRegistry {
    live: IndexMap<VehicleId, VehicleRecord>,
    native_index: IndexMap<NativeId, VehicleId>,
    next_logical: u64,
    last_collisions: Vec<(VehicleId, VehicleId)>,
    tick: TickId,
}

impl FleetRegistry {
    /// An empty registry at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile a raw step report against the previous live set.
    ///
    /// Native IDs present only in the report are *entered* (allocated a
    /// fresh logical ID, in ascending native order so allocation itself
    /// is deterministic); present only in the registry are *left*
    /// (retired and removed from every index); present in both are
    /// *updated*. Collision pairs are resolved to logical IDs while the
    /// participants are still indexed, so a vehicle that collided and
    /// was removed in the same tick still resolves.
    pub fn apply_report(&mut self, report: &StepReport) -> FleetDelta {
        self.tick = report.tick;

        let mut entered_native: Vec<&NativeId> = report
            .vehicles
            .keys()
            .filter(|n| !self.native_index.contains_key(*n))
            .collect();
        entered_native.sort_unstable();

        let mut left: Vec<(NativeId, VehicleId)> = self
            .native_index
            .iter()
            .filter(|(n, _)| !report.vehicles.contains_key(*n))
            .map(|(n, &id)| (n.clone(), id))
            .collect();
        left.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut entered = Vec::with_capacity(entered_native.len());
        for native in entered_native {
            let id = VehicleId(self.next_logical);
            self.next_logical += 1;
            let state = report.vehicles[native].clone();
            self.native_index.insert(native.clone(), id);
            self.live.insert(
                id,
                VehicleRecord {
                    id,
                    native: native.clone(),
                    kind: state.kind,
                    state,
                    leader: None,
                    follower: None,
                    entered_at: report.tick,
                },
            );
            entered.push(id);
        }

        let mut updated: Vec<(NativeId, VehicleId)> = Vec::new();
        for (native, state) in &report.vehicles {
            let id = self.native_index[native];
            if !entered.contains(&id) {
                updated.push((native.clone(), id));
            }
            let record = self
                .live
                .get_mut(&id)
                .expect("native index and live map are kept in sync");
            record.state = state.clone();
            record.kind = state.kind;
        }
        updated.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        // Collisions resolve against the full index, before leavers go.
        self.last_collisions = report
            .collisions
            .iter()
            .filter_map(|(a, b)| {
                Some((
                    *self.native_index.get(a)?,
                    *self.native_index.get(b)?,
                ))
            })
            .collect();

        for (native, id) in &left {
            self.native_index.shift_remove(native);
            self.live.shift_remove(id);
        }

        // Neighbour references resolve post-removal: a leader that left
        // this tick reads as absent, which is what the encoder wants.
        let resolved: Vec<(VehicleId, Option<(VehicleId, f64)>, Option<(VehicleId, f64)>)> = self
            .live
            .iter()
            .map(|(&id, rec)| {
                let resolve = |n: &Option<(NativeId, f64)>| {
                    n.as_ref()
                        .and_then(|(native, gap)| Some((*self.native_index.get(native)?, *gap)))
                };
                (id, resolve(&rec.state.leader), resolve(&rec.state.follower))
            })
            .collect();
        for (id, leader, follower) in resolved {
            let rec = self
                .live
                .get_mut(&id)
                .expect("resolved ids come from the live map");
            rec.leader = leader;
            rec.follower = follower;
        }

        FleetDelta {
            entered,
            left: left.into_iter().map(|(_, id)| id).collect(),
            updated: updated.into_iter().map(|(_, id)| id).collect(),
        }
    }

    /// Logical ID for a native ID, if that vehicle is live.
    pub fn resolve(&self, native: &NativeId) -> Option<VehicleId> {
        self.native_index.get(native).copied()
    }

    /// Native ID for a logical ID, if that vehicle is live.
    pub fn native_of(&self, id: VehicleId) -> Option<&NativeId> {
        self.live.get(&id).map(|r| &r.native)
    }

    /// The full record for a live vehicle.
    pub fn get(&self, id: VehicleId) -> Option<&VehicleRecord> {
        self.live.get(&id)
    }

    /// Whether a logical ID refers to a currently live vehicle.
    pub fn is_live(&self, id: VehicleId) -> bool {
        self.live.contains_key(&id)
    }

    /// Number of live vehicles.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no vehicle is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Live controlled vehicles, sorted ascending by native ID.
    pub fn controlled_ids(&self) -> Vec<VehicleId> {
        let mut ids: Vec<(&NativeId, VehicleId)> = self
            .live
            .values()
            .filter(|r| r.kind.is_controlled())
            .map(|r| (&r.native, r.id))
            .collect();
        ids.sort_unstable_by(|a, b| a.0.cmp(b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Iterate all live records in entry order.
    pub fn iter(&self) -> impl Iterator<Item = &VehicleRecord> {
        self.live.values()
    }

    /// Owned copy of the live population at the current tick.
    pub fn snapshot(&self) -> crate::snapshot::FleetSnapshot {
        crate::snapshot::FleetSnapshot {
            tick: self.tick,
            vehicles: self.live.clone(),
            collisions: self.last_collisions.clone(),
        }
    }
}
