//! Owned, immutable copies of the live population.

use indexmap::IndexMap;

use tarmac_core::{TickId, VehicleId};

use crate::registry::VehicleRecord;

/// The live population at one tick, decoupled from the registry.
///
/// Snapshots are what reward policies and episode bookkeeping read:
/// owning the data keeps those layers pure functions of explicit
/// inputs, and lets an episode hold a before/after lineage while the
/// registry mutates underneath.
#[derive(Clone, Debug, PartialEq)]
pub struct FleetSnapshot {
    /// Tick this snapshot was taken at.
    pub tick: TickId,
    /// Every live vehicle, keyed by logical ID, in entry order.
    pub vehicles: IndexMap<VehicleId, VehicleRecord>,
    /// Collision pairs from this tick, resolved to logical IDs.
    pub collisions: Vec<(VehicleId, VehicleId)>,
}

impl FleetSnapshot {
    /// An empty snapshot at tick 0.
    pub fn empty() -> Self {
        Self {
            tick: TickId(0),
            vehicles: IndexMap::new(),
            collisions: Vec::new(),
        }
    }

    /// Look up one vehicle.
    pub fn get(&self, id: VehicleId) -> Option<&VehicleRecord> {
        self.vehicles.get(&id)
    }

    /// Number of live vehicles.
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Whether the snapshot holds no vehicles.
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    /// Whether any collision happened this tick.
    pub fn has_collision(&self) -> bool {
        !self.collisions.is_empty()
    }

    /// Live controlled vehicles, sorted ascending by native ID.
    pub fn controlled_ids(&self) -> Vec<VehicleId> {
        let mut ids: Vec<(&str, VehicleId)> = self
            .vehicles
            .values()
            .filter(|r| r.kind.is_controlled())
            .map(|r| (r.native.as_str(), r.id))
            .collect();
        ids.sort_unstable_by(|a, b| a.0.cmp(b.0));
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Mean speed over all live vehicles, in m/s. 0.0 when empty.
    pub fn mean_speed(&self) -> f64 {
        if self.vehicles.is_empty() {
            return 0.0;
        }
        let total: f64 = self.vehicles.values().map(|r| r.state.speed).sum();
        total / self.vehicles.len() as f64
    }
}
