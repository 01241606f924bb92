//! Stable assignment of controlled vehicles to observation slots.

use indexmap::IndexMap;

use tarmac_core::VehicleId;

/// Pins each controlled vehicle to a fixed slot for as long as it
/// lives.
///
/// Entrants take the lowest free slot (entrant lists arrive sorted by
/// native ID, so assignment is deterministic); a vehicle's slot is
/// freed only when it leaves and is never repacked mid-episode —
/// surviving agents must not shift position in the observation vector
/// just because a neighbour departed. Entrants past the cap stay
/// unassigned and are counted as overflow.
#[derive(Debug)]
pub struct SlotMap {
    slots: Vec<Option<VehicleId>>,
    by_vehicle: IndexMap<VehicleId, usize>,
}

impl SlotMap {
    /// An empty map with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            by_vehicle: IndexMap::new(),
        }
    }

    /// Apply one step of controlled-vehicle churn.
    ///
    /// `left` frees first so a same-tick replacement can take the
    /// freed slot. Returns the number of entrants that found no slot.
    pub fn update(&mut self, entered: &[VehicleId], left: &[VehicleId]) -> usize {
        for id in left {
            if let Some(slot) = self.by_vehicle.shift_remove(id) {
                self.slots[slot] = None;
            }
        }

        let mut overflow = 0;
        for &id in entered {
            match self.slots.iter().position(Option::is_none) {
                Some(slot) => {
                    self.slots[slot] = Some(id);
                    self.by_vehicle.insert(id, slot);
                }
                None => overflow += 1,
            }
        }
        overflow
    }

    /// The slot a vehicle occupies, if assigned.
    pub fn slot_of(&self, id: VehicleId) -> Option<usize> {
        self.by_vehicle.get(&id).copied()
    }

    /// The vehicle in a slot, if any.
    pub fn vehicle_at(&self, slot: usize) -> Option<VehicleId> {
        self.slots.get(slot).copied().flatten()
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn occupied(&self) -> usize {
        self.by_vehicle.len()
    }

    /// Free every slot (episode reset).
    pub fn clear(&mut self) {
        self.slots.fill(None);
        self.by_vehicle.clear();
    }
}
