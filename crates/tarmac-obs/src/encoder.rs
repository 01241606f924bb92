//! Fixed-shape observation encoding with padding and masking.

use std::sync::Arc;

use tarmac_fleet::{FleetSnapshot, VehicleRecord};
use tarmac_net::Network;

use crate::slots::SlotMap;
use crate::spec::{Feature, ObsSpec};
use crate::PAD_SENTINEL;

/// Encodes the live controlled population into a fixed-shape vector.
///
/// The encoder captures its normalizing constants (network max speed,
/// total length, widest lane count) at construction from static
/// topology. At encode time it walks the slot map: occupied slots get
/// their feature block and mask bit 1, empty slots get
/// [`PAD_SENTINEL`] and mask bit 0.
#[derive(Debug)]
pub struct ObsEncoder {
    spec: ObsSpec,
    network: Arc<Network>,
    max_controlled: usize,
    max_speed: f64,
    total_length: f64,
    max_lanes: u8,
}

impl ObsEncoder {
    /// Build an encoder for one scenario class.
    pub fn new(network: Arc<Network>, spec: ObsSpec, max_controlled: usize) -> Self {
        let max_speed = network.max_speed();
        let total_length = network.total_length();
        let max_lanes = network.max_lanes();
        Self {
            spec,
            network,
            max_controlled,
            max_speed,
            total_length,
            max_lanes,
        }
    }

    /// Flat output length: `max_controlled × feature width`.
    pub fn output_len(&self) -> usize {
        self.max_controlled * self.spec.width()
    }

    /// Number of mask bytes (one per slot).
    pub fn mask_len(&self) -> usize {
        self.max_controlled
    }

    /// Fill `out` and `mask` from the snapshot.
    ///
    /// `out` is resized to [`output_len`](Self::output_len) and `mask`
    /// to [`mask_len`](Self::mask_len); previous contents are
    /// discarded. A slot whose vehicle is absent from the snapshot
    /// (departed after the slot map was updated) pads like an empty
    /// slot.
    pub fn encode(&self, snapshot: &FleetSnapshot, slots: &SlotMap, out: &mut Vec<f32>, mask: &mut Vec<u8>) {
        out.clear();
        out.resize(self.output_len(), PAD_SENTINEL);
        mask.clear();
        mask.resize(self.mask_len(), 0);

        let width = self.spec.width();
        for slot in 0..self.max_controlled {
            let Some(id) = slots.vehicle_at(slot) else {
                continue;
            };
            let Some(record) = snapshot.get(id) else {
                continue;
            };
            let block = &mut out[slot * width..(slot + 1) * width];
            self.fill_agent(record, snapshot, block);
            mask[slot] = 1;
        }
    }

    /// Encode one agent's feature block (multi-agent view).
    pub fn encode_agent(&self, record: &VehicleRecord, snapshot: &FleetSnapshot) -> Vec<f32> {
        let mut block = vec![PAD_SENTINEL; self.spec.width()];
        self.fill_agent(record, snapshot, &mut block);
        block
    }

    fn fill_agent(&self, record: &VehicleRecord, snapshot: &FleetSnapshot, block: &mut [f32]) {
        for (i, &feature) in self.spec.features.iter().enumerate() {
            block[i] = self.feature_value(feature, record, snapshot);
        }
    }

    fn feature_value(
        &self,
        feature: Feature,
        record: &VehicleRecord,
        snapshot: &FleetSnapshot,
    ) -> f32 {
        let speed = record.state.speed;
        match feature {
            Feature::EgoSpeed => (speed / self.max_speed) as f32,
            Feature::LeaderSpeedDelta => {
                // Invisible leader reads as free-flowing traffic ahead.
                let leader_speed = record
                    .leader
                    .and_then(|(id, _)| snapshot.get(id))
                    .map_or(self.max_speed, |r| r.state.speed);
                ((leader_speed - speed) / self.max_speed) as f32
            }
            Feature::LeaderGap => {
                let gap = record.leader.map_or(self.total_length, |(_, gap)| gap);
                (gap / self.total_length) as f32
            }
            Feature::FollowerSpeedDelta => {
                // Invisible follower reads as stationary.
                let follower_speed = record
                    .follower
                    .and_then(|(id, _)| snapshot.get(id))
                    .map_or(0.0, |r| r.state.speed);
                ((speed - follower_speed) / self.max_speed) as f32
            }
            Feature::FollowerGap => {
                let gap = record.follower.map_or(self.total_length, |(_, gap)| gap);
                (gap / self.total_length) as f32
            }
            Feature::RoutePosition => {
                let abs = self
                    .network
                    .absolute_position(record.state.edge, record.state.lane_pos)
                    .unwrap_or(0.0);
                (abs / self.total_length) as f32
            }
            Feature::LaneIndex => {
                if self.max_lanes <= 1 {
                    0.0
                } else {
                    record.state.lane as f32 / (self.max_lanes - 1) as f32
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tarmac_core::{
        EdgeId, NativeId, RouteId, TickId, VehicleId, VehicleKind, VehicleKinematics,
    };
    use tarmac_net::ring_network;

    fn record(id: u64, native: &str, speed: f64) -> VehicleRecord {
        VehicleRecord {
            id: VehicleId(id),
            native: NativeId::from(native),
            kind: VehicleKind::Controlled,
            state: VehicleKinematics {
                speed,
                ..VehicleKinematics::at_rest(VehicleKind::Controlled, EdgeId(0), RouteId(0))
            },
            leader: None,
            follower: None,
            entered_at: TickId(0),
        }
    }

    fn snapshot_of(records: Vec<VehicleRecord>) -> FleetSnapshot {
        let mut vehicles = IndexMap::new();
        for r in records {
            vehicles.insert(r.id, r);
        }
        FleetSnapshot {
            tick: TickId(1),
            vehicles,
            collisions: vec![],
        }
    }

    // Ring of 200 m, max speed 10 m/s.
    fn encoder(max_controlled: usize) -> ObsEncoder {
        ObsEncoder::new(
            Arc::new(ring_network(200.0, 1, 10.0)),
            ObsSpec::highway_pov(),
            max_controlled,
        )
    }

    #[test]
    fn empty_slots_are_padded_and_masked() {
        let enc = encoder(3);
        let mut slots = SlotMap::new(3);
        slots.update(&[VehicleId(0)], &[]);
        let snap = snapshot_of(vec![record(0, "av_0", 5.0)]);

        let (mut out, mut mask) = (Vec::new(), Vec::new());
        enc.encode(&snap, &slots, &mut out, &mut mask);

        assert_eq!(out.len(), 15);
        assert_eq!(mask, vec![1, 0, 0]);
        // Slot 0 is live: ego speed 5/10.
        assert_eq!(out[0], 0.5);
        // Slots 1 and 2 are all sentinel.
        assert!(out[5..].iter().all(|&v| v == PAD_SENTINEL));
    }

    #[test]
    fn absent_neighbours_use_fallbacks() {
        let enc = encoder(1);
        let mut slots = SlotMap::new(1);
        slots.update(&[VehicleId(0)], &[]);
        let snap = snapshot_of(vec![record(0, "av_0", 4.0)]);

        let (mut out, mut mask) = (Vec::new(), Vec::new());
        enc.encode(&snap, &slots, &mut out, &mut mask);

        // LeaderSpeedDelta: (10 - 4) / 10.
        assert!((out[1] - 0.6).abs() < 1e-6);
        // LeaderGap: full length.
        assert_eq!(out[2], 1.0);
        // FollowerSpeedDelta: (4 - 0) / 10.
        assert!((out[3] - 0.4).abs() < 1e-6);
        // FollowerGap: full length.
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn visible_leader_uses_reported_gap_and_speed() {
        let enc = encoder(1);
        let mut slots = SlotMap::new(1);
        slots.update(&[VehicleId(0)], &[]);

        let mut ego = record(0, "av_0", 4.0);
        ego.leader = Some((VehicleId(1), 20.0));
        let lead = record(1, "human_0", 8.0);
        let snap = snapshot_of(vec![ego, lead]);

        let (mut out, mut mask) = (Vec::new(), Vec::new());
        enc.encode(&snap, &slots, &mut out, &mut mask);

        // LeaderSpeedDelta: (8 - 4) / 10.
        assert!((out[1] - 0.4).abs() < 1e-6);
        // LeaderGap: 20 / 200.
        assert!((out[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn slot_vehicle_missing_from_snapshot_pads() {
        let enc = encoder(1);
        let mut slots = SlotMap::new(1);
        slots.update(&[VehicleId(7)], &[]);
        let snap = snapshot_of(vec![]);

        let (mut out, mut mask) = (Vec::new(), Vec::new());
        enc.encode(&snap, &slots, &mut out, &mut mask);
        assert_eq!(mask, vec![0]);
        assert!(out.iter().all(|&v| v == PAD_SENTINEL));
    }

    #[test]
    fn encode_agent_matches_slot_block() {
        let enc = encoder(2);
        let mut slots = SlotMap::new(2);
        slots.update(&[VehicleId(0)], &[]);
        let snap = snapshot_of(vec![record(0, "av_0", 5.0)]);

        let (mut out, mut mask) = (Vec::new(), Vec::new());
        enc.encode(&snap, &slots, &mut out, &mut mask);
        let block = enc.encode_agent(snap.get(VehicleId(0)).unwrap(), &snap);
        assert_eq!(&out[..5], block.as_slice());
    }
}
