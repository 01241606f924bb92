//! Action decoding: fixed-shape vectors back into vehicle intents.

use indexmap::IndexMap;

use tarmac_core::{LaneChange, OrderDropReason, OrderOp, Receipt, VehicleId};
use tarmac_fleet::FleetRegistry;

use crate::slots::SlotMap;
use crate::spec::ActionBounds;

/// Result of decoding one action.
///
/// `intents` address vehicles by logical ID; the environment core
/// resolves them to native orders just before kernel submission.
/// `receipts` cover every dropped slot/key — stale targets are
/// absorbed here, never surfaced as step failures.
#[derive(Debug, Default)]
pub struct DecodedActions {
    /// Operations for live controlled vehicles, in slot/key order.
    pub intents: Vec<(VehicleId, OrderOp)>,
    /// Drop receipts for stale or unauthorized targets.
    pub receipts: Vec<Receipt>,
}

/// Decodes flat action vectors and per-agent action maps.
#[derive(Clone, Debug)]
pub struct ActionDecoder {
    bounds: ActionBounds,
    max_controlled: usize,
}

impl ActionDecoder {
    /// Build a decoder for one scenario class.
    pub fn new(bounds: ActionBounds, max_controlled: usize) -> Self {
        Self {
            bounds,
            max_controlled,
        }
    }

    /// Channels per agent slot.
    pub fn action_width(&self) -> usize {
        self.bounds.width()
    }

    /// Expected flat action length.
    pub fn flat_len(&self) -> usize {
        self.max_controlled * self.bounds.width()
    }

    /// Decode a flat single-policy action vector.
    ///
    /// Slot addressing comes from the slot map: empty slots are
    /// skipped silently (the mask already told the policy they were
    /// empty), occupied slots whose vehicle is no longer live produce
    /// an `UnknownVehicle` receipt. `action` must have
    /// [`flat_len`](Self::flat_len) elements; the caller validates
    /// shape before decoding.
    pub fn decode_flat(
        &self,
        action: &[f32],
        slots: &SlotMap,
        registry: &FleetRegistry,
    ) -> DecodedActions {
        let width = self.bounds.width();
        let mut out = DecodedActions::default();
        for slot in 0..self.max_controlled {
            let Some(id) = slots.vehicle_at(slot) else {
                continue;
            };
            let channels = &action[slot * width..(slot + 1) * width];
            self.decode_one(id, channels, slot, registry, &mut out);
        }
        out
    }

    /// Decode a per-agent action map (multi-agent policies).
    ///
    /// Keys addressing departed vehicles yield `UnknownVehicle`
    /// receipts; keys addressing background vehicles yield
    /// `Uncontrolled`. Each value must have
    /// [`action_width`](Self::action_width) elements.
    pub fn decode_map(
        &self,
        actions: &IndexMap<VehicleId, Vec<f32>>,
        registry: &FleetRegistry,
    ) -> DecodedActions {
        let mut out = DecodedActions::default();
        for (i, (&id, channels)) in actions.iter().enumerate() {
            self.decode_one(id, channels, i, registry, &mut out);
        }
        out
    }

    fn decode_one(
        &self,
        id: VehicleId,
        channels: &[f32],
        index: usize,
        registry: &FleetRegistry,
        out: &mut DecodedActions,
    ) {
        let Some(record) = registry.get(id) else {
            out.receipts.push(Receipt::dropped(
                index,
                OrderDropReason::UnknownVehicle { target: id },
            ));
            return;
        };
        if !record.kind.is_controlled() {
            out.receipts.push(Receipt::dropped(
                index,
                OrderDropReason::Uncontrolled { target: id },
            ));
            return;
        }

        let accel = self.bounds.clamp_accel(channels[0] as f64);
        out.intents.push((id, OrderOp::Accelerate { accel }));

        if self.bounds.lane_change {
            if let Some(direction) = decode_lane_change(&channels[1..4]) {
                out.intents.push((id, OrderOp::ChangeLane { direction }));
            }
        }
    }
}

/// Argmax over (left, stay, right) scores; `Stay` decodes to no order.
/// Ties resolve leftmost, matching the argmax convention.
fn decode_lane_change(scores: &[f32]) -> Option<LaneChange> {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate() {
        if s > scores[best] {
            best = i;
        }
    }
    match best {
        0 => Some(LaneChange::Left),
        2 => Some(LaneChange::Right),
        _ => None,
    }
}
