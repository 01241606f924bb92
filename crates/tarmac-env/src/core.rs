//! Shared step/reset plumbing behind [`Env`](crate::Env) and
//! [`MultiEnv`](crate::MultiEnv).

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use tarmac_core::{
    EnvError, OrderDropReason, Receipt, TickId, VehicleId, VehicleOrder,
};
use tarmac_fleet::{FleetRegistry, FleetSnapshot};
use tarmac_kernel::{SimKernel, Transport};
use tarmac_net::Scenario;
use tarmac_obs::{
    build_spaces, ActionDecoder, DecodedActions, ObsEncoder, SlotMap, SpacePair,
};
use tarmac_reward::{DoneReason, Transition};

use crate::config::{ConfigError, EnvConfig};
use crate::episode::EpisodePhase;
use crate::metrics::StepMetrics;

/// Microseconds elapsed since `start`, saturated into u64.
pub(crate) fn us_since(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Bookkeeping from one advance, shared by both wrappers.
pub(crate) struct StepAccounting {
    /// Drop receipts from decode, resolution, and buffer rejection.
    pub receipts: Vec<Receipt>,
    /// Kernel tick after the advance.
    pub tick: TickId,
    /// Vehicles entered during the step (all kinds).
    pub entered: usize,
    /// Vehicles left during the step (all kinds).
    pub left: usize,
    /// Controlled entrants that found no free observation slot.
    pub slot_overflow: usize,
}

/// The engine both environment flavors drive.
///
/// Owns the kernel, registry, slot map, encoder/decoder, and the
/// before/after snapshot pair. Wrappers differ only in how they decode
/// actions and package observations/rewards.
pub(crate) struct EnvCore<T: Transport> {
    pub(crate) config: EnvConfig,
    pub(crate) scenario: Scenario,
    pub(crate) spaces: SpacePair,
    pub(crate) decoder: ActionDecoder,
    pub(crate) phase: EpisodePhase,
    pub(crate) metrics: StepMetrics,
    kernel: SimKernel<T>,
    registry: FleetRegistry,
    slots: SlotMap,
    encoder: ObsEncoder,
    step_index: u64,
    /// Fleet state before the most recent step.
    before: FleetSnapshot,
    /// Fleet state after the most recent step (or reset).
    after: FleetSnapshot,
}

impl<T: Transport> EnvCore<T> {
    pub(crate) fn new(config: EnvConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        let scenario = Scenario::build(Arc::clone(&config.network), config.scenario.clone())?;
        let spaces = build_spaces(
            &config.network,
            &config.obs,
            &config.actions,
            config.max_controlled,
        )?;
        let encoder = ObsEncoder::new(
            Arc::clone(&config.network),
            config.obs.clone(),
            config.max_controlled,
        );
        let decoder = ActionDecoder::new(config.actions.clone(), config.max_controlled);
        let kernel = SimKernel::new(transport, config.order_buffer_capacity, config.sub_steps);
        let slots = SlotMap::new(config.max_controlled);

        Ok(Self {
            config,
            scenario,
            spaces,
            decoder,
            phase: EpisodePhase::Uninitialized,
            metrics: StepMetrics::default(),
            kernel,
            registry: FleetRegistry::new(),
            slots,
            encoder,
            step_index: 0,
            before: FleetSnapshot::empty(),
            after: FleetSnapshot::empty(),
        })
    }

    /// Discard any live episode and start a fresh one.
    ///
    /// Relaunches the kernel (in-flight orders are discarded), rebuilds
    /// the registry and slot map, runs the configured warmup, and
    /// leaves the environment in `Ready` with the first snapshot
    /// taken. Any failure keeps the phase at `Uninitialized` — the
    /// episode never reached READY.
    pub(crate) fn reset(&mut self) -> Result<(), EnvError> {
        self.phase = EpisodePhase::Uninitialized;
        self.registry = FleetRegistry::new();
        self.slots.clear();
        self.step_index = 0;

        let report = self
            .kernel
            .reset(&self.scenario)
            .map_err(|e| EnvError::Init {
                reason: e.to_string(),
            })?;
        let delta = self.registry.apply_report(report);
        let entered = controlled_subset(&self.registry, &delta.entered);
        self.slots.update(&entered, &[]);

        for _ in 0..self.config.warmup_steps {
            let advance = self.kernel.advance_time().map_err(|e| EnvError::Init {
                reason: e.to_string(),
            })?;
            let delta = self.registry.apply_report(advance.report);
            let entered = controlled_subset(&self.registry, &delta.entered);
            self.slots.update(&entered, &delta.left);
        }

        self.after = self.registry.snapshot();
        self.before = self.after.clone();
        self.phase = EpisodePhase::Ready;
        self.metrics.total_episodes += 1;
        Ok(())
    }

    /// Reject steps in phases where stepping is illegal.
    pub(crate) fn guard_step(&self) -> Result<(), EnvError> {
        match self.phase {
            EpisodePhase::Uninitialized => Err(EnvError::NotReset),
            EpisodePhase::Done => Err(EnvError::EpisodeAlreadyDone),
            EpisodePhase::Aborted => Err(EnvError::EpisodeAborted),
            EpisodePhase::Ready | EpisodePhase::Running => Ok(()),
        }
    }

    /// Submit decoded intents, advance one tick, reconcile churn.
    ///
    /// On a simulator failure the phase latches to `Aborted` and the
    /// kernel error surfaces unchanged — never folded into `done`.
    pub(crate) fn advance_with(
        &mut self,
        decoded: DecodedActions,
        step_start: Instant,
    ) -> Result<StepAccounting, EnvError> {
        let mut receipts = decoded.receipts;

        // Resolve logical intents to native orders. A target that
        // vanished between decode and here is absorbed like any other
        // churn race.
        let issued_at = self.kernel.tick();
        let mut orders = Vec::with_capacity(decoded.intents.len());
        for (i, (id, op)) in decoded.intents.into_iter().enumerate() {
            match self.registry.native_of(id) {
                Some(native) => orders.push(VehicleOrder {
                    target: native.clone(),
                    op,
                    issued_at,
                    arrival_seq: 0,
                }),
                None => receipts.push(Receipt::dropped(
                    i,
                    OrderDropReason::UnknownVehicle { target: id },
                )),
            }
        }
        let orders_submitted = orders.len();
        let submit_receipts = self.kernel.submit_orders(orders);
        receipts.extend(submit_receipts.into_iter().filter(|r| !r.accepted));
        self.metrics.decode_us = us_since(step_start);

        let advance_start = Instant::now();
        let (tick, delta, orders_applied, collisions) = match self.kernel.advance_time() {
            Ok(advance) => {
                let tick = advance.report.tick;
                let collisions = advance.report.collisions.len();
                let orders_applied = advance.orders_applied;
                let delta = self.registry.apply_report(advance.report);
                (tick, delta, orders_applied, collisions)
            }
            Err(e) => {
                self.phase = EpisodePhase::Aborted;
                return Err(EnvError::Simulator(e));
            }
        };
        self.metrics.advance_us = us_since(advance_start);

        let registry_start = Instant::now();
        let entered = controlled_subset(&self.registry, &delta.entered);
        let slot_overflow = self.slots.update(&entered, &delta.left);
        self.before = std::mem::replace(&mut self.after, self.registry.snapshot());
        self.step_index += 1;
        self.metrics.registry_us = us_since(registry_start);

        self.metrics.live_vehicles = self.after.len();
        self.metrics.entered = delta.entered.len();
        self.metrics.left = delta.left.len();
        self.metrics.orders_submitted = orders_submitted;
        self.metrics.orders_applied = orders_applied;
        self.metrics.total_orders_dropped += receipts.len() as u64;
        self.metrics.total_collisions += collisions as u64;

        Ok(StepAccounting {
            receipts,
            tick,
            entered: delta.entered.len(),
            left: delta.left.len(),
            slot_overflow,
        })
    }

    /// The transition the reward policy evaluates.
    pub(crate) fn transition(&self) -> Transition<'_> {
        Transition {
            before: &self.before,
            after: &self.after,
            network: &self.config.network,
            step: self.step_index,
            horizon: self.config.horizon,
        }
    }

    /// Move the phase according to the policy's verdict.
    pub(crate) fn settle(&mut self, done: Option<DoneReason>) {
        self.phase = if done.is_some() {
            EpisodePhase::Done
        } else {
            EpisodePhase::Running
        };
    }

    /// Encode the flat observation and mask for the current state.
    pub(crate) fn encode_current(&self, out: &mut Vec<f32>, mask: &mut Vec<u8>) {
        self.encoder.encode(&self.after, &self.slots, out, mask);
    }

    /// Validity mask over observation slots for the current state.
    pub(crate) fn slot_mask(&self) -> Vec<u8> {
        (0..self.slots.capacity())
            .map(|slot| match self.slots.vehicle_at(slot) {
                Some(id) if self.after.get(id).is_some() => 1,
                _ => 0,
            })
            .collect()
    }

    /// Per-agent observations for every live controlled vehicle.
    pub(crate) fn encode_agents(&self) -> IndexMap<VehicleId, Vec<f32>> {
        let mut out = IndexMap::new();
        for id in self.after.controlled_ids() {
            if let Some(record) = self.after.get(id) {
                out.insert(id, self.encoder.encode_agent(record, &self.after));
            }
        }
        out
    }

    pub(crate) fn registry(&self) -> &FleetRegistry {
        &self.registry
    }

    pub(crate) fn slots(&self) -> &SlotMap {
        &self.slots
    }

    pub(crate) fn snapshot(&self) -> &FleetSnapshot {
        &self.after
    }

    pub(crate) fn tick(&self) -> TickId {
        self.kernel.tick()
    }

    pub(crate) fn step_index(&self) -> u64 {
        self.step_index
    }
}

/// Filter a delta ID list down to controlled vehicles, preserving
/// order.
fn controlled_subset(registry: &FleetRegistry, ids: &[VehicleId]) -> Vec<VehicleId> {
    ids.iter()
        .copied()
        .filter(|&id| {
            registry
                .get(id)
                .map(|r| r.kind.is_controlled())
                .unwrap_or(false)
        })
        .collect()
}
