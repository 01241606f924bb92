//! Single-agent environment.

use std::time::Instant;

use tarmac_core::{EnvError, Receipt, TickId};
use tarmac_fleet::FleetSnapshot;
use tarmac_kernel::Transport;
use tarmac_net::Scenario;
use tarmac_obs::BoxSpace;
use tarmac_reward::DoneReason;

use crate::config::{ConfigError, EnvConfig};
use crate::core::{us_since, EnvCore};
use crate::episode::EpisodePhase;
use crate::metrics::StepMetrics;

/// Auxiliary data accompanying every step result.
#[derive(Clone, Debug)]
pub struct StepInfo {
    /// 1-based step index within the episode.
    pub step: u64,
    /// Kernel tick after the step.
    pub tick: TickId,
    /// Why the episode ended, if it did.
    pub done_reason: Option<DoneReason>,
    /// Vehicles that entered during the step (all kinds).
    pub entered: usize,
    /// Vehicles that left during the step (all kinds).
    pub left: usize,
    /// Vehicles live after the step.
    pub live_vehicles: usize,
    /// Controlled entrants that found no observation slot.
    pub slot_overflow: usize,
    /// Per-slot validity mask (1 = live vehicle, 0 = padding).
    pub mask: Vec<u8>,
    /// Receipts for orders dropped this step (stale target, no
    /// control authority, buffer full). Dropped orders never fail the
    /// step.
    pub dropped_orders: Vec<Receipt>,
    /// Timing and churn metrics for this step.
    pub metrics: StepMetrics,
}

/// Result of one successful [`Env::step`] call: the conventional
/// (observation, reward, done, info) tuple.
#[derive(Clone, Debug)]
pub struct StepOutcome {
    /// Fixed-shape flat observation.
    pub observation: Vec<f32>,
    /// Scalar reward.
    pub reward: f64,
    /// Whether the episode terminated with this step.
    pub done: bool,
    /// Auxiliary step data.
    pub info: StepInfo,
}

/// Single-agent environment over one owned simulator kernel.
///
/// Space descriptors are queryable immediately after construction,
/// before the first `reset()` — their shape depends only on the
/// configuration, never on live state.
///
/// # Example
///
/// ```ignore
/// let mut env = Env::new(config, transport)?;
/// let mut obs = env.reset()?;
/// loop {
///     let outcome = env.step(&action)?;
///     obs = outcome.observation;
///     if outcome.done {
///         break;
///     }
/// }
/// ```
pub struct Env<T: Transport> {
    core: EnvCore<T>,
}

impl<T: Transport> Env<T> {
    /// Validate the configuration and build the environment.
    ///
    /// Builds the scenario and the cached space pair; does not touch
    /// the simulator (that happens at the first `reset()`).
    pub fn new(config: EnvConfig, transport: T) -> Result<Self, ConfigError> {
        Ok(Self {
            core: EnvCore::new(config, transport)?,
        })
    }

    /// The flat observation space.
    pub fn observation_space(&self) -> &BoxSpace {
        &self.core.spaces.observation
    }

    /// The flat action space.
    pub fn action_space(&self) -> &BoxSpace {
        &self.core.spaces.action
    }

    /// The scenario this environment instantiates at each reset.
    pub fn scenario(&self) -> &Scenario {
        &self.core.scenario
    }

    /// Where the episode lifecycle currently stands.
    pub fn phase(&self) -> EpisodePhase {
        self.core.phase
    }

    /// Kernel tick (0 after reset).
    pub fn current_tick(&self) -> TickId {
        self.core.tick()
    }

    /// Fleet state after the most recent step or reset.
    pub fn snapshot(&self) -> &FleetSnapshot {
        self.core.snapshot()
    }

    /// Metrics from the most recent step.
    pub fn metrics(&self) -> &StepMetrics {
        &self.core.metrics
    }

    /// Start a fresh episode and return the first observation.
    ///
    /// Any live episode is discarded wholesale; buffered orders are
    /// dropped.
    ///
    /// # Errors
    ///
    /// [`EnvError::Init`] if the kernel fails to launch or warmup
    /// fails — the episode never reaches READY.
    pub fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        self.core.reset()?;
        let mut observation = Vec::new();
        let mut mask = Vec::new();
        self.core.encode_current(&mut observation, &mut mask);
        Ok(observation)
    }

    /// Apply one flat action and advance the episode by one step.
    ///
    /// # Errors
    ///
    /// - [`EnvError::NotReset`] before the first `reset()`.
    /// - [`EnvError::EpisodeAlreadyDone`] when stepping past
    ///   termination (misuse; `reset()` first).
    /// - [`EnvError::EpisodeAborted`] when stepping after a simulator
    ///   failure (broken trajectory; `reset()` first).
    /// - [`EnvError::ActionShape`] for a wrong-length action.
    /// - [`EnvError::Simulator`] when the simulator fails during this
    ///   step; the episode is aborted, not marked done.
    pub fn step(&mut self, action: &[f32]) -> Result<StepOutcome, EnvError> {
        self.core.guard_step()?;
        let expected = self.core.decoder.flat_len();
        if action.len() != expected {
            return Err(EnvError::ActionShape {
                expected,
                got: action.len(),
            });
        }

        let step_start = Instant::now();
        let decoded = self
            .core
            .decoder
            .decode_flat(action, self.core.slots(), self.core.registry());
        let accounting = self.core.advance_with(decoded, step_start)?;

        let reward_start = Instant::now();
        let judgment = self.core.config.policy.evaluate(&self.core.transition());
        self.core.metrics.reward_us = us_since(reward_start);
        self.core.settle(judgment.done);

        let encode_start = Instant::now();
        let mut observation = Vec::new();
        let mut mask = Vec::new();
        self.core.encode_current(&mut observation, &mut mask);
        self.core.metrics.encode_us = us_since(encode_start);
        self.core.metrics.total_us = us_since(step_start);

        Ok(StepOutcome {
            observation,
            reward: judgment.reward,
            done: judgment.done.is_some(),
            info: StepInfo {
                step: self.core.step_index(),
                tick: accounting.tick,
                done_reason: judgment.done,
                entered: accounting.entered,
                left: accounting.left,
                live_vehicles: self.core.snapshot().len(),
                slot_overflow: accounting.slot_overflow,
                mask,
                dropped_orders: accounting.receipts,
                metrics: self.core.metrics.clone(),
            },
        })
    }
}

impl<T: Transport> std::fmt::Debug for Env<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env")
            .field("scenario", &self.core.scenario.name())
            .field("phase", &self.core.phase)
            .field("step", &self.core.step_index())
            .field("tick", &self.core.tick())
            .finish()
    }
}
