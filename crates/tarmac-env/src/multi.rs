//! Multi-agent environment.

use std::time::Instant;

use indexmap::IndexMap;

use tarmac_core::{EnvError, TickId, VehicleId};
use tarmac_fleet::FleetSnapshot;
use tarmac_kernel::Transport;
use tarmac_net::Scenario;
use tarmac_obs::BoxSpace;

use crate::config::{ConfigError, EnvConfig};
use crate::core::{us_since, EnvCore};
use crate::env::StepInfo;
use crate::episode::EpisodePhase;
use crate::metrics::StepMetrics;

/// Result of one successful [`MultiEnv::step`] call.
///
/// Maps are keyed by logical agent ID and contain exactly the
/// controlled vehicles live *after* the step: an agent that departed
/// mid-episode vanishes from the maps (its key is omitted, not filled
/// with a terminal placeholder), and a freshly entered controlled
/// vehicle appears. Departures alone never terminate the episode.
#[derive(Clone, Debug)]
pub struct MultiStepOutcome {
    /// Per-agent observations.
    pub observations: IndexMap<VehicleId, Vec<f32>>,
    /// Per-agent rewards.
    pub rewards: IndexMap<VehicleId, f64>,
    /// Shared episode-done signal.
    pub done: bool,
    /// Auxiliary step data (shared across agents).
    pub info: StepInfo,
}

/// Multi-agent environment over one owned simulator kernel.
///
/// The agent population is open: controlled vehicles may enter and
/// leave while the episode runs, and the policy is shared across them.
/// Per-agent space descriptors are queryable before the first
/// `reset()`.
pub struct MultiEnv<T: Transport> {
    core: EnvCore<T>,
    agent_obs_space: BoxSpace,
    agent_action_space: BoxSpace,
}

impl<T: Transport> MultiEnv<T> {
    /// Validate the configuration and build the environment.
    pub fn new(config: EnvConfig, transport: T) -> Result<Self, ConfigError> {
        let core = EnvCore::new(config, transport)?;
        let agent_obs_space = core.spaces.agent_observation()?;
        let agent_action_space = core.spaces.agent_action()?;
        Ok(Self {
            core,
            agent_obs_space,
            agent_action_space,
        })
    }

    /// Observation space of one agent.
    pub fn observation_space(&self) -> &BoxSpace {
        &self.agent_obs_space
    }

    /// Action space of one agent.
    pub fn action_space(&self) -> &BoxSpace {
        &self.agent_action_space
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

    /// Live controlled agents, sorted by native ID.
    pub fn agent_ids(&self) -> Vec<VehicleId> {
        self.core.snapshot().controlled_ids()
    }

    /// Start a fresh episode; returns the initial per-agent
    /// observations.
    ///
    /// # Errors
    ///
    /// [`EnvError::Init`] if the kernel fails to launch or warmup
    /// fails.
    pub fn reset(&mut self) -> Result<IndexMap<VehicleId, Vec<f32>>, EnvError> {
        self.core.reset()?;
        Ok(self.core.encode_agents())
    }

    /// Apply per-agent actions and advance the episode by one step.
    ///
    /// Actions keyed by departed agents are dropped with receipts
    /// (visible in `info.dropped_orders`); the step itself always
    /// proceeds. Each action value must have the per-agent action
    /// width.
    ///
    /// # Errors
    ///
    /// Same phase and simulator errors as [`Env::step`]
    /// (`NotReset`, `EpisodeAlreadyDone`, `EpisodeAborted`,
    /// `Simulator`), plus [`EnvError::ActionShape`] if any one
    /// agent's action has the wrong width.
    ///
    /// [`Env::step`]: crate::Env::step
    pub fn step(
        &mut self,
        actions: &IndexMap<VehicleId, Vec<f32>>,
    ) -> Result<MultiStepOutcome, EnvError> {
        self.core.guard_step()?;
        let expected = self.core.decoder.action_width();
        for action in actions.values() {
            if action.len() != expected {
                return Err(EnvError::ActionShape {
                    expected,
                    got: action.len(),
                });
            }
        }

        let step_start = Instant::now();
        let decoded = self.core.decoder.decode_map(actions, self.core.registry());
        let accounting = self.core.advance_with(decoded, step_start)?;

        let reward_start = Instant::now();
        let (rewards, done) = self
            .core
            .config
            .policy
            .evaluate_per_agent(&self.core.transition());
        self.core.metrics.reward_us = us_since(reward_start);
        self.core.settle(done);

        let encode_start = Instant::now();
        let observations = self.core.encode_agents();
        let mask = self.core.slot_mask();
        self.core.metrics.encode_us = us_since(encode_start);
        self.core.metrics.total_us = us_since(step_start);

        Ok(MultiStepOutcome {
            observations,
            rewards,
            done: done.is_some(),
            info: StepInfo {
                step: self.core.step_index(),
                tick: accounting.tick,
                done_reason: done,
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

impl<T: Transport> std::fmt::Debug for MultiEnv<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiEnv")
            .field("scenario", &self.core.scenario.name())
            .field("phase", &self.core.phase)
            .field("agents", &self.core.snapshot().controlled_ids().len())
            .finish()
    }
}
