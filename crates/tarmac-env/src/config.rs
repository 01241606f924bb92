//! Environment configuration, validation, and error types.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tarmac_net::{Network, ScenarioConfig, ScenarioError};
use tarmac_obs::{ActionBounds, ObsError, ObsSpec};
use tarmac_reward::Policy;

/// Builder-input for constructing an environment.
///
/// Everything here is static per scenario class. The observation and
/// action spaces are derived from this struct once, at construction,
/// and never re-derived from live simulation state.
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// The static road network (scenario-provider boundary).
    pub network: Arc<Network>,
    /// Scenario class: placement template plus seed.
    pub scenario: ScenarioConfig,
    /// Episode length in steps. At least 1.
    pub horizon: u64,
    /// Simulator-driven steps run at reset before control begins.
    pub warmup_steps: u64,
    /// Controlled-vehicle cap; fixes the space shapes.
    pub max_controlled: usize,
    /// Per-agent observation features.
    pub obs: ObsSpec,
    /// Per-agent action shape and bounds.
    pub actions: ActionBounds,
    /// Reward shaping and termination condition.
    pub policy: Policy,
    /// Kernel order-buffer capacity. At least 1.
    pub order_buffer_capacity: usize,
    /// Simulator ticks per environment step. At least 1.
    pub sub_steps: u32,
}

impl EnvConfig {
    /// A ring-road configuration with the conventional defaults:
    /// highway POV observation, symmetric 1 m/s² accelerations,
    /// desired-velocity reward, collision termination.
    pub fn ring_defaults(network: Arc<Network>, scenario: ScenarioConfig, horizon: u64) -> Self {
        let max_controlled = scenario.placement.controlled.max(1) as usize;
        let target = network.max_speed() * 0.8;
        Self {
            network,
            scenario,
            horizon,
            warmup_steps: 0,
            max_controlled,
            obs: ObsSpec::highway_pov(),
            actions: ActionBounds::symmetric(1.0),
            policy: Policy::desired_velocity(target),
            order_buffer_capacity: 256,
            sub_steps: 1,
        }
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        if self.max_controlled == 0 {
            return Err(ConfigError::ZeroMaxControlled);
        }
        if self.order_buffer_capacity == 0 {
            return Err(ConfigError::ZeroOrderBuffer);
        }
        if self.sub_steps == 0 {
            return Err(ConfigError::ZeroSubSteps);
        }
        self.scenario.validate().map_err(ConfigError::Scenario)?;
        self.obs.validate().map_err(ConfigError::Obs)?;
        self.actions.validate().map_err(ConfigError::Obs)?;
        Ok(())
    }
}

/// Errors detected during [`EnvConfig::validate()`] or environment
/// construction.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Horizon must be at least one step.
    ZeroHorizon,
    /// The controlled-vehicle cap must be at least 1.
    ZeroMaxControlled,
    /// Order-buffer capacity must be at least 1.
    ZeroOrderBuffer,
    /// Sub-step count must be at least 1.
    ZeroSubSteps,
    /// The scenario template is invalid or cannot be built on the
    /// network.
    Scenario(ScenarioError),
    /// Observation spec or action bounds are invalid.
    Obs(ObsError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroHorizon => write!(f, "horizon must be at least 1"),
            Self::ZeroMaxControlled => write!(f, "max_controlled must be at least 1"),
            Self::ZeroOrderBuffer => write!(f, "order_buffer_capacity must be at least 1"),
            Self::ZeroSubSteps => write!(f, "sub_steps must be at least 1"),
            Self::Scenario(e) => write!(f, "scenario: {e}"),
            Self::Obs(e) => write!(f, "spaces: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Scenario(e) => Some(e),
            Self::Obs(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ScenarioError> for ConfigError {
    fn from(e: ScenarioError) -> Self {
        ConfigError::Scenario(e)
    }
}

impl From<ObsError> for ConfigError {
    fn from(e: ObsError) -> Self {
        ConfigError::Obs(e)
    }
}
