//! Tarmac: a traffic-simulation environment layer for reinforcement
//! learning.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Tarmac sub-crates. For most users, adding `tarmac` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tarmac::prelude::*;
//!
//! // Static topology and a scenario class.
//! let network = Arc::new(tarmac::net::ring_network(400.0, 1, 10.0));
//! let scenario = ScenarioConfig {
//!     name: "ring".into(),
//!     placement: PlacementSpec {
//!         controlled: 2,
//!         background: 8,
//!         route: RouteId(0),
//!         spacing: 40.0,
//!         position_jitter: 3.0,
//!         depart_speed: 5.0,
//!     },
//!     seed: 42,
//! };
//!
//! // One environment over one owned simulator transport.
//! let config = EnvConfig::ring_defaults(network, scenario, 500);
//! let mut env = Env::new(config, my_transport)?;
//!
//! let mut obs = env.reset()?;
//! loop {
//!     let outcome = env.step(&policy(&obs))?;
//!     obs = outcome.observation;
//!     if outcome.done {
//!         break;
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tarmac-core` | IDs, kinematics, orders, reports, errors |
//! | [`net`] | `tarmac-net` | Networks, routes, scenarios |
//! | [`kernel`] | `tarmac-kernel` | Transport boundary, order buffer, kernel |
//! | [`fleet`] | `tarmac-fleet` | Entity registry and snapshots |
//! | [`obs`] | `tarmac-obs` | Spaces, encoding, decoding |
//! | [`reward`] | `tarmac-reward` | Reward/termination policies |
//! | [`env`] | `tarmac-env` | Environments, metrics, pools |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, IDs, and errors (`tarmac-core`).
pub use tarmac_core as types;

/// Networks, routes, and scenario construction (`tarmac-net`).
pub use tarmac_net as net;

/// Kernel interface over the external simulator (`tarmac-kernel`).
pub use tarmac_kernel as kernel;

/// Entity registry and fleet snapshots (`tarmac-fleet`).
pub use tarmac_fleet as fleet;

/// Observation/action spaces, encoding, decoding (`tarmac-obs`).
pub use tarmac_obs as obs;

/// Reward and termination policies (`tarmac-reward`).
pub use tarmac_reward as reward;

/// Single- and multi-agent environments (`tarmac-env`).
pub use tarmac_env as env;

/// Common imports for typical Tarmac usage.
///
/// ```
/// use tarmac::prelude::*;
/// ```
pub mod prelude {
    // IDs and core data
    pub use tarmac_core::{
        EdgeId, NativeId, NodeId, RouteId, StepReport, TickId, VehicleId, VehicleKind,
        VehicleKinematics, VehicleOrder,
    };

    // Errors
    pub use tarmac_core::{EnvError, KernelError, TransportError};

    // Orders and receipts
    pub use tarmac_core::{LaneChange, OrderDropReason, OrderOp, Receipt};

    // Networks and scenarios
    pub use tarmac_net::{Network, PlacementSpec, Scenario, ScenarioConfig};

    // Kernel
    pub use tarmac_kernel::{SimKernel, Transport};

    // Fleet
    pub use tarmac_fleet::{FleetDelta, FleetRegistry, FleetSnapshot};

    // Spaces
    pub use tarmac_obs::{ActionBounds, BoxSpace, ObsSpec, SpacePair};

    // Policies
    pub use tarmac_reward::{DoneReason, Policy, RewardKind, TerminationKind};

    // Environments
    pub use tarmac_env::{
        Env, EnvConfig, EnvPool, EpisodePhase, MultiEnv, MultiStepOutcome, StepMetrics,
        StepOutcome,
    };
}
