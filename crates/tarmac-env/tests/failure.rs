//! Infrastructure-failure semantics: abort, never mask.

use std::sync::Arc;

use tarmac_core::{EnvError, KernelError, RouteId, VehicleKind};
use tarmac_env::{Env, EnvConfig, EpisodePhase};
use tarmac_net::{ring_network, PlacementSpec, ScenarioConfig};
use tarmac_test_utils::{FrameBuilder, ScriptedTransport};

fn config() -> EnvConfig {
    let network = Arc::new(ring_network(400.0, 1, 10.0));
    EnvConfig::ring_defaults(
        network,
        ScenarioConfig {
            name: "ring-1av".into(),
            placement: PlacementSpec {
                controlled: 1,
                background: 0,
                route: RouteId(0),
                spacing: 20.0,
                position_jitter: 0.0,
                depart_speed: 5.0,
            },
            seed: 1,
        },
        50,
    )
}

fn frame() -> tarmac_core::StepReport {
    FrameBuilder::new()
        .vehicle("av_0", VehicleKind::Controlled, 5.0)
        .build()
}

#[test]
fn launch_failure_is_an_init_error_and_never_reaches_ready() {
    let transport = ScriptedTransport::steady(frame()).failing_launch();
    let mut env = Env::new(config(), transport).unwrap();

    let err = env.reset().unwrap_err();
    assert!(matches!(err, EnvError::Init { .. }));
    assert_eq!(env.phase(), EpisodePhase::Uninitialized);
    assert_eq!(env.step(&[0.0]).unwrap_err(), EnvError::NotReset);
}

#[test]
fn mid_episode_disconnect_aborts_with_a_distinguishing_error() {
    let transport = ScriptedTransport::steady(frame()).failing_at_advance(2);
    let mut env = Env::new(config(), transport).unwrap();
    env.reset().unwrap();

    // Step 1 succeeds.
    let outcome = env.step(&[0.0]).unwrap();
    assert!(!outcome.done);

    // Step 2 hits the disconnect: surfaced as a simulator error, not
    // folded into a done flag.
    let err = env.step(&[0.0]).unwrap_err();
    assert!(matches!(
        err,
        EnvError::Simulator(KernelError::SimulatorUnavailable { .. })
    ));
    assert_eq!(env.phase(), EpisodePhase::Aborted);
}

#[test]
fn stepping_an_aborted_episode_is_its_own_error() {
    let transport = ScriptedTransport::steady(frame()).failing_at_advance(1);
    let mut env = Env::new(config(), transport).unwrap();
    env.reset().unwrap();
    let _ = env.step(&[0.0]).unwrap_err();

    // Distinct from EpisodeAlreadyDone: the trajectory is broken, not
    // complete.
    assert_eq!(env.step(&[0.0]).unwrap_err(), EnvError::EpisodeAborted);
}

#[test]
fn reset_recovers_an_aborted_environment() {
    let transport = ScriptedTransport::steady(frame()).failing_at_advance(1);
    let mut env = Env::new(config(), transport).unwrap();
    env.reset().unwrap();
    let _ = env.step(&[0.0]).unwrap_err();
    assert_eq!(env.phase(), EpisodePhase::Aborted);

    // The injected failure fired once; a fresh launch works again.
    env.reset().unwrap();
    assert_eq!(env.phase(), EpisodePhase::Ready);
    assert!(env.step(&[0.0]).is_ok());
}

#[test]
fn invalid_config_fails_construction() {
    let mut cfg = config();
    cfg.horizon = 0;
    let result = Env::new(cfg, ScriptedTransport::steady(frame()));
    assert!(result.is_err());
}
