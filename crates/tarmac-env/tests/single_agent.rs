//! Single-agent step/reset contract over a scripted simulator.

use std::sync::Arc;

use tarmac_core::{EnvError, RouteId, TickId, VehicleKind};
use tarmac_env::{Env, EnvConfig, EpisodePhase};
use tarmac_net::{ring_network, PlacementSpec, ScenarioConfig};
use tarmac_reward::DoneReason;
use tarmac_test_utils::{FrameBuilder, ScriptedTransport};

fn two_av_frame() -> tarmac_core::StepReport {
    FrameBuilder::new()
        .vehicle("av_0", VehicleKind::Controlled, 5.0)
        .vehicle("av_1", VehicleKind::Controlled, 5.0)
        .build()
}

fn config(horizon: u64) -> EnvConfig {
    let network = Arc::new(ring_network(400.0, 1, 10.0));
    EnvConfig::ring_defaults(
        network,
        ScenarioConfig {
            name: "ring-2av".into(),
            placement: PlacementSpec {
                controlled: 2,
                background: 0,
                route: RouteId(0),
                spacing: 20.0,
                position_jitter: 0.0,
                depart_speed: 5.0,
            },
            seed: 1,
        },
        horizon,
    )
}

fn env(horizon: u64) -> Env<ScriptedTransport> {
    Env::new(config(horizon), ScriptedTransport::steady(two_av_frame())).unwrap()
}

// ── space queries before reset ───────────────────────────────

#[test]
fn spaces_queryable_before_first_reset() {
    let env = env(5);
    assert_eq!(env.observation_space().shape(), 10);
    assert_eq!(env.action_space().shape(), 2);
    assert_eq!(env.phase(), EpisodePhase::Uninitialized);
}

#[test]
fn space_shape_is_identical_across_resets() {
    let mut env = env(5);
    let shape_before = env.observation_space().shape();

    let obs_1 = env.reset().unwrap();
    let shape_1 = env.observation_space().shape();

    // A second reset of the same scenario class.
    let obs_2 = env.reset().unwrap();
    let shape_2 = env.observation_space().shape();

    assert_eq!(shape_before, shape_1);
    assert_eq!(shape_1, shape_2);
    assert_eq!(obs_1.len(), obs_2.len());
    assert_eq!(obs_1.len(), shape_1);
}

// ── the horizon-5 scenario ───────────────────────────────────

#[test]
fn horizon_five_is_done_exactly_on_the_fifth_step() {
    let mut env = env(5);
    env.reset().unwrap();
    let noop = vec![0.0; env.action_space().shape()];

    for step in 1..=4u64 {
        let outcome = env.step(&noop).unwrap();
        assert!(!outcome.done, "done too early at step {step}");
        assert_eq!(outcome.info.step, step);
    }

    let fifth = env.step(&noop).unwrap();
    assert!(fifth.done);
    assert_eq!(fifth.info.done_reason, Some(DoneReason::HorizonReached));
    assert_eq!(env.phase(), EpisodePhase::Done);
}

#[test]
fn stepping_past_done_is_an_error() {
    let mut env = env(1);
    env.reset().unwrap();
    let noop = vec![0.0; 2];
    assert!(env.step(&noop).unwrap().done);
    assert_eq!(env.step(&noop).unwrap_err(), EnvError::EpisodeAlreadyDone);
}

#[test]
fn reset_after_done_starts_a_new_episode() {
    let mut env = env(1);
    env.reset().unwrap();
    env.step(&[0.0, 0.0]).unwrap();
    assert_eq!(env.phase(), EpisodePhase::Done);

    env.reset().unwrap();
    assert_eq!(env.phase(), EpisodePhase::Ready);
    assert_eq!(env.current_tick(), TickId(0));
    let outcome = env.step(&[0.0, 0.0]).unwrap();
    assert_eq!(outcome.info.step, 1);
}

// ── misuse and shape errors ──────────────────────────────────

#[test]
fn step_before_reset_is_an_error() {
    let mut env = env(5);
    assert_eq!(env.step(&[0.0, 0.0]).unwrap_err(), EnvError::NotReset);
}

#[test]
fn wrong_action_shape_is_an_error() {
    let mut env = env(5);
    env.reset().unwrap();
    assert_eq!(
        env.step(&[0.0]).unwrap_err(),
        EnvError::ActionShape {
            expected: 2,
            got: 1
        }
    );
}

// ── observation and mask shape under a full population ───────

#[test]
fn both_slots_live_and_masked_in() {
    let mut env = env(5);
    let obs = env.reset().unwrap();
    assert_eq!(obs.len(), 10);

    let outcome = env.step(&[0.0, 0.0]).unwrap();
    assert_eq!(outcome.info.mask, vec![1, 1]);
    assert!(env.observation_space().contains(&outcome.observation));
}

#[test]
fn tick_advances_by_one_per_step() {
    let mut env = env(5);
    env.reset().unwrap();
    assert_eq!(env.current_tick(), TickId(0));
    let outcome = env.step(&[0.0, 0.0]).unwrap();
    assert_eq!(outcome.info.tick, TickId(1));
    env.step(&[0.0, 0.0]).unwrap();
    assert_eq!(env.current_tick(), TickId(2));
}
