//! Tarmac quickstart — a complete, minimal control loop from scratch.
//!
//! Demonstrates:
//!   1. Building a ring network and a scenario class
//!   2. Configuring a single-agent environment
//!   3. Querying spaces before the first reset
//!   4. Stepping with a naive speed-tracking controller
//!   5. Reading receipts, metrics, and the done reason
//!
//! Run with:
//!   cargo run --example quickstart

use std::sync::Arc;

use tarmac_core::RouteId;
use tarmac_env::{Env, EnvConfig};
use tarmac_net::{ring_network, PlacementSpec, ScenarioConfig};
use tarmac_test_utils::KinematicTransport;

// ─── Scenario parameters ────────────────────────────────────────

const RING_LENGTH: f64 = 400.0;
const SPEED_LIMIT: f64 = 10.0;
const TARGET_SPEED: f64 = 8.0;
const HORIZON: u64 = 120;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tarmac Quickstart ===\n");

    // 1. Static topology: a single-lane ring, shared read-only.
    let network = Arc::new(ring_network(RING_LENGTH, 1, SPEED_LIMIT));
    println!(
        "Network: {} ({} edges, {:.0} m, max speed {} m/s)",
        network.name(),
        network.edge_count(),
        network.total_length(),
        network.max_speed(),
    );

    // 2. Scenario class: 2 AVs interleaved with 8 background vehicles.
    let scenario = ScenarioConfig {
        name: "ring-quickstart".into(),
        placement: PlacementSpec {
            controlled: 2,
            background: 8,
            route: RouteId(0),
            spacing: 40.0,
            position_jitter: 3.0,
            depart_speed: 5.0,
        },
        seed: 42,
    };

    let mut config = EnvConfig::ring_defaults(network, scenario, HORIZON);
    config.warmup_steps = 5;

    // 3. The environment owns its simulator outright. Spaces are
    //    queryable before the first reset.
    let mut env = Env::new(config, KinematicTransport::new(0.5))?;
    println!(
        "Spaces: obs {} dims, action {} dims\n",
        env.observation_space().shape(),
        env.action_space().shape(),
    );

    // 4. Run one episode with a naive proportional speed tracker.
    let mut obs = env.reset()?;
    println!("Reset: {} vehicles live", env.snapshot().len());

    let mut episode_return = 0.0;
    loop {
        // Feature 0 of each slot is normalized ego speed.
        let action: Vec<f32> = (0..2)
            .map(|slot| {
                let ego_speed = f64::from(obs[slot * 5]) * SPEED_LIMIT;
                ((TARGET_SPEED - ego_speed) * 0.5) as f32
            })
            .collect();

        let outcome = env.step(&action)?;
        episode_return += outcome.reward;
        obs = outcome.observation;

        if outcome.info.step % 20 == 0 {
            println!(
                "  step {:>3}: reward={:.3}, live={}, mean_speed={:.2} m/s, step_time={}us",
                outcome.info.step,
                outcome.reward,
                outcome.info.live_vehicles,
                env.snapshot().mean_speed(),
                outcome.info.metrics.total_us,
            );
        }
        if !outcome.info.dropped_orders.is_empty() {
            println!(
                "  step {:>3}: {} order(s) dropped",
                outcome.info.step,
                outcome.info.dropped_orders.len(),
            );
        }
        if outcome.done {
            println!(
                "\nEpisode done after {} steps ({:?}), return {:.2}",
                outcome.info.step, outcome.info.done_reason, episode_return,
            );
            break;
        }
    }

    // 5. Reset and confirm the space shape held.
    let obs2 = env.reset()?;
    assert_eq!(obs.len(), obs2.len());
    println!("Reset again: shape unchanged ({} dims). Done.", obs2.len());
    Ok(())
}
