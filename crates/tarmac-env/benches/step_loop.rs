//! Step-loop throughput over the kinematic reference simulator.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use tarmac_core::RouteId;
use tarmac_env::{Env, EnvConfig};
use tarmac_net::{ring_network, PlacementSpec, ScenarioConfig};
use tarmac_test_utils::KinematicTransport;

fn ring_env(controlled: u32, background: u32) -> Env<KinematicTransport> {
    let network = Arc::new(ring_network(2000.0, 1, 10.0));
    let config = EnvConfig::ring_defaults(
        network,
        ScenarioConfig {
            name: "ring-bench".into(),
            placement: PlacementSpec {
                controlled,
                background,
                route: RouteId(0),
                spacing: 20.0,
                position_jitter: 0.0,
                depart_speed: 5.0,
            },
            seed: 0,
        },
        u64::MAX / 2,
    );
    Env::new(config, KinematicTransport::new(0.5)).expect("bench config is valid")
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    // Controlled-only columns: identical actions keep gaps fixed, so
    // the loop can run unboundedly many steps without a terminal.
    for (name, controlled) in [("small", 10u32), ("medium", 40), ("large", 80)] {
        let mut env = ring_env(controlled, 0);
        env.reset().expect("kinematic reset succeeds");
        let action = vec![0.1f32; env.action_space().shape()];
        group.bench_function(name, |b| {
            b.iter(|| env.step(&action).expect("kinematic step succeeds"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_step);
criterion_main!(benches);
