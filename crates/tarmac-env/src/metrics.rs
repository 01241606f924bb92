//! Per-step performance and churn metrics.

/// Timing and bookkeeping data for a single environment step.
///
/// All durations are in microseconds. The environment populates these
/// after each `step()`; the `total_*` counters are cumulative across
/// the environment's lifetime (they survive resets).
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent decoding the action into vehicle orders.
    pub decode_us: u64,
    /// Time spent in the kernel advance (includes simulator IPC).
    pub advance_us: u64,
    /// Time spent reconciling the registry and slot map.
    pub registry_us: u64,
    /// Time spent computing reward and termination.
    pub reward_us: u64,
    /// Time spent encoding observations.
    pub encode_us: u64,
    /// Vehicles live after the step.
    pub live_vehicles: usize,
    /// Vehicles that entered during the step.
    pub entered: usize,
    /// Vehicles that left during the step.
    pub left: usize,
    /// Orders submitted to the kernel this step.
    pub orders_submitted: usize,
    /// Orders the advance carried to the simulator this step.
    pub orders_applied: usize,
    /// Cumulative orders dropped (stale target, no authority, buffer
    /// full) over the environment's lifetime.
    pub total_orders_dropped: u64,
    /// Cumulative collision events over the environment's lifetime.
    pub total_collisions: u64,
    /// Cumulative successful resets over the environment's lifetime.
    pub total_episodes: u64,
}
