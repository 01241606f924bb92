//! Frame-scripted transport for exact churn/failure staging.

use tarmac_core::{
    EdgeId, NativeId, RouteId, StepReport, TickId, TransportError, VehicleKind,
    VehicleKinematics, VehicleOrder,
};
use tarmac_kernel::Transport;
use tarmac_net::Scenario;

/// Builds one scripted [`StepReport`] frame.
///
/// ```
/// use tarmac_core::VehicleKind;
/// use tarmac_test_utils::FrameBuilder;
///
/// let frame = FrameBuilder::new()
///     .vehicle("av_0", VehicleKind::Controlled, 5.0)
///     .vehicle("human_0", VehicleKind::Background, 4.0)
///     .leader("av_0", "human_0", 12.0)
///     .build();
/// assert_eq!(frame.vehicles.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct FrameBuilder {
    report: StepReport,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            report: StepReport::empty(TickId(0)),
        }
    }

    /// Add a vehicle with the given speed, at rest position defaults.
    pub fn vehicle(mut self, native: &str, kind: VehicleKind, speed: f64) -> Self {
        let mut state = VehicleKinematics::at_rest(kind, EdgeId(0), RouteId(0));
        state.speed = speed;
        self.report.vehicles.insert(NativeId::from(native), state);
        self
    }

    /// Set a vehicle's full kinematics.
    pub fn kinematics(mut self, native: &str, state: VehicleKinematics) -> Self {
        self.report.vehicles.insert(NativeId::from(native), state);
        self
    }

    /// Mark `leader` as the vehicle ahead of `native` with `gap` meters.
    ///
    /// # Panics
    ///
    /// Panics if `native` was not added first (test-authoring error).
    pub fn leader(mut self, native: &str, leader: &str, gap: f64) -> Self {
        let state = self
            .report
            .vehicles
            .get_mut(&NativeId::from(native))
            .expect("add the vehicle before naming its leader");
        state.leader = Some((NativeId::from(leader), gap));
        self
    }

    /// Record a collision pair in this frame.
    pub fn collision(mut self, a: &str, b: &str) -> Self {
        self.report
            .collisions
            .push((NativeId::from(a), NativeId::from(b)));
        self
    }

    pub fn build(self) -> StepReport {
        self.report
    }
}

/// Transport that replays a canned frame sequence.
///
/// `launch()` returns the initial frame and rewinds the script;
/// each `advance()` returns the next frame, repeating the last frame
/// once the script is exhausted (so fixed-horizon tests don't need
/// `horizon` identical frames). Failures can be injected at launch or
/// at the N-th advance. Every received order batch is recorded for
/// assertion.
#[derive(Debug)]
pub struct ScriptedTransport {
    initial: StepReport,
    frames: Vec<StepReport>,
    cursor: usize,
    advances: usize,
    fail_launch: bool,
    fail_at_advance: Option<usize>,
    /// Order batches received by `advance`, in call order.
    pub received: Vec<Vec<VehicleOrder>>,
}

impl ScriptedTransport {
    /// A transport replaying `frames` after an `initial` launch frame.
    pub fn new(initial: StepReport, frames: Vec<StepReport>) -> Self {
        Self {
            initial,
            frames,
            cursor: 0,
            advances: 0,
            fail_launch: false,
            fail_at_advance: None,
            received: Vec::new(),
        }
    }

    /// A transport whose population never changes.
    pub fn steady(frame: StepReport) -> Self {
        Self::new(frame.clone(), vec![frame])
    }

    /// Fail the next `launch()` call.
    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Fail the `n`-th `advance()` call (1-based) with a disconnect.
    pub fn failing_at_advance(mut self, n: usize) -> Self {
        self.fail_at_advance = Some(n);
        self
    }

    /// Total `advance()` calls seen.
    pub fn advance_count(&self) -> usize {
        self.advances
    }
}

impl Transport for ScriptedTransport {
    fn launch(&mut self, _scenario: &Scenario) -> Result<StepReport, TransportError> {
        if self.fail_launch {
            return Err(TransportError::Disconnected {
                reason: "scripted launch failure".into(),
            });
        }
        self.cursor = 0;
        Ok(self.initial.clone())
    }

    fn advance(&mut self, orders: &[VehicleOrder]) -> Result<StepReport, TransportError> {
        self.advances += 1;
        if self.fail_at_advance == Some(self.advances) {
            return Err(TransportError::Disconnected {
                reason: "scripted disconnect".into(),
            });
        }
        self.received.push(orders.to_vec());

        let frame = if self.frames.is_empty() {
            self.initial.clone()
        } else {
            let idx = self.cursor.min(self.frames.len() - 1);
            self.cursor += 1;
            self.frames[idx].clone()
        };
        Ok(frame)
    }
}
