//! The kernel capability layer: reset / apply_command / advance_time /
//! query over one owned transport.

use tarmac_core::{
    KernelError, NativeId, Receipt, StepReport, TickId, VehicleKinematics, VehicleOrder,
};
use tarmac_net::Scenario;

use crate::buffer::OrderBuffer;
use crate::transport::Transport;

/// Result of a successful [`SimKernel::advance_time`] call.
#[derive(Debug)]
pub struct AdvanceResult<'k> {
    /// Post-tick state, normalized to the kernel's tick counter.
    ///
    /// Borrows from the kernel, so the caller must finish reading it
    /// before the next mutating call — the borrow checker enforces
    /// that there is no stale-report aliasing.
    pub report: &'k StepReport,
    /// Applied-receipts for every order the advance carried, with
    /// their original batch indices.
    pub receipts: Vec<Receipt>,
    /// Number of orders the advance carried. Buffer-overflow drops
    /// were already reported at submit time and are not counted here.
    pub orders_applied: usize,
}

/// The capability set over one external simulator process.
///
/// Owns the transport and the order buffer; caches the most recent
/// report so `query()` never touches the wire (which also makes two
/// queries with no intervening advance trivially identical).
///
/// # Failure latching
///
/// The first transport failure poisons the kernel: every later
/// `advance_time`/`query` fails with `SimulatorUnavailable` or
/// `NotLaunched` until `reset()` relaunches. Fatal errors must reach
/// the caller once per episode, not once per call site.
pub struct SimKernel<T: Transport> {
    transport: T,
    buffer: OrderBuffer,
    report: Option<StepReport>,
    tick: TickId,
    sub_steps: u32,
    poisoned: bool,
}

impl<T: Transport> SimKernel<T> {
    /// Create a kernel over `transport`.
    ///
    /// `buffer_capacity` bounds the order buffer; `sub_steps` is how
    /// many internal simulator ticks one `advance_time()` spans
    /// (orders ride the first sub-step, collisions are unioned across
    /// all of them, and the kernel's own tick still advances by one).
    ///
    /// # Panics
    ///
    /// Panics if `buffer_capacity` or `sub_steps` is zero.
    pub fn new(transport: T, buffer_capacity: usize, sub_steps: u32) -> Self {
        assert!(sub_steps > 0, "SimKernel needs at least one sub-step");
        Self {
            transport,
            buffer: OrderBuffer::new(buffer_capacity),
            report: None,
            tick: TickId(0),
            sub_steps,
            poisoned: false,
        }
    }

    /// Launch (or relaunch) the simulator with `scenario`.
    ///
    /// Discards any buffered orders, clears the poison latch, resets
    /// the tick counter to 0, and caches the initial report.
    ///
    /// # Errors
    ///
    /// [`KernelError::SimulatorUnavailable`] if the transport cannot
    /// launch; the kernel stays poisoned in that case.
    pub fn reset(&mut self, scenario: &Scenario) -> Result<&StepReport, KernelError> {
        self.buffer.clear();
        self.poisoned = false;
        match self.transport.launch(scenario) {
            Ok(mut report) => {
                self.tick = TickId(0);
                report.tick = self.tick;
                Ok(&*self.report.insert(report))
            }
            Err(source) => {
                self.poisoned = true;
                self.report = None;
                Err(KernelError::SimulatorUnavailable { source })
            }
        }
    }

    /// Buffer one order for the next advance.
    ///
    /// Never touches the wire. The only local drop reason is a full
    /// buffer; stale-target filtering happens above this layer.
    pub fn apply_command(&mut self, order: VehicleOrder) -> Receipt {
        self.buffer
            .submit(vec![order])
            .pop()
            .expect("submit returns one receipt per order")
    }

    /// Buffer a batch of orders for the next advance.
    pub fn submit_orders(&mut self, orders: Vec<VehicleOrder>) -> Vec<Receipt> {
        self.buffer.submit(orders)
    }

    /// Advance simulated time by exactly one tick.
    ///
    /// Drains the buffer in deterministic order, hands the batch to
    /// the transport atomically with the first sub-step, runs the
    /// remaining sub-steps, unions their collisions, and caches the
    /// final report (stamped with the kernel's tick).
    ///
    /// # Errors
    ///
    /// [`KernelError::NotLaunched`] before the first `reset()` or
    /// while poisoned; [`KernelError::SimulatorUnavailable`] if the
    /// transport fails, which also poisons the kernel. Either way the
    /// episode is over for the caller — there is no retry path.
    pub fn advance_time(&mut self) -> Result<AdvanceResult<'_>, KernelError> {
        if self.poisoned || self.report.is_none() {
            return Err(KernelError::NotLaunched);
        }

        let drained = self.buffer.drain();
        let orders: Vec<VehicleOrder> = drained.iter().map(|d| d.order.clone()).collect();

        let mut collisions = Vec::new();
        let mut report = None;
        for sub in 0..self.sub_steps {
            let batch: &[VehicleOrder] = if sub == 0 { &orders } else { &[] };
            match self.transport.advance(batch) {
                Ok(r) => {
                    collisions.extend(r.collisions.iter().cloned());
                    report = Some(r);
                }
                Err(source) => {
                    self.poisoned = true;
                    return Err(KernelError::SimulatorUnavailable { source });
                }
            }
        }

        let mut report = report.expect("sub_steps >= 1 guarantees a report");
        report.collisions = collisions;
        self.tick = TickId(self.tick.0 + 1);
        report.tick = self.tick;

        let receipts = drained
            .iter()
            .map(|d| Receipt::applied(d.order_index, self.tick))
            .collect();
        let orders_applied = drained.len();

        Ok(AdvanceResult {
            report: &*self.report.insert(report),
            receipts,
            orders_applied,
        })
    }

    /// Kinematic state of one vehicle from the cached report.
    ///
    /// # Errors
    ///
    /// [`KernelError::NotLaunched`] before the first reset;
    /// [`KernelError::UnknownVehicle`] if the vehicle is not live.
    /// Unlike orders, an explicit query about a departed vehicle is a
    /// caller error worth surfacing.
    pub fn query(&self, native: &NativeId) -> Result<&VehicleKinematics, KernelError> {
        let report = self.report.as_ref().ok_or(KernelError::NotLaunched)?;
        report
            .vehicles
            .get(native)
            .ok_or_else(|| KernelError::UnknownVehicle { id: native.clone() })
    }

    /// The most recent cached report, if launched.
    pub fn report(&self) -> Option<&StepReport> {
        self.report.as_ref()
    }

    /// Current kernel tick (0 after reset).
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Whether a transport failure has poisoned this kernel.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of orders waiting for the next advance.
    pub fn buffered_orders(&self) -> usize {
        self.buffer.len()
    }

    /// Consume the kernel, tearing the transport down.
    pub fn shutdown(mut self) {
        self.transport.teardown();
    }
}

impl<T: Transport> std::fmt::Debug for SimKernel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimKernel")
            .field("tick", &self.tick)
            .field("launched", &self.report.is_some())
            .field("poisoned", &self.poisoned)
            .field("buffered_orders", &self.buffer.len())
            .finish()
    }
}
