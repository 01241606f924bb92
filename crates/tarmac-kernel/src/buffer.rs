//! Bounded order buffer with deterministic drain ordering.
//!
//! [`OrderBuffer`] holds orders between submission and the next time
//! advance. It enforces a capacity limit, assigns monotonic arrival
//! sequence numbers, and drains in the deterministic order
//! `(target native ID, arrival_seq)` — two runs that submit the same
//! orders in the same relative order hand the transport identical
//! batches, independent of submission batching.

use std::collections::VecDeque;

use tarmac_core::{OrderDropReason, Receipt, VehicleOrder};

/// An order paired with its batch-local index from `submit()`, so the
/// kernel can build applied-receipts with correct indices after
/// reordering.
#[derive(Debug)]
pub struct DrainedOrder {
    /// The order to hand to the transport.
    pub order: VehicleOrder,
    /// The original batch-local index from the `submit()` call.
    pub order_index: usize,
}

struct BufferEntry {
    order: VehicleOrder,
    order_index: usize,
}

/// Bounded buffer between `apply_command` and `advance_time`.
pub struct OrderBuffer {
    queue: VecDeque<BufferEntry>,
    capacity: usize,
    next_arrival_seq: u64,
}

impl OrderBuffer {
    /// Create a buffer with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "OrderBuffer capacity must be at least 1");
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            next_arrival_seq: 0,
        }
    }

    /// Submit a batch of orders.
    ///
    /// Returns one [`Receipt`] per input order: accepted-pending while
    /// there is room, `BufferFull` past capacity. Arrival sequence
    /// numbers come from a monotonic counter that persists across
    /// submits, overwriting whatever the caller set.
    pub fn submit(&mut self, orders: Vec<VehicleOrder>) -> Vec<Receipt> {
        let mut receipts = Vec::with_capacity(orders.len());
        for (i, mut order) in orders.into_iter().enumerate() {
            if self.queue.len() >= self.capacity {
                receipts.push(Receipt::dropped(i, OrderDropReason::BufferFull));
                continue;
            }
            order.arrival_seq = self.next_arrival_seq;
            self.next_arrival_seq += 1;
            self.queue.push_back(BufferEntry {
                order,
                order_index: i,
            });
            receipts.push(Receipt::pending(i));
        }
        receipts
    }

    /// Drain every buffered order, sorted by `(target, arrival_seq)`.
    pub fn drain(&mut self) -> Vec<DrainedOrder> {
        let mut out: Vec<DrainedOrder> = self
            .queue
            .drain(..)
            .map(|e| DrainedOrder {
                order: e.order,
                order_index: e.order_index,
            })
            .collect();
        out.sort_unstable_by(|a, b| {
            (&a.order.target, a.order.arrival_seq).cmp(&(&b.order.target, b.order.arrival_seq))
        });
        out
    }

    /// Discard all pending orders, returning how many were dropped.
    ///
    /// Called on reset/abort so in-flight orders never survive into a
    /// new episode.
    pub fn clear(&mut self) -> usize {
        let n = self.queue.len();
        self.queue.clear();
        n
    }

    /// Number of orders currently buffered.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Maximum number of orders this buffer can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_core::{NativeId, OrderOp, TickId};

    fn accel(target: &str) -> VehicleOrder {
        VehicleOrder {
            target: NativeId::from(target),
            op: OrderOp::Accelerate { accel: 0.5 },
            issued_at: TickId(0),
            arrival_seq: 0,
        }
    }

    // ── submit ───────────────────────────────────────────────

    #[test]
    fn submit_assigns_monotonic_arrival_seq() {
        let mut buf = OrderBuffer::new(8);
        let receipts = buf.submit(vec![accel("a"), accel("b"), accel("c")]);
        assert!(receipts.iter().all(|r| r.accepted));

        let drained = buf.drain();
        let seqs: Vec<u64> = drained.iter().map(|d| d.order.arrival_seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn arrival_seq_persists_across_submits() {
        let mut buf = OrderBuffer::new(8);
        buf.submit(vec![accel("a")]);
        buf.submit(vec![accel("b")]);
        let drained = buf.drain();
        assert_eq!(drained[0].order.arrival_seq, 0);
        assert_eq!(drained[1].order.arrival_seq, 1);
    }

    #[test]
    fn submit_rejects_past_capacity() {
        let mut buf = OrderBuffer::new(2);
        let receipts = buf.submit(vec![accel("a"), accel("b"), accel("c")]);
        assert!(receipts[0].accepted);
        assert!(receipts[1].accepted);
        assert!(!receipts[2].accepted);
        assert_eq!(receipts[2].reason, Some(OrderDropReason::BufferFull));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn receipt_order_index_matches_input() {
        let mut buf = OrderBuffer::new(8);
        let receipts = buf.submit(vec![accel("a"), accel("b")]);
        assert_eq!(receipts[0].order_index, 0);
        assert_eq!(receipts[1].order_index, 1);
    }

    // ── drain ────────────────────────────────────────────────

    #[test]
    fn drain_sorts_by_target_then_arrival() {
        let mut buf = OrderBuffer::new(8);
        buf.submit(vec![accel("c"), accel("a"), accel("c"), accel("b")]);
        let drained = buf.drain();
        let order: Vec<(&str, u64)> = drained
            .iter()
            .map(|d| (d.order.target.as_str(), d.order.arrival_seq))
            .collect();
        assert_eq!(order, vec![("a", 1), ("b", 3), ("c", 0), ("c", 2)]);
    }

    #[test]
    fn drain_preserves_batch_indices() {
        let mut buf = OrderBuffer::new(8);
        buf.submit(vec![accel("b"), accel("a")]);
        let drained = buf.drain();
        assert_eq!(drained[0].order.target.as_str(), "a");
        assert_eq!(drained[0].order_index, 1);
        assert_eq!(drained[1].order_index, 0);
    }

    #[test]
    fn drain_empties_buffer() {
        let mut buf = OrderBuffer::new(8);
        buf.submit(vec![accel("a")]);
        let _ = buf.drain();
        assert!(buf.is_empty());
    }

    // ── clear ────────────────────────────────────────────────

    #[test]
    fn clear_reports_discarded_count() {
        let mut buf = OrderBuffer::new(8);
        buf.submit(vec![accel("a"), accel("b")]);
        assert_eq!(buf.clear(), 2);
        assert!(buf.is_empty());
        assert_eq!(buf.clear(), 0);
    }

    // ── property: drain order is deterministic ───────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_orders() -> impl Strategy<Value = Vec<String>> {
            prop::collection::vec("[a-d]{1,2}", 0..32)
        }

        proptest! {
            #[test]
            fn drain_always_sorted(targets in arb_orders()) {
                let mut buf = OrderBuffer::new(64);
                buf.submit(targets.iter().map(|t| accel(t)).collect());
                let drained = buf.drain();
                for w in drained.windows(2) {
                    let a = (&w[0].order.target, w[0].order.arrival_seq);
                    let b = (&w[1].order.target, w[1].order.arrival_seq);
                    prop_assert!(a <= b, "drain order violated: {a:?} > {b:?}");
                }
            }

            #[test]
            fn batching_does_not_change_drain_order(targets in arb_orders()) {
                // Everything in one batch…
                let mut one = OrderBuffer::new(64);
                one.submit(targets.iter().map(|t| accel(t)).collect());

                // …versus one order per batch.
                let mut many = OrderBuffer::new(64);
                for t in &targets {
                    many.submit(vec![accel(t)]);
                }

                let a: Vec<String> = one
                    .drain()
                    .iter()
                    .map(|d| d.order.target.as_str().to_string())
                    .collect();
                let b: Vec<String> = many
                    .drain()
                    .iter()
                    .map(|d| d.order.target.as_str().to_string())
                    .collect();
                prop_assert_eq!(a, b);
            }
        }
    }
}
