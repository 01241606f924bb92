//! Reward and termination policies.
//!
//! A [`Policy`] is a closed pair of tagged variants — a reward shaping
//! and a termination condition — resolved at environment construction.
//! Evaluation is a pure function of a [`Transition`] (the before/after
//! fleet snapshots plus static context): no hidden state, no clock, no
//! RNG, so identical trajectories always reproduce identical rewards.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod policy;

pub use policy::{DoneReason, Judgment, Policy, RewardKind, TerminationKind, Transition};
