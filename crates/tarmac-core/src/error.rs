//! Error types for the Tarmac framework, organized by subsystem:
//! transport (wire), kernel (capability layer), and environment core.
//!
//! The propagation policy mirrors the churn-vs-infrastructure split:
//! errors caused by the inherently racy vehicle population are absorbed
//! into receipts and never appear here; errors in this module describe
//! conditions the caller must know about (process failure, misuse,
//! failed initialization).

use std::error::Error;
use std::fmt;

use crate::id::NativeId;

/// Errors at the opaque wire boundary to the simulator process.
///
/// Transports produce these; the kernel maps them into [`KernelError`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The simulator process crashed, hung up, or refused the
    /// connection.
    Disconnected {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The simulator answered with something the adapter cannot
    /// interpret.
    Protocol {
        /// Description of the malformed exchange.
        reason: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected { reason } => write!(f, "simulator disconnected: {reason}"),
            Self::Protocol { reason } => write!(f, "protocol violation: {reason}"),
        }
    }
}

impl Error for TransportError {}

/// Errors from the kernel capability layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelError {
    /// The external simulator process is gone. Fatal: the current
    /// episode must be aborted and the error surfaced, never retried —
    /// masking it would hand the training loop a partial trajectory.
    SimulatorUnavailable {
        /// The underlying transport failure.
        source: TransportError,
    },
    /// An explicit `query()` addressed a vehicle that is not live.
    ///
    /// Only queries raise this; orders to unknown vehicles are dropped
    /// with a receipt instead.
    UnknownVehicle {
        /// The queried native ID.
        id: NativeId,
    },
    /// The kernel has not been launched (no `reset()` yet), or was
    /// poisoned by an earlier transport failure.
    NotLaunched,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimulatorUnavailable { source } => {
                write!(f, "simulator unavailable: {source}")
            }
            Self::UnknownVehicle { id } => write!(f, "unknown vehicle '{id}'"),
            Self::NotLaunched => write!(f, "kernel not launched"),
        }
    }
}

impl Error for KernelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SimulatorUnavailable { source } => Some(source),
            _ => None,
        }
    }
}

/// Errors from the environment core's step/reset state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvError {
    /// Scenario or kernel failed to initialize; the episode never
    /// reached READY. The caller decides whether to retry with a fresh
    /// process.
    Init {
        /// Description of what failed to come up.
        reason: String,
    },
    /// `step()` was called on a terminated episode. Caller misuse:
    /// always surfaced, never retried. `reset()` first.
    EpisodeAlreadyDone,
    /// `step()` was called on an episode that was aborted by an
    /// infrastructure failure. Distinct from [`EpisodeAlreadyDone`]
    /// so training code can tell genuine completion from a broken
    /// trajectory. `reset()` first.
    ///
    /// [`EpisodeAlreadyDone`]: EnvError::EpisodeAlreadyDone
    EpisodeAborted,
    /// `step()` was called before the first `reset()`.
    NotReset,
    /// The action had the wrong shape for the action space.
    ActionShape {
        /// Expected flat length.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },
    /// The kernel reported a fatal simulator failure mid-episode.
    Simulator(KernelError),
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init { reason } => write!(f, "environment init failed: {reason}"),
            Self::EpisodeAlreadyDone => write!(f, "episode already done; reset() first"),
            Self::EpisodeAborted => {
                write!(f, "episode aborted by simulator failure; reset() first")
            }
            Self::NotReset => write!(f, "step() before first reset()"),
            Self::ActionShape { expected, got } => {
                write!(f, "action has length {got}, action space expects {expected}")
            }
            Self::Simulator(e) => write!(f, "simulator failure: {e}"),
        }
    }
}

impl Error for EnvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Simulator(e) => Some(e),
            _ => None,
        }
    }
}

impl From<KernelError> for EnvError {
    fn from(e: KernelError) -> Self {
        EnvError::Simulator(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_error_chains_transport_source() {
        let e = KernelError::SimulatorUnavailable {
            source: TransportError::Disconnected {
                reason: "pipe closed".into(),
            },
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("pipe closed"));
    }

    #[test]
    fn env_error_from_kernel_error() {
        let e: EnvError = KernelError::NotLaunched.into();
        assert!(matches!(e, EnvError::Simulator(KernelError::NotLaunched)));
    }

    #[test]
    fn done_and_aborted_are_distinct() {
        assert_ne!(EnvError::EpisodeAlreadyDone, EnvError::EpisodeAborted);
    }

    #[test]
    fn action_shape_display() {
        let e = EnvError::ActionShape {
            expected: 4,
            got: 3,
        };
        assert_eq!(e.to_string(), "action has length 3, action space expects 4");
    }
}
