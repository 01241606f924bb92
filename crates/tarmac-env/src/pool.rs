//! Worker-thread pool of independent environment instances.
//!
//! Parallel rollout workers each need their own simulator process —
//! nothing is shareable across instances. [`EnvPool`] moves each
//! [`Env`] into a dedicated worker thread (the environment is `Send`,
//! not `Sync`) and drives them over bounded crossbeam channels with a
//! per-call reply channel, so `step_all` runs all environments
//! concurrently and collects results in index order.

use std::thread::JoinHandle;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use tarmac_core::{EnvError, KernelError, TransportError};
use tarmac_kernel::Transport;

use crate::config::ConfigError;
use crate::env::{Env, StepOutcome};

enum WorkerRequest {
    Reset {
        reply: Sender<Result<Vec<f32>, EnvError>>,
    },
    Step {
        action: Vec<f32>,
        reply: Sender<Result<StepOutcome, EnvError>>,
    },
    Shutdown,
}

struct Worker {
    requests: Sender<WorkerRequest>,
    handle: Option<JoinHandle<()>>,
}

/// N independent environments, each owned by its own worker thread.
pub struct EnvPool {
    workers: Vec<Worker>,
}

impl EnvPool {
    /// Build `count` environments via `factory` and move each onto a
    /// worker thread.
    ///
    /// The factory receives the worker index, so per-worker seeds or
    /// ports can differ. Construction happens on the calling thread;
    /// a factory failure tears down nothing (already-spawned workers
    /// are shut down by drop).
    pub fn new<T, F>(count: usize, mut factory: F) -> Result<Self, ConfigError>
    where
        T: Transport + Send + 'static,
        F: FnMut(usize) -> Result<Env<T>, ConfigError>,
    {
        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let mut env = factory(index)?;
            let (requests, inbox) = unbounded::<WorkerRequest>();
            let handle = std::thread::spawn(move || {
                while let Ok(request) = inbox.recv() {
                    match request {
                        WorkerRequest::Reset { reply } => {
                            let _ = reply.send(env.reset());
                        }
                        WorkerRequest::Step { action, reply } => {
                            let _ = reply.send(env.step(&action));
                        }
                        WorkerRequest::Shutdown => break,
                    }
                }
            });
            workers.push(Worker {
                requests,
                handle: Some(handle),
            });
        }
        Ok(Self { workers })
    }

    /// Number of environments in the pool.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool holds no environments.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Reset every environment; results come back in index order.
    pub fn reset_all(&self) -> Vec<Result<Vec<f32>, EnvError>> {
        let replies: Vec<Receiver<Result<Vec<f32>, EnvError>>> = self
            .workers
            .iter()
            .map(|worker| {
                let (reply, rx) = bounded(1);
                let _ = worker.requests.send(WorkerRequest::Reset { reply });
                rx
            })
            .collect();
        replies
            .into_iter()
            .map(|rx| rx.recv().unwrap_or_else(|_| Err(worker_lost())))
            .collect()
    }

    /// Step every environment with its own action; results come back
    /// in index order. All environments run concurrently.
    ///
    /// # Panics
    ///
    /// Panics if `actions.len()` differs from the pool size
    /// (programming error, same class as a wrong-shape batch).
    pub fn step_all(&self, actions: Vec<Vec<f32>>) -> Vec<Result<StepOutcome, EnvError>> {
        assert_eq!(
            actions.len(),
            self.workers.len(),
            "one action per pooled environment"
        );
        let replies: Vec<Receiver<Result<StepOutcome, EnvError>>> = self
            .workers
            .iter()
            .zip(actions)
            .map(|(worker, action)| {
                let (reply, rx) = bounded(1);
                let _ = worker.requests.send(WorkerRequest::Step { action, reply });
                rx
            })
            .collect();
        replies
            .into_iter()
            .map(|rx| rx.recv().unwrap_or_else(|_| Err(worker_lost())))
            .collect()
    }
}

impl Drop for EnvPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            let _ = worker.requests.send(WorkerRequest::Shutdown);
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

/// The error a dead worker thread degrades into: indistinguishable
/// from a lost simulator, which is what it is from the trainer's
/// perspective.
fn worker_lost() -> EnvError {
    EnvError::Simulator(KernelError::SimulatorUnavailable {
        source: TransportError::Disconnected {
            reason: "environment worker thread terminated".into(),
        },
    })
}
