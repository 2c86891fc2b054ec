//! Background execution of retrying tasks.
//!
//! A [`Scheduler`] owns a small dedicated Tokio runtime. Tasks submitted via
//! [`Scheduler::schedule_retry`] run attempt after attempt on that runtime,
//! paced by a [`RetryPolicy`], and report exactly one [`Outcome`] to their
//! completion callback.

mod gate;
mod outcome;
mod retry;

pub(crate) use gate::DeliveryGate;
pub use outcome::{Attempt, Outcome};
pub(crate) use outcome::Completion;

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{Error, Result, RetryPolicy, SchedulerConfig};

/// Runs retrying verification tasks off the caller's thread.
///
/// The scheduler is an explicit service: create one, share it (usually in an
/// `Arc`) and shut it down when done. Dropping it shuts it down too.
///
/// Shutdown cancels every outstanding task. Outcomes produced while the
/// scheduler shuts down are delivered as [`Outcome::Cancelled`]; once
/// [`shutdown`](Self::shutdown) has returned no callback runs any more, and
/// callbacks still pending are dropped uncalled. Scheduling after shutdown
/// fails with [`Error::SchedulerShutdown`].
///
/// # Example
///
/// ```rust
/// use mockverify::{Attempt, Outcome, RetryPolicy, Scheduler, SchedulerConfig};
/// use std::sync::mpsc;
///
/// let scheduler = Scheduler::new(SchedulerConfig::default())?;
/// let (tx, rx) = mpsc::channel();
/// scheduler.schedule_retry(
///     RetryPolicy::default(),
///     |attempt| Ok(if attempt < 3 { Attempt::Retry(attempt) } else { Attempt::Done(attempt) }),
///     move |outcome| { let _ = tx.send(outcome); },
/// )?;
/// assert_eq!(rx.recv().unwrap(), Outcome::Completed(3));
/// scheduler.shutdown();
/// # Ok::<(), mockverify::Error>(())
/// ```
pub struct Scheduler {
    runtime: Mutex<Option<Runtime>>,
    cancel_token: CancellationToken,
    tracker: TaskTracker,
    gate: Arc<DeliveryGate>,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Start a scheduler with its own worker threads.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads())
            .thread_name(config.thread_name())
            .enable_time()
            .build()?;
        tracing::debug!(
            workers = config.worker_threads(),
            thread_name = config.thread_name(),
            "scheduler started"
        );
        Ok(Self {
            runtime: Mutex::new(Some(runtime)),
            cancel_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
            gate: Arc::new(DeliveryGate::default()),
            config,
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Run `task` repeatedly until it returns [`Attempt::Done`], fails, or
    /// the policy runs out, then pass the [`Outcome`] to `on_complete`.
    ///
    /// `task` receives the 1-based attempt number. The first attempt starts
    /// immediately. `on_complete` is invoked at most once, on a scheduler
    /// thread. It is never invoked if this call returns an error, or if the
    /// outcome is not ready by the time [`shutdown`](Self::shutdown) returns;
    /// in both cases it is dropped instead.
    pub fn schedule_retry<T, F, C>(&self, policy: RetryPolicy, task: F, on_complete: C) -> Result
    where
        T: Send + 'static,
        F: FnMut(u32) -> Result<Attempt<T>> + Send + 'static,
        C: FnOnce(Outcome<T>) + Send + 'static,
    {
        let runtime = self.runtime.lock();
        let Some(runtime) = runtime.as_ref() else {
            return Err(Error::SchedulerShutdown);
        };
        if self.cancel_token.is_cancelled() {
            return Err(Error::SchedulerShutdown);
        }

        let completion = Completion::new(on_complete, self.gate.clone());
        let cancel = self.cancel_token.child_token();
        self.tracker.spawn_on(
            retry::run_retry(policy, task, completion, cancel),
            runtime.handle(),
        );
        Ok(())
    }

    /// Cancel outstanding tasks and stop the worker threads.
    ///
    /// Idempotent. Once it returns, no completion callback is running and
    /// none will be invoked.
    ///
    /// Outside of an async context this blocks for up to the configured
    /// shutdown timeout while cancelled tasks deliver their outcomes. Inside
    /// an async context it only waits for callbacks already running; tasks
    /// that have not delivered yet are dropped with their callbacks. Use
    /// [`shutdown_and_wait`](Self::shutdown_and_wait) there to let every task
    /// deliver first.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
        self.tracker.close();

        let runtime = self.runtime.lock().take();
        if let Some(runtime) = runtime {
            tracing::debug!(pending = self.tracker.len(), "scheduler shutting down");
            if Handle::try_current().is_ok() {
                runtime.shutdown_background();
            } else {
                runtime.shutdown_timeout(self.config.shutdown_timeout());
            }
        }
        self.gate.close();
    }

    /// Async-friendly shutdown: cancels outstanding tasks, waits (bounded by
    /// the shutdown timeout) until all of them delivered their outcome, then
    /// stops the worker threads.
    pub async fn shutdown_and_wait(&self) {
        self.cancel_token.cancel();
        self.tracker.close();
        if tokio::time::timeout(self.config.shutdown_timeout(), self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                pending = self.tracker.len(),
                "scheduler tasks still running after shutdown timeout"
            );
        }
        self.shutdown();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("shutdown", &self.is_shutdown())
            .field("pending", &self.pending())
            .finish()
    }
}
