use std::time::Duration;

/// How often, and for how long, a verification is re-evaluated.
///
/// A retry stops at whichever limit is reached first: `max_attempts`
/// evaluations, or `timeout` elapsed since the first evaluation.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use mockverify::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .with_interval(Duration::from_millis(10))   // poll faster
///     .with_max_attempts(5)                       // give up sooner
///     .with_timeout(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetryPolicy {
    /// Delay between two consecutive evaluations.
    /// Default: 50ms
    interval: Duration,

    /// Maximum number of evaluations, including the first one.
    /// Default: 20
    max_attempts: u32,

    /// Total time budget measured from the first evaluation.
    /// Default: 1s
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            interval: Duration::from_millis(50),
            max_attempts: 20,
            timeout: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that evaluates exactly once and never retries.
    pub fn once() -> Self {
        RetryPolicy {
            interval: Duration::ZERO,
            max_attempts: 1,
            timeout: Duration::ZERO,
        }
    }

    /// Set the delay between evaluations.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the delay between evaluations.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Set the maximum number of evaluations. Values below 1 are treated as 1.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Returns the maximum number of evaluations.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Set the total time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the total time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Configuration of the [`Scheduler`](crate::Scheduler) worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchedulerConfig {
    /// Number of worker threads running retry tasks.
    /// Default: 1
    worker_threads: usize,

    /// Name given to the worker threads.
    /// Default: "mockverify-scheduler"
    thread_name: String,

    /// How long [`Scheduler::shutdown`](crate::Scheduler::shutdown) waits for
    /// in-flight attempts when called outside an async context.
    /// Default: 1s
    shutdown_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            worker_threads: 1,
            thread_name: "mockverify-scheduler".to_string(),
            shutdown_timeout: Duration::from_secs(1),
        }
    }
}

impl SchedulerConfig {
    /// Set the number of worker threads. Values below 1 are treated as 1.
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

/// Configuration of the [`VerificationEngine`](crate::VerificationEngine).
///
/// # Examples
///
/// ```rust
/// use mockverify::{RetryPolicy, VerifyConfig};
///
/// let config = VerifyConfig::default()
///     .with_retry(RetryPolicy::once())
///     .with_max_requests_in_failure(50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyConfig {
    /// Retry policy applied to every verification.
    /// Default: [`RetryPolicy::default`]
    retry: RetryPolicy,

    /// Largest number of recorded requests rendered in a failure message.
    ///
    /// Up to this many, the message ends with the full received list,
    /// `... but was:<[ ... ]>`. Above it, the list is replaced by a count:
    /// `... but was not found, found N other requests`. Set it to
    /// `usize::MAX` to always get the full list.
    /// Default: 10
    max_requests_in_failure: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        VerifyConfig {
            retry: RetryPolicy::default(),
            max_requests_in_failure: 10,
        }
    }
}

impl VerifyConfig {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn with_max_requests_in_failure(mut self, max: usize) -> Self {
        self.max_requests_in_failure = max;
        self
    }

    pub fn max_requests_in_failure(&self) -> usize {
        self.max_requests_in_failure
    }
}
