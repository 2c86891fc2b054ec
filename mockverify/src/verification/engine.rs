use std::sync::Arc;

use crate::{
    DiffFormatter, Error, EventLog, HttpRequest, LogSnapshot, RequestMatcher, Result, Scheduler,
    VerificationTimes, VerifyConfig,
    event_log::inbound_requests,
    scheduler::{Attempt, Outcome},
    verification::{
        Verification, VerificationHandle, VerificationSequence, cardinality::count_matches,
        sequence::find_subsequence,
    },
};

/// Result of checking one snapshot of the log.
#[derive(Debug)]
enum Verdict {
    Satisfied,
    /// The snapshot that failed; rendered only if it ends up reported.
    NotSatisfied(LogSnapshot),
}

/// What was asked for, kept to describe a failure.
enum Expected {
    Times {
        request: HttpRequest,
        times: VerificationTimes,
    },
    Sequence(Vec<HttpRequest>),
}

impl Expected {
    fn kind(&self) -> &'static str {
        match self {
            Expected::Times { .. } => "times",
            Expected::Sequence(_) => "sequence",
        }
    }

    fn describe(&self, formatter: &DiffFormatter, actual: &[HttpRequest]) -> Result<String> {
        match self {
            Expected::Times { request, times } => formatter.times_mismatch(request, times, actual),
            Expected::Sequence(requests) => formatter.sequence_mismatch(requests, actual),
        }
    }
}

/// Asserts that requests recorded in an [`EventLog`] arrived as expected.
///
/// Each check runs on the [`Scheduler`]: the log is sampled, and if the
/// assertion does not hold yet it is retried with a fresh snapshot under the
/// configured [`RetryPolicy`](crate::RetryPolicy), so requests still in
/// flight when `verify_*` is called are picked up. The result is a single
/// string: empty on success, the failure text otherwise.
///
/// # Example
///
/// ```rust
/// use mockverify::*;
/// use std::sync::Arc;
///
/// let log = EventLog::new();
/// let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default())?);
/// let engine = VerificationEngine::new(log.clone(), scheduler.clone());
///
/// log.add(LogEntry::received_request(request("/login")));
/// log.add(LogEntry::received_request(request("/checkout")));
///
/// let sequence = VerificationSequence::new()
///     .with_request(request("/login"))
///     .with_request(request("/checkout"));
/// assert_eq!(engine.verify_sequence(Some(&sequence))?.wait(), "");
///
/// scheduler.shutdown();
/// # Ok::<(), mockverify::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    log: EventLog,
    scheduler: Arc<Scheduler>,
    config: VerifyConfig,
}

impl VerificationEngine {
    pub fn new(log: EventLog, scheduler: Arc<Scheduler>) -> Self {
        Self {
            log,
            scheduler,
            config: VerifyConfig::default(),
        }
    }

    pub fn with_config(mut self, config: VerifyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Check that requests matching the verification's pattern were received
    /// the expected number of times.
    ///
    /// `None` resolves immediately to success. Fails fast with
    /// [`Error::InvalidMatcher`] for malformed patterns and with
    /// [`Error::SchedulerShutdown`] after shutdown.
    pub fn verify_times(&self, verification: Option<&Verification>) -> Result<VerificationHandle> {
        let (tx, handle) = VerificationHandle::channel();
        self.verify_times_with(verification, move |result| {
            let _ = tx.send(result);
        })?;
        Ok(handle)
    }

    /// Like [`verify_times`](Self::verify_times), delivering the result to
    /// `on_done` instead. `on_done` is called at most once: never if this
    /// returns an error, nor if the scheduler shuts down before the result is
    /// ready, in which case it is dropped uncalled.
    pub fn verify_times_with<F>(&self, verification: Option<&Verification>, on_done: F) -> Result
    where
        F: FnOnce(String) + Send + 'static,
    {
        let Some(verification) = verification else {
            tracing::debug!("no verification given, nothing to check");
            on_done(String::new());
            return Ok(());
        };

        let matcher = verification.compile()?;
        let times = verification.times();
        let log = self.log.clone();

        let task = move |attempt: u32| -> Result<Attempt<Verdict>> {
            let snapshot = log.entries();
            let actual: Vec<&HttpRequest> = inbound_requests(&snapshot).collect();
            let count = count_matches(&matcher, &actual);
            tracing::trace!(attempt, count, expected = %times, "checking request count");
            Ok(if times.matches(count) {
                Attempt::Done(Verdict::Satisfied)
            } else if times.exceeded_by(count) {
                Attempt::Done(Verdict::NotSatisfied(snapshot))
            } else {
                Attempt::Retry(Verdict::NotSatisfied(snapshot))
            })
        };

        let expected = Expected::Times {
            request: verification.request().clone(),
            times,
        };
        self.schedule(task, expected, on_done)
    }

    /// Check that the expected requests were received in the given relative
    /// order, other requests allowed in between.
    ///
    /// `None` and an empty sequence resolve immediately to success. Fails
    /// fast with [`Error::InvalidMatcher`] for malformed patterns and with
    /// [`Error::SchedulerShutdown`] after shutdown.
    pub fn verify_sequence(
        &self,
        sequence: Option<&VerificationSequence>,
    ) -> Result<VerificationHandle> {
        match sequence {
            Some(sequence) if !sequence.is_empty() => {
                let (tx, handle) = VerificationHandle::channel();
                self.verify_sequence_with(Some(sequence), move |result| {
                    let _ = tx.send(result);
                })?;
                Ok(handle)
            }
            _ => Ok(VerificationHandle::resolved(String::new())),
        }
    }

    /// Like [`verify_sequence`](Self::verify_sequence), delivering the
    /// result to `on_done` instead. `on_done` is called at most once: never if
    /// this returns an error, nor if the scheduler shuts down before the
    /// result is ready, in which case it is dropped uncalled.
    pub fn verify_sequence_with<F>(
        &self,
        sequence: Option<&VerificationSequence>,
        on_done: F,
    ) -> Result
    where
        F: FnOnce(String) + Send + 'static,
    {
        let Some(sequence) = sequence.filter(|s| !s.is_empty()) else {
            tracing::debug!("no expected requests, sequence trivially present");
            on_done(String::new());
            return Ok(());
        };

        let matchers: Vec<RequestMatcher> = sequence.compile()?;
        let log = self.log.clone();

        let task = move |attempt: u32| -> Result<Attempt<Verdict>> {
            let snapshot = log.entries();
            let actual: Vec<&HttpRequest> = inbound_requests(&snapshot).collect();
            Ok(match find_subsequence(&matchers, &actual) {
                Some(positions) => {
                    tracing::trace!(attempt, ?positions, "request sequence found");
                    Attempt::Done(Verdict::Satisfied)
                }
                None => {
                    tracing::trace!(attempt, received = actual.len(), "request sequence not found yet");
                    Attempt::Retry(Verdict::NotSatisfied(snapshot))
                }
            })
        };

        self.schedule(task, Expected::Sequence(sequence.requests().to_vec()), on_done)
    }

    fn schedule<T, F>(&self, task: T, expected: Expected, on_done: F) -> Result
    where
        T: FnMut(u32) -> Result<Attempt<Verdict>> + Send + 'static,
        F: FnOnce(String) + Send + 'static,
    {
        let formatter = DiffFormatter::new(self.config.max_requests_in_failure());
        self.scheduler
            .schedule_retry(self.config.retry(), task, move |outcome| {
                on_done(resolve(outcome, &expected, &formatter))
            })
    }
}

/// Turn a retry outcome into the verification result string.
fn resolve(outcome: Outcome<Verdict>, expected: &Expected, formatter: &DiffFormatter) -> String {
    let kind = expected.kind();
    let verdict = match outcome {
        Outcome::Completed(verdict) | Outcome::Exhausted(verdict) => verdict,
        Outcome::Cancelled(Some(verdict)) => {
            tracing::debug!(kind, "verification cancelled, reporting last result");
            verdict
        }
        Outcome::Cancelled(None) => {
            tracing::debug!(kind, "verification cancelled before any attempt");
            return Error::Cancelled.to_string();
        }
        Outcome::Failed(e) => {
            tracing::warn!(kind, error = %e, "verification task failed");
            return format!("Verification failed: {e}");
        }
    };

    match verdict {
        Verdict::Satisfied => {
            tracing::debug!(kind, "verification passed");
            String::new()
        }
        Verdict::NotSatisfied(snapshot) => {
            let actual: Vec<HttpRequest> = inbound_requests(&snapshot).cloned().collect();
            describe_failure(expected, formatter, &actual)
        }
    }
}

fn describe_failure(expected: &Expected, formatter: &DiffFormatter, actual: &[HttpRequest]) -> String {
    let kind = expected.kind();
    match expected.describe(formatter, actual) {
        Ok(failure) => {
            tracing::warn!(kind, received = actual.len(), "verification failed");
            failure
        }
        Err(e) => {
            tracing::warn!(kind, error = %e, "could not describe verification failure");
            format!("Verification failed: {e}")
        }
    }
}
