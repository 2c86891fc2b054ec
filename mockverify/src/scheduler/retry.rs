use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
};

use tokio::{select, time::Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    Error, Result, RetryPolicy,
    scheduler::{Attempt, Completion, Outcome},
};

/// Drive `task` until it is done, the policy runs out, or `cancel` fires.
///
/// The task runs synchronously on the scheduler worker; only the pauses
/// between attempts are awaited.
pub(crate) async fn run_retry<T, F, C>(
    policy: RetryPolicy,
    mut task: F,
    completion: Completion<T, C>,
    cancel: CancellationToken,
) where
    F: FnMut(u32) -> Result<Attempt<T>>,
    C: FnOnce(Outcome<T>),
{
    if cancel.is_cancelled() {
        return completion.complete(Outcome::Cancelled(None));
    }

    let deadline = Instant::now() + policy.timeout();
    let mut attempt = 0;

    loop {
        attempt += 1;
        let value = match catch_unwind(AssertUnwindSafe(|| task(attempt))) {
            Ok(Ok(Attempt::Done(value))) => {
                tracing::trace!(attempt, "retry task completed");
                return completion.complete(Outcome::Completed(value));
            }
            Ok(Ok(Attempt::Retry(value))) => value,
            Ok(Err(e)) => {
                tracing::warn!(attempt, error = %e, "retry task failed");
                return completion.complete(Outcome::Failed(e));
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(attempt, panic = %message, "retry task panicked");
                return completion.complete(Outcome::Failed(Error::TaskFailed(message)));
            }
        };

        let next = Instant::now() + policy.interval();
        if attempt >= policy.max_attempts() || next > deadline {
            tracing::trace!(attempt, "retry budget exhausted");
            return completion.complete(Outcome::Exhausted(value));
        }

        select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::trace!(attempt, "retry cancelled");
                return completion.complete(Outcome::Cancelled(Some(value)));
            }
            _ = tokio::time::sleep_until(next) => {}
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::DeliveryGate;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    type Seen = Arc<Mutex<Vec<Outcome<u32>>>>;

    fn completion() -> (Seen, Completion<u32, impl FnOnce(Outcome<u32>)>) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (
            seen,
            Completion::new(
                move |o| sink.lock().unwrap().push(o),
                Arc::new(DeliveryGate::default()),
            ),
        )
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::default()
            .with_interval(Duration::from_millis(1))
            .with_max_attempts(max_attempts)
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn completes_on_first_done() {
        let (seen, completion) = completion();
        run_retry(fast(5), |n| Ok(Attempt::Done(n)), completion, CancellationToken::new()).await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Completed(1)]);
    }

    #[tokio::test]
    async fn retries_until_done() {
        let (seen, completion) = completion();
        let task = |n| {
            if n < 3 {
                Ok(Attempt::Retry(n))
            } else {
                Ok(Attempt::Done(n))
            }
        };
        run_retry(fast(5), task, completion, CancellationToken::new()).await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Completed(3)]);
    }

    #[tokio::test]
    async fn exhausts_after_max_attempts_with_last_value() {
        let (seen, completion) = completion();
        run_retry(fast(4), |n| Ok(Attempt::Retry(n * 10)), completion, CancellationToken::new())
            .await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Exhausted(40)]);
    }

    #[tokio::test]
    async fn exhausts_when_deadline_passes() {
        let (seen, completion) = completion();
        let policy = RetryPolicy::default()
            .with_interval(Duration::from_millis(20))
            .with_max_attempts(1000)
            .with_timeout(Duration::from_millis(50));
        run_retry(policy, |n| Ok(Attempt::Retry(n)), completion, CancellationToken::new()).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        match seen[0] {
            Outcome::Exhausted(attempts) => assert!((1..=4).contains(&attempts)),
            ref other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn once_policy_runs_a_single_attempt() {
        let (seen, completion) = completion();
        run_retry(
            RetryPolicy::once(),
            |n| Ok(Attempt::Retry(n)),
            completion,
            CancellationToken::new(),
        )
        .await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Exhausted(1)]);
    }

    #[tokio::test]
    async fn task_error_fails_without_retrying() {
        let (seen, completion) = completion();
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let task = move |_| {
            *counter.lock().unwrap() += 1;
            Err(Error::TaskFailed("boom".into()))
        };
        run_retry(fast(5), task, completion, CancellationToken::new()).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Outcome::Failed(Error::TaskFailed("boom".into()))]
        );
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn panicking_task_is_reported_as_failure() {
        let (seen, completion) = completion();
        let task = |_| -> Result<Attempt<u32>> { panic!("attempt exploded") };
        run_retry(fast(5), task, completion, CancellationToken::new()).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Outcome::Failed(Error::TaskFailed("attempt exploded".into()))]
        );
    }

    #[tokio::test]
    async fn already_cancelled_runs_no_attempt() {
        let (seen, completion) = completion();
        let cancel = CancellationToken::new();
        cancel.cancel();
        run_retry(fast(5), |n| Ok(Attempt::Done(n)), completion, cancel).await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Cancelled(None)]);
    }

    #[tokio::test]
    async fn cancellation_between_attempts_keeps_last_value() {
        let (seen, completion) = completion();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let policy = RetryPolicy::default()
            .with_interval(Duration::from_secs(10))
            .with_timeout(Duration::from_secs(60));
        let task = move |n| {
            trigger.cancel();
            Ok(Attempt::Retry(n))
        };
        run_retry(policy, task, completion, cancel).await;
        assert_eq!(*seen.lock().unwrap(), vec![Outcome::Cancelled(Some(1))]);
    }
}
