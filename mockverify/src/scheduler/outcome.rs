use std::{marker::PhantomData, sync::Arc};

use crate::{Error, scheduler::DeliveryGate};

/// What a single retry attempt reports back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Stop retrying and complete with this value.
    Done(T),
    /// Not there yet. The value is kept as the latest result in case no
    /// further attempt runs.
    Retry(T),
}

/// How a scheduled retry ended. Delivered at most once per scheduled task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// An attempt returned [`Attempt::Done`].
    Completed(T),
    /// The attempt budget or the deadline ran out; carries the last result.
    Exhausted(T),
    /// The scheduler shut down first; carries the last result, if any
    /// attempt ran.
    Cancelled(Option<T>),
    /// An attempt returned an error or panicked.
    Failed(Error),
}

/// At-most-once delivery of an [`Outcome`].
///
/// If the guard is dropped without completing, for instance because the
/// task owning it was dropped during runtime shutdown, the callback receives
/// `Outcome::Cancelled(None)`. Once the scheduler's [`DeliveryGate`] is
/// closed the callback is dropped without being called.
pub(crate) struct Completion<T, C>
where
    C: FnOnce(Outcome<T>),
{
    callback: Option<C>,
    gate: Arc<DeliveryGate>,
    _outcome: PhantomData<fn(Outcome<T>)>,
}

impl<T, C> Completion<T, C>
where
    C: FnOnce(Outcome<T>),
{
    pub(crate) fn new(callback: C, gate: Arc<DeliveryGate>) -> Self {
        Self {
            callback: Some(callback),
            gate,
            _outcome: PhantomData,
        }
    }

    pub(crate) fn complete(mut self, outcome: Outcome<T>) {
        self.deliver(outcome);
    }

    fn deliver(&mut self, outcome: Outcome<T>) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        if !self.gate.deliver(|| callback(outcome)) {
            tracing::trace!("scheduler shut down, outcome discarded");
        }
    }
}

impl<T, C> Drop for Completion<T, C>
where
    C: FnOnce(Outcome<T>),
{
    fn drop(&mut self) {
        self.deliver(Outcome::Cancelled(None));
    }
}
