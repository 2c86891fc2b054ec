use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use tokio::sync::oneshot;

use crate::Error;

/// Pending result of a verification.
///
/// Resolves to an empty string on success, or to the failure text. Await it
/// from async code, or call [`wait`](Self::wait) from synchronous code.
///
/// If the verification is torn down without producing a result, the handle
/// resolves to the [`Error::Cancelled`] message.
#[derive(Debug)]
pub struct VerificationHandle {
    receiver: oneshot::Receiver<String>,
}

impl VerificationHandle {
    pub(crate) fn channel() -> (oneshot::Sender<String>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { receiver: rx })
    }

    /// A handle that is already resolved to `result`.
    pub(crate) fn resolved(result: String) -> Self {
        let (tx, handle) = Self::channel();
        let _ = tx.send(result);
        handle
    }

    /// Block the current thread until the result is available.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; await
    /// the handle there instead.
    pub fn wait(self) -> String {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Error::Cancelled.to_string())
    }

    /// The result if it is already available, without waiting.
    pub fn try_result(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Error::Cancelled.to_string()),
        }
    }
}

impl Future for VerificationHandle {
    type Output = String;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Error::Cancelled.to_string()))
    }
}
