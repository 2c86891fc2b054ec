//! # mockverify
//!
//! Record inbound HTTP requests and assert, after the fact, that they arrived
//! the expected number of times or in the expected order.
//!
//! A mock server appends one [`LogEntry`] per received request to an
//! [`EventLog`]. Tests then ask a [`VerificationEngine`] to check the log.
//! Checks run on a background [`Scheduler`] and are retried with fresh
//! snapshots for a while, so requests still in flight are not reported as
//! missing. Each check resolves to a single string: empty on success, a
//! human-readable diff otherwise.
//!
//! ## Quick Start
//!
//! ```rust
//! use mockverify::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result {
//! let log = EventLog::new();
//! let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default())?);
//! let engine = VerificationEngine::new(log.clone(), scheduler.clone());
//!
//! for path in ["/login", "/cart", "/checkout"] {
//!     log.add(LogEntry::received_request(request(path)));
//! }
//!
//! let in_order = VerificationSequence::new()
//!     .with_request(request("/login"))
//!     .with_request(request("/checkout"));
//! assert_eq!(engine.verify_sequence(Some(&in_order))?.wait(), "");
//!
//! let once = Verification::new(request("/cart")).with_times(VerificationTimes::once());
//! assert_eq!(engine.verify_times(Some(&once))?.wait(), "");
//!
//! scheduler.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventLog`] | Append-only, thread-safe log of [`LogEntry`] values |
//! | [`HttpRequest`] | Request descriptor, used both as a recorded request and as a pattern |
//! | [`RequestMatcher`] | Compiled pattern matching [`HttpRequest`]s |
//! | [`Verification`] | "received N times" assertion, see [`VerificationTimes`] |
//! | [`VerificationSequence`] | "received in this order" assertion |
//! | [`VerificationEngine`] | Runs assertions against a log |
//! | [`VerificationHandle`] | Pending result of an assertion |
//! | [`Scheduler`] | Background runtime executing retrying checks |
//! | [`DiffFormatter`] | Canonical rendering of requests and failure messages |
//!
//! ## Failure messages
//!
//! ```text
//! Request sequence not found, expected:<[ {
//!   "path" : "/checkout"
//! } ]> but was:<[ {
//!   "path" : "/login"
//! } ]>
//! ```
//!
//! Line breaks inside failure messages use the platform convention, see
//! [`NEW_LINE`].
//!
//! ## Retries
//!
//! [`VerifyConfig`] holds the [`RetryPolicy`] used for every check: the pause
//! between attempts, the maximum number of attempts, and an overall timeout.
//! A check that is still unsatisfied when either limit is reached resolves
//! with the failure text of its last attempt.

mod config;
mod diff;
mod entry_id;
mod error;
mod event_log;
mod log_entry;
mod request;
mod request_matcher;

pub mod scheduler;
pub mod verification;

pub use config::{RetryPolicy, SchedulerConfig, VerifyConfig};
pub use diff::{DiffFormatter, NEW_LINE};
pub use entry_id::EntryId;
pub use error::Error;
pub use event_log::{EventLog, LogSnapshot};
pub use log_entry::{LogEntry, LogEntryKind};
pub use request::{HttpRequest, Multimap, request};
pub use request_matcher::RequestMatcher;
pub use scheduler::{Attempt, Outcome, Scheduler};
pub use verification::{
    Verification, VerificationEngine, VerificationHandle, VerificationSequence, VerificationTimes,
};

/// Convenience alias for `Result<T, mockverify::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
