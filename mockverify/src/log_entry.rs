use std::{fmt, time::SystemTime};

use crate::{EntryId, HttpRequest};

/// The kind of event a [`LogEntry`] records.
///
/// Only [`ReceivedRequest`](Self::ReceivedRequest) entries take part in
/// verification; the other kinds are recorded by the surrounding server for
/// diagnostics and are skipped by request snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogEntryKind {
    ReceivedRequest,
    ExpectationResponse,
    NoMatchResponse,
    ForwardedRequest,
    ExpectationMatched,
    ExpectationNotMatched,
    Verification,
    VerificationFailed,
    Info,
    Warn,
}

impl LogEntryKind {
    /// Returns true for entries that denote an inbound request.
    #[inline]
    pub fn is_request(&self) -> bool {
        matches!(self, LogEntryKind::ReceivedRequest)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogEntryKind::ReceivedRequest => "RECEIVED_REQUEST",
            LogEntryKind::ExpectationResponse => "EXPECTATION_RESPONSE",
            LogEntryKind::NoMatchResponse => "NO_MATCH_RESPONSE",
            LogEntryKind::ForwardedRequest => "FORWARDED_REQUEST",
            LogEntryKind::ExpectationMatched => "EXPECTATION_MATCHED",
            LogEntryKind::ExpectationNotMatched => "EXPECTATION_NOT_MATCHED",
            LogEntryKind::Verification => "VERIFICATION",
            LogEntryKind::VerificationFailed => "VERIFICATION_FAILED",
            LogEntryKind::Info => "INFO",
            LogEntryKind::Warn => "WARN",
        }
    }
}

impl fmt::Display for LogEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded event.
///
/// Entries are immutable: they are built by the caller, handed to
/// [`EventLog::add`](crate::EventLog::add), and from then on only read.
/// The log assigns the insertion index; a detached entry reports `None`.
///
/// # Example
///
/// ```rust
/// use mockverify::{LogEntry, request};
///
/// let entry = LogEntry::received_request(request("/health"));
/// assert!(entry.kind().is_request());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    id: EntryId,
    timestamp: u64,
    kind: LogEntryKind,
    request: Option<HttpRequest>,
    message: Option<String>,
    index: Option<u64>,
}

impl LogEntry {
    /// Construct an entry of the given kind without a request.
    pub fn new(kind: LogEntryKind) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: now_nanos(),
            kind,
            request: None,
            message: None,
            index: None,
        }
    }

    /// Construct the entry recorded for every inbound request.
    pub fn received_request(request: HttpRequest) -> Self {
        Self::new(LogEntryKind::ReceivedRequest).with_request(request)
    }

    pub fn with_request(mut self, request: HttpRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub(crate) fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Creation time in nanoseconds since the Unix epoch.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    #[inline]
    pub fn kind(&self) -> LogEntryKind {
        self.kind
    }

    #[inline]
    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Position in the log, assigned on append.
    #[inline]
    pub fn index(&self) -> Option<u64> {
        self.index
    }

    /// Returns the request if this entry denotes an inbound request.
    #[inline]
    pub(crate) fn inbound_request(&self) -> Option<&HttpRequest> {
        if self.kind.is_request() {
            self.request.as_ref()
        } else {
            None
        }
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogEntry {{ id: {}, kind: {}", self.id, self.kind)?;
        if let Some(index) = self.index {
            write!(f, ", index: {index}")?;
        }
        if let Some(path) = self.request.as_ref().and_then(|r| r.path()) {
            write!(f, ", path: {path}")?;
        }
        write!(f, " }}")
    }
}
