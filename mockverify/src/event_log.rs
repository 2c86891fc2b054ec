use std::{fmt, sync::Arc};

use parking_lot::RwLock;

use crate::{HttpRequest, LogEntry, RequestMatcher};

/// A frozen, ordered view of the log taken by a single read.
pub type LogSnapshot = Arc<[Arc<LogEntry>]>;

/// Append-only, thread-safe store of recorded events.
///
/// Request-handling code calls [`add`](Self::add) from any number of threads;
/// the verification engine reads consistent snapshots while writers keep
/// appending. Entries are stored behind `Arc`, so a snapshot only clones
/// pointers under the read lock.
///
/// Guarantees:
/// - Entries keep their append order; positions never change.
/// - An entry is visible to every read that starts after its `add` returned.
/// - A snapshot is a prefix of the log: it never contains an entry without
///   also containing every entry appended before it.
///
/// `EventLog` is cheap to clone; clones share the same storage.
///
/// # Example
///
/// ```rust
/// use mockverify::{EventLog, LogEntry, request};
///
/// let log = EventLog::new();
/// log.add(LogEntry::received_request(request("one")));
/// log.add(LogEntry::received_request(request("two")));
///
/// let paths: Vec<_> = log
///     .matching_requests()
///     .iter()
///     .map(|r| r.path().unwrap_or_default().to_string())
///     .collect();
/// assert_eq!(paths, ["one", "two"]);
/// ```
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<RwLock<Vec<Arc<LogEntry>>>>,
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("entries", &self.len())
            .finish()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return its insertion index.
    pub fn add(&self, entry: LogEntry) -> u64 {
        let (id, kind) = (entry.id(), entry.kind());
        let index = {
            let mut entries = self.entries.write();
            let index = entries.len() as u64;
            entries.push(Arc::new(entry.with_index(index)));
            index
        };
        tracing::debug!(entry_id = %id, %kind, index, "entry appended");
        index
    }

    /// Returns every entry, in append order.
    pub fn entries(&self) -> LogSnapshot {
        self.entries.read().as_slice().into()
    }

    /// Returns the requests of all inbound-request entries, in append order.
    ///
    /// The result is a consistent snapshot: entries appended while it is
    /// being built are not included.
    pub fn matching_requests(&self) -> Vec<HttpRequest> {
        inbound_requests(&self.entries()).cloned().collect()
    }

    /// Returns the inbound requests that satisfy `matcher`, in append order.
    pub fn retrieve_requests(&self, matcher: &RequestMatcher) -> Vec<HttpRequest> {
        inbound_requests(&self.entries())
            .filter(|r| matcher.matches(r))
            .cloned()
            .collect()
    }

    /// Returns the number of entries of any kind.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Requests of the inbound-request entries in `entries`, borrowed in order.
pub(crate) fn inbound_requests(entries: &[Arc<LogEntry>]) -> impl Iterator<Item = &HttpRequest> {
    entries.iter().filter_map(|e| e.inbound_request())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LogEntryKind, request};
    use std::thread;

    fn paths(requests: &[HttpRequest]) -> Vec<String> {
        requests
            .iter()
            .map(|r| r.path().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn add_assigns_increasing_indexes() {
        let log = EventLog::new();
        assert_eq!(log.add(LogEntry::received_request(request("a"))), 0);
        assert_eq!(log.add(LogEntry::new(LogEntryKind::Info)), 1);
        assert_eq!(log.add(LogEntry::received_request(request("b"))), 2);

        let entries = log.entries();
        let indexes: Vec<_> = entries.iter().map(|e| e.index()).collect();
        assert_eq!(indexes, [Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn matching_requests_skips_non_request_entries() {
        let log = EventLog::new();
        log.add(LogEntry::received_request(request("one")));
        log.add(LogEntry::new(LogEntryKind::Warn).with_message("no match"));
        log.add(LogEntry::new(LogEntryKind::ForwardedRequest).with_request(request("fwd")));
        log.add(LogEntry::received_request(request("two")));

        assert_eq!(paths(&log.matching_requests()), ["one", "two"]);
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn empty_log() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert!(log.matching_requests().is_empty());
        assert!(log.entries().is_empty());
    }

    #[test]
    fn snapshot_is_not_affected_by_later_appends() {
        let log = EventLog::new();
        log.add(LogEntry::received_request(request("one")));
        let snapshot = log.entries();
        log.add(LogEntry::received_request(request("two")));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.entries().len(), 2);
    }

    #[test]
    fn clones_share_storage() {
        let log = EventLog::new();
        let writer = log.clone();
        writer.add(LogEntry::received_request(request("one")));
        assert_eq!(paths(&log.matching_requests()), ["one"]);
    }

    #[test]
    fn retrieve_requests_filters_by_matcher() {
        let log = EventLog::new();
        for path in ["one", "multi", "three", "multi"] {
            log.add(LogEntry::received_request(request(path)));
        }
        let matcher = RequestMatcher::new(&request("multi")).unwrap();
        assert_eq!(paths(&log.retrieve_requests(&matcher)), ["multi", "multi"]);
    }

    #[test]
    fn concurrent_appends_are_neither_lost_nor_duplicated() {
        let log = EventLog::new();
        let writers: Vec<_> = (0..8)
            .map(|w| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        log.add(LogEntry::received_request(request(format!("{w}-{i}"))));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let requests = log.matching_requests();
        assert_eq!(requests.len(), 2000);

        let mut seen = std::collections::HashSet::new();
        assert!(requests.iter().all(|r| seen.insert(r.path().unwrap().to_string())));

        // Per-writer order survives interleaving.
        for w in 0..8 {
            let prefix = format!("{w}-");
            let own: Vec<usize> = requests
                .iter()
                .filter_map(|r| r.path().unwrap().strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(own, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn snapshots_taken_during_appends_are_prefixes() {
        let log = EventLog::new();
        let writer = {
            let log = log.clone();
            thread::spawn(move || {
                for i in 0..1000 {
                    log.add(LogEntry::received_request(request(i.to_string())));
                }
            })
        };

        for _ in 0..50 {
            let snapshot = log.matching_requests();
            for (i, r) in snapshot.iter().enumerate() {
                assert_eq!(r.path(), Some(i.to_string().as_str()));
            }
        }
        writer.join().unwrap();
        assert_eq!(log.matching_requests().len(), 1000);
    }

    #[test]
    fn inbound_requests_borrow_from_snapshot() {
        let log = EventLog::new();
        log.add(LogEntry::received_request(request("one")));
        log.add(LogEntry::new(LogEntryKind::Info));
        log.add(LogEntry::received_request(request("two")));

        let snapshot = log.entries();
        let borrowed: Vec<&HttpRequest> = inbound_requests(&snapshot).collect();
        assert_eq!(borrowed.len(), 2);
        assert!(std::ptr::eq(borrowed[0], snapshot[0].request().unwrap()));
        assert!(std::ptr::eq(borrowed[1], snapshot[2].request().unwrap()));
    }

    #[test]
    fn append_logging_runs_without_holding_the_lock() {
        let log = EventLog::new();
        let reader = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || {
                // Reads the log from inside the subscriber while an event is written.
                let _ = reader.len();
                std::io::sink()
            })
            .finish();

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let writer = log.clone();
        thread::spawn(move || {
            tracing::subscriber::with_default(subscriber, || {
                writer.add(LogEntry::received_request(request("one")));
            });
            let _ = done_tx.send(());
        });

        done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("append finished while the subscriber read the log");
        assert_eq!(log.len(), 1);
    }
}
