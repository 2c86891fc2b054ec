use std::{sync::Arc, thread, time::Duration};

use mockverify::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

struct Fixture {
    log: EventLog,
    scheduler: Arc<Scheduler>,
    engine: VerificationEngine,
}

impl Fixture {
    fn new(paths: &[&str]) -> Self {
        init_tracing();
        let log = EventLog::new();
        for path in paths {
            log.add(LogEntry::received_request(request(*path)));
        }
        let scheduler = Arc::new(Scheduler::new(SchedulerConfig::default()).unwrap());
        let retry = RetryPolicy::default()
            .with_interval(Duration::from_millis(5))
            .with_max_attempts(5);
        let engine = VerificationEngine::new(log.clone(), scheduler.clone())
            .with_config(VerifyConfig::default().with_retry(retry));
        Self {
            log,
            scheduler,
            engine,
        }
    }

    fn sequence(&self, paths: &[&str]) -> String {
        let sequence =
            VerificationSequence::new().with_requests(paths.iter().map(|p| request(*p)));
        self.engine.verify_sequence(Some(&sequence)).unwrap().wait()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.scheduler.shutdown();
    }
}

const LOG: &[&str] = &["one", "multi", "three", "multi", "four"];

fn lines(text: &str) -> String {
    text.replace('\n', NEW_LINE)
}

#[test]
fn missing_request_lists_everything_received() {
    let fixture = Fixture::new(LOG);
    let expected = lines(
        "Request sequence not found, expected:<[ {\n  \"path\" : \"five\"\n} ]> but was:<[ {\n  \"path\" : \"one\"\n}, {\n  \"path\" : \"multi\"\n}, {\n  \"path\" : \"three\"\n}, {\n  \"path\" : \"multi\"\n}, {\n  \"path\" : \"four\"\n} ]>",
    );
    assert_eq!(fixture.sequence(&["five"]), expected);
}

#[test]
fn in_order_subsequences_pass() {
    let fixture = Fixture::new(LOG);
    assert_eq!(fixture.sequence(&["one", "multi"]), "");
    assert_eq!(fixture.sequence(&["multi", "multi"]), "");
    assert_eq!(fixture.sequence(&["one", "multi", "three", "multi", "four"]), "");
}

#[test]
fn over_consuming_or_reordered_sequences_fail() {
    let fixture = Fixture::new(LOG);
    assert_ne!(fixture.sequence(&["multi", "multi", "multi"]), "");
    assert_ne!(fixture.sequence(&["multi", "one"]), "");
}

#[test]
fn empty_and_absent_sequences_pass() {
    let fixture = Fixture::new(LOG);
    assert_eq!(fixture.sequence(&[]), "");
    assert_eq!(fixture.engine.verify_sequence(None).unwrap().wait(), "");
}

#[test]
fn empty_log_reports_empty_actual_list() {
    let fixture = Fixture::new(&[]);
    assert_eq!(
        fixture.sequence(&["one"]),
        lines("Request sequence not found, expected:<[ {\n  \"path\" : \"one\"\n} ]> but was:<[ ]>")
    );
}

#[test]
fn concurrent_writers_are_all_visible() {
    let fixture = Fixture::new(&[]);
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let log = fixture.log.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    log.add(LogEntry::received_request(request(format!("/w{w}/{i}"))));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    assert_eq!(fixture.log.matching_requests().len(), 200);
    for w in 0..4 {
        let first = format!("/w{w}/0");
        let last = format!("/w{w}/49");
        assert_eq!(fixture.sequence(&[first.as_str(), last.as_str()]), "");
    }
}

#[test]
fn counts_are_checked_against_times() {
    let fixture = Fixture::new(LOG);
    let verify = |path: &str, times: VerificationTimes| {
        let verification = Verification::new(request(path)).with_times(times);
        fixture.engine.verify_times(Some(&verification)).unwrap().wait()
    };

    assert_eq!(verify("multi", VerificationTimes::exactly(2)), "");
    assert_eq!(verify("multi", VerificationTimes::at_least(1)), "");
    assert_eq!(verify("five", VerificationTimes::never()), "");
    assert_eq!(verify("one", VerificationTimes::between(1, 3)), "");
    assert!(verify("multi", VerificationTimes::at_most(1)).starts_with("Request not found at most once"));
}

#[test]
fn regex_paths_match_recorded_requests() {
    let fixture = Fixture::new(&["/orders/17", "/orders/18/items", "/checkout"]);
    assert_eq!(fixture.sequence(&["/orders/\\d+", "/checkout"]), "");
    assert_ne!(fixture.sequence(&["/checkout", "/orders/.*"]), "");
}

#[test]
fn verifying_after_shutdown_is_an_error() {
    let fixture = Fixture::new(LOG);
    fixture.scheduler.shutdown();
    let sequence = VerificationSequence::new().with_request(request("one"));
    assert_eq!(
        fixture.engine.verify_sequence(Some(&sequence)).unwrap_err(),
        Error::SchedulerShutdown
    );
}
