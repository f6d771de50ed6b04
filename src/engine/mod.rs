//! The execution engine.
//!
//! [`run`] launches every registered test case at once, collects settled
//! outcomes in completion order, and races settlement against the suite
//! timer and (when configured) the first test failure. Whichever settles
//! first decides how the run ends; the summary is reported either way.
//!
//! Early exit stops the engine from *waiting for* and *reporting on*
//! tests still in flight; it does not cancel them. Their tasks keep
//! running until the process terminates, and any result they produce
//! afterwards is discarded.

pub mod race;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::lifecycle::SuiteSignal;
use crate::report::Reporter;
use crate::suite::{SuiteOptions, TestCase, TestFailure};
use race::{SuiteTimer, race};

/// Result of an entire suite run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Number of tests registered when the run started.
    pub total: usize,
    /// Tests that settled successfully before the run ended.
    pub passed: usize,
    /// Tests that settled with a failure before the run ended.
    pub failed: usize,
    /// Whether the run ended on the timeout or fail-fast race rather
    /// than by all tests settling.
    pub exited_early: bool,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

impl RunResult {
    /// Tests still in flight (or suppressed) when the run ended.
    pub fn unfinished(&self) -> usize {
        self.total - self.passed - self.failed
    }

    /// Whether the run passed. Unfinished tests do not fail a run on
    /// their own.
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for this result: `1` if any test failed, else
    /// `0`, regardless of the unfinished count.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 { 1 } else { 0 }
    }
}

/// How the three-way race resolved.
#[derive(Debug)]
enum RaceOutcome {
    AllSettled,
    TimedOut,
    FailFast { description: String },
}

/// Run all cases to a [`RunResult`], reporting as results arrive.
///
/// The declared total is fixed before any test is polled. Result lines
/// are emitted in completion order, which need not match registration
/// order; summary lines are always last.
pub(crate) async fn run<R>(
    cases: Vec<TestCase>,
    options: &SuiteOptions,
    signals: &broadcast::Sender<SuiteSignal>,
    reporter: &R,
) -> RunResult
where
    R: Reporter + ?Sized,
{
    let start = Instant::now();
    let total = cases.len();
    let limit = options.maximum_duration();

    debug!(tests = total, "running tests");
    reporter.on_run_start(total).await;

    // Subscribe before any test can fail, so the fail-fast contender
    // cannot miss the first TestError.
    let mut error_signals = options.exit_on_failure.then(|| signals.subscribe());

    let (tx, mut rx) = mpsc::unbounded_channel::<(usize, Result<(), TestFailure>)>();
    let mut descriptions = Vec::with_capacity(total);

    for (index, case) in cases.into_iter().enumerate() {
        let (description, test_fn) = case.into_parts();
        descriptions.push(description.clone());
        let tx = tx.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(async move { (test_fn)().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => Err(TestFailure::from_panic(payload)),
            };
            debug!(
                test = %description,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "test settled"
            );
            if tx.send((index, outcome)).is_err() {
                // The run exited early; the result is deliberately
                // discarded, failures included.
                debug!(test = %description, "result arrived after early exit; discarding");
            }
        });
    }
    drop(tx);

    let mut passed = 0usize;
    let mut failed = 0usize;

    let drain = async {
        while let Some((index, outcome)) = rx.recv().await {
            let description = &descriptions[index];
            match outcome {
                Ok(()) => {
                    passed += 1;
                    reporter.on_test_passed(description).await;
                }
                Err(failure) => {
                    failed += 1;
                    reporter.on_test_failed(description, &failure).await;
                    let _ = signals.send(SuiteSignal::TestError {
                        description: description.clone(),
                        failure: Arc::new(failure),
                    });
                }
            }
        }
        RaceOutcome::AllSettled
    };

    let mut contenders = vec![
        drain.boxed_local(),
        async move {
            SuiteTimer::new(limit).elapsed().await;
            RaceOutcome::TimedOut
        }
        .boxed_local(),
    ];
    if let Some(rx) = error_signals.take() {
        contenders.push(first_test_error(rx).boxed_local());
    }

    let outcome = race(contenders).await;

    let exited_early = match outcome {
        RaceOutcome::AllSettled => false,
        RaceOutcome::TimedOut => {
            reporter.on_timeout(limit).await;
            true
        }
        RaceOutcome::FailFast { description } => {
            reporter.on_early_exit(&description).await;
            true
        }
    };

    let result = RunResult {
        total,
        passed,
        failed,
        exited_early,
        duration: start.elapsed(),
    };
    debug!(
        elapsed_ms = result.duration.as_millis() as u64,
        passed = result.passed,
        failed = result.failed,
        unfinished = result.unfinished(),
        "done running tests"
    );
    reporter.on_run_complete(&result).await;
    result
}

/// The fail-fast contender: resolves on the first `TestError` signal.
async fn first_test_error(mut signals: broadcast::Receiver<SuiteSignal>) -> RaceOutcome {
    loop {
        match signals.recv().await {
            Ok(SuiteSignal::TestError { description, .. }) => {
                return RaceOutcome::FailFast { description };
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Only TestError signals flow during a run, so the next
                // retained signal is still a failure; keep receiving.
                debug!(skipped, "fail-fast listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Reporter;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records reporter events as plain strings, in order.
    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl Reporter for RecordingReporter {
        async fn on_run_start(&self, total: usize) {
            self.push(format!("start {total}"));
        }
        async fn on_test_passed(&self, description: &str) {
            self.push(format!("ok {description}"));
        }
        async fn on_test_failed(&self, description: &str, failure: &TestFailure) {
            self.push(format!("not ok {description}: {}", failure.message()));
        }
        async fn on_timeout(&self, limit: Duration) {
            self.push(format!("timeout {}s", limit.as_secs_f64()));
        }
        async fn on_early_exit(&self, description: &str) {
            self.push(format!("early exit {description}"));
        }
        async fn on_run_complete(&self, result: &RunResult) {
            self.push(format!(
                "complete pass={} fail={} unfinished={}",
                result.passed,
                result.failed,
                result.unfinished()
            ));
        }
    }

    fn case_ok(description: &str) -> TestCase {
        TestCase::new(description, || async { Ok(()) })
    }

    fn case_failing(description: &str, message: &'static str) -> TestCase {
        TestCase::new(description, move || async move {
            Err(TestFailure::new(message))
        })
    }

    fn case_sleeping(description: &str, delay: Duration) -> TestCase {
        TestCase::new(description, move || async move {
            tokio::time::sleep(delay).await;
            Ok(())
        })
    }

    fn signals() -> broadcast::Sender<SuiteSignal> {
        broadcast::channel(64).0
    }

    #[tokio::test]
    async fn single_passing_test() {
        let reporter = RecordingReporter::default();
        let result = run(
            vec![case_ok("it works")],
            &SuiteOptions::default(),
            &signals(),
            &reporter,
        )
        .await;

        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(result.unfinished(), 0);
        assert!(!result.exited_early);
        assert_eq!(result.exit_code(), 0);
        assert_eq!(
            reporter.events(),
            ["start 1", "ok it works", "complete pass=1 fail=0 unfinished=0"]
        );
    }

    #[tokio::test]
    async fn single_failing_test() {
        let reporter = RecordingReporter::default();
        let result = run(
            vec![case_failing("it breaks", "boom")],
            &SuiteOptions::default(),
            &signals(),
            &reporter,
        )
        .await;

        assert_eq!(result.failed, 1);
        assert_eq!(result.exit_code(), 1);
        assert_eq!(
            reporter.events(),
            [
                "start 1",
                "not ok it breaks: boom",
                "complete pass=0 fail=1 unfinished=0"
            ]
        );
    }

    #[tokio::test]
    async fn panicking_test_is_caught_like_a_failure() {
        let reporter = RecordingReporter::default();
        let cases = vec![TestCase::new("it panics", || async { panic!("boom") })];
        let result = run(cases, &SuiteOptions::default(), &signals(), &reporter).await;

        assert_eq!(result.failed, 1);
        assert!(
            reporter
                .events()
                .contains(&"not ok it panics: boom".to_string())
        );
    }

    #[tokio::test]
    async fn empty_suite_settles_immediately() {
        let reporter = RecordingReporter::default();
        let result = run(
            Vec::new(),
            &SuiteOptions::default(),
            &signals(),
            &reporter,
        )
        .await;

        assert_eq!(result.total, 0);
        assert!(!result.exited_early);
        assert_eq!(result.exit_code(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_suppresses_slow_tests() {
        let reporter = RecordingReporter::default();
        let cases = vec![
            case_ok("fast success"),
            case_failing("fast failure", "nope"),
            case_sleeping("slow one", Duration::from_secs(1)),
            case_sleeping("slow two", Duration::from_secs(1)),
        ];
        let options = SuiteOptions {
            maximum_duration_secs: 0.1,
            ..SuiteOptions::default()
        };
        let result = run(cases, &options, &signals(), &reporter).await;

        assert!(result.exited_early);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.unfinished(), 2);
        assert_eq!(result.exit_code(), 1);

        let events = reporter.events();
        assert!(events.contains(&"timeout 0.1s".to_string()));
        assert!(!events.iter().any(|e| e.contains("slow one")));
        assert!(!events.iter().any(|e| e.contains("slow two")));
        assert_eq!(
            events.last().unwrap().as_str(),
            "complete pass=1 fail=1 unfinished=2"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_stops_before_later_tests_settle() {
        let reporter = RecordingReporter::default();
        let cases = vec![
            case_sleeping("first, succeeding test", Duration::ZERO),
            TestCase::new("second, failing test", || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(TestFailure::new("error"))
            }),
            case_sleeping("third, succeeding test", Duration::from_millis(20)),
        ];
        let options = SuiteOptions {
            exit_on_failure: true,
            ..SuiteOptions::default()
        };
        let result = run(cases, &options, &signals(), &reporter).await;

        assert!(result.exited_early);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.unfinished(), 1);

        let events = reporter.events();
        assert!(events.contains(&"ok first, succeeding test".to_string()));
        assert!(events.contains(&"early exit second, failing test".to_string()));
        assert!(!events.iter().any(|e| e.contains("third")));
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_disabled_waits_for_everything() {
        let reporter = RecordingReporter::default();
        let cases = vec![
            case_failing("failing", "x"),
            case_sleeping("slow", Duration::from_millis(50)),
        ];
        let result = run(cases, &SuiteOptions::default(), &signals(), &reporter).await;

        assert!(!result.exited_early);
        assert_eq!(result.passed, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.unfinished(), 0);
    }

    #[tokio::test]
    async fn failure_emits_test_error_signal() {
        let sender = signals();
        let mut observer = sender.subscribe();
        let reporter = RecordingReporter::default();
        run(
            vec![case_failing("watched", "boom")],
            &SuiteOptions::default(),
            &sender,
            &reporter,
        )
        .await;

        let signal = observer.recv().await.unwrap();
        match signal {
            SuiteSignal::TestError {
                description,
                failure,
            } => {
                assert_eq!(description, "watched");
                assert_eq!(failure.message(), "boom");
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[tokio::test]
    async fn counters_always_reconcile_with_the_total() {
        let reporter = RecordingReporter::default();
        let cases: Vec<_> = (0..50)
            .map(|i| {
                if i % 7 == 0 {
                    case_failing("failing case", "nope")
                } else {
                    case_ok("passing case")
                }
            })
            .collect();
        let total = cases.len();
        let result = run(cases, &SuiteOptions::default(), &signals(), &reporter).await;

        assert_eq!(result.total, total);
        assert_eq!(result.passed + result.failed + result.unfinished(), total);
        assert_eq!(result.unfinished(), 0);
    }
}
