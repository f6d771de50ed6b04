//! Result reporting: the reporter seam and the TAP v13 renderer.

pub mod format;

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::RunResult;
use crate::suite::TestFailure;

/// A reporter receives run events as they happen.
///
/// Events arrive in completion order, after a fixed run-start event; the
/// run-complete event is always last. Reporting must never fail the run.
#[async_trait]
pub trait Reporter: Send + Sync {
    /// The run is starting; `total` is the declared test count, fixed
    /// for the whole run.
    async fn on_run_start(&self, total: usize);

    /// A test settled successfully.
    async fn on_test_passed(&self, description: &str);

    /// A test settled with a failure.
    async fn on_test_failed(&self, description: &str, failure: &TestFailure);

    /// The suite deadline elapsed; the run is exiting early.
    async fn on_timeout(&self, limit: Duration);

    /// Fail-fast tripped on the named test; the run is exiting early.
    async fn on_early_exit(&self, description: &str);

    /// The run is over; summary counts are final.
    async fn on_run_complete(&self, result: &RunResult);
}

/// A reporter that does nothing (for tests or embedded runs).
pub struct NullReporter;

#[async_trait]
impl Reporter for NullReporter {
    async fn on_run_start(&self, _total: usize) {}
    async fn on_test_passed(&self, _description: &str) {}
    async fn on_test_failed(&self, _description: &str, _failure: &TestFailure) {}
    async fn on_timeout(&self, _limit: Duration) {}
    async fn on_early_exit(&self, _description: &str) {}
    async fn on_run_complete(&self, _result: &RunResult) {}
}

/// Streams the TAP version 13 protocol, one line at a time:
///
/// ```text
/// TAP version 13
/// 1..<N>
/// ok <description>
/// not ok <description>
///   ---
///   message: <string>
///   expected: <value>
///   actual: <value>
///   stack: <cleaned trace>
///   ...
/// # tests <N>
/// # pass <N>
/// # fail <N>
/// # unfinished <N>
/// ```
///
/// The writer sits behind a mutex so the reporter can be shared; output
/// errors are swallowed — a broken pipe must not take the run down.
pub struct TapReporter<W: Write> {
    out: Mutex<W>,
}

impl TapReporter<std::io::Stdout> {
    /// The standard reporter: TAP on stdout.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TapReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Recover the writer, e.g. to inspect captured output in tests.
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn line(&self, text: &str) {
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }
}

#[async_trait]
impl<W: Write + Send> Reporter for TapReporter<W> {
    async fn on_run_start(&self, total: usize) {
        self.line("TAP version 13");
        self.line(&format!("1..{total}"));
    }

    async fn on_test_passed(&self, description: &str) {
        self.line(&format!("ok {description}"));
    }

    async fn on_test_failed(&self, description: &str, failure: &TestFailure) {
        self.line(&format!("not ok {description}"));
        self.line("  ---");
        self.line(&format!("  message: {}", failure.message()));
        self.line(&format!(
            "  expected: {}",
            format::render_value(failure.expected())
        ));
        self.line(&format!(
            "  actual: {}",
            format::render_value(failure.actual())
        ));
        match failure.backtrace().and_then(format::clean_backtrace) {
            Some(stack) => {
                let mut lines = stack.lines();
                if let Some(first) = lines.next() {
                    self.line(&format!("  stack: {first}"));
                }
                for rest in lines {
                    self.line(&format!("    {rest}"));
                }
            }
            None => self.line("  stack: ~"),
        }
        self.line("  ...");
    }

    async fn on_timeout(&self, limit: Duration) {
        self.line(&format!(
            "# suite timed out after {}s",
            limit.as_secs_f64()
        ));
    }

    async fn on_early_exit(&self, description: &str) {
        self.line(&format!("# exiting early on first failure: {description}"));
    }

    async fn on_run_complete(&self, result: &RunResult) {
        self.line(&format!("# tests {}", result.total));
        self.line(&format!("# pass {}", result.passed));
        self.line(&format!("# fail {}", result.failed));
        self.line(&format!("# unfinished {}", result.unfinished()));
    }
}
