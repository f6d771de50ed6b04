//! Test cases and test failures.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

/// The boxed future a test function resolves to.
pub type TestFuture = BoxFuture<'static, Result<(), TestFailure>>;

/// The stored form of a registered test function.
pub(crate) type TestFn = Box<dyn FnOnce() -> TestFuture + Send>;

/// A single registered test case.
///
/// Cases are immutable once registered; the registration order is
/// preserved and fixes both the launch order and the declared total of
/// the run.
pub struct TestCase {
    description: String,
    test_fn: TestFn,
}

impl TestCase {
    /// Create a test case from a description and an async test function.
    pub fn new<F, Fut>(description: impl Into<String>, test_fn: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TestFailure>> + Send + 'static,
    {
        Self {
            description: description.into(),
            test_fn: Box::new(move || -> TestFuture { Box::pin(test_fn()) }),
        }
    }

    /// The human-readable description reported on the `ok`/`not ok` line.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn into_parts(self) -> (String, TestFn) {
        (self.description, self.test_fn)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A failed test: the error value a test function returns (or the caught
/// panic it raised).
///
/// `expected` and `actual` are optional arbitrary values attached by
/// comparison assertions; the reporter renders them when present and a
/// placeholder when absent.
#[derive(Debug, Serialize)]
pub struct TestFailure {
    message: String,
    expected: Option<Value>,
    actual: Option<Value>,
    #[serde(skip)]
    backtrace: Option<Backtrace>,
}

impl TestFailure {
    /// Create a failure with the given message, capturing a backtrace if
    /// the environment enables one (`RUST_BACKTRACE`).
    pub fn new(message: impl Into<String>) -> Self {
        let captured = Backtrace::capture();
        let backtrace = match captured.status() {
            BacktraceStatus::Captured => Some(captured),
            _ => None,
        };
        Self {
            message: message.into(),
            expected: None,
            actual: None,
            backtrace,
        }
    }

    /// Create a comparison failure carrying the expected and actual
    /// values.
    pub fn comparison<E, A>(message: impl Into<String>, expected: E, actual: A) -> Self
    where
        E: Serialize,
        A: Serialize,
    {
        Self::new(message)
            .with_expected(expected)
            .with_actual(actual)
    }

    /// Attach the expected value.
    pub fn with_expected(mut self, expected: impl Serialize) -> Self {
        self.expected = serde_json::to_value(expected).ok();
        self
    }

    /// Attach the actual value.
    pub fn with_actual(mut self, actual: impl Serialize) -> Self {
        self.actual = serde_json::to_value(actual).ok();
        self
    }

    /// Convert a caught panic payload into a failure.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "test panicked".to_string()
        };
        Self {
            message,
            expected: None,
            actual: None,
            backtrace: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    pub fn actual(&self) -> Option<&Value> {
        self.actual.as_ref()
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }
}

impl fmt::Display for TestFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TestFailure {}

impl From<String> for TestFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for TestFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
