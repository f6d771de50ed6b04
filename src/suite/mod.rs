//! Suite state: the registry of test cases, the one-shot options store,
//! and the lifecycle coordinator, behind one cheaply clonable handle.
//!
//! A [`Suite`] is an explicit state object rather than process-wide
//! globals: several independent suites can coexist in one process, which
//! is what makes the engine itself testable.

pub mod case;
pub mod options;

pub use case::{TestCase, TestFailure, TestFuture};
pub use options::SuiteOptions;

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::UsageError;
use crate::lifecycle::{Coordinator, Phase, SuiteSignal};

/// How many signals an observer may fall behind before it starts
/// skipping. Observers are best-effort; the suite never blocks on them.
const SIGNAL_CAPACITY: usize = 256;

/// A handle to one test suite.
///
/// Cloning is cheap and every clone refers to the same suite. Test
/// modules call [`register`](Suite::register) while the suite is loading;
/// the harness consumes the registered cases exactly once when the run
/// starts.
#[derive(Clone)]
pub struct Suite {
    inner: Arc<SuiteInner>,
}

struct SuiteInner {
    state: Mutex<SuiteState>,
    signals: broadcast::Sender<SuiteSignal>,
}

struct SuiteState {
    cases: Vec<TestCase>,
    options: SuiteOptions,
    options_set: bool,
    coordinator: Coordinator,
}

impl Suite {
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self {
            inner: Arc::new(SuiteInner {
                state: Mutex::new(SuiteState {
                    cases: Vec::new(),
                    options: SuiteOptions::default(),
                    options_set: false,
                    coordinator: Coordinator::new(),
                }),
                signals,
            }),
        }
    }

    /// Register an async test case.
    ///
    /// Fails if the run has already started, or if the description starts
    /// with a digit (reserved by TAP plan lines). Descriptions are not
    /// required to be unique.
    pub fn register<F, Fut>(&self, description: impl Into<String>, test_fn: F) -> Result<(), UsageError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TestFailure>> + Send + 'static,
    {
        let description = description.into();
        {
            let mut state = self.lock();
            if state.coordinator.run_started() {
                return Err(UsageError::RegisterWhileRunning(description));
            }
            if description.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return Err(UsageError::DigitDescription(description));
            }
            debug!(test = %description, "registering test");
            state.cases.push(TestCase::new(description.clone(), test_fn));
            state.coordinator.note_registration();
        }
        let _ = self
            .inner
            .signals
            .send(SuiteSignal::TestRegistered { description });
        Ok(())
    }

    /// Register a synchronous test case. A panic inside the function is
    /// caught and reported identically to a returned `Err`.
    pub fn register_sync<F>(&self, description: impl Into<String>, test_fn: F) -> Result<(), UsageError>
    where
        F: FnOnce() -> Result<(), TestFailure> + Send + 'static,
    {
        self.register(description, move || async move { test_fn() })
    }

    /// Set the suite options. One-shot: fails on a second call, or once
    /// the run has started.
    pub fn set_options(&self, options: SuiteOptions) -> Result<(), UsageError> {
        let mut state = self.lock();
        if state.coordinator.run_started() {
            return Err(UsageError::OptionsAfterStart);
        }
        if state.options_set {
            return Err(UsageError::OptionsAlreadySet);
        }
        debug!(?options, "setting suite options");
        state.options = options;
        state.options_set = true;
        Ok(())
    }

    /// Subscribe to lifecycle signals. Best-effort: a receiver that falls
    /// behind skips old signals rather than stalling the suite.
    pub fn subscribe(&self) -> broadcast::Receiver<SuiteSignal> {
        self.inner.signals.subscribe()
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lock().coordinator.phase()
    }

    /// Number of registered test cases.
    pub fn len(&self) -> usize {
        self.lock().cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cases.is_empty()
    }

    /// `SuiteLoading`: a batch loader is about to load test modules.
    pub(crate) fn announce_loading(&self) -> Result<(), UsageError> {
        self.lock().coordinator.announce_loading()?;
        let _ = self.inner.signals.send(SuiteSignal::SuiteLoading);
        Ok(())
    }

    /// `SuiteLoaded`: batch loading finished; the run trigger is armed.
    pub(crate) fn announce_loaded(&self) -> Result<(), UsageError> {
        self.lock().coordinator.announce_loaded()?;
        let _ = self.inner.signals.send(SuiteSignal::SuiteLoaded);
        Ok(())
    }

    /// Consume the run trigger and drain the registry. The phase flips to
    /// `Running` before any test function is polled, so registrations
    /// attempted from inside a running test observe the gate and fail.
    pub(crate) fn begin_run(&self) -> Result<(Vec<TestCase>, SuiteOptions), UsageError> {
        let mut state = self.lock();
        state.coordinator.begin_run()?;
        debug_assert_eq!(state.coordinator.registered(), state.cases.len());
        let cases = std::mem::take(&mut state.cases);
        let options = state.options.clone();
        debug!(tests = cases.len(), "starting test run");
        Ok((cases, options))
    }

    pub(crate) fn finish_run(&self) {
        self.lock().coordinator.finish_run();
        let _ = self.inner.signals.send(SuiteSignal::SuiteFinished);
    }

    pub(crate) fn signal_sender(&self) -> broadcast::Sender<SuiteSignal> {
        self.inner.signals.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SuiteState> {
        // Poisoning only happens if a panic escaped a suite call; the
        // state itself is still consistent at every await point.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Suite")
            .field("phase", &state.coordinator.phase())
            .field("cases", &state.cases.len())
            .finish_non_exhaustive()
    }
}
