//! Suite lifecycle: signals and the coordinator state machine.
//!
//! The coordinator decides the single moment a run may begin. It supports
//! two usage modes without the test module knowing which one applies:
//!
//! - **Direct run**: a module registers its tests and the harness is
//!   executed right after; the run starts from `AwaitingRegistration`.
//! - **Batch run**: a loader announces [`SuiteSignal::SuiteLoading`]
//!   before loading any module, which disarms the direct trigger, and
//!   [`SuiteSignal::SuiteLoaded`] after all modules have registered,
//!   which arms the one-shot batch trigger.
//!
//! The transition table is explicit so that "one run per suite, later
//! triggers are usage errors" is enforced structurally rather than by
//! listener bookkeeping.

use std::sync::Arc;

use crate::error::UsageError;
use crate::suite::TestFailure;

/// Transient coordination signals observable through
/// [`Suite::subscribe`](crate::Suite::subscribe).
///
/// Delivery to observers is best-effort: a lagging observer skips old
/// signals rather than stalling the suite.
#[derive(Debug, Clone)]
pub enum SuiteSignal {
    /// A test case was appended to the registry. Emitted on every
    /// registration so batch loaders can tell more cases were added.
    TestRegistered {
        description: String,
    },
    /// A batch loader is about to load test modules.
    SuiteLoading,
    /// A batch loader finished loading; all registrations are in.
    SuiteLoaded,
    /// A test failed during the run.
    TestError {
        description: String,
        failure: Arc<TestFailure>,
    },
    /// The run is over and the summary has been reported.
    SuiteFinished,
}

/// The lifecycle phase of a suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Tests may register; a direct run may be triggered.
    AwaitingRegistration,
    /// A batch loader is loading modules; only `SuiteLoaded` can arm the
    /// run trigger.
    BatchLoading,
    /// Batch loading finished; the run may be triggered.
    ReadyToRun,
    /// The engine is executing the suite. Registration is gated off.
    Running,
    /// The run completed. The suite is inert.
    Finished,
}

/// The lifecycle state machine. One per suite, driven synchronously by
/// the registration and batch-loader calls, exactly once into `Running`.
#[derive(Debug)]
pub(crate) struct Coordinator {
    phase: Phase,
    registered: usize,
}

impl Coordinator {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::AwaitingRegistration,
            registered: 0,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the run has started (or finished); registration and
    /// option setting are gated on this.
    pub(crate) fn run_started(&self) -> bool {
        matches!(self.phase, Phase::Running | Phase::Finished)
    }

    /// A registration was accepted in the current phase.
    pub(crate) fn note_registration(&mut self) {
        debug_assert!(!self.run_started());
        self.registered += 1;
    }

    pub(crate) fn registered(&self) -> usize {
        self.registered
    }

    /// `SuiteLoading`: switch to batch mode, disarming the direct
    /// trigger so individual module loads cannot start a run.
    pub(crate) fn announce_loading(&mut self) -> Result<(), UsageError> {
        match self.phase {
            Phase::AwaitingRegistration => {
                self.phase = Phase::BatchLoading;
                Ok(())
            }
            Phase::BatchLoading | Phase::ReadyToRun => Err(UsageError::LoadingAlreadyAnnounced),
            Phase::Running => Err(UsageError::AlreadyRunning),
            Phase::Finished => Err(UsageError::AlreadyFinished),
        }
    }

    /// `SuiteLoaded`: batch loading is complete; arm the one-shot run
    /// trigger.
    pub(crate) fn announce_loaded(&mut self) -> Result<(), UsageError> {
        match self.phase {
            Phase::BatchLoading => {
                self.phase = Phase::ReadyToRun;
                Ok(())
            }
            _ => Err(UsageError::LoadedWithoutLoading),
        }
    }

    /// Consume the run trigger. Succeeds exactly once per suite.
    pub(crate) fn begin_run(&mut self) -> Result<(), UsageError> {
        match self.phase {
            Phase::AwaitingRegistration | Phase::ReadyToRun => {
                self.phase = Phase::Running;
                Ok(())
            }
            Phase::BatchLoading => Err(UsageError::BatchStillLoading),
            Phase::Running => Err(UsageError::AlreadyRunning),
            Phase::Finished => Err(UsageError::AlreadyFinished),
        }
    }

    pub(crate) fn finish_run(&mut self) {
        debug_assert_eq!(self.phase, Phase::Running);
        self.phase = Phase::Finished;
    }
}
