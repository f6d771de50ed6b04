//! The harness: suite, engine, reporter, and exit controller wired
//! together, plus the batch-loading contract.
//!
//! A standalone test binary registers its cases and hands the suite to
//! [`main`]:
//!
//! ```no_run
//! use volley::{Arguments, Suite};
//!
//! fn main() {
//!     let args = Arguments::from_args();
//!     let suite = Suite::new();
//!
//!     suite.register("adds numbers", || async {
//!         // ...
//!         Ok(())
//!     }).unwrap();
//!
//!     if args.overrides_options() {
//!         suite.set_options(args.suite_options()).unwrap();
//!     }
//!     volley::main(suite);
//! }
//! ```
//!
//! A batch binary loads several modules through a [`BatchLoader`], which
//! announces `SuiteLoading` before the first module and `SuiteLoaded`
//! after the last, so no individual module can start a run on its own.

use std::io;

use anyhow::Context;

use crate::engine;
use crate::error::UsageError;
use crate::exit::{ExitController, SelfInterrupt, Terminate};
use crate::report::{Reporter, TapReporter};
use crate::suite::{Suite, SuiteOptions};

pub use crate::engine::RunResult;

/// Outcome of one harness execution.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: RunResult,
    pub exit_code: i32,
}

/// Ties one [`Suite`] to a reporter and an exit controller, and executes
/// the run exactly once.
pub struct Harness<R: Reporter = TapReporter<io::Stdout>, T: Terminate = SelfInterrupt> {
    suite: Suite,
    reporter: R,
    exit: ExitController<T>,
}

impl Harness {
    /// A harness with the standard wiring: TAP on stdout, self-interrupt
    /// on early exit.
    pub fn new(suite: Suite) -> Self {
        Self {
            suite,
            reporter: TapReporter::stdout(),
            exit: ExitController::default(),
        }
    }
}

impl<R: Reporter, T: Terminate> Harness<R, T> {
    /// Replace the reporter.
    pub fn with_reporter<R2: Reporter>(self, reporter: R2) -> Harness<R2, T> {
        Harness {
            suite: self.suite,
            reporter,
            exit: self.exit,
        }
    }

    /// Replace the terminate capability fired on early exit.
    pub fn with_terminator<T2: Terminate>(self, terminator: T2) -> Harness<R, T2> {
        Harness {
            suite: self.suite,
            reporter: self.reporter,
            exit: ExitController::new(terminator),
        }
    }

    /// Run the suite to completion and finalize the exit code.
    ///
    /// The lifecycle coordinator decides whether the run may start:
    /// executing while a batch loader is still loading, or executing the
    /// same suite twice, is a usage error. The suite is flipped to
    /// running before any test is polled, so late registrations fail.
    pub async fn execute(self) -> anyhow::Result<RunOutcome> {
        let (cases, options) = self
            .suite
            .begin_run()
            .context("cannot start the test run")?;
        let signals = self.suite.signal_sender();

        let result = engine::run(cases, &options, &signals, &self.reporter).await;
        self.suite.finish_run();

        let exit_code = self.exit.finalize(&result);
        Ok(RunOutcome { result, exit_code })
    }
}

/// Loads test modules in batch mode.
///
/// The loader drives the batch half of the lifecycle contract: it
/// announces `SuiteLoading` when constructed and `SuiteLoaded` when
/// finished, and may set the suite options exactly once in between. A
/// module is any function that registers cases against the suite.
pub struct BatchLoader<'a> {
    suite: &'a Suite,
}

impl<'a> BatchLoader<'a> {
    /// Announce `SuiteLoading` and start loading.
    pub fn begin(suite: &'a Suite) -> Result<Self, UsageError> {
        suite.announce_loading()?;
        Ok(Self { suite })
    }

    /// Load one module: run its registration function against the suite.
    pub fn load<F>(&self, module: F) -> Result<(), UsageError>
    where
        F: FnOnce(&Suite) -> Result<(), UsageError>,
    {
        module(self.suite)
    }

    /// Set the suite options. One-shot, like [`Suite::set_options`].
    pub fn set_options(&self, options: SuiteOptions) -> Result<(), UsageError> {
        self.suite.set_options(options)
    }

    /// Announce `SuiteLoaded`; the run trigger is armed.
    pub fn finish(self) -> Result<(), UsageError> {
        self.suite.announce_loaded()
    }
}

/// Run the suite on a fresh current-thread runtime and exit the process.
///
/// The current-thread runtime keeps the whole run cooperatively
/// scheduled: test futures interleave at their await points and all
/// engine state is mutated from one thread. Usage errors print to
/// stderr and exit non-zero — they indicate a broken test module and are
/// not recoverable.
pub fn main(suite: Suite) -> ! {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("volley: failed to build the runtime: {error}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(Harness::new(suite).execute()) {
        Ok(outcome) => std::process::exit(outcome.exit_code),
        Err(error) => {
            eprintln!("volley: {error:#}");
            std::process::exit(1);
        }
    }
}
