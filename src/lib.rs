//! volley: a concurrent TAP test-execution engine.
//!
//! Test cases register against a [`Suite`]; the harness launches them
//! all at once, streams results in the TAP version 13 protocol as they
//! settle, and terminates the process with an exit status reflecting
//! pass/fail. A global timeout and an optional fail-fast policy race the
//! run and can end it early.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Suite**: the registry of test cases, the one-shot options store,
//!   and the lifecycle coordinator, behind one clonable handle
//! - **Lifecycle**: the state machine deciding when a run may start,
//!   coordinating direct runs with multi-module batch loading
//! - **Engine**: concurrent execution, racing settlement against the
//!   suite timer and the first failure
//! - **Report**: the reporter seam and the TAP renderer
//! - **Exit**: exit-code computation and forced termination on early
//!   exit
//!
//! # Example
//!
//! ```no_run
//! use volley::Suite;
//!
//! fn main() {
//!     let suite = Suite::new();
//!
//!     suite.register("resolves quickly", || async { Ok(()) }).unwrap();
//!     suite.register_sync("adds numbers", || {
//!         assert_eq!(2 + 2, 4);
//!         Ok(())
//!     }).unwrap();
//!
//!     volley::main(suite);
//! }
//! ```

pub mod args;
pub mod engine;
pub mod error;
pub mod exit;
pub mod harness;
pub mod lifecycle;
pub mod logging;
pub mod report;
pub mod suite;

// Re-export commonly used types
pub use args::Arguments;
pub use engine::RunResult;
pub use error::UsageError;
pub use exit::{ExitController, NoopTerminate, SelfInterrupt, Terminate};
pub use harness::{BatchLoader, Harness, RunOutcome, main};
pub use lifecycle::{Phase, SuiteSignal};
pub use report::{NullReporter, Reporter, TapReporter};
pub use suite::{Suite, SuiteOptions, TestCase, TestFailure};
