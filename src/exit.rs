//! Process exit control.
//!
//! After a run, the exit controller turns the [`RunResult`] into a
//! process exit code. When the run exited early, test tasks may still be
//! executing; the controller additionally fires an injected terminate
//! capability so those tasks cannot keep the process alive. The real
//! capability raises `SIGINT` on the engine's own process, which lets
//! externally registered interrupt handlers run before the process dies;
//! unit tests inject a recording or no-op capability instead.

use tracing::debug;

use crate::engine::RunResult;

/// A way to force process termination.
pub trait Terminate: Send + Sync {
    fn terminate(&self);
}

/// Sends an interrupt to the engine's own process.
///
/// If no interrupt handler is installed the process dies by signal right
/// here; if a handler is installed and returns, control comes back and
/// the caller proceeds to a normal exit.
pub struct SelfInterrupt;

impl Terminate for SelfInterrupt {
    fn terminate(&self) {
        #[cfg(unix)]
        unsafe {
            libc::raise(libc::SIGINT);
        }
    }
}

/// Termination that does nothing. For tests and embedded runs.
pub struct NoopTerminate;

impl Terminate for NoopTerminate {
    fn terminate(&self) {}
}

/// Computes the exit code for a finished run and, on early exit, fires
/// the terminate capability.
pub struct ExitController<T: Terminate = SelfInterrupt> {
    terminator: T,
}

impl Default for ExitController<SelfInterrupt> {
    fn default() -> Self {
        Self::new(SelfInterrupt)
    }
}

impl<T: Terminate> ExitController<T> {
    pub fn new(terminator: T) -> Self {
        Self { terminator }
    }

    /// Exit code: `1` if any test failed, else `0`. Unfinished tests do
    /// not flip the code on their own. On early exit, the terminate
    /// capability fires before the code is returned.
    pub fn finalize(&self, result: &RunResult) -> i32 {
        if result.exited_early {
            debug!(
                unfinished = result.unfinished(),
                "run exited early; signalling termination"
            );
            self.terminator.terminate();
        }
        result.exit_code()
    }
}
