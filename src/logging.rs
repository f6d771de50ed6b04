//! Diagnostic logging setup.
//!
//! TAP owns stdout, so all diagnostics go to stderr. The filter follows
//! `RUST_LOG` when set; otherwise `verbose` selects debug-level traces
//! (registration, per-test timing, suppressed results).

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
