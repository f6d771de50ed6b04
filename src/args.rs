//! Command-line surface for harness binaries.
//!
//! A harness binary parses [`Arguments`] from its own argv, applies the
//! option overrides once, and executes the suite. Path patterns select
//! which test modules a batch binary loads; resolving them is the
//! caller's concern (modules are linked in at compile time).

use clap::Parser;

use crate::suite::SuiteOptions;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "volley", about = "Concurrent TAP test harness", long_about = None)]
pub struct Arguments {
    /// Path or glob pattern selecting test modules to load. Can be
    /// repeated, e.g. `--path 'unit/*' --path integration`.
    #[arg(long = "path", value_name = "PATTERN")]
    pub paths: Vec<String>,

    /// Maximum time the whole suite may run, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub maximum_duration_seconds: Option<f64>,

    /// Stop the run at the first failing test.
    #[arg(long)]
    pub exit_on_failure: bool,
}

impl Arguments {
    /// Parse from the process arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Whether any option override was given. Options are one-shot, so
    /// a harness should only call `set_options` when this is true.
    pub fn overrides_options(&self) -> bool {
        self.maximum_duration_seconds.is_some() || self.exit_on_failure
    }

    /// The given overrides merged over the defaults.
    pub fn suite_options(&self) -> SuiteOptions {
        let mut options = SuiteOptions::default();
        if let Some(seconds) = self.maximum_duration_seconds {
            options.maximum_duration_secs = seconds;
        }
        options.exit_on_failure = self.exit_on_failure;
        options
    }
}
