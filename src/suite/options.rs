//! Suite-wide run options.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options governing a single suite run.
///
/// Options are a one-shot configuration: they may be set at most once per
/// suite, and only before the run starts. Construct them by merging over
/// the defaults:
///
/// ```
/// use volley::SuiteOptions;
///
/// let options = SuiteOptions {
///     exit_on_failure: true,
///     ..SuiteOptions::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SuiteOptions {
    /// Maximum time the whole suite may run, in seconds. When the limit
    /// elapses the engine stops waiting for unfinished tests and reports
    /// an early exit.
    ///
    /// Default: 3600 (one hour)
    #[serde(default = "default_maximum_duration_secs")]
    pub maximum_duration_secs: f64,

    /// Stop the run at the first failing test instead of waiting for the
    /// remaining tests to settle.
    ///
    /// Default: false
    #[serde(default)]
    pub exit_on_failure: bool,
}

impl SuiteOptions {
    /// The suite deadline as a [`Duration`]. Non-finite or negative
    /// values fall back to the default limit.
    pub fn maximum_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.maximum_duration_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_maximum_duration_secs()))
    }
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            maximum_duration_secs: default_maximum_duration_secs(),
            exit_on_failure: false,
        }
    }
}

fn default_maximum_duration_secs() -> f64 {
    3600.0
}
