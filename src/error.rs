//! Usage errors: programmer misuse of the suite API.
//!
//! Every variant here indicates a broken test module or harness binary,
//! not a failing test. They are raised synchronously at the call site and
//! are not meant to be recovered from.

/// Errors caused by misusing the registration or lifecycle API.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// A test was registered after the run had already started.
    ///
    /// Tests must be registered synchronously, before the harness begins
    /// executing the suite.
    #[error(
        "failed to register \"{0}\": tests are already running, so it's not possible to register a new test; tests must be registered before the run starts"
    )]
    RegisterWhileRunning(String),

    /// The description starts with a digit. Leading digits are reserved
    /// by TAP plan lines (`1..N`), so they would make the output stream
    /// ambiguous.
    #[error("test descriptions cannot start with a digit: \"{0}\"")]
    DigitDescription(String),

    /// Suite options were set a second time. Options are a one-shot
    /// configuration, not an accumulator.
    #[error("suite options can only be set once")]
    OptionsAlreadySet,

    /// Suite options were set after the run had started.
    #[error("suite options cannot be set once tests are running")]
    OptionsAfterStart,

    /// The run was triggered while a batch loader had announced loading
    /// but never announced completion.
    #[error("suite loading was announced but never finished; missing SuiteLoaded")]
    BatchStillLoading,

    /// A batch loader announced loading twice for the same suite.
    #[error("suite loading was already announced")]
    LoadingAlreadyAnnounced,

    /// `SuiteLoaded` was announced without a preceding `SuiteLoading`.
    #[error("suite loading completion was announced, but loading was never started")]
    LoadedWithoutLoading,

    /// The run was triggered while it was already in progress.
    #[error("tests are already running")]
    AlreadyRunning,

    /// The run was triggered after the suite had finished.
    #[error("the suite has already finished running")]
    AlreadyFinished,
}
