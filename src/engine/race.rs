//! First-settled-wins racing and the one-shot suite timer.

use std::time::Duration;

use futures::future::LocalBoxFuture;

/// Race a set of contenders: the first to settle wins, the losers are
/// dropped (and thereby cancelled).
///
/// `contenders` must be non-empty.
pub(crate) async fn race<T>(contenders: Vec<LocalBoxFuture<'_, T>>) -> T {
    debug_assert!(!contenders.is_empty());
    let (winner, _index, losers) = futures::future::select_all(contenders).await;
    drop(losers);
    winner
}

/// The suite deadline. Scheduled once per run; dropping the future (as a
/// race loser) disarms it, so an expired-but-unneeded timer can never
/// outlive the run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SuiteTimer {
    limit: Duration,
}

impl SuiteTimer {
    pub(crate) fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub(crate) async fn elapsed(self) {
        tokio::time::sleep(self.limit).await;
    }
}
