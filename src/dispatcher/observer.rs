//! Progress observer seam.

use crate::types::CallOutcome;

/// Receives every outcome of a run, in index order, exactly once
///
/// Called synchronously on the dispatch loop between two calls, so a slow
/// observer delays the next send. Closures `FnMut(attempted, total, &outcome)`
/// implement this trait, and `()` is a no-op observer.
///
/// # Examples
///
/// ```
/// use batch_relay::dispatcher::ProgressObserver;
/// use batch_relay::types::CallOutcome;
///
/// let mut seen = Vec::new();
/// let mut observer = |attempted: u32, total: u32, outcome: &CallOutcome| {
///     seen.push((attempted, total, outcome.success));
/// };
/// observer.on_progress(1, 3, &CallOutcome::success(200, "success"));
/// drop(observer);
/// assert_eq!(seen, vec![(1, 3, true)]);
/// ```
pub trait ProgressObserver: Send {
    /// One call finished: `attempted` of `total` calls are now recorded
    fn on_progress(&mut self, attempted: u32, total: u32, outcome: &CallOutcome);
}

impl<F> ProgressObserver for F
where
    F: FnMut(u32, u32, &CallOutcome) + Send,
{
    fn on_progress(&mut self, attempted: u32, total: u32, outcome: &CallOutcome) {
        self(attempted, total, outcome)
    }
}

impl ProgressObserver for () {
    fn on_progress(&mut self, _attempted: u32, _total: u32, _outcome: &CallOutcome) {}
}
