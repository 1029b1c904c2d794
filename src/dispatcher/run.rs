//! Run execution: the batch dispatch loop.

use super::Dispatcher;
use super::handle::{RunHandle, SlotGuard};
use super::observer::ProgressObserver;
use crate::error::{Error, Result};
use crate::types::{DispatchRequest, Event, RunState, RunSummary, RunTally};

/// A run that holds the single-flight slot but has not been driven yet
///
/// Obtained from [`Dispatcher::begin`]. Hand [`ActiveRun::handle`] to whoever
/// may need to cancel, then drive the run with [`ActiveRun::execute`].
/// Dropping an `ActiveRun` (or the `execute` future) frees the slot.
#[must_use = "a claimed run holds the dispatcher until it is executed or dropped"]
#[derive(Debug)]
pub struct ActiveRun {
    dispatcher: Dispatcher,
    request: DispatchRequest,
    handle: RunHandle,
    guard: SlotGuard,
}

impl ActiveRun {
    pub(super) fn new(
        dispatcher: Dispatcher,
        request: DispatchRequest,
        handle: RunHandle,
        guard: SlotGuard,
    ) -> Self {
        Self {
            dispatcher,
            request,
            handle,
            guard,
        }
    }

    /// Handle naming this run, for cancellation
    pub fn handle(&self) -> &RunHandle {
        &self.handle
    }

    /// The request this run executes
    pub fn request(&self) -> &DispatchRequest {
        &self.request
    }

    /// Drive the run to a terminal state
    ///
    /// Sends `count` calls one after another, reporting each outcome to
    /// `observer` before sleeping for the request's delay. Cancellation is
    /// checked before every send and interrupts the delay; a call already in
    /// flight is allowed to finish and is recorded.
    ///
    /// Returns the finalized summary for completed and cancelled runs. A
    /// transport error ends the run with [`Error::Internal`], which carries the
    /// partial summary.
    pub async fn execute<O: ProgressObserver>(self, mut observer: O) -> Result<RunSummary> {
        let ActiveRun {
            dispatcher,
            request,
            handle,
            guard,
        } = self;

        let run_id = handle.id();
        let token = handle.token();
        let total = request.count();
        let delay = request.delay();
        let mut tally = RunTally::new(run_id, total);

        tracing::info!(
            run_id = %run_id,
            target_link = %request.target(),
            total,
            delay_ms = delay.as_millis() as u64,
            "run started"
        );
        dispatcher.emit_event(Event::RunStarted {
            run_id,
            target: request.target().to_string(),
            total,
            delay_ms: delay.as_millis() as u64,
        });

        let mut state = RunState::Completed;

        for index in 1..=total {
            if token.is_cancelled() {
                state = RunState::Cancelled;
                break;
            }

            let outcome = match dispatcher
                .transport
                .send(request.target(), request.message())
                .await
            {
                Ok(outcome) => outcome.stamp(index),
                Err(e) => {
                    tracing::error!(run_id = %run_id, index, error = %e, "run aborted by internal failure");
                    let partial = dispatcher.finish(tally, RunState::Failed, guard);
                    return Err(Error::Internal {
                        reason: e.to_string(),
                        partial: Box::new(partial),
                    });
                }
            };

            tracing::debug!(
                run_id = %run_id,
                index,
                success = outcome.success,
                status = ?outcome.http_status,
                "call recorded"
            );

            let attempted = tally.record(outcome.clone());
            observer.on_progress(attempted, total, &outcome);
            dispatcher.emit_event(Event::CallCompleted {
                run_id,
                attempted,
                total,
                outcome,
            });

            if index < total && !delay.is_zero() {
                if token.is_cancelled() {
                    state = RunState::Cancelled;
                    break;
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        state = RunState::Cancelled;
                        break;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Ok(dispatcher.finish(tally, state, guard))
    }
}

impl Dispatcher {
    /// Finalize a run: build the summary, remember it, free the slot, announce it
    fn finish(&self, tally: RunTally, state: RunState, guard: SlotGuard) -> RunSummary {
        let summary = tally.finish(state);

        self.remember(&summary);
        drop(guard);

        match state {
            RunState::Failed => tracing::error!(
                run_id = %summary.run_id,
                attempted = summary.attempted,
                total = summary.total,
                "run failed"
            ),
            _ => tracing::info!(
                run_id = %summary.run_id,
                state = ?summary.state,
                sent = summary.sent,
                failed = summary.failed,
                total = summary.total,
                success_rate_pct = summary.success_rate_pct,
                duration_ms = summary.duration_ms,
                "run finished"
            ),
        }

        self.emit_event(Event::finished(&summary));
        summary
    }
}
