//! Run handles and the single-flight slot.

use crate::error::{Error, Result};
use crate::types::RunId;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Handle to one in-flight run
///
/// Clones share the same cancellation flag. Pass a handle to
/// [`Dispatcher::cancel`](super::Dispatcher::cancel) to stop the run it names;
/// a handle whose run has already finished is stale and cancelling it is a no-op.
#[derive(Debug, Clone)]
pub struct RunHandle {
    id: RunId,
    token: CancellationToken,
}

impl RunHandle {
    fn new(id: RunId) -> Self {
        Self {
            id,
            token: CancellationToken::new(),
        }
    }

    /// ID of the run this handle names
    pub fn id(&self) -> RunId {
        self.id
    }

    /// Whether cancellation has been requested for this run
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Default)]
struct SlotState {
    active: Option<RunHandle>,
    last_id: u64,
    /// Set once by shutdown; no run can be claimed afterwards
    closed: bool,
}

/// Single-flight slot: holds the handle of the one active run, if any
///
/// The mutex is only held for O(1) bookkeeping and never across an await.
#[derive(Debug, Default)]
pub(crate) struct RunSlot {
    state: Mutex<SlotState>,
    idle: Notify,
}

impl RunSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for a new run
    ///
    /// Fails with [`Error::ShuttingDown`] once the slot is closed and with
    /// [`Error::Conflict`] if a run is already active. The returned guard
    /// frees the slot when dropped.
    pub(crate) fn claim(self: &Arc<Self>) -> Result<(RunHandle, SlotGuard)> {
        let mut state = self.lock();
        if state.closed {
            return Err(Error::ShuttingDown);
        }
        if let Some(active) = &state.active {
            return Err(Error::Conflict { active: active.id });
        }

        state.last_id += 1;
        let handle = RunHandle::new(RunId::new(state.last_id));
        state.active = Some(handle.clone());

        let guard = SlotGuard {
            slot: Arc::clone(self),
            id: handle.id,
        };
        Ok((handle, guard))
    }

    pub(crate) fn active(&self) -> Option<RunHandle> {
        self.lock().active.clone()
    }

    /// Signal the active run if `id` names it (or any active run when `id` is None)
    ///
    /// Returns the ID of the run that was newly signalled.
    pub(crate) fn cancel(&self, id: Option<RunId>) -> Option<RunId> {
        let state = self.lock();
        let active = state.active.as_ref()?;
        if id.is_some_and(|id| id != active.id) || active.token.is_cancelled() {
            return None;
        }
        active.token.cancel();
        Some(active.id)
    }

    /// Refuse all future claims and signal the active run, under one lock
    ///
    /// Returns the ID of the run that was newly signalled.
    pub(crate) fn close(&self) -> Option<RunId> {
        let mut state = self.lock();
        state.closed = true;
        let active = state.active.as_ref()?;
        if active.token.is_cancelled() {
            return None;
        }
        active.token.cancel();
        Some(active.id)
    }

    fn release(&self, id: RunId) {
        let mut state = self.lock();
        if state.active.as_ref().is_some_and(|active| active.id == id) {
            state.active = None;
            drop(state);
            self.idle.notify_waiters();
        }
    }

    /// Wait until no run holds the slot
    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().active.is_none() {
                return;
            }
            notified.await;
        }
    }
}

/// Frees the single-flight slot when the run that claimed it goes away
#[derive(Debug)]
pub(crate) struct SlotGuard {
    slot: Arc<RunSlot>,
    id: RunId,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.release(self.id);
    }
}
