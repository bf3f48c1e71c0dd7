//! Dispatch/subscribe store driven by an asynchronous reducer
//!
//! `dispatch` flips the store to busy right away, then queues the real
//! transition. The queue worker commits the reducer's answer, or leaves the
//! data alone when the answer is unchanged or the call failed.

mod state;

pub use state::{is_busy, StoreState};

use crate::action::ActionBatch;
use crate::config::ErrorHandler;
use crate::engine::{Reducer, Reduction};
use crate::queue::{SerialQueue, Ticket};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Observer of state changes
pub type Listener = Arc<dyn Fn(&StoreState) + Send + Sync>;

/// How a dispatched transition ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// New data was committed
    Committed,
    /// No-op batch, or the reducer answered with the current data
    Unchanged,
    /// The reducer failed; the error went to the error handler
    Failed,
}

/// Cloneable handle to a store
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    slot: Mutex<Slot>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    queue: SerialQueue,
    reducer: Arc<dyn Reducer>,
    error_handler: ErrorHandler,
}

struct Slot {
    state: StoreState,
    /// Dispatches that have not settled yet
    unsettled: usize,
}

/// Handle returned by [`Store::subscribe`]
pub struct Subscription {
    id: u64,
    store: Weak<StoreInner>,
}

impl Subscription {
    /// Stop receiving updates. Dropping the handle does not unsubscribe.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners().retain(|(id, _)| *id != self.id);
        }
    }
}

impl Store {
    pub fn new(
        initial: Value,
        reducer: Arc<dyn Reducer>,
        queue: SerialQueue,
        error_handler: ErrorHandler,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                slot: Mutex::new(Slot {
                    state: StoreState::idle(initial),
                    unsettled: 0,
                }),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                queue,
                reducer,
                error_handler,
            }),
        }
    }

    /// Snapshot of the current state
    pub fn get_state(&self) -> StoreState {
        self.inner.slot().state.clone()
    }

    /// Queue a transition for `action`; a JSON array is a batch.
    ///
    /// The store is busy when this returns. The ticket resolves once the
    /// transition settled; ignoring it is fine.
    pub fn dispatch(&self, action: impl Into<ActionBatch>) -> Ticket<Settlement> {
        let batch = action.into();

        let entered_busy = {
            let mut slot = self.inner.slot();
            slot.unsettled += 1;
            let was_busy = std::mem::replace(&mut slot.state.busy, true);
            (!was_busy).then(|| slot.state.clone())
        };
        if let Some(snapshot) = entered_busy {
            self.inner.notify(&snapshot);
        }

        let inner = self.inner.clone();
        self.inner
            .queue
            .submit(async move { inner.run_transition(batch).await })
    }

    /// Call `listener` after every state change, busy flips included.
    ///
    /// Snapshots are taken under the state lock but delivered after it is
    /// released. On a multi-threaded runtime a `dispatch` racing with a
    /// settling transition may deliver its busy snapshot before the
    /// transition's idle one; [`Store::get_state`] is always current.
    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners().push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }
}

impl StoreInner {
    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Listeners run with no lock held so they may call back into the store
    fn notify(&self, state: &StoreState) {
        let listeners: Vec<Listener> = self.listeners().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(state);
        }
    }

    async fn run_transition(&self, batch: ActionBatch) -> Settlement {
        // Released on unwind too, so a panicking reducer cannot pin busy
        let pending = PendingDispatch {
            inner: self,
            settled: false,
        };
        let current = self.slot().state.data.clone();
        let outcome = self.reducer.reduce(&current, &batch).await;

        let (next, settlement, failure) = match outcome {
            // Parsed replies never share identity with the old value, so
            // "unchanged" means deep-equal
            Ok(Reduction::Replaced(next)) if next != current => {
                (Some(next), Settlement::Committed, None)
            }
            Ok(_) => (None, Settlement::Unchanged, None),
            Err(e) => (None, Settlement::Failed, Some(e)),
        };

        if let Some(snapshot) = pending.settle(next) {
            self.notify(&snapshot);
        }
        // The slot is already settled; a panicking handler only loses its ticket
        if let Some(e) = failure {
            (self.error_handler)(&e);
        }

        tracing::debug!(?settlement, actions = batch.len(), "Transition settled");
        settlement
    }

    /// Release one unsettled dispatch, committing `next` if present.
    /// Returns the snapshot to broadcast when data or busy changed.
    fn release(&self, next: Option<Value>) -> Option<StoreState> {
        let mut slot = self.slot();
        slot.unsettled = slot.unsettled.saturating_sub(1);
        let still_busy = slot.unsettled > 0;
        let busy_changed = slot.state.busy != still_busy;
        slot.state.busy = still_busy;
        let committed = next.is_some();
        if let Some(next) = next {
            slot.state.data = next;
        }
        (committed || busy_changed).then(|| slot.state.clone())
    }
}

/// One dispatch counted in `Slot::unsettled` until released
struct PendingDispatch<'a> {
    inner: &'a StoreInner,
    settled: bool,
}

impl PendingDispatch<'_> {
    fn settle(mut self, next: Option<Value>) -> Option<StoreState> {
        self.settled = true;
        self.inner.release(next)
    }
}

impl Drop for PendingDispatch<'_> {
    fn drop(&mut self) {
        if !self.settled {
            // Unwinding: fix the counters but leave listeners alone
            let _ = self.inner.release(None);
        }
    }
}
