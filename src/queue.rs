//! Serial execution queue
//!
//! FIFO with concurrency exactly one. A single worker task pulls units of
//! work off an unbounded channel and runs each to completion before taking
//! the next, so submission order is execution order.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

type Job = BoxFuture<'static, ()>;

/// A unit of work never produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("queue worker is no longer running")]
    Closed,
    #[error("unit of work was dropped before it settled")]
    Dropped,
}

/// Pending result of a submitted unit of work.
///
/// Awaiting is optional: the work runs whether or not anyone polls the
/// ticket.
pub struct Ticket<T> {
    /// `None` when the work was never admitted
    rx: Option<oneshot::Receiver<T>>,
}

impl<T> Future for Ticket<T> {
    type Output = Result<T, QueueError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.rx.as_mut() {
            Some(rx) => Pin::new(rx)
                .poll(cx)
                .map(|result| result.map_err(|_| QueueError::Dropped)),
            None => Poll::Ready(Err(QueueError::Closed)),
        }
    }
}

/// Handle to the queue. Cloning shares the same worker.
#[derive(Clone)]
pub struct SerialQueue {
    tx: mpsc::UnboundedSender<Job>,
    pending: Arc<watch::Sender<usize>>,
}

impl SerialQueue {
    /// Start the worker. Must be called from within a Tokio runtime.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0);
        let pending = Arc::new(pending);

        tokio::spawn(run_worker(rx, pending.clone()));

        Self { tx, pending }
    }

    /// Enqueue `work`. It is admitted before this returns, so two `submit`
    /// calls made in order run in that order.
    pub fn submit<F, T>(&self, work: F) -> Ticket<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, rx) = oneshot::channel();
        let job: Job = async move {
            let output = work.await;
            let _ = result_tx.send(output);
        }
        .boxed();

        self.pending.send_modify(|n| *n += 1);
        if self.tx.send(job).is_err() {
            self.pending.send_modify(|n| *n = n.saturating_sub(1));
            tracing::error!("Serial queue worker is not running; unit of work discarded");
            return Ticket { rx: None };
        }

        Ticket { rx: Some(rx) }
    }

    /// Units submitted but not yet settled, the running one included
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Resolve once nothing is queued or running
    pub async fn drain(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for SerialQueue {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_worker(mut rx: mpsc::UnboundedReceiver<Job>, pending: Arc<watch::Sender<usize>>) {
    tracing::debug!("Serial queue worker started");

    while let Some(job) = rx.recv().await {
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            tracing::error!("Unit of work panicked; continuing with the next one");
        }
        pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    tracing::debug!("Serial queue worker stopped");
}
