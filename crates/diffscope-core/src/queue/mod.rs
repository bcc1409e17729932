//! Bounded fire-and-forget task queue with a single background consumer.
//!
//! `enqueue` never blocks and never fails the caller: when the queue is at
//! capacity the new item is dropped and logged. One worker consumes items
//! strictly in arrival order, one at a time; a handler error is logged and
//! the next item is still processed. `stop` is cooperative: the in-flight
//! item finishes, only the wait for the next item is cancelled.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::types::Task;

/// Consumes one task at a time on the queue worker.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> anyhow::Result<()>;
}

pub struct TaskQueue {
    tx: mpsc::Sender<Task>,
    token: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl TaskQueue {
    /// Starts the background worker and returns the queue handle.
    pub fn start(capacity: usize, handler: Arc<dyn TaskHandler>) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let token = CancellationToken::new();

        let worker = tokio::spawn(worker_loop(rx, token.clone(), handler));
        info!(capacity, "Queue worker started");

        Self {
            tx,
            token,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Non-blocking enqueue. A full queue drops the new item (existing
    /// items are never evicted); callers see no error either way.
    pub fn enqueue(&self, task: Task) {
        match self.tx.try_send(task) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(task)) => {
                warn!(pr_id = task.pr_id, repo = %task.repo, "Queue full, dropping task");
            }
            Err(mpsc::error::TrySendError::Closed(task)) => {
                warn!(pr_id = task.pr_id, repo = %task.repo, "Queue stopped, dropping task");
            }
        }
    }

    /// Requests cooperative cancellation and waits for the worker to exit.
    pub async fn stop(&self) {
        self.token.cancel();
        if let Some(worker) = self.worker.lock().await.take() {
            if let Err(e) = worker.await {
                error!(error = %e, "Queue worker join failed");
            }
        }
        info!("Queue worker stopped");
    }
}

async fn worker_loop(
    mut rx: mpsc::Receiver<Task>,
    token: CancellationToken,
    handler: Arc<dyn TaskHandler>,
) {
    loop {
        let task = tokio::select! {
            _ = token.cancelled() => break,
            task = rx.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        let pr_id = task.pr_id;
        let repo = task.repo.clone();
        if let Err(e) = handler.handle(task).await {
            // One bad task must never stall the queue.
            error!(pr_id, repo = %repo, error = %e, "Task handler failed");
        }
    }
}
