use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};

use super::*;
use crate::types::Task;

/// Handler that records processed pr_ids, optionally gated on a Notify so
/// tests can hold the worker mid-item.
struct RecordingHandler {
    processed: Mutex<Vec<u64>>,
    gate: Option<Arc<Notify>>,
    fail_on: Option<u64>,
}

impl RecordingHandler {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            processed: Mutex::new(Vec::new()),
            gate: None,
            fail_on: None,
        })
    }

    fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            processed: Mutex::new(Vec::new()),
            gate: Some(gate),
            fail_on: None,
        })
    }

    fn failing_on(pr_id: u64) -> Arc<Self> {
        Arc::new(Self {
            processed: Mutex::new(Vec::new()),
            gate: None,
            fail_on: Some(pr_id),
        })
    }
}

#[async_trait::async_trait]
impl TaskHandler for RecordingHandler {
    async fn handle(&self, task: Task) -> anyhow::Result<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.processed.lock().await.push(task.pr_id);
        if self.fail_on == Some(task.pr_id) {
            anyhow::bail!("simulated handler failure for pr {}", task.pr_id);
        }
        Ok(())
    }
}

async fn wait_for_processed(handler: &RecordingHandler, expected: usize) {
    for _ in 0..200 {
        if handler.processed.lock().await.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("worker did not process {expected} tasks in time");
}

#[tokio::test]
async fn tasks_are_processed_in_fifo_order() {
    let handler = RecordingHandler::new();
    let queue = TaskQueue::start(10, handler.clone());

    for pr_id in [1, 2, 3] {
        queue.enqueue(Task::rank_pr(pr_id, "acme/widgets"));
    }

    wait_for_processed(&handler, 3).await;
    assert_eq!(*handler.processed.lock().await, vec![1, 2, 3]);

    queue.stop().await;
}

#[tokio::test]
async fn full_queue_drops_new_items_without_blocking_or_evicting() {
    let gate = Arc::new(Notify::new());
    let handler = RecordingHandler::gated(gate.clone());
    // Capacity 2: one task held in-flight at the gate, two queued behind it.
    let queue = TaskQueue::start(2, handler.clone());

    queue.enqueue(Task::rank_pr(1, "acme/widgets"));
    // Let the worker pull task 1 and park at the gate.
    tokio::time::sleep(Duration::from_millis(20)).await;
    queue.enqueue(Task::rank_pr(2, "acme/widgets"));
    queue.enqueue(Task::rank_pr(3, "acme/widgets"));
    // Queue is now full: this one must be dropped, not block.
    queue.enqueue(Task::rank_pr(4, "acme/widgets"));

    // Release held tasks one at a time (Notify stores a single permit).
    for expected in 1..=3 {
        gate.notify_one();
        wait_for_processed(&handler, expected).await;
    }

    // Oldest items survived; the overflow item never ran.
    assert_eq!(*handler.processed.lock().await, vec![1, 2, 3]);

    queue.stop().await;
}

#[tokio::test]
async fn handler_failure_does_not_stop_the_worker() {
    let handler = RecordingHandler::failing_on(2);
    let queue = TaskQueue::start(10, handler.clone());

    for pr_id in [1, 2, 3] {
        queue.enqueue(Task::rank_pr(pr_id, "acme/widgets"));
    }

    wait_for_processed(&handler, 3).await;
    assert_eq!(*handler.processed.lock().await, vec![1, 2, 3]);

    queue.stop().await;
}

#[tokio::test]
async fn stop_is_cooperative_and_idempotent_for_enqueue() {
    let handler = RecordingHandler::new();
    let queue = TaskQueue::start(10, handler.clone());

    queue.enqueue(Task::rank_pr(1, "acme/widgets"));
    wait_for_processed(&handler, 1).await;

    queue.stop().await;

    // Enqueue after stop neither panics nor blocks.
    queue.enqueue(Task::rank_pr(2, "acme/widgets"));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(*handler.processed.lock().await, vec![1]);
}
