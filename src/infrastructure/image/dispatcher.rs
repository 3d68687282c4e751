//! Single background loop handing queued tasks to the worker pool.
//!
//! Tasks wait in a last-in-first-out queue: when a slot frees up, the most recently
//! submitted task runs next.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::LoadTask;
use crate::domain::errors::LoadError;

use super::worker_pool::WorkerPool;

/// Executes one task on a worker slot.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync + 'static {
    /// Runs the task to completion. Never fails; failures are reported downstream.
    async fn run(&self, task: LoadTask);
}

/// Pending tasks, newest at the back.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<LoadTask>,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task as the newest entry.
    pub fn push(&mut self, task: LoadTask) {
        self.tasks.push_back(task);
    }

    /// Removes the most recently pushed task.
    pub fn pop_newest(&mut self) -> Option<LoadTask> {
        self.tasks.pop_back()
    }

    /// Returns the number of waiting tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Sending half used to submit tasks to a running dispatcher.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    submit_tx: mpsc::UnboundedSender<LoadTask>,
}

impl Dispatcher {
    /// Spawns the dispatch loop. Must be called inside a tokio runtime.
    ///
    /// The loop ends once every `Dispatcher` clone is dropped; tasks still queued at
    /// that point are discarded.
    pub fn spawn(pool: WorkerPool, runner: Arc<dyn JobRunner>) -> Self {
        let (submit_tx, submit_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_dispatch_loop(submit_rx, pool, runner));
        Self { submit_tx }
    }

    /// Queues a task. Never blocks.
    ///
    /// # Errors
    /// Returns an interrupted error if the dispatch loop has stopped.
    pub fn submit(&self, task: LoadTask) -> Result<(), LoadError> {
        let id = task.id.clone();
        self.submit_tx
            .send(task)
            .map_err(|_| LoadError::interrupted(format!("Dispatcher stopped before {id} was queued")))
    }

    /// Returns true while the dispatch loop accepts tasks.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.submit_tx.is_closed()
    }
}

async fn run_dispatch_loop(
    mut submit_rx: mpsc::UnboundedReceiver<LoadTask>,
    pool: WorkerPool,
    runner: Arc<dyn JobRunner>,
) {
    let mut queue = TaskQueue::new();
    debug!(workers = pool.size(), "Dispatcher started");

    loop {
        tokio::select! {
            biased;

            submitted = submit_rx.recv() => {
                match submitted {
                    Some(task) => {
                        trace!(id = %task.id, queued = queue.len() + 1, "Task queued");
                        queue.push(task);
                    }
                    None => break,
                }
            }
            slot = pool.acquire(), if !queue.is_empty() => {
                // Drain anything already submitted so the newest task wins the slot.
                while let Ok(task) = submit_rx.try_recv() {
                    queue.push(task);
                }
                let Some(task) = queue.pop_newest() else {
                    continue;
                };
                match slot {
                    Ok(slot) => {
                        trace!(id = %task.id, waiting = queue.len(), "Dispatching task");
                        let runner = runner.clone();
                        pool.spawn(slot, async move { runner.run(task).await });
                    }
                    Err(e) => {
                        warn!(id = %task.id, error = %e, "Could not reserve a worker slot, dropping task");
                    }
                }
            }
        }
    }

    if queue.is_empty() {
        debug!("Dispatcher stopped");
    } else {
        info!(dropped = queue.len(), "Dispatcher stopped with queued tasks");
    }
}
