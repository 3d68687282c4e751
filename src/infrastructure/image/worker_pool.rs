//! Fixed-size pool of background load slots.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tracing::trace;

use crate::domain::errors::LoadError;

/// Caps how many load tasks run at once.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

/// One reserved slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct WorkerSlot {
    _permit: OwnedSemaphorePermit,
    running: Arc<AtomicUsize>,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }
}

impl WorkerPool {
    /// Creates a pool with `size` slots, at least one.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            running: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Waits until a slot is free and reserves it.
    ///
    /// # Errors
    /// Returns an interrupted error if the pool was shut down.
    pub async fn acquire(&self) -> Result<WorkerSlot, LoadError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| LoadError::interrupted(format!("Worker pool closed: {e}")))?;

        let now = self.running.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        trace!(running = now, size = self.size, "Reserved worker slot");

        Ok(WorkerSlot {
            _permit: permit,
            running: self.running.clone(),
        })
    }

    /// Runs `job` in the background holding `slot`.
    /// The slot is released however the job ends, panics included.
    pub fn spawn<F>(&self, slot: WorkerSlot, job: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(async move {
            let _slot = slot;
            job.await;
        })
    }

    /// Number of slots.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Slots currently held.
    #[must_use]
    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    /// Highest number of slots ever held at the same time.
    #[must_use]
    pub fn peak_running(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Slots free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
