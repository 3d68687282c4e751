//! Async image loading pipeline.
//!
//! Implements a three-tier lookup: Memory -> Disk -> Network. The memory tier is checked
//! synchronously by [`ImagePipeline::load`]; misses become tasks for the dispatcher and
//! finished tasks come back through the [`DeliveryReceiver`].

use std::sync::Arc;

use sysinfo::System;
use tracing::{debug, info, trace, warn};

use crate::domain::entities::{LoadTask, ResourceId};
use crate::domain::errors::LoadError;
use crate::domain::ports::{DisplayTarget, ImageSourcePort};

use super::delivery::{Delivery, DeliveryReceiver, DeliverySink, result_channel};
use super::dispatcher::{Dispatcher, JobRunner};
use super::disk_cache::DiskStore;
use super::fetcher::Fetcher;
use super::http_source::HttpImageSource;
use super::memory_cache::MemoryImageCache;
use super::worker_pool::WorkerPool;

const DEFAULT_WORKERS: usize = 5;
const FALLBACK_MEMORY_BUDGET: usize = 64 * 1024 * 1024;
const MEMORY_BUDGET_DIVISOR: u64 = 8;

/// Configuration for the image pipeline.
#[derive(Debug, Clone)]
pub struct ImagePipelineConfig {
    /// Maximum concurrent load tasks.
    pub worker_count: usize,
    /// Whether downloads are committed to the disk store.
    pub disk_cache_enabled: bool,
    /// Memory cache budget in bytes of decoded pixels.
    pub memory_budget_bytes: usize,
}

impl Default for ImagePipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKERS,
            disk_cache_enabled: true,
            memory_budget_bytes: default_memory_budget(),
        }
    }
}

/// One-eighth of the memory currently available, or 64 MiB if the platform reports none.
#[must_use]
pub fn default_memory_budget() -> usize {
    let mut sys = System::new();
    sys.refresh_memory();
    let available = sys.available_memory();
    if available == 0 {
        return FALLBACK_MEMORY_BUDGET;
    }
    usize::try_from(available / MEMORY_BUDGET_DIVISOR).unwrap_or(usize::MAX)
}

/// What [`ImagePipeline::load`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from memory; the target already shows the image.
    MemoryHit,
    /// Queued for a background worker.
    Queued,
    /// The dispatcher is gone; the target keeps its placeholder.
    Rejected,
}

/// Runs a task on a worker: resolve, cache in memory, deliver.
struct PipelineWorker {
    fetcher: Fetcher,
    memory_cache: Arc<MemoryImageCache>,
    sink: DeliverySink,
}

#[async_trait::async_trait]
impl JobRunner for PipelineWorker {
    async fn run(&self, task: LoadTask) {
        debug!(id = %task.id, "Load task started");
        let found = self.fetcher.fetch(&task).await;

        let (image, source) = match found {
            Some((image, source)) => {
                self.memory_cache.put(task.id.clone(), image.clone());
                debug!(id = %task.id, source = %source, "Load task finished");
                (Some(image), Some(source))
            }
            None => (None, None),
        };

        self.sink.deliver(Delivery {
            id: task.id,
            target: task.target,
            image,
            source,
        });
    }
}

/// Front door of the pipeline.
pub struct ImagePipeline {
    memory_cache: Arc<MemoryImageCache>,
    dispatcher: Dispatcher,
    pool: WorkerPool,
    config: ImagePipelineConfig,
}

impl std::fmt::Debug for ImagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ImagePipeline {
    /// Creates a pipeline and spawns its dispatcher. Must be called inside a tokio runtime.
    ///
    /// Returns the receiver the display-owning task drains to apply results.
    #[must_use]
    pub fn new(
        config: ImagePipelineConfig,
        source: Arc<dyn ImageSourcePort>,
        disk: Arc<DiskStore>,
    ) -> (Self, DeliveryReceiver) {
        let config = ImagePipelineConfig {
            worker_count: config.worker_count.max(1),
            ..config
        };
        let memory_cache = Arc::new(MemoryImageCache::new(config.memory_budget_bytes));
        let (sink, receiver) = result_channel();
        let pool = WorkerPool::new(config.worker_count);

        let worker = PipelineWorker {
            fetcher: Fetcher::new(source, disk, config.disk_cache_enabled),
            memory_cache: memory_cache.clone(),
            sink,
        };
        let dispatcher = Dispatcher::spawn(pool.clone(), Arc::new(worker));

        info!(
            workers = config.worker_count,
            disk_cache = config.disk_cache_enabled,
            memory_budget = config.memory_budget_bytes,
            "Image pipeline started"
        );

        (
            Self {
                memory_cache,
                dispatcher,
                pool,
                config,
            },
            receiver,
        )
    }

    /// Creates a pipeline over HTTP in the default disk location.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_defaults(config: ImagePipelineConfig) -> Result<(Self, DeliveryReceiver), LoadError> {
        let source = Arc::new(HttpImageSource::new()?);
        let disk = Arc::new(DiskStore::default_location());
        Ok(Self::new(config, source, disk))
    }

    /// Requests `id` for `target`, allowing network fetches.
    pub fn load(&self, id: &ResourceId, target: &Arc<dyn DisplayTarget>) -> LoadOutcome {
        self.load_with(id, target, true)
    }

    /// Requests `id` for `target`.
    ///
    /// The target is tagged with `id` first. A memory hit is assigned right away and
    /// schedules nothing; a miss queues a task and returns immediately.
    pub fn load_with(
        &self,
        id: &ResourceId,
        target: &Arc<dyn DisplayTarget>,
        fetch_from_network: bool,
    ) -> LoadOutcome {
        target.set_identity_tag(id);

        if let Some(image) = self.memory_cache.get(id) {
            if target.identity_tag().as_ref() == Some(id) {
                target.assign_image(image);
            }
            trace!(id = %id, "Served from memory cache");
            return LoadOutcome::MemoryHit;
        }

        let task = LoadTask::new(id.clone(), target.clone(), fetch_from_network);
        match self.dispatcher.submit(task) {
            Ok(()) => LoadOutcome::Queued,
            Err(e) => {
                warn!(id = %id, error = %e, "Load request rejected");
                LoadOutcome::Rejected
            }
        }
    }

    /// Returns the memory cache.
    #[must_use]
    pub const fn memory_cache(&self) -> &Arc<MemoryImageCache> {
        &self.memory_cache
    }

    /// Returns the worker pool.
    #[must_use]
    pub const fn worker_pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Returns the effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ImagePipelineConfig {
        &self.config
    }
}
