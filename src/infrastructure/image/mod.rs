//! Image handling infrastructure.
//!
//! This module provides:
//! - Memory caching with LRU eviction under a byte budget
//! - Content-addressed disk caching with atomic commits
//! - Decode-time downscaling
//! - Async image loading pipeline with a bounded worker pool

pub mod content_key;
pub mod decode;
pub mod delivery;
pub mod disk_cache;
pub mod dispatcher;
pub mod fetcher;
pub mod http_source;
pub mod loader;
pub mod memory_cache;
pub mod worker_pool;

pub use content_key::ContentKey;
pub use delivery::{Delivery, DeliveryOutcome, DeliveryReceiver, DeliverySink, result_channel};
pub use disk_cache::{DiskStore, StorageLocator};
pub use dispatcher::{Dispatcher, JobRunner, TaskQueue};
pub use fetcher::Fetcher;
pub use http_source::HttpImageSource;
pub use loader::{ImagePipeline, ImagePipelineConfig, LoadOutcome};
pub use memory_cache::{CacheStats, MemoryImageCache};
pub use worker_pool::{WorkerPool, WorkerSlot};
