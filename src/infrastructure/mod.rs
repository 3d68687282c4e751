//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Image handling (caching, loading, decoding).
pub mod image;

pub use self::config::{AppConfig, CliArgs, ConfigError, LogLevel, PipelineSettings, StorageManager};
pub use self::image::{
    CacheStats, Delivery, DeliveryOutcome, DeliveryReceiver, DiskStore, HttpImageSource,
    ImagePipeline, ImagePipelineConfig, LoadOutcome, MemoryImageCache, StorageLocator, WorkerPool,
};
