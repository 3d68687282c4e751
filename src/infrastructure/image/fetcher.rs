//! Disk then network resolution for a single task.

use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::domain::entities::{ImageSource, LoadTask, ResourceId, SharedImage, TargetSize};
use crate::domain::errors::LoadError;
use crate::domain::ports::{ByteStream, ImageSourcePort};

use super::content_key::ContentKey;
use super::decode::decode_downscaled;
use super::disk_cache::DiskStore;

/// Loads a resource from the disk store, falling back to the network source.
pub struct Fetcher {
    source: Arc<dyn ImageSourcePort>,
    disk: Arc<DiskStore>,
    disk_cache_enabled: bool,
}

impl Fetcher {
    /// Creates a fetcher.
    #[must_use]
    pub fn new(source: Arc<dyn ImageSourcePort>, disk: Arc<DiskStore>, disk_cache_enabled: bool) -> Self {
        Self {
            source,
            disk,
            disk_cache_enabled,
        }
    }

    /// Resolves a task, logging and swallowing any failure.
    pub async fn fetch(&self, task: &LoadTask) -> Option<(SharedImage, ImageSource)> {
        let required = task.target.required_size();
        match self.try_fetch(&task.id, required, task.fetch_from_network).await {
            Ok(found) => Some(found),
            Err(e) => {
                warn!(id = %task.id, error = %e, "Failed to load image");
                None
            }
        }
    }

    /// Resolves a resource to a decoded image sized for `required`.
    ///
    /// A committed disk file always wins. On a disk miss the network is consulted only if
    /// `fetch_from_network` is set. With the disk cache enabled the body is committed to
    /// disk and decoded from the committed path; otherwise it is decoded from memory and nothing is
    /// written.
    ///
    /// # Errors
    /// Returns the first error from the disk store, the source, or the decoder.
    pub async fn try_fetch(
        &self,
        id: &ResourceId,
        required: TargetSize,
        fetch_from_network: bool,
    ) -> Result<(SharedImage, ImageSource), LoadError> {
        let key = ContentKey::for_resource(id);

        if self.disk.exists(&key).await {
            let image = self.disk.read(&key, required).await?;
            return Ok((image, ImageSource::DiskCache));
        }

        if !fetch_from_network {
            return Err(LoadError::Offline { id: id.to_string() });
        }

        let stream = self.source.open(id).await?;

        if self.disk_cache_enabled {
            let path = self.disk.write_from_stream(&key, stream).await?;
            let image = self.disk.read_path(&path, required).await?;
            return Ok((image, ImageSource::Network));
        }

        let bytes = collect(stream).await?;
        debug!(id = %id, size = bytes.len(), "Decoding downloaded image in memory");
        let image = tokio::task::spawn_blocking(move || decode_downscaled(&bytes, required))
            .await
            .map_err(|e| LoadError::interrupted(format!("Decode task panicked: {e}")))??;
        Ok((Arc::new(image), ImageSource::Network))
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("disk", &self.disk)
            .field("disk_cache_enabled", &self.disk_cache_enabled)
            .finish_non_exhaustive()
    }
}

async fn collect(mut stream: ByteStream) -> Result<Vec<u8>, LoadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}
