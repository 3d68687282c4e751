//! Content-addressed disk store for encoded image bytes.
//!
//! One flat directory holds one file per resource, named by its [`ContentKey`].
//! Writes stream into a temp file in the same directory and are renamed into place only
//! after the source stream finished cleanly, so readers never observe partial files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use crate::domain::entities::{SharedImage, TargetSize};
use crate::domain::errors::LoadError;
use crate::domain::ports::ByteStream;

use super::content_key::ContentKey;
use super::decode::decode_downscaled;

const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "linuxmobile";
const APP_NAME: &str = "pixfetch";
const IMAGES_DIR: &str = "images";

/// Picks the storage root: the external cache directory while it is available,
/// otherwise the internal one. Resolved on every call.
#[derive(Debug, Clone)]
pub struct StorageLocator {
    external: Option<PathBuf>,
    internal: PathBuf,
}

impl StorageLocator {
    /// Creates a locator from an optional external root and an internal fallback.
    #[must_use]
    pub const fn new(external: Option<PathBuf>, internal: PathBuf) -> Self {
        Self { external, internal }
    }

    /// Locator that always uses a single directory.
    #[must_use]
    pub const fn fixed(root: PathBuf) -> Self {
        Self::new(None, root)
    }

    /// Platform cache dir (`~/.cache/pixfetch/images` on Linux) with a temp-dir fallback.
    #[must_use]
    pub fn default_location() -> Self {
        let external = directories::ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.cache_dir().join(IMAGES_DIR));
        Self::new(external, default_internal_root())
    }

    /// Returns the root to use right now.
    #[must_use]
    pub fn resolve(&self) -> PathBuf {
        match &self.external {
            Some(external) if is_available(external) => external.clone(),
            _ => self.internal.clone(),
        }
    }
}

/// Internal fallback root under the system temp directory.
#[must_use]
pub fn default_internal_root() -> PathBuf {
    std::env::temp_dir().join(APP_NAME).join(IMAGES_DIR)
}

/// A path is available when it, or its nearest existing ancestor, is a writable directory.
/// Missing levels are created on the first write.
fn is_available(path: &Path) -> bool {
    path.ancestors()
        .find_map(|ancestor| std::fs::metadata(ancestor).ok())
        .is_some_and(|meta| meta.is_dir() && !meta.permissions().readonly())
}

/// Disk store keyed by content hash.
#[derive(Debug, Clone)]
pub struct DiskStore {
    locator: StorageLocator,
}

impl DiskStore {
    /// Creates a store over the given locator. Nothing is created until the first write.
    #[must_use]
    pub const fn new(locator: StorageLocator) -> Self {
        Self { locator }
    }

    /// Creates a store in the default location.
    #[must_use]
    pub fn default_location() -> Self {
        Self::new(StorageLocator::default_location())
    }

    /// Returns the file location for a key under the current root.
    #[must_use]
    pub fn path_for(&self, key: &ContentKey) -> PathBuf {
        self.locator.resolve().join(key.as_str())
    }

    /// Checks if a committed file exists for the key.
    pub async fn exists(&self, key: &ContentKey) -> bool {
        let path = self.path_for(key);
        fs::try_exists(&path).await.unwrap_or(false)
    }

    /// Streams `source` into the file for `key`.
    ///
    /// The bytes land in a temp file first; it is renamed over the final path only after
    /// the stream ends without error. On failure the temp file is removed and nothing
    /// is committed.
    ///
    /// # Errors
    /// Returns the stream's error, or an I/O error from the file system.
    pub async fn write_from_stream(
        &self,
        key: &ContentKey,
        mut source: ByteStream,
    ) -> Result<PathBuf, LoadError> {
        let root = self.locator.resolve();
        fs::create_dir_all(&root).await?;
        let path = root.join(key.as_str());

        let temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".part")
            .tempfile_in(&root)?;
        let (file, temp_path) = temp.into_parts();
        let mut file = fs::File::from_std(file);

        let mut written = 0usize;
        while let Some(chunk) = source.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;
        drop(file);

        temp_path.persist(&path).map_err(|e| LoadError::Io(e.error))?;
        debug!(key = %key, path = %path.display(), size = written, "Stored image in disk cache");
        Ok(path)
    }

    /// Reads the raw bytes for a key.
    ///
    /// # Errors
    /// Returns an I/O error if the file is missing or unreadable.
    pub async fn read_bytes(&self, key: &ContentKey) -> Result<Vec<u8>, LoadError> {
        let path = self.path_for(key);
        let bytes = fs::read(&path).await?;
        trace!(key = %key, path = %path.display(), "Disk cache hit");
        Ok(bytes)
    }

    /// Reads and decodes the image for a key, downscaled for `required`.
    ///
    /// # Errors
    /// Returns an I/O error on read failure or a decode error for corrupt bytes.
    pub async fn read(&self, key: &ContentKey, required: TargetSize) -> Result<SharedImage, LoadError> {
        self.read_path(&self.path_for(key), required).await
    }

    /// Decodes a committed file by location, as returned from
    /// [`write_from_stream`](Self::write_from_stream). Does not resolve the root again.
    ///
    /// # Errors
    /// Returns an I/O error on read failure or a decode error for corrupt bytes.
    pub async fn read_path(&self, path: &Path, required: TargetSize) -> Result<SharedImage, LoadError> {
        let bytes = fs::read(path).await?;
        let image = tokio::task::spawn_blocking(move || decode_downscaled(&bytes, required))
            .await
            .map_err(|e| LoadError::interrupted(format!("Decode task panicked: {e}")))??;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Decoded image from disk cache"
        );
        Ok(Arc::new(image))
    }
}
