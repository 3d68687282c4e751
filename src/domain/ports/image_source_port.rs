//! Port definition for fetching encoded image bytes.

use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::domain::entities::ResourceId;
use crate::domain::errors::LoadError;

/// Stream of encoded image chunks. An error item aborts the transfer.
pub type ByteStream = BoxStream<'static, Result<Bytes, LoadError>>;

/// Port for opening the remote byte stream behind a resource identifier.
/// Implementations must be thread-safe.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageSourcePort: Send + Sync {
    /// Opens the resource for reading.
    /// Failures to connect or non-success responses are returned here; failures
    /// mid-transfer surface as error items in the stream.
    async fn open(&self, id: &ResourceId) -> Result<ByteStream, LoadError>;
}
