//! Image load error types.

use thiserror::Error;

/// Per-task failure while resolving an image.
/// None of these escape the worker; they turn into an absent image.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum LoadError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status} while fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {message}")]
    Decode { message: String },

    #[error("worker interrupted: {message}")]
    Interrupted { message: String },

    #[error("{id} is not on disk and network fetch is disabled for this request")]
    Offline { id: String },
}

impl LoadError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates interrupted error.
    #[must_use]
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted {
            message: message.into(),
        }
    }
}

impl From<image::ImageError> for LoadError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => Self::Io(io),
            other => Self::decode(other.to_string()),
        }
    }
}
