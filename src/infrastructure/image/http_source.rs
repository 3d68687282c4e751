//! Plain HTTP(S) GET image source.

use futures_util::StreamExt;
use tracing::debug;

use crate::domain::entities::ResourceId;
use crate::domain::errors::LoadError;
use crate::domain::ports::{ByteStream, ImageSourcePort};

/// Fetches one image stream per request with platform-default client settings.
#[derive(Debug, Clone)]
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    /// Creates a new source.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LoadError::network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ImageSourcePort for HttpImageSource {
    async fn open(&self, id: &ResourceId) -> Result<ByteStream, LoadError> {
        debug!(id = %id, "Downloading image from network");
        let response = self
            .client
            .get(id.as_str())
            .send()
            .await
            .map_err(|e| LoadError::network(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: id.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| LoadError::network(format!("Failed to read body: {e}"))))
            .boxed())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serves one canned HTTP/1.1 response per connection.
    async fn serve(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/image.png")
    }

    fn local_source() -> HttpImageSource {
        HttpImageSource::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
    }

    async fn collect(mut stream: ByteStream) -> Result<Vec<u8>, LoadError> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn test_streams_body_on_success() {
        let url = serve("200 OK", b"not really a png").await;
        let source = local_source();

        let stream = source.open(&ResourceId::new(url)).await.unwrap();
        assert_eq!(collect(stream).await.unwrap(), b"not really a png");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let url = serve("404 Not Found", b"").await;
        let source = local_source();

        let result = source.open(&ResourceId::new(url)).await;
        assert!(matches!(result, Err(LoadError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = local_source();
        let result = source.open(&ResourceId::new(format!("http://{addr}/gone.png"))).await;
        assert!(matches!(result, Err(LoadError::Network { .. })));
    }
}
