use crate::error::TransportError;
use crate::multipart::UploadRequest;
use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Puts an upload on the wire and hands back whatever body came back.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: UploadRequest) -> Result<Bytes, TransportError>;
}

/// The real thing, over reqwest. Clones share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: UploadRequest) -> Result<Bytes, TransportError> {
        let body = request.body();
        debug!(
            "POST {} ({} bytes, boundary {})",
            request.endpoint(),
            body.len(),
            request.boundary()
        );
        let response = self
            .client
            .post(request.endpoint().clone())
            .header(CONTENT_TYPE, request.content_type())
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // The body is still what the service had to say; let the caller
            // try to decode it.
            warn!("Upload to {} returned status {}", request.endpoint(), status);
        }
        Ok(response.bytes().await?)
    }
}
