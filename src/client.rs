use crate::config::Config;
use crate::error::UploadError;
use crate::multipart::UploadRequest;
use crate::transport::{HttpTransport, Transport};
use crate::types::UploadResponse;
use bytes::Bytes;
use failure::Error;
use futures::ready;
use log::{debug, info};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use tokio::task::JoinHandle;
use url::Url;

/// Sends photos to the recognition service. Clones are cheap and share the
/// underlying transport; calls on any clone are independent of each other.
#[derive(Clone)]
pub struct UploadClient {
    endpoint: Url,
    transport: Arc<dyn Transport>,
}

impl UploadClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let transport = HttpTransport::new(config.timeout)?;
        UploadClient::with_transport(config, transport)
    }

    pub fn with_transport<T>(config: &Config, transport: T) -> Result<Self, Error>
    where
        T: Transport + 'static,
    {
        Ok(UploadClient {
            endpoint: config.upload_url()?,
            transport: Arc::new(transport),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Uploads one JPEG and decodes what the service says about it. Makes
    /// exactly one attempt.
    pub async fn upload(&self, image: Bytes) -> Result<UploadResponse, UploadError> {
        if image.is_empty() {
            return Err(UploadError::Encoding("image data is empty".to_string()));
        }
        let request = UploadRequest::new(self.endpoint.clone(), image);
        info!(
            "Uploading {} byte image to {}",
            request.image().len(),
            self.endpoint
        );
        let started = Instant::now();
        let body = self.transport.send(request).await?;
        debug!("Received {} byte response", body.len());
        let response = UploadResponse::from_body(&body)?;
        info!(
            "Upload finished in {:?} with {} recognized text(s)",
            started.elapsed(),
            response.texts.as_ref().map_or(0, |t| t.len())
        );
        Ok(response)
    }

    /// Starts an upload on the runtime and returns at once. The result is
    /// delivered to whichever task awaits the returned handle; moving it to
    /// a UI thread is up to the caller.
    pub fn spawn(&self, image: Bytes) -> PendingUpload {
        let client = self.clone();
        PendingUpload {
            handle: tokio::spawn(async move { client.upload(image).await }),
            cancelled: false,
        }
    }
}

/// An upload running in the background. Dropping it aborts the request.
pub struct PendingUpload {
    handle: JoinHandle<Result<UploadResponse, UploadError>>,
    cancelled: bool,
}

impl PendingUpload {
    /// Aborts the request. Awaiting the handle afterwards yields
    /// `UploadError::Cancelled`, even if the response had already arrived.
    pub fn cancel(&mut self) {
        debug!("Cancelling upload");
        self.cancelled = true;
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Future for PendingUpload {
    type Output = Result<UploadResponse, UploadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.cancelled {
            return Poll::Ready(Err(UploadError::Cancelled));
        }
        match ready!(Pin::new(&mut self.handle).poll(cx)) {
            Ok(result) => Poll::Ready(result),
            Err(e) if e.is_cancelled() => Poll::Ready(Err(UploadError::Cancelled)),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
