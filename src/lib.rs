//! Client for a license plate recognition service: upload a photo, get back
//! the annotated image, the cropped plate and the plate text.

#[macro_use]
extern crate failure;

pub mod client;
pub mod config;
pub mod error;
pub mod multipart;
pub mod photo;
pub mod transport;
pub mod types;

pub use client::{PendingUpload, UploadClient};
pub use config::Config;
pub use error::{TransportError, UploadError};
pub use multipart::UploadRequest;
pub use transport::{HttpTransport, Transport};
pub use types::UploadResponse;
