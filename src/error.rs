use failure::Fail;
use std::fmt;

/// Every way an upload can end other than with a decoded response.
#[derive(Debug, Fail)]
pub enum UploadError {
    /// The source image could not be turned into upload bytes. Raised
    /// before any network activity.
    #[fail(display = "Could not encode image: {}", _0)]
    Encoding(String),

    #[fail(display = "Network error: {}", _0)]
    Network(#[cause] TransportError),

    /// The round trip succeeded but the server sent no body.
    #[fail(display = "Server returned an empty response")]
    EmptyResponse,

    #[fail(display = "Could not decode response: {}", _0)]
    Decode(#[cause] serde_json::Error),

    #[fail(display = "Upload cancelled")]
    Cancelled,
}

impl UploadError {
    /// Text suitable for showing to the person who started the upload.
    /// Cancellation is their own doing, so it has no message.
    pub fn user_message(&self) -> Option<String> {
        match self {
            UploadError::Encoding(_) => {
                Some("The selected photo could not be read. Please choose another one.".to_string())
            }
            UploadError::Network(e) if e.is_timeout() => {
                Some("The recognition server took too long to answer. Please try again.".to_string())
            }
            UploadError::Network(_) => Some(
                "Could not reach the recognition server. Check your connection and try again."
                    .to_string(),
            ),
            UploadError::EmptyResponse => {
                Some("The recognition server sent back nothing. Please try again.".to_string())
            }
            UploadError::Decode(_) => {
                Some("The recognition server sent an unexpected answer.".to_string())
            }
            UploadError::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UploadError::Cancelled)
    }
}

impl From<TransportError> for UploadError {
    fn from(e: TransportError) -> Self {
        UploadError::Network(e)
    }
}

/// Failure below the HTTP layer: refused or reset connections, DNS, TLS,
/// timeouts. The underlying error stays reachable through `Fail::cause`.
#[derive(Debug)]
pub struct TransportError(failure::Error);

impl TransportError {
    pub fn new<E: Into<failure::Error>>(cause: E) -> Self {
        TransportError(cause.into())
    }

    pub fn is_timeout(&self) -> bool {
        if let Some(e) = self.0.downcast_ref::<reqwest::Error>() {
            return e.is_timeout();
        }
        self.0
            .downcast_ref::<std::io::Error>()
            .map_or(false, |e| e.kind() == std::io::ErrorKind::TimedOut)
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Fail for TransportError {
    fn cause(&self) -> Option<&dyn Fail> {
        Some(self.0.as_fail())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::new(e)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        TransportError::new(e)
    }
}
