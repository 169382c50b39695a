use crate::error::UploadError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

/// What the recognition service found in an uploaded photo. Any subset of
/// the fields may be missing; a photo with no plate usually yields none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    /// Base64 image of the photo with detections drawn on it.
    #[serde(rename = "prediction", default)]
    pub prediction_image: Option<String>,
    /// Base64 image of the cropped plate region.
    #[serde(default)]
    pub license_plate_image: Option<String>,
    /// One entry per recognized plate or line, in the order the service
    /// reported them.
    #[serde(default)]
    pub texts: Option<Vec<String>>,
}

impl UploadResponse {
    /// Decodes a response body. An empty body is a broken server contract
    /// rather than bad JSON, so it gets its own error.
    pub fn from_body(body: &[u8]) -> Result<Self, UploadError> {
        if body.is_empty() {
            return Err(UploadError::EmptyResponse);
        }
        serde_json::from_slice(body).map_err(UploadError::Decode)
    }

    pub fn prediction_image_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        decode_image(self.prediction_image.as_deref())
    }

    pub fn license_plate_image_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        decode_image(self.license_plate_image.as_deref())
    }

    /// Recognized texts one per line, empty when there are none.
    pub fn joined_texts(&self) -> String {
        self.texts
            .as_ref()
            .map(|texts| texts.join("\n"))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.prediction_image.is_none()
            && self.license_plate_image.is_none()
            && self.texts.as_ref().map_or(true, |t| t.is_empty())
    }
}

fn decode_image(data: Option<&str>) -> Result<Option<Vec<u8>>, base64::DecodeError> {
    data.map(|s| STANDARD.decode(s.trim())).transpose()
}
