use crate::error::UploadError;
use bytes::Bytes;
use failure::Error;
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Same compression the service was tuned against.
pub const JPEG_QUALITY: u8 = 80;

/// Encodes an image as the JPEG the service expects. Alpha is dropped,
/// since JPEG has nowhere to put it.
pub fn encode_jpeg(image: &DynamicImage) -> Result<Bytes, UploadError> {
    let rgb = image.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| UploadError::Encoding(e.to_string()))?;
    if data.is_empty() {
        return Err(UploadError::Encoding("encoder produced no data".to_string()));
    }
    debug!(
        "Encoded {}x{} image as {} byte JPEG",
        rgb.width(),
        rgb.height(),
        data.len()
    );
    Ok(Bytes::from(data))
}

/// Reads a photo from disk in whatever format it is in and re-encodes it
/// for upload. Re-encoding drops EXIF, so any orientation tag is applied to
/// the pixels first.
pub fn load_for_upload(path: &Path) -> Result<Bytes, UploadError> {
    let encoding_error = |e: &dyn std::fmt::Display| {
        UploadError::Encoding(format!("{}: {}", path.display(), e))
    };
    let mut decoder = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| encoding_error(&e))?
        .into_decoder()
        .map_err(|e| encoding_error(&e))?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        warn!("Ignoring unreadable orientation in {}: {}", path.display(), e);
        Orientation::NoTransforms
    });
    let mut image = DynamicImage::from_decoder(decoder).map_err(|e| encoding_error(&e))?;
    image.apply_orientation(orientation);
    encode_jpeg(&image)
}

/// Writes a decoded result image to `dir/{stem}.{ext}`, with the extension
/// picked from the image data. Data that is not an image we can read is
/// skipped rather than written.
pub fn save_result(data: &[u8], dir: &Path, stem: &str) -> Result<Option<PathBuf>, Error> {
    let format = match image::guess_format(data) {
        Ok(format) => format,
        Err(e) => {
            warn!("Result image {} has an unknown format: {}", stem, e);
            return Ok(None);
        }
    };
    if let Err(e) = image::load_from_memory_with_format(data, format) {
        warn!("Failed to decode result image {}: {}", stem, e);
        return Ok(None);
    }
    let path = dir.join(format!("{}.{}", stem, extension(format)));
    fs::write(&path, data).map_err(|e| format_err!("Writing {}: {}", path.display(), e))?;
    Ok(Some(path))
}

fn extension(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        other => other.extensions_str().first().copied().unwrap_or("img"),
    }
}
