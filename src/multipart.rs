use bytes::{BufMut, Bytes, BytesMut};
use log::debug;
use url::Url;
use uuid::Uuid;

pub const FIELD_NAME: &str = "file";
pub const FILE_NAME: &str = "image.jpg";
pub const FILE_CONTENT_TYPE: &str = "image/jpeg";

/// A single photo upload, ready to be put on the wire once.
#[derive(Debug)]
pub struct UploadRequest {
    endpoint: Url,
    boundary: String,
    image: Bytes,
}

impl UploadRequest {
    pub fn new(endpoint: Url, image: Bytes) -> Self {
        let boundary = unique_boundary(&image, || format!("Boundary-{}", Uuid::new_v4().simple()));
        UploadRequest {
            endpoint,
            boundary,
            image,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn image(&self) -> &Bytes {
        &self.image
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// The form body: one `file` part holding the image, then the closing
    /// boundary.
    pub fn body(&self) -> Bytes {
        let head = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            self.boundary, FIELD_NAME, FILE_NAME, FILE_CONTENT_TYPE
        );
        let tail = format!("\r\n--{}--\r\n", self.boundary);

        let mut body = BytesMut::with_capacity(head.len() + self.image.len() + tail.len());
        body.put_slice(head.as_bytes());
        body.put_slice(&self.image);
        body.put_slice(tail.as_bytes());
        body.freeze()
    }
}

/// Draws boundaries until one does not occur in the payload.
fn unique_boundary<F>(payload: &[u8], mut next: F) -> String
where
    F: FnMut() -> String,
{
    loop {
        let boundary = next();
        if !contains(payload, boundary.as_bytes()) {
            return boundary;
        }
        debug!("Boundary {} collides with payload, drawing another", boundary);
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> Url {
        Url::parse("http://localhost:5500/api/upload").unwrap()
    }

    /// Pulls the payload of the only part back out of a form body.
    fn extract_file_part(body: &[u8], boundary: &str) -> Vec<u8> {
        let opening = format!("--{}\r\n", boundary);
        assert!(body.starts_with(opening.as_bytes()));
        let headers_end = body
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("part headers should end with a blank line")
            + 4;
        let closing = format!("\r\n--{}--\r\n", boundary);
        assert!(body.ends_with(closing.as_bytes()));
        body[headers_end..body.len() - closing.len()].to_vec()
    }

    #[test]
    fn body_layout() {
        let request = UploadRequest::new(endpoint(), Bytes::from_static(b"JPEG"));
        let b = request.boundary();
        let expected = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"image.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEG\r\n--{b}--\r\n",
            b = b
        );
        assert_eq!(request.body(), Bytes::from(expected));
        assert_eq!(
            request.content_type(),
            format!("multipart/form-data; boundary={}", b)
        );
    }

    #[test]
    fn payload_survives_the_body() {
        let payloads: Vec<Vec<u8>> = vec![
            vec![0],
            b"\r\n".to_vec(),
            b"\r\n--Boundary-\r\n\r\n--".to_vec(),
            (0..=255u8).cycle().take(70_000).collect(),
            b"\xff\xd8\xff\xe0 not really a jpeg \xff\xd9".to_vec(),
        ];
        for payload in payloads {
            let request = UploadRequest::new(endpoint(), Bytes::from(payload.clone()));
            let body = request.body();
            assert_eq!(extract_file_part(&body, request.boundary()), payload);
        }
    }

    #[test]
    fn boundaries_differ_per_request() {
        let image = Bytes::from_static(b"JPEG");
        let a = UploadRequest::new(endpoint(), image.clone());
        let b = UploadRequest::new(endpoint(), image);
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.boundary().starts_with("Boundary-"));
    }

    #[test]
    fn colliding_boundary_is_rejected() {
        let payload = b"junk Boundary-aaaa junk";
        let mut candidates = vec!["Boundary-bbbb", "Boundary-aaaa"];
        let boundary = unique_boundary(payload, || candidates.pop().unwrap().to_string());
        assert_eq!(boundary, "Boundary-bbbb");
        assert!(candidates.is_empty());
    }

    #[test]
    fn boundary_never_appears_in_payload() {
        // Embed boundaries issued earlier so the payload looks like a form.
        let mut payload = Vec::new();
        for _ in 0..16 {
            let previous = UploadRequest::new(endpoint(), Bytes::from_static(b"x"));
            payload.extend_from_slice(previous.boundary().as_bytes());
            payload.extend_from_slice(b"\r\n");
        }
        for _ in 0..64 {
            let request = UploadRequest::new(endpoint(), Bytes::from(payload.clone()));
            assert!(!contains(&payload, request.boundary().as_bytes()));
        }
    }
}
