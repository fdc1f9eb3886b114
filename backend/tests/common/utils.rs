use axum::{http::header::LOCATION, response::Response};
use http_body_util::BodyExt;

const BOUNDARY: &str = "spic-test-boundary";

/// Hand-built `multipart/form-data` body
pub struct MultipartBody {
    buffer: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.buffer.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.buffer.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.buffer.extend_from_slice(bytes);
        self.buffer.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.buffer
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.buffer
    }
}

/// Response body as text
pub async fn body_string(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

/// `Location` header of a redirect
pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("Redirect should carry a Location header")
        .to_str()
        .unwrap()
}
