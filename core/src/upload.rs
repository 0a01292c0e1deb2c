//! File upload entry points: multipart form POST and raw-body PUT.

use std::fs;
use std::path::Path;

use uuid::Uuid;

use crate::client::{decode, HttpProxy};
use crate::error::ProxyError;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::options::{text_callback, ResponseType};
use crate::request::parse_uri;

const OCTET_STREAM: &str = "application/octet-stream";

/// MIME types accepted for PUT uploads, keyed by lowercase extension.
const MIME_TYPES: &[(&str, &str)] = &[
    ("bmp", "image/bmp"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("gif", "image/gif"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("mp3", "audio/mpeg"),
    ("mp4", "video/mp4"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("txt", "text/plain"),
    ("webp", "image/webp"),
    ("xml", "application/xml"),
    ("zip", "application/zip"),
];

/// Content type for `path`'s extension, compared case-insensitively.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// A `multipart/form-data` body holding one file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartBody {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn single_file(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        let boundary = format!("----hc-{}", Uuid::new_v4().simple());
        let mut bytes = Vec::with_capacity(data.len() + 256);
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quoted(field),
                escape_quoted(file_name)
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        bytes.extend_from_slice(data);
        bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Self { boundary, bytes }
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

impl<T: Transport> HttpProxy<T> {
    /// POSTs `path` as the single file part `field` of a multipart form.
    /// Returns the response text.
    pub fn upload_multipart(
        &self,
        url: &str,
        field: &str,
        path: impl AsRef<Path>,
    ) -> Result<String, ProxyError> {
        let path = path.as_ref();
        parse_uri(url)?;
        let data = fs::read(path)?;
        let part_type = mime_for_path(path).unwrap_or(OCTET_STREAM);
        let body = MultipartBody::single_file(field, &file_name(path), part_type, &data);

        let request = HttpRequest {
            method: HttpMethod::Post,
            uri: url.to_string(),
            headers: vec![("Content-Type".to_string(), body.content_type())],
            body: Some(body.bytes),
        };
        let description = format!("url:{url} file:{}", path.display());
        let response = self.dispatch(request, &description)?;
        decode(response, ResponseType::Text, Box::new(text_callback), &description)
    }

    /// PUTs the raw bytes of `path` with a content type chosen from its
    /// extension. Unknown extensions fail before the file is read.
    pub fn upload_put(&self, url: &str, path: impl AsRef<Path>) -> Result<String, ProxyError> {
        let path = path.as_ref();
        let content_type = mime_for_path(path)
            .ok_or_else(|| ProxyError::UnsupportedFileType(path.display().to_string()))?;
        parse_uri(url)?;
        let data = fs::read(path)?;

        let request = HttpRequest {
            method: HttpMethod::Put,
            uri: url.to_string(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: Some(data),
        };
        let description = format!("url:{url} file:{}", path.display());
        let response = self.dispatch(request, &description)?;
        decode(response, ResponseType::Text, Box::new(text_callback), &description)
    }
}
