//! HTTP transport types and the `Transport` seam.
//!
//! # Design
//! The request builder produces `HttpRequest` values as plain data and the
//! executor consumes `HttpResponse` values; the actual network round-trip
//! lives behind the [`Transport`] trait. Production code plugs in
//! [`crate::transport::UreqTransport`], tests plug in a closure or a canned
//! response, so the option merging and decoding logic stays deterministic.
//!
//! Requests use owned types (`String`, `Vec`) so a built request can be
//! inspected, logged or replayed without lifetime concerns. Response bodies
//! are a reader rather than a buffer: the raw-bytes response type hands the
//! open stream to the caller's transform.

use std::fmt;
use std::io::Read;

use crate::error::ProxyError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by [`crate::request::build_request`] or the upload helpers and
/// handed to a [`Transport`] for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// First header value with the given name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Response backed by an in-memory body.
    pub fn from_bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Box::new(std::io::Cursor::new(body.into())),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes built requests against the network.
///
/// Implementations are shared across threads by `HttpProxy`, so they must be
/// safe for concurrent use; each call receives an independent request.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProxyError>;
}

impl<F> Transport for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, ProxyError> + Send + Sync,
{
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProxyError> {
        self(request)
    }
}
