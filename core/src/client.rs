//! Request executor over a shared, pooled transport.
//!
//! # Design
//! `HttpProxy` holds the transport behind an `Arc`, so clones share one
//! connection pool and the proxy can be handed to any number of threads.
//! Each call consumes its own `Options`, builds an independent request (with
//! its own cookie context) and blocks until the transform has produced a
//! result. Whatever the outcome, the response body is drained before
//! returning so the connection goes back to the pool.

use std::io::{self, Read};
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::options::{Body, Callback, Options, ResponseType};
use crate::request::build_request;
use crate::transport::UreqTransport;

pub struct HttpProxy<T = UreqTransport> {
    transport: Arc<T>,
    default_cookie_domain: String,
}

impl<T> Clone for HttpProxy<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            default_cookie_domain: self.default_cookie_domain.clone(),
        }
    }
}

impl HttpProxy<UreqTransport> {
    /// Builds the pooled `ureq` transport described by `config`.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let transport = UreqTransport::new(&config.pool())?;
        Ok(Self::new(transport, config.default_cookie_domain.clone()))
    }
}

impl<T: Transport> HttpProxy<T> {
    pub fn new(transport: T, default_cookie_domain: impl Into<String>) -> Self {
        Self {
            transport: Arc::new(transport),
            default_cookie_domain: default_cookie_domain.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a GET with the options' parameters merged into the query string.
    pub fn get<R>(&self, options: Options<R>) -> Result<R, ProxyError> {
        self.execute(HttpMethod::Get, options)
    }

    /// Sends a POST with the options' parameters encoded as the body.
    pub fn post<R>(&self, options: Options<R>) -> Result<R, ProxyError> {
        self.execute(HttpMethod::Post, options)
    }

    fn execute<R>(&self, method: HttpMethod, options: Options<R>) -> Result<R, ProxyError> {
        let request = build_request(&options, method, &self.default_cookie_domain)?;
        let description = options.to_string();
        let response_type = options.response_type();
        let response = self.dispatch(request, &description)?;
        decode(response, response_type, options.into_callback(), &description)
    }

    /// Sends `request`, logging transport failures with `description`.
    pub(crate) fn dispatch(
        &self,
        request: HttpRequest,
        description: &str,
    ) -> Result<HttpResponse, ProxyError> {
        let method = request.method;
        self.transport.send(request).map_err(|err| {
            tracing::error!(%method, error = %err, options = %description, "request failed");
            err
        })
    }
}

/// Runs `callback` over the body of a successful response and releases the
/// connection. Non-2xx responses never reach the callback.
pub(crate) fn decode<R>(
    mut response: HttpResponse,
    response_type: ResponseType,
    callback: Callback<R>,
    description: &str,
) -> Result<R, ProxyError> {
    let result = if !response.is_success() {
        let body = match read_text(&mut *response.body) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(error = %err, options = %description, "failed reading error body");
                String::new()
            }
        };
        tracing::warn!(status = response.status, options = %description, "unsuccessful response");
        Err(ProxyError::Status {
            status: response.status,
            body,
        })
    } else {
        match response_type {
            ResponseType::Text => match read_text(&mut *response.body) {
                Ok(text) => callback(Body::Text(text)).map_err(ProxyError::Decode),
                Err(err) => {
                    tracing::error!(error = %err, options = %description, "failed reading response body");
                    Err(ProxyError::Io(err))
                }
            },
            ResponseType::RawBytes => {
                callback(Body::Stream(&mut *response.body)).map_err(ProxyError::Decode)
            }
        }
    };

    release(&mut response, description);
    result
}

fn read_text(reader: &mut dyn Read) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Consumes whatever the callback left unread.
fn release(response: &mut HttpResponse, description: &str) {
    if let Err(err) = io::copy(&mut response.body, &mut io::sink()) {
        tracing::warn!(error = %err, options = %description, "failed to release response body");
    }
}
