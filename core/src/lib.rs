//! Blocking HTTP facade over a shared connection pool.
//!
//! # Overview
//! Callers describe each request with an [`Options`] value (URI, headers,
//! cookies, parameters, body encoding, response shape and a typed
//! transform) and hand it to [`HttpProxy::get`] or [`HttpProxy::post`].
//! The proxy merges the options into an [`HttpRequest`], executes it on the
//! pooled transport and runs the transform over the decoded body.
//!
//! # Design
//! - Request building is pure: [`request::build_request`] never does I/O,
//!   so missing or malformed URIs fail before anything is sent.
//! - GET parameters are appended to the query string only for names the URI
//!   does not already carry; POST parameters become a JSON or form body.
//! - The network sits behind the [`Transport`] trait. [`UreqTransport`] is
//!   the pooled production implementation; tests inject their own.
//! - Failures come back as [`ProxyError`]; transport failures are also
//!   logged with the options that caused them.

pub mod client;
pub mod config;
pub mod cookie;
pub mod error;
pub mod http;
pub mod logging;
pub mod options;
pub mod request;
pub mod transport;
pub mod upload;

pub use client::HttpProxy;
pub use config::{load_config, PoolConfig, ProxyConfig};
pub use cookie::{Cookie, CookieContext};
pub use error::{BoxError, ProxyError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use options::{Body, ContentType, Options, OptionsBuilder, ResponseType};
pub use transport::UreqTransport;
