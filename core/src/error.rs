//! Error types for the request facade.
//!
//! # Design
//! Failures raised before any I/O (`MissingUri`, `InvalidUri`,
//! `InvalidRequest`, `UnsupportedFileType`) are argument errors. `Transport`
//! and `Io` cover everything that went wrong on the wire; callers that only
//! care about "did the request reach the server" can use
//! [`ProxyError::is_transport`]. Non-2xx responses land in `Status` with the
//! drained body text for debugging.

use thiserror::Error;

/// Boxed error returned by response transforms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `HttpProxy` and the request builder.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The options were built without a URI.
    #[error("request uri is required")]
    MissingUri,

    /// The URI (after query merging) is not a valid HTTP URI.
    #[error("invalid uri {0:?}")]
    InvalidUri(String),

    /// A header name/value or the request itself could not be assembled.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// PUT upload of a file whose extension is not in the MIME table.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with a status outside `2xx`.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("form encoding error: {0}")]
    Form(#[from] serde_urlencoded::ser::Error),

    /// The response transform rejected the body.
    #[error("response decoding failed: {0}")]
    Decode(#[source] BoxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ProxyError {
    /// True when the request failed on the wire (connect, timeout, reset).
    pub fn is_transport(&self) -> bool {
        matches!(self, ProxyError::Transport(_) | ProxyError::Io(_))
    }

    /// True for failures detected before any network I/O.
    pub fn is_argument(&self) -> bool {
        matches!(
            self,
            ProxyError::MissingUri
                | ProxyError::InvalidUri(_)
                | ProxyError::InvalidRequest(_)
                | ProxyError::UnsupportedFileType(_)
        )
    }
}
