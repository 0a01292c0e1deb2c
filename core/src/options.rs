//! Per-request options and their fluent builder.
//!
//! # Design
//! `OptionsBuilder` is the mutable, chainable surface; `build()` checks the
//! preconditions and freezes everything into an `Options<R>` that a single
//! `get`/`post` call consumes by value. The response transform is typed:
//! `callback` and `json` change the builder's result type, and the decoded
//! body reaches the transform as an explicit [`Body`] variant chosen by the
//! [`ResponseType`].

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cookie::Cookie;
use crate::error::{BoxError, ProxyError};

/// Encoding of a POST body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    #[default]
    Json,
    FormUrlEncoded,
}

impl ContentType {
    pub const APPLICATION_JSON: &'static str = "application/json";
    pub const APPLICATION_FORM_URLENCODED: &'static str = "application/x-www-form-urlencoded";

    /// Value sent in the `Content-Type` header.
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => Self::APPLICATION_JSON,
            ContentType::FormUrlEncoded => Self::APPLICATION_FORM_URLENCODED,
        }
    }
}

/// Shape of the body handed to the response transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// The open response stream; the transform reads as much as it wants.
    RawBytes,
    /// The whole body, decoded as UTF-8.
    #[default]
    Text,
}

/// Decoded response body passed to the transform.
pub enum Body<'a> {
    Stream(&'a mut dyn Read),
    Text(String),
}

impl Body<'_> {
    /// Reads the remaining body as UTF-8 text, replacing invalid sequences.
    pub fn into_string(self) -> io::Result<String> {
        match self {
            Body::Text(text) => Ok(text),
            Body::Stream(reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
        }
    }

    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Body::Text(text) => Ok(text.into_bytes()),
            Body::Stream(reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Debug for Body<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Stream(_) => f.write_str("Body::Stream(..)"),
            Body::Text(text) => f.debug_tuple("Body::Text").field(text).finish(),
        }
    }
}

/// Transform applied once to the decoded body.
pub type Callback<R> = Box<dyn FnOnce(Body<'_>) -> Result<R, BoxError> + Send>;

pub(crate) fn text_callback(body: Body<'_>) -> Result<String, BoxError> {
    Ok(body.into_string()?)
}

/// Immutable description of one request. Build it with [`Options::builder`].
pub struct Options<R = String> {
    uri: String,
    parameters: BTreeMap<String, Value>,
    headers: BTreeMap<String, String>,
    cookies: Vec<Cookie>,
    content_type: ContentType,
    response_type: ResponseType,
    callback: Callback<R>,
}

impl Options<String> {
    /// Builder whose default transform returns the body as text.
    pub fn builder() -> OptionsBuilder<String> {
        OptionsBuilder::new()
    }
}

impl<R> Options<R> {
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub(crate) fn into_callback(self) -> Callback<R> {
        self.callback
    }
}

impl<R> fmt::Display for Options<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "url:{} headers:{:?}", self.uri, self.headers)
    }
}

impl<R> fmt::Debug for Options<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("uri", &self.uri)
            .field("parameters", &self.parameters)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("content_type", &self.content_type)
            .field("response_type", &self.response_type)
            .finish_non_exhaustive()
    }
}

/// Chainable builder for [`Options`].
pub struct OptionsBuilder<R = String> {
    uri: Option<String>,
    parameters: BTreeMap<String, Value>,
    headers: BTreeMap<String, String>,
    cookies: Vec<Cookie>,
    content_type: ContentType,
    response_type: ResponseType,
    callback: Callback<R>,
}

impl OptionsBuilder<String> {
    pub fn new() -> Self {
        Self {
            uri: None,
            parameters: BTreeMap::new(),
            headers: BTreeMap::new(),
            cookies: Vec::new(),
            content_type: ContentType::default(),
            response_type: ResponseType::default(),
            callback: Box::new(text_callback),
        }
    }
}

impl Default for OptionsBuilder<String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> OptionsBuilder<R> {
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets a header; a later value for the same name replaces the earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        self.cookies.extend(cookies);
        self
    }

    /// Query parameter for GET, body field for POST.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameters<I, K, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.parameters
            .extend(parameters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Replaces the response transform, changing the result type.
    pub fn callback<T, F>(self, callback: F) -> OptionsBuilder<T>
    where
        F: FnOnce(Body<'_>) -> Result<T, BoxError> + Send + 'static,
    {
        OptionsBuilder {
            uri: self.uri,
            parameters: self.parameters,
            headers: self.headers,
            cookies: self.cookies,
            content_type: self.content_type,
            response_type: self.response_type,
            callback: Box::new(callback),
        }
    }

    /// Deserializes the response body as JSON into `T`.
    pub fn json<T>(self) -> OptionsBuilder<T>
    where
        T: DeserializeOwned + 'static,
    {
        self.callback(|body| {
            let value = match body {
                Body::Stream(reader) => serde_json::from_reader(reader)?,
                Body::Text(text) => serde_json::from_str(&text)?,
            };
            Ok(value)
        })
    }

    /// Streams the raw body into a byte buffer.
    pub fn bytes(self) -> OptionsBuilder<Vec<u8>> {
        self.response_type(ResponseType::RawBytes)
            .callback(|body| Ok(body.into_bytes()?))
    }

    /// Freezes the options. Fails when no (non-blank) URI was set.
    pub fn build(self) -> Result<Options<R>, ProxyError> {
        let uri = self
            .uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or(ProxyError::MissingUri)?;
        Ok(Options {
            uri,
            parameters: self.parameters,
            headers: self.headers,
            cookies: self.cookies,
            content_type: self.content_type,
            response_type: self.response_type,
            callback: self.callback,
        })
    }
}
