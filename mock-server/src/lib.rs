use axum::{
    body::Bytes,
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

/// What the server saw of a request, returned by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", get(status))
        .route("/bytes/{len}", get(bytes))
        .route("/json", get(json))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        cookie: header_value(&headers, header::COOKIE),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

async fn bytes(Path(len): Path<usize>) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

async fn json() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "name": "mock", "items": [1, 2, 3] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_serializes_to_json() {
        let echo = Echo {
            method: "GET".to_string(),
            path: "/echo".to_string(),
            query: Some("a=1".to_string()),
            content_type: None,
            cookie: None,
            body: String::new(),
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["method"], "GET");
        assert_eq!(json["query"], "a=1");
        assert!(json["cookie"].is_null());
    }

    #[test]
    fn header_value_reads_present_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "sid=1".parse().unwrap());
        assert_eq!(header_value(&headers, header::COOKIE).as_deref(), Some("sid=1"));
        assert_eq!(header_value(&headers, header::CONTENT_TYPE), None);
    }
}
