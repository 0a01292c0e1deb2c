//! Option merging: turns `Options` into an `HttpRequest`.
//!
//! GET requests carry parameters in the query string, appended only for
//! names the URI does not already have. POST and PUT requests carry them in
//! the body, encoded according to the options' content type. Cookies are
//! rendered into a `Cookie` header through a context private to the request.

use std::collections::BTreeMap;

use serde_json::Value;
use ureq::http::Uri;

use crate::cookie::CookieContext;
use crate::error::ProxyError;
use crate::http::{HttpMethod, HttpRequest};
use crate::options::{ContentType, Options};

/// Builds the request descriptor for `options` without touching the network.
pub fn build_request<R>(
    options: &Options<R>,
    method: HttpMethod,
    default_cookie_domain: &str,
) -> Result<HttpRequest, ProxyError> {
    let mut headers: Vec<(String, String)> = options
        .headers()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let (uri, body) = match method {
        HttpMethod::Get => (merge_query(options.uri(), options.parameters())?, None),
        HttpMethod::Post | HttpMethod::Put => {
            let body = encode_body(options.parameters(), options.content_type())?;
            if body.is_some() {
                set_header(&mut headers, "Content-Type", options.content_type().mime());
            }
            (options.uri().to_string(), body)
        }
    };

    let parsed = parse_uri(&uri)?;

    if !options.cookies().is_empty() {
        let context = CookieContext::new(options.cookies(), default_cookie_domain);
        if let Some(cookie) = context.header_for(&parsed) {
            append_cookie(&mut headers, cookie);
        }
    }

    Ok(HttpRequest {
        method,
        uri,
        headers,
        body,
    })
}

/// Appends `parameters` to the query string of `uri`, skipping any name
/// already present as `name=` in the query. Existing values are never overwritten.
pub fn merge_query(uri: &str, parameters: &BTreeMap<String, Value>) -> Result<String, ProxyError> {
    if parameters.is_empty() {
        return Ok(uri.to_string());
    }

    let (base, fragment) = match uri.find('#') {
        Some(i) => (&uri[..i], Some(&uri[i..])),
        None => (uri, None),
    };
    let query = base.find('?').map(|i| &base[i + 1..]);
    let existing = query.unwrap_or_default();

    let extra: Vec<(&str, String)> = parameters
        .iter()
        .filter(|(name, _)| !is_present(existing, name))
        .map(|(name, value)| (name.as_str(), value_to_string(value)))
        .collect();
    if extra.is_empty() {
        return Ok(uri.to_string());
    }
    let extra = serde_urlencoded::to_string(&extra)?;

    let mut merged = String::with_capacity(uri.len() + extra.len() + 1);
    merged.push_str(base);
    match query {
        None => merged.push('?'),
        Some(q) if q.is_empty() || q.ends_with('&') => {}
        Some(_) => merged.push('&'),
    }
    merged.push_str(&extra);
    if let Some(fragment) = fragment {
        merged.push_str(fragment);
    }
    Ok(merged)
}

/// Encodes `parameters` as a request body. Empty parameters produce no body.
pub fn encode_body(
    parameters: &BTreeMap<String, Value>,
    content_type: ContentType,
) -> Result<Option<Vec<u8>>, ProxyError> {
    if parameters.is_empty() {
        return Ok(None);
    }
    let body = match content_type {
        ContentType::Json => serde_json::to_vec(parameters)?,
        ContentType::FormUrlEncoded => {
            let pairs: Vec<(&str, String)> = parameters
                .iter()
                .map(|(name, value)| (name.as_str(), value_to_string(value)))
                .collect();
            serde_urlencoded::to_string(&pairs)?.into_bytes()
        }
    };
    Ok(Some(body))
}

/// String form of a parameter value: strings verbatim, the rest as JSON text.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn parse_uri(uri: &str) -> Result<Uri, ProxyError> {
    let parsed: Uri = uri
        .parse()
        .map_err(|_| ProxyError::InvalidUri(uri.to_string()))?;
    if parsed.scheme().is_none() || parsed.host().is_none() {
        return Err(ProxyError::InvalidUri(uri.to_string()));
    }
    Ok(parsed)
}

/// A name counts as present when `name=` occurs anywhere in the query,
/// raw or URL-encoded. Bare keys without `=` do not count.
fn is_present(query: &str, name: &str) -> bool {
    query.contains(&format!("{name}=")) || query.contains(&format!("{}=", encode_name(name)))
}

fn encode_name(name: &str) -> String {
    let pair = [(name, "")];
    serde_urlencoded::to_string(&pair[..])
        .map(|pair| pair.trim_end_matches('=').to_string())
        .unwrap_or_default()
}

pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

fn append_cookie(headers: &mut Vec<(String, String)>, cookie: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case("cookie")) {
        Some((_, existing)) if !existing.is_empty() => {
            existing.push_str("; ");
            existing.push_str(&cookie);
        }
        Some((_, existing)) => *existing = cookie,
        None => headers.push(("Cookie".to_string(), cookie)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cookie::Cookie;

    fn params(value: Value) -> BTreeMap<String, Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn existing_query_parameter_is_not_clobbered() {
        let merged = merge_query(
            "http://example.com/search?q=foo",
            &params(json!({"q": "bar", "page": "2"})),
        )
        .unwrap();
        assert_eq!(merged, "http://example.com/search?q=foo&page=2");
    }

    #[test]
    fn uri_without_query_gets_question_mark() {
        let merged = merge_query("http://example.com/api", &params(json!({"k1": "v1", "k2": "v2"}))).unwrap();
        assert_eq!(merged, "http://example.com/api?k1=v1&k2=v2");
    }

    #[test]
    fn empty_query_is_appended_directly() {
        let merged = merge_query("http://example.com/api?", &params(json!({"a": 1}))).unwrap();
        assert_eq!(merged, "http://example.com/api?a=1");
    }

    #[test]
    fn trailing_ampersand_is_not_doubled() {
        let merged = merge_query("http://example.com/api?x=1&", &params(json!({"a": 1}))).unwrap();
        assert_eq!(merged, "http://example.com/api?x=1&a=1");
    }

    #[test]
    fn all_present_leaves_uri_unchanged() {
        let uri = "http://example.com/api?a=9&b=8";
        assert_eq!(merge_query(uri, &params(json!({"a": 1, "b": 2}))).unwrap(), uri);
    }

    #[test]
    fn name_occurring_as_substring_counts_as_present() {
        let uri = "http://example.com/?xq=1";
        assert_eq!(merge_query(uri, &params(json!({"q": "2"}))).unwrap(), uri);
    }

    #[test]
    fn bare_key_without_equals_is_not_present() {
        let merged = merge_query("http://example.com/?q&x=1", &params(json!({"q": "2"}))).unwrap();
        assert_eq!(merged, "http://example.com/?q&x=1&q=2");
    }

    #[test]
    fn encoded_name_in_query_counts_as_present() {
        let uri = "http://example.com/?a+b=1";
        assert_eq!(merge_query(uri, &params(json!({"a b": "2"}))).unwrap(), uri);
    }

    #[test]
    fn fragment_stays_last() {
        let merged = merge_query("http://example.com/p#top", &params(json!({"a": "b"}))).unwrap();
        assert_eq!(merged, "http://example.com/p?a=b#top");
    }

    #[test]
    fn appended_values_are_percent_encoded() {
        let merged = merge_query("http://example.com/", &params(json!({"q": "a b&c"}))).unwrap();
        assert_eq!(merged, "http://example.com/?q=a+b%26c");
    }

    #[test]
    fn json_body_matches_parameters() {
        let p = params(json!({"a": 1, "b": 2}));
        let body = encode_body(&p, ContentType::Json).unwrap().unwrap();
        assert_eq!(String::from_utf8(body.clone()).unwrap(), r#"{"a":1,"b":2}"#);
        let back: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(back, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn form_body_round_trips_as_strings() {
        let p = params(json!({"name": "Zoë & co", "n": 3, "flag": true, "none": null}));
        let body = encode_body(&p, ContentType::FormUrlEncoded).unwrap().unwrap();
        let back: BTreeMap<String, String> = serde_urlencoded::from_bytes(&body).unwrap();
        let expected: BTreeMap<String, String> = p
            .iter()
            .map(|(k, v)| (k.clone(), value_to_string(v)))
            .collect();
        assert_eq!(back, expected);
        assert_eq!(back["none"], "null");
    }

    #[test]
    fn empty_parameters_produce_no_body() {
        assert!(encode_body(&BTreeMap::new(), ContentType::Json).unwrap().is_none());
    }

    #[test]
    fn get_request_puts_parameters_in_query() {
        let opts = Options::builder()
            .uri("http://example.com/search?q=foo")
            .parameter("q", "bar")
            .parameter("page", "2")
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Get, "localhost").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.uri, "http://example.com/search?q=foo&page=2");
        assert!(req.body.is_none());
        assert!(req.header("content-type").is_none());
    }

    #[test]
    fn post_request_puts_parameters_in_json_body() {
        let opts = Options::builder()
            .uri("http://example.com/api")
            .parameter("a", 1)
            .parameter("b", 2)
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Post, "localhost").unwrap();
        assert_eq!(req.uri, "http://example.com/api");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.body.as_deref(), Some(br#"{"a":1,"b":2}"#.as_slice()));
    }

    #[test]
    fn post_form_overrides_caller_content_type() {
        let opts = Options::builder()
            .uri("http://example.com/api")
            .header("content-type", "text/plain")
            .content_type(ContentType::FormUrlEncoded)
            .parameter("a", "x y")
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Post, "localhost").unwrap();
        assert_eq!(
            req.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(req.headers.len(), 1);
        assert_eq!(req.body.as_deref(), Some(b"a=x+y".as_slice()));
    }

    #[test]
    fn post_without_parameters_keeps_caller_headers_only() {
        let opts = Options::builder()
            .uri("http://example.com/api")
            .header("X-Trace", "1")
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Post, "localhost").unwrap();
        assert!(req.body.is_none());
        assert_eq!(req.headers, vec![("X-Trace".to_string(), "1".to_string())]);
    }

    #[test]
    fn cookies_for_matching_domain_become_header() {
        let opts = Options::builder()
            .uri("http://www.example.com/app")
            .cookie(Cookie::new("sid", "abc"))
            .cookie(Cookie::new("other", "x").with_domain("other.org"))
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Get, ".example.com").unwrap();
        assert_eq!(req.header("cookie"), Some("sid=abc"));
    }

    #[test]
    fn cookies_extend_an_explicit_cookie_header() {
        let opts = Options::builder()
            .uri("http://localhost/")
            .header("Cookie", "manual=1")
            .cookie(Cookie::new("sid", "abc"))
            .build()
            .unwrap();
        let req = build_request(&opts, HttpMethod::Get, "localhost").unwrap();
        assert_eq!(req.header("cookie"), Some("manual=1; sid=abc"));
    }

    #[test]
    fn relative_uri_is_rejected_before_io() {
        let opts = Options::builder().uri("/just/a/path").build().unwrap();
        let err = build_request(&opts, HttpMethod::Get, "localhost").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidUri(_)));
        assert!(err.is_argument());
    }
}
