//! Pooled network transport backed by `ureq`.
//!
//! One `UreqTransport` owns one `ureq::Agent`, i.e. one connection pool with
//! fixed timeouts. Construct it once at start-up and share it; clones share
//! the same pool.

use ureq::http;
use ureq::Agent;

use crate::config::PoolConfig;
use crate::error::ProxyError;
use crate::http::{HttpRequest, HttpResponse, Transport};

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new(pool: &PoolConfig) -> Result<Self, ProxyError> {
        let proxy = pool
            .proxy
            .as_deref()
            .map(ureq::Proxy::new)
            .transpose()
            .map_err(|e| ProxyError::Config(format!("invalid proxy: {e}")))?;

        let agent = Agent::config_builder()
            // Statuses are interpreted by `HttpProxy`, not by ureq.
            .http_status_as_error(false)
            .timeout_resolve(Some(pool.connection_request_timeout))
            .timeout_connect(Some(pool.connect_timeout))
            .timeout_recv_response(Some(pool.socket_timeout))
            // ureq's body timeout is a total budget, not a per-read gap, so
            // slow but live bodies are read without a deadline.
            .timeout_recv_body(None)
            .max_idle_connections(pool.max_total)
            .max_idle_connections_per_host(pool.max_per_route)
            .max_idle_age(pool.max_idle_age)
            .proxy(proxy)
            .build()
            .new_agent();

        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ProxyError> {
        tracing::debug!(method = %request.method, uri = %request.uri, "sending request");

        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.uri.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match request.body {
            Some(body) => self.agent.run(builder.body(body).map_err(invalid_request)?)?,
            None => self.agent.run(builder.body(()).map_err(invalid_request)?)?,
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.into_body().into_reader();

        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(body),
        })
    }
}

fn invalid_request(e: http::Error) -> ProxyError {
    ProxyError::InvalidRequest(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_builds() {
        assert!(UreqTransport::new(&PoolConfig::default()).is_ok());
    }
}
