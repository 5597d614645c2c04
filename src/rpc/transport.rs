//! The byte-level collaborator behind [`RpcClient`](crate::rpc::RpcClient)
//! and its default plain-HTTP implementation.
//!
//! The RPC core only ever hands a serialized request to [`Transport::send`]
//! and gets raw response bytes back. Everything about getting those bytes
//! across the wire (timeouts, retries, breaker gating, size limits) lives in
//! the transport.

use crate::rpc::auth::basic_auth_header;
use crate::rpc::circuit_breaker::{CircuitBreaker, CircuitOpen};
use crate::rpc::error::TransportError;
use crate::rpc::metrics::{TransportMetrics, TransportMetricsSnapshot};
use crate::rpc::options::TransportOptions;
use crate::rpc::retry::{RetryContext, RetryDisposition, HTTP_POST_RETRY};
use crate::runtime::config::ClientConfig;
use anyhow::{anyhow, bail, Result};
use bytes::{Bytes, BytesMut};
use futures::future::BoxFuture;
use hyper::body::HttpBody;
use hyper::client::HttpConnector;
use hyper::header::{self, HeaderValue};
use hyper::{Body, Client, Method, Request, Uri};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Instant};

/// Upper bound on how much of an error status body is kept for diagnostics.
const STATUS_BODY_PREVIEW_BYTES: usize = 512;

/// Delivers one serialized JSON-RPC request and yields the raw response body.
pub trait Transport: Send + Sync {
    fn send(&self, body: Bytes) -> BoxFuture<'_, Result<Bytes, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, body: Bytes) -> BoxFuture<'_, Result<Bytes, TransportError>> {
        (**self).send(body)
    }
}

#[derive(Debug)]
struct HttpTransportInner {
    endpoint: String,
    uri: Uri,
    auth: Option<HeaderValue>,
    client: Client<HttpConnector>,
    options: TransportOptions,
    metrics: TransportMetrics,
    breaker: Arc<CircuitBreaker>,
}

/// JSON-RPC over HTTP/1.1 POST. Cheap to clone; clones share the connection
/// pool, breaker, and counters.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

impl Transport for HttpTransport {
    fn send(&self, body: Bytes) -> BoxFuture<'_, Result<Bytes, TransportError>> {
        Box::pin(self.send_with_retry(body))
    }
}

impl HttpTransport {
    pub fn new(
        url: impl Into<String>,
        credentials: Option<(&str, &str)>,
        options: TransportOptions,
    ) -> Result<Self> {
        let breaker = Arc::new(CircuitBreaker::new(
            options.breaker_failure_threshold,
            options.breaker_cooldown,
        ));
        Self::with_breaker(url, credentials, options, breaker)
    }

    /// Like [`HttpTransport::new`] but shares an existing breaker, so several
    /// transports pointed at the same node trip together.
    pub fn with_breaker(
        url: impl Into<String>,
        credentials: Option<(&str, &str)>,
        options: TransportOptions,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self> {
        options.validate()?;

        let endpoint = url.into().trim().to_owned();
        let uri = parse_endpoint(&endpoint)?;
        let auth = credentials
            .map(|(user, password)| basic_auth_header(user, password))
            .transpose()?;

        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        connector.set_connect_timeout(Some(options.request_timeout));
        let client = Client::builder().build(connector);

        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                endpoint,
                uri,
                auth,
                client,
                options,
                metrics: TransportMetrics::default(),
                breaker,
            }),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.rpc_url().to_owned(),
            config.credentials(),
            config.transport_options(),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn options(&self) -> &TransportOptions {
        &self.inner.options
    }

    pub fn metrics(&self) -> TransportMetricsSnapshot {
        self.inner
            .metrics
            .snapshot(self.inner.breaker.snapshot().state)
    }

    /// Breaker-gated retry loop. Only timeouts and connection failures are
    /// retried; every granted permit is settled exactly once.
    async fn send_with_retry(&self, body: Bytes) -> Result<Bytes, TransportError> {
        let inner = &*self.inner;
        let limit = inner.options.max_request_body_bytes;
        if body.len() > limit {
            let err = TransportError::RequestTooLarge {
                size: body.len(),
                limit,
            };
            tracing::warn!(endpoint = %inner.endpoint, error = %err, "refusing oversized request");
            return Err(err);
        }

        let context = RetryContext::new(&HTTP_POST_RETRY, &inner.endpoint, body.len());
        let mut attempt = 0;

        loop {
            // Held across the await so a dropped call future gives the permit back.
            let permit = match inner.breaker.acquire() {
                Ok(permit) => permit,
                Err(CircuitOpen) => {
                    context.log_circuit_open();
                    inner.metrics.record_rejected();
                    return Err(TransportError::CircuitOpen);
                }
            };
            context.log_permit(permit.state());

            attempt += 1;
            let start = Instant::now();

            match self.send_once(body.clone()).await {
                Ok(response) => {
                    inner.metrics.record_success(start.elapsed());
                    permit.success();
                    tracing::debug!(
                        attempt,
                        response_bytes = response.len(),
                        "json-rpc request completed"
                    );
                    return Ok(response);
                }
                Err(err) => {
                    let elapsed = start.elapsed();
                    if err == TransportError::Timeout {
                        inner.metrics.record_timeout(elapsed);
                    } else {
                        inner.metrics.record_failure(elapsed);
                    }
                    permit.failure();

                    if RetryDisposition::classify(&err) == RetryDisposition::Abort {
                        context.log_aborted(attempt, &err);
                        return Err(err);
                    }
                    if attempt >= inner.options.max_attempts {
                        context.log_exhausted(attempt, &err);
                        return Err(err);
                    }

                    let backoff = inner.options.backoff_delay(attempt);
                    if err == TransportError::Timeout {
                        context.log_timeout(attempt, backoff);
                    } else {
                        context.log_retry(attempt, backoff, &err);
                    }
                    inner.metrics.record_retry();
                    sleep(backoff).await;
                }
            }
        }
    }

    async fn send_once(&self, body: Bytes) -> Result<Bytes, TransportError> {
        let inner = &*self.inner;

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(inner.uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");
        if let Some(auth) = &inner.auth {
            builder = builder.header(header::AUTHORIZATION, auth.clone());
        }
        let request = builder
            .body(Body::from(body))
            .map_err(|err| TransportError::InvalidEndpoint(err.to_string()))?;

        let exchange = async {
            let response = inner
                .client
                .request(request)
                .await
                .map_err(|err| TransportError::Connection(err.to_string()))?;

            let status = response.status();
            let payload =
                read_limited(response.into_body(), inner.options.max_response_body_bytes).await?;

            if !status.is_success() {
                let preview = &payload[..payload.len().min(STATUS_BODY_PREVIEW_BYTES)];
                return Err(TransportError::Status {
                    code: status.as_u16(),
                    body: String::from_utf8_lossy(preview).into_owned(),
                });
            }

            Ok(payload)
        };

        timeout(inner.options.request_timeout, exchange)
            .await
            .map_err(|_| TransportError::Timeout)?
    }
}

async fn read_limited(mut body: Body, limit: usize) -> Result<Bytes, TransportError> {
    if body.size_hint().lower() > limit as u64 {
        return Err(TransportError::ResponseTooLarge { limit });
    }

    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(|err| TransportError::Connection(err.to_string()))?;
        if buffer.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

fn parse_endpoint(endpoint: &str) -> Result<Uri> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|err| anyhow!(TransportError::InvalidEndpoint(format!("{endpoint}: {err}"))))?;

    match uri.scheme_str() {
        Some("http") => {}
        Some(other) => bail!(TransportError::InvalidEndpoint(format!(
            "unsupported scheme {other}; only http:// endpoints are supported"
        ))),
        None => bail!(TransportError::InvalidEndpoint(format!(
            "{endpoint} has no scheme"
        ))),
    }
    if uri.host().is_none() {
        bail!(TransportError::InvalidEndpoint(format!(
            "{endpoint} has no host"
        )));
    }

    Ok(uri)
}
