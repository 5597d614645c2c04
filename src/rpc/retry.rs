//! Retry classification and the logging context used by the transport's
//! retry loop, so every attempt reports breaker state, backoff, and
//! exhaustion the same way.

use crate::rpc::circuit_breaker::CircuitState;
use crate::rpc::error::TransportError;
use std::time::Duration;

/// What the retry loop does with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RetryDisposition {
    Retry,
    Abort,
}

impl RetryDisposition {
    /// Timeouts and connection failures are retried. A timed-out request may
    /// already have been executed by the node, so non-idempotent calls such as
    /// `eth_sendRawTransaction` can be delivered more than once. A status
    /// answer or a size violation repeats identically and is not retried.
    pub(crate) fn classify(err: &TransportError) -> Self {
        match err {
            TransportError::Timeout | TransportError::Connection(_) => RetryDisposition::Retry,
            TransportError::CircuitOpen
            | TransportError::RequestTooLarge { .. }
            | TransportError::ResponseTooLarge { .. }
            | TransportError::Status { .. }
            | TransportError::InvalidEndpoint(_) => RetryDisposition::Abort,
        }
    }
}

/// Log lines for one kind of transport operation.
#[derive(Clone, Copy)]
pub(crate) struct RetryMessages {
    pub(crate) permit: &'static str,
    pub(crate) circuit_open: &'static str,
    pub(crate) timeout: &'static str,
    pub(crate) retry: &'static str,
    pub(crate) aborted: &'static str,
    pub(crate) exhausted: &'static str,
}

#[derive(Clone, Copy)]
pub(crate) struct RetryContext<'a> {
    endpoint: &'a str,
    body_bytes: usize,
    messages: &'a RetryMessages,
}

impl<'a> RetryContext<'a> {
    pub(crate) fn new(messages: &'a RetryMessages, endpoint: &'a str, body_bytes: usize) -> Self {
        Self {
            endpoint,
            body_bytes,
            messages,
        }
    }

    pub(crate) fn log_permit(&self, state: CircuitState) {
        tracing::trace!(
            endpoint = self.endpoint,
            breaker_state = ?state,
            "{}",
            self.messages.permit
        );
    }

    pub(crate) fn log_circuit_open(&self) {
        tracing::warn!(endpoint = self.endpoint, "{}", self.messages.circuit_open);
    }

    pub(crate) fn log_timeout(&self, attempt: usize, backoff: Duration) {
        tracing::warn!(
            endpoint = self.endpoint,
            attempt,
            backoff_ms = duration_to_millis(backoff),
            "{}",
            self.messages.timeout
        );
    }

    pub(crate) fn log_retry(&self, attempt: usize, backoff: Duration, err: &TransportError) {
        tracing::warn!(
            endpoint = self.endpoint,
            attempt,
            backoff_ms = duration_to_millis(backoff),
            error = %err,
            "{}",
            self.messages.retry
        );
    }

    pub(crate) fn log_aborted(&self, attempt: usize, err: &TransportError) {
        tracing::warn!(
            endpoint = self.endpoint,
            attempt,
            body_bytes = self.body_bytes,
            error = %err,
            "{}",
            self.messages.aborted
        );
    }

    pub(crate) fn log_exhausted(&self, attempt: usize, err: &TransportError) {
        tracing::error!(
            endpoint = self.endpoint,
            attempt,
            error = %err,
            "{}",
            self.messages.exhausted
        );
    }
}

fn duration_to_millis(backoff: Duration) -> u64 {
    backoff.as_millis().min(u128::from(u64::MAX)) as u64
}

pub(crate) const HTTP_POST_RETRY: RetryMessages = RetryMessages {
    permit: "circuit breaker permit acquired",
    circuit_open: "transport circuit breaker open; rejecting request",
    timeout: "json-rpc request timed out; will retry",
    retry: "json-rpc request failed; retrying",
    aborted: "json-rpc request failed with a non-retryable error",
    exhausted: "json-rpc request exhausted retries",
};
