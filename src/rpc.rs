//! JSON-RPC plumbing: request/response codec, the async client and its typed
//! methods, and the HTTP transport with its retry, circuit breaker, metrics,
//! and authentication helpers.

pub mod auth;
pub mod circuit_breaker;
pub mod client;
pub mod codec;
pub mod error;
pub mod methods;
pub mod metrics;
pub mod options;
pub mod retry;
pub mod transport;
pub mod types;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerSnapshot, CircuitOpen, CircuitState};
pub use client::RpcClient;
pub use codec::{decode_response, to_param, RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use error::{RpcError, TransportError};
pub use metrics::TransportMetricsSnapshot;
pub use options::TransportOptions;
pub use transport::{HttpTransport, Transport};
pub use types::{SyncProgress, SyncStatus};
