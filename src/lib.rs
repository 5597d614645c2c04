pub mod primitives;
pub mod rpc;
pub mod runtime;

pub use primitives::{
    derive_create, derive_create2, derive_create2_from_init_code, keccak256, BlockParameter, Data,
    EncodingError, EthereumAddress, Hash32, Quantity,
};
pub use rpc::{
    CircuitBreaker, CircuitState, HttpTransport, RpcClient, RpcError, SyncStatus, Transport,
    TransportError, TransportMetricsSnapshot, TransportOptions,
};
pub use runtime::config::{ClientConfig, ClientConfigBuilder, ClientConfigParams};
pub use runtime::telemetry::{
    init_tracing, spawn_configured_metrics_reporter, spawn_metrics_reporter,
};
