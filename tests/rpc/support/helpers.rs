use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use ethrpc::{ClientConfig, ClientConfigBuilder, HttpTransport, RpcClient};
use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

static TRACING_SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING_SUBSCRIBER);
}

/// Config tuned for tests: short timeout and near-instant backoff.
pub fn fast_config(url: &str) -> ClientConfigBuilder {
    ClientConfig::builder()
        .rpc_url(url)
        .request_timeout(Duration::from_millis(250))
        .max_attempts(3)
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(5))
}

/// Builds a client over an HTTP transport and keeps a handle on the
/// transport so tests can inspect its metrics.
pub fn client_for(config: &ClientConfig) -> Result<(RpcClient, HttpTransport)> {
    let transport = HttpTransport::from_config(config)?;
    let client = RpcClient::new(Arc::new(transport.clone()));
    Ok((client, transport))
}
