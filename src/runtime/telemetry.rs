use crate::rpc::transport::HttpTransport;
use crate::runtime::config::ClientConfig;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Default interval used by the metrics reporter task.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(5);

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Installs a basic tracing subscriber (if one is not already active).
///
/// The subscriber honours `RUST_LOG` if it is present, otherwise it falls back to `info`.
/// Calling this function multiple times is harmless.
pub fn init_tracing() {
    if TRACING_INIT.get().is_some() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();

    let _ = TRACING_INIT.set(());
}

/// Spawns a background task that periodically logs the transport's request
/// counters, error rate, latency, and breaker state until `shutdown` fires.
pub fn spawn_metrics_reporter(
    transport: HttpTransport,
    shutdown: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_requests = 0u64;

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(target: "ethrpc::metrics", "metrics reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let snapshot = transport.metrics();
                    let requests_delta = snapshot.total_requests.saturating_sub(last_requests);

                    tracing::info!(
                        target: "ethrpc::metrics",
                        endpoint = transport.endpoint(),
                        requests = snapshot.total_requests,
                        requests_delta,
                        errors = snapshot.total_errors,
                        timeouts = snapshot.total_timeouts,
                        retries = snapshot.total_retries,
                        rejected = snapshot.total_rejected,
                        error_rate = format!("{:.3}", snapshot.error_rate),
                        avg_latency_ms = format!("{:.2}", snapshot.average_latency_ms),
                        breaker_state = ?snapshot.breaker_state,
                        "transport metrics snapshot"
                    );

                    last_requests = snapshot.total_requests;
                }
            }
        }
    })
}

/// [`spawn_metrics_reporter`] ticking at the config's `metrics_interval`.
pub fn spawn_configured_metrics_reporter(
    config: &ClientConfig,
    transport: HttpTransport,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    spawn_metrics_reporter(transport, shutdown, config.metrics_interval())
}
