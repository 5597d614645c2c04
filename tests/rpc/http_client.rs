use std::time::{Duration, Instant};

use crate::support::{
    helpers::{client_for, fast_config, init_tracing},
    mock_node::{Fault, MockNode, MockRpcServer, CHAIN_ID, CLIENT_VERSION, SHUTDOWN_GRACE},
};
use anyhow::Result;
use ethrpc::{
    BlockParameter, CircuitState, EthereumAddress, Quantity, RpcClient, RpcError, SyncStatus,
    TransportError,
};
use tokio::sync::mpsc;

const HOLDER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn typed_calls_round_trip_over_http() -> Result<()> {
    init_tracing();
    let node = MockNode::new(4_000_000);
    node.set_balance(HOLDER, "0xde0b6b3a7640000");
    node.add_account(HOLDER);
    let server = MockRpcServer::start(node.clone()).await?;

    let config = fast_config(server.url()).build()?;
    let (client, transport) = client_for(&config)?;
    let holder: EthereumAddress = HOLDER.parse()?;

    assert_eq!(client.client_version().await?, CLIENT_VERSION);
    assert_eq!(client.net_version().await?, "1337");
    assert_eq!(client.chain_id().await?.encode(), CHAIN_ID);
    assert_eq!(client.block_number().await?, Quantity::from(4_000_000u64));
    assert_eq!(client.syncing().await?, SyncStatus::NotSyncing);
    assert_eq!(client.accounts().await?, vec![holder]);

    let balance = client.get_balance(&holder, &BlockParameter::Latest).await?;
    assert_eq!(balance.to_u64(), Some(1_000_000_000_000_000_000));

    let metrics = transport.metrics();
    assert_eq!(metrics.total_requests, 7);
    assert_eq!(metrics.total_errors, 0);
    assert_eq!(metrics.breaker_state, CircuitState::Closed);
    assert_eq!(node.requests(), 7);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn basic_auth_header_is_sent() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    let server = MockRpcServer::start(node.clone()).await?;

    let config = fast_config(server.url()).credentials("user", "pass").build()?;
    let client = RpcClient::from_config(&config)?;
    client.block_number().await?;

    assert_eq!(
        node.last_authorization().as_deref(),
        Some("Basic dXNlcjpwYXNz")
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn node_errors_surface_as_rpc_failures() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    let server = MockRpcServer::start(node.clone()).await?;
    let (client, _) = client_for(&fast_config(server.url()).build()?)?;

    let err = client.mining().await.unwrap_err();
    match err {
        RpcError::Rpc { code, message, .. } => {
            assert_eq!(code, -32601);
            assert!(message.contains("eth_mining"), "{message}");
        }
        other => panic!("expected rpc failure, got {other:?}"),
    }

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_status_errors_are_not_retried() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    node.set_fault(Fault::Status(503));
    let server = MockRpcServer::start(node.clone()).await?;
    let (client, transport) = client_for(&fast_config(server.url()).build()?)?;

    let err = client.block_number().await.unwrap_err();
    match err {
        RpcError::Transport(TransportError::Status { code, body }) => {
            assert_eq!(code, 503);
            assert_eq!(body, "node unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert_eq!(node.requests(), 1);
    assert_eq!(transport.metrics().total_retries, 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timed_out_attempt_is_retried() -> Result<()> {
    init_tracing();
    let node = MockNode::new(77);
    node.set_fault(Fault::StallFirst(1, Duration::from_secs(2)));
    let server = MockRpcServer::start(node.clone()).await?;
    let (client, transport) = client_for(&fast_config(server.url()).build()?)?;

    assert_eq!(client.block_number().await?.to_u64(), Some(77));

    let metrics = transport.metrics();
    assert_eq!(metrics.total_timeouts, 1);
    assert_eq!(metrics.total_retries, 1);
    assert_eq!(metrics.total_requests, 2);
    assert_eq!(node.requests(), 2);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeouts_exhaust_attempts() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    node.set_fault(Fault::StallFirst(usize::MAX, Duration::from_secs(2)));
    let server = MockRpcServer::start(node.clone()).await?;
    let config = fast_config(server.url()).max_attempts(2).build()?;
    let (client, transport) = client_for(&config)?;

    let err = client.block_number().await.unwrap_err();
    assert!(
        matches!(err, RpcError::Transport(TransportError::Timeout)),
        "{err:?}"
    );
    assert_eq!(transport.metrics().total_timeouts, 2);

    let started = Instant::now();
    server.shutdown().await;
    assert!(
        started.elapsed() < SHUTDOWN_GRACE + Duration::from_millis(500),
        "shutdown took {:?}",
        started.elapsed()
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn breaker_opens_after_repeated_failures() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    node.set_fault(Fault::Status(500));
    let server = MockRpcServer::start(node.clone()).await?;
    let config = fast_config(server.url())
        .breaker_failure_threshold(2)
        .breaker_cooldown(Duration::from_secs(60))
        .build()?;
    let (client, transport) = client_for(&config)?;

    for _ in 0..2 {
        let err = client.block_number().await.unwrap_err();
        assert!(
            matches!(err, RpcError::Transport(TransportError::Status { code: 500, .. })),
            "{err:?}"
        );
    }

    let err = client.block_number().await.unwrap_err();
    assert!(
        matches!(err, RpcError::Transport(TransportError::CircuitOpen)),
        "{err:?}"
    );
    assert_eq!(node.requests(), 2);

    let metrics = transport.metrics();
    assert_eq!(metrics.breaker_state, CircuitState::Open);
    assert_eq!(metrics.total_rejected, 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn oversized_response_is_rejected() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    node.set_fault(Fault::Oversized(4_096));
    let server = MockRpcServer::start(node.clone()).await?;
    let config = fast_config(server.url())
        .max_response_body_bytes(1_024)
        .build()?;
    let (client, _) = client_for(&config)?;

    let err = client.client_version().await.unwrap_err();
    assert!(
        matches!(
            err,
            RpcError::Transport(TransportError::ResponseTooLarge { limit: 1_024 })
        ),
        "{err:?}"
    );
    assert_eq!(node.requests(), 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn foreign_ids_and_garbage_are_distinct_failures() -> Result<()> {
    init_tracing();
    let node = MockNode::new(1);
    let server = MockRpcServer::start(node.clone()).await?;
    let (client, _) = client_for(&fast_config(server.url()).build()?)?;

    node.set_fault(Fault::WrongId);
    let err = client.chain_id().await.unwrap_err();
    match err {
        RpcError::CorrelationMismatch { expected, actual } => {
            assert_eq!(actual, expected + 1_000);
        }
        other => panic!("expected correlation mismatch, got {other:?}"),
    }

    node.set_fault(Fault::Garbage);
    let err = client.chain_id().await.unwrap_err();
    assert!(matches!(err, RpcError::MalformedResponse(_)), "{err:?}");

    server.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_spawned_calls_each_complete_once() -> Result<()> {
    init_tracing();
    let node = MockNode::new(42);
    let server = MockRpcServer::start(node.clone()).await?;
    let (client, _) = client_for(&fast_config(server.url()).build()?)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handles = Vec::new();
    for index in 0..16usize {
        let tx = tx.clone();
        handles.push(client.spawn_call(
            "eth_blockNumber",
            Vec::new(),
            serde_json::from_value::<Quantity>,
            move |outcome| {
                let _ = tx.send((index, outcome));
            },
        ));
    }
    drop(tx);

    for handle in handles {
        handle.await?;
    }

    let mut seen = Vec::new();
    while let Some((index, outcome)) = rx.recv().await {
        assert_eq!(outcome?.to_u64(), Some(42));
        seen.push(index);
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..16).collect::<Vec<_>>());
    assert_eq!(node.requests(), 16);

    server.shutdown().await;
    Ok(())
}
