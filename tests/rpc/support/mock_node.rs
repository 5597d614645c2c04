use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use hyper::service::{make_service_fn, service_fn};
use hyper::{body, Body, Method, Request, Response, Server, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

pub const CHAIN_ID: &str = "0x539";
pub const CLIENT_VERSION: &str = "MockNode/v0.1.0";

/// Graceful shutdown waits on open keep-alive connections, which the client
/// pool holds for up to 90 s. Past this grace the server task is aborted.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Misbehaviour the node applies to incoming requests.
#[derive(Clone, Debug)]
pub enum Fault {
    None,
    /// Answer every request with this HTTP status.
    Status(u16),
    /// Sleep before answering the first `n` requests.
    StallFirst(usize, Duration),
    /// Echo a different id than the one requested.
    WrongId,
    /// Answer with a body that is not JSON.
    Garbage,
    /// Answer with a result string of this many bytes.
    Oversized(usize),
}

/// In-memory Ethereum node state served over JSON-RPC.
#[derive(Clone)]
pub struct MockNode {
    inner: Arc<MockNodeInner>,
}

struct MockNodeInner {
    block_number: AtomicU64,
    balances: RwLock<HashMap<String, String>>,
    accounts: RwLock<Vec<String>>,
    fault: Mutex<Fault>,
    requests: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
}

impl MockNode {
    pub fn new(block_number: u64) -> Self {
        Self {
            inner: Arc::new(MockNodeInner {
                block_number: AtomicU64::new(block_number),
                balances: RwLock::new(HashMap::new()),
                accounts: RwLock::new(Vec::new()),
                fault: Mutex::new(Fault::None),
                requests: AtomicUsize::new(0),
                last_authorization: Mutex::new(None),
            }),
        }
    }

    pub fn set_balance(&self, address: &str, wei: &str) {
        self.inner
            .balances
            .write()
            .expect("mock node poisoned")
            .insert(address.to_ascii_lowercase(), wei.to_string());
    }

    pub fn add_account(&self, address: &str) {
        self.inner
            .accounts
            .write()
            .expect("mock node poisoned")
            .push(address.to_ascii_lowercase());
    }

    pub fn set_fault(&self, fault: Fault) {
        *self.inner.fault.lock().expect("mock node poisoned") = fault;
    }

    /// Number of HTTP requests that reached the node.
    pub fn requests(&self) -> usize {
        self.inner.requests.load(Ordering::SeqCst)
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.inner
            .last_authorization
            .lock()
            .expect("mock node poisoned")
            .clone()
    }

    fn fault(&self) -> Fault {
        self.inner.fault.lock().expect("mock node poisoned").clone()
    }

    fn balance_of(&self, address: &str) -> String {
        self.inner
            .balances
            .read()
            .expect("mock node poisoned")
            .get(&address.to_ascii_lowercase())
            .cloned()
            .unwrap_or_else(|| "0x0".to_string())
    }

    fn handle_call(&self, call: Value) -> Value {
        let id = call.get("id").cloned().unwrap_or(Value::Null);
        let method = call
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = call
            .get("params")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        match method.as_str() {
            "web3_clientVersion" => success(id, json!(CLIENT_VERSION)),
            "net_version" => success(id, json!("1337")),
            "net_listening" => success(id, json!(true)),
            "eth_chainId" => success(id, json!(CHAIN_ID)),
            "eth_syncing" => success(id, json!(false)),
            "eth_blockNumber" => {
                let number = self.inner.block_number.load(Ordering::SeqCst);
                success(id, json!(format!("{number:#x}")))
            }
            "eth_accounts" => {
                let accounts = self.inner.accounts.read().expect("mock node poisoned").clone();
                success(id, json!(accounts))
            }
            "eth_getBalance" => match params.first().and_then(Value::as_str) {
                Some(address) if params.len() == 2 => success(id, json!(self.balance_of(address))),
                _ => error(id, -32602, "invalid params"),
            },
            _ => error(id, -32601, format!("the method {method} does not exist")),
        }
    }
}

pub struct MockRpcServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl MockRpcServer {
    pub async fn start(node: MockNode) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind mock RPC listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read mock listener address")?;
        let std_listener = listener
            .into_std()
            .context("failed to convert mock listener")?;
        std_listener
            .set_nonblocking(true)
            .context("failed to set mock listener non-blocking")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let make_service = make_service_fn(move |_| {
            let node = node.clone();
            async move { Ok::<_, Infallible>(service_fn(move |req| serve_request(node.clone(), req))) }
        });

        let server = Server::from_tcp(std_listener)
            .context("failed to build mock HTTP server")?
            .serve(make_service);
        let graceful = server.with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });

        let handle = tokio::spawn(async move {
            if let Err(err) = graceful.await {
                eprintln!("mock RPC server stopped: {err}");
            }
        });

        Ok(Self {
            url: format!("http://{}", addr),
            shutdown: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(mut handle) = self.handle.take() {
            if timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
                handle.abort();
                let _ = handle.await;
            }
        }
    }
}

async fn serve_request(node: MockNode, req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let index = node.inner.requests.fetch_add(1, Ordering::SeqCst);
    let authorization = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    *node
        .inner
        .last_authorization
        .lock()
        .expect("mock node poisoned") = authorization;

    if req.method() != Method::POST {
        return Ok(plain(StatusCode::METHOD_NOT_ALLOWED, "Unsupported method"));
    }

    let bytes = match body::to_bytes(req.into_body()).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return Ok(plain(
                StatusCode::BAD_REQUEST,
                format!("failed to read body: {err}"),
            ))
        }
    };

    let payload: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(err) => {
            return Ok(plain(
                StatusCode::BAD_REQUEST,
                format!("invalid JSON payload: {err}"),
            ))
        }
    };

    let mut response_value = match node.fault() {
        Fault::Status(code) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Ok(plain(status, "node unavailable"));
        }
        Fault::Garbage => return Ok(json_body("this is not json".to_string())),
        Fault::Oversized(len) => success(payload["id"].clone(), json!("a".repeat(len))),
        Fault::StallFirst(count, delay) => {
            if index < count {
                sleep(delay).await;
            }
            node.handle_call(payload)
        }
        Fault::WrongId | Fault::None => node.handle_call(payload),
    };

    if matches!(node.fault(), Fault::WrongId) {
        let shifted = response_value["id"].as_u64().unwrap_or_default() + 1_000;
        response_value["id"] = json!(shifted);
    }

    Ok(json_body(response_value.to_string()))
}

fn plain(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;
    response
}

fn json_body(body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

fn success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id,
    })
}

fn error(id: Value, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message.into(),
        },
        "id": id,
    })
}
