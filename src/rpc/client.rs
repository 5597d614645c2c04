//! The asynchronous JSON-RPC client: allocates request ids, hands encoded
//! requests to a [`Transport`], correlates responses, and turns the raw result
//! into a typed value through a caller-supplied decoder.

use crate::rpc::codec::{decode_response, RpcRequest};
use crate::rpc::error::RpcError;
use crate::rpc::transport::{HttpTransport, Transport};
use crate::runtime::config::ClientConfig;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

#[derive(Clone)]
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    next_id: Arc<AtomicU64>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Builds an [`HttpTransport`] from `config` and wraps it.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Ids are unique for the lifetime of the client and its clones, even
    /// when a call is abandoned before its response arrives.
    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Performs one call and decodes its raw result with `decode`.
    ///
    /// A decoder failure becomes [`RpcError::Decode`] tagged with `method`;
    /// it is never folded into an RPC error or a missing value.
    pub async fn call<T, E, D>(
        &self,
        method: &str,
        params: Vec<Value>,
        decode: D,
    ) -> Result<T, RpcError>
    where
        D: FnOnce(Value) -> Result<T, E>,
        E: Display,
    {
        let id = self.allocate_id();
        let request = RpcRequest::new(id, method, params);
        let body = request.encode()?;

        tracing::debug!(method, id, request_bytes = body.len(), "sending json-rpc request");

        let raw = self.transport.send(body).await.map_err(|err| {
            tracing::warn!(method, id, error = %err, "json-rpc transport failed");
            RpcError::from(err)
        })?;

        let result = decode_response(&raw, id)
            .and_then(|response| response.into_result())
            .map_err(|err| {
                tracing::debug!(method, id, error = %err, "json-rpc call failed");
                err
            })?;

        decode(result).map_err(|err| {
            tracing::debug!(method, id, error = %err, "json-rpc result did not decode");
            RpcError::Decode {
                method: method.to_string(),
                reason: err.to_string(),
            }
        })
    }

    /// [`call`](Self::call) with a serde decoder for the result type.
    pub async fn call_typed<T>(&self, method: &str, params: Vec<Value>) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        self.call(method, params, serde_json::from_value::<T>).await
    }

    /// Runs the call on the tokio runtime and hands the outcome to
    /// `completion` exactly once, from the spawned task.
    pub fn spawn_call<T, E, D, C>(
        &self,
        method: impl Into<String>,
        params: Vec<Value>,
        decode: D,
        completion: C,
    ) -> JoinHandle<()>
    where
        T: Send + 'static,
        E: Display + Send + 'static,
        D: FnOnce(Value) -> Result<T, E> + Send + 'static,
        C: FnOnce(Result<T, RpcError>) + Send + 'static,
    {
        let client = self.clone();
        let method = method.into();
        tokio::spawn(async move {
            let outcome = client.call(&method, params, decode).await;
            completion(outcome);
        })
    }
}
