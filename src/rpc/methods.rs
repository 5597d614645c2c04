//! Typed veneers over [`RpcClient::call`] for the standard `web3_`, `net_`
//! and `eth_` namespaces. Each method fixes the positional params and the
//! result type; nothing else happens here.

use crate::primitives::{BlockParameter, Data, EthereumAddress, Hash32, Quantity};
use crate::rpc::client::RpcClient;
use crate::rpc::codec::to_param;
use crate::rpc::error::RpcError;
use crate::rpc::types::SyncStatus;

impl RpcClient {
    pub async fn client_version(&self) -> Result<String, RpcError> {
        self.call_typed("web3_clientVersion", vec![]).await
    }

    /// Keccak-256 computed by the node.
    pub async fn sha3(&self, data: &Data) -> Result<Hash32, RpcError> {
        self.call_typed("web3_sha3", vec![to_param(data)?]).await
    }

    /// Network id as the decimal string the node reports.
    pub async fn net_version(&self) -> Result<String, RpcError> {
        self.call_typed("net_version", vec![]).await
    }

    pub async fn net_listening(&self) -> Result<bool, RpcError> {
        self.call_typed("net_listening", vec![]).await
    }

    pub async fn peer_count(&self) -> Result<Quantity, RpcError> {
        self.call_typed("net_peerCount", vec![]).await
    }

    pub async fn protocol_version(&self) -> Result<String, RpcError> {
        self.call_typed("eth_protocolVersion", vec![]).await
    }

    pub async fn syncing(&self) -> Result<SyncStatus, RpcError> {
        self.call_typed("eth_syncing", vec![]).await
    }

    pub async fn mining(&self) -> Result<bool, RpcError> {
        self.call_typed("eth_mining", vec![]).await
    }

    pub async fn hashrate(&self) -> Result<Quantity, RpcError> {
        self.call_typed("eth_hashrate", vec![]).await
    }

    /// Current gas price in wei.
    pub async fn gas_price(&self) -> Result<Quantity, RpcError> {
        self.call_typed("eth_gasPrice", vec![]).await
    }

    pub async fn accounts(&self) -> Result<Vec<EthereumAddress>, RpcError> {
        self.call_typed("eth_accounts", vec![]).await
    }

    pub async fn block_number(&self) -> Result<Quantity, RpcError> {
        self.call_typed("eth_blockNumber", vec![]).await
    }

    pub async fn chain_id(&self) -> Result<Quantity, RpcError> {
        self.call_typed("eth_chainId", vec![]).await
    }

    /// Balance in wei of `address` at `block`.
    pub async fn get_balance(
        &self,
        address: &EthereumAddress,
        block: &BlockParameter,
    ) -> Result<Quantity, RpcError> {
        self.call_typed("eth_getBalance", vec![to_param(address)?, to_param(block)?])
            .await
    }

    /// One 32-byte storage word of `address` at slot `position`.
    pub async fn get_storage_at(
        &self,
        address: &EthereumAddress,
        position: &Quantity,
        block: &BlockParameter,
    ) -> Result<Data, RpcError> {
        self.call_typed(
            "eth_getStorageAt",
            vec![to_param(address)?, to_param(position)?, to_param(block)?],
        )
        .await
    }

    /// Nonce of `address` at `block`.
    pub async fn get_transaction_count(
        &self,
        address: &EthereumAddress,
        block: &BlockParameter,
    ) -> Result<Quantity, RpcError> {
        self.call_typed(
            "eth_getTransactionCount",
            vec![to_param(address)?, to_param(block)?],
        )
        .await
    }

    pub async fn get_block_transaction_count_by_hash(
        &self,
        block_hash: &Hash32,
    ) -> Result<Quantity, RpcError> {
        self.call_typed(
            "eth_getBlockTransactionCountByHash",
            vec![to_param(block_hash)?],
        )
        .await
    }

    pub async fn get_block_transaction_count_by_number(
        &self,
        block: &BlockParameter,
    ) -> Result<Quantity, RpcError> {
        self.call_typed(
            "eth_getBlockTransactionCountByNumber",
            vec![to_param(block)?],
        )
        .await
    }

    pub async fn get_code(
        &self,
        address: &EthereumAddress,
        block: &BlockParameter,
    ) -> Result<Data, RpcError> {
        self.call_typed("eth_getCode", vec![to_param(address)?, to_param(block)?])
            .await
    }

    /// Submits an already signed, RLP-encoded transaction and returns its hash.
    ///
    /// The HTTP transport retries timeouts, so the same transaction may reach
    /// the node twice; a repeat is rejected by the node as already known.
    pub async fn send_raw_transaction(&self, signed: &Data) -> Result<Hash32, RpcError> {
        self.call_typed("eth_sendRawTransaction", vec![to_param(signed)?])
            .await
    }
}
