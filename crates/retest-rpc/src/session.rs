//! Blocking RPC session over an async transport

use retest_document::Document;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};

use crate::error::{RpcError, RpcResult};
use crate::transport::Transport;

/// One exclusive connection to a client under test.
///
/// Every method blocks the calling worker until the client replies. The
/// session drives its transport on its own single-threaded runtime, so it can
/// be used from plain OS threads.
pub struct RpcSession {
    runtime: Runtime,
    transport: Box<dyn Transport>,
    client_version: String,
}

impl RpcSession {
    /// Establish a session by probing `web3_clientVersion`
    pub fn open(transport: Box<dyn Transport>) -> RpcResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| RpcError::Connection(e.to_string()))?;

        let version = runtime
            .block_on(transport.request_json("web3_clientVersion", vec![]))
            .map_err(|e| RpcError::Connection(e.to_string()))?;
        let client_version = match version {
            Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(Self {
            runtime,
            transport,
            client_version,
        })
    }

    fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.runtime
            .block_on(self.transport.request_json(method, params))
    }

    fn call_document(&self, method: &str, params: Vec<Value>) -> RpcResult<Document> {
        Ok(Document::from_json_value(self.call(method, params)?)?)
    }

    fn call_string(&self, method: &str, params: Vec<Value>) -> RpcResult<String> {
        match self.call(method, params)? {
            Value::String(s) => Ok(s),
            other => Err(RpcError::Rpc {
                code: -32603,
                message: format!("{} returned {}, expected a string", method, other),
            }),
        }
    }

    fn call_bool(&self, method: &str, params: Vec<Value>) -> RpcResult<bool> {
        match self.call(method, params)? {
            Value::Bool(b) => Ok(b),
            other => Err(RpcError::Rpc {
                code: -32603,
                message: format!("{} returned {}, expected a bool", method, other),
            }),
        }
    }

    // ==================== Client Info ====================

    /// Client version string, cached when the session was opened
    pub fn web3_client_version(&self) -> &str {
        &self.client_version
    }

    // ==================== Chain Queries ====================

    /// Head block number as a hex quantity
    pub fn eth_block_number(&self) -> RpcResult<String> {
        self.call_string("eth_blockNumber", vec![])
    }

    /// Block by number (`full_tx` includes transaction bodies)
    pub fn eth_get_block_by_number(&self, block: &str, full_tx: bool) -> RpcResult<Document> {
        self.call_document(
            "eth_getBlockByNumber",
            vec![Value::from(block), Value::Bool(full_tx)],
        )
    }

    /// Balance of `address` at `block`
    pub fn eth_get_balance(&self, address: &str, block: &str) -> RpcResult<String> {
        self.call_string("eth_getBalance", vec![Value::from(address), Value::from(block)])
    }

    /// Code of `address` at `block`
    pub fn eth_get_code(&self, address: &str, block: &str) -> RpcResult<String> {
        self.call_string("eth_getCode", vec![Value::from(address), Value::from(block)])
    }

    /// Nonce of `address` at `block`
    pub fn eth_get_transaction_count(&self, address: &str, block: &str) -> RpcResult<String> {
        self.call_string(
            "eth_getTransactionCount",
            vec![Value::from(address), Value::from(block)],
        )
    }

    /// Page of accounts alive after transaction `tx_index` of `block`
    pub fn debug_account_range_at(
        &self,
        block: &str,
        tx_index: u64,
        start: &str,
        max_results: u64,
    ) -> RpcResult<Document> {
        self.call_document(
            "debug_accountRangeAt",
            vec![
                Value::from(block),
                Value::from(tx_index),
                Value::from(start),
                Value::from(max_results),
            ],
        )
    }

    /// Page of storage slots of `address` after transaction `tx_index` of `block`
    pub fn debug_storage_range_at(
        &self,
        block: &str,
        tx_index: u64,
        address: &str,
        start: &str,
        max_results: u64,
    ) -> RpcResult<Document> {
        self.call_document(
            "debug_storageRangeAt",
            vec![
                Value::from(block),
                Value::from(tx_index),
                Value::from(address),
                Value::from(start),
                Value::from(max_results),
            ],
        )
    }

    /// Hash of the logs emitted by transaction `tx_hash`
    pub fn test_get_log_hash(&self, tx_hash: &str) -> RpcResult<String> {
        self.call_string("test_getLogHash", vec![Value::from(tx_hash)])
    }

    // ==================== Test Control ====================

    /// Reset the chain to the genesis described by `params`
    pub fn test_set_chain_params(&self, params: &Document) -> RpcResult<bool> {
        self.call_bool("test_setChainParams", vec![params.to_json_value()])
    }

    /// Mine `count` blocks
    pub fn test_mine_blocks(&self, count: u64) -> RpcResult<bool> {
        self.call_bool("test_mineBlocks", vec![Value::from(count)])
    }

    /// Rewind the chain to block `number`
    pub fn test_rewind_to_block(&self, number: u64) -> RpcResult<bool> {
        self.call_bool("test_rewindToBlock", vec![Value::from(number)])
    }

    /// Set the timestamp of the next block
    pub fn test_modify_timestamp(&self, timestamp: u64) -> RpcResult<bool> {
        self.call_bool("test_modifyTimestamp", vec![Value::from(timestamp)])
    }

    /// Submit a signed transaction, returning its hash
    pub fn eth_send_raw_transaction(&self, raw: &str) -> RpcResult<String> {
        self.call_string("eth_sendRawTransaction", vec![Value::from(raw)])
    }
}

impl std::fmt::Debug for RpcSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcSession")
            .field("client_version", &self.client_version)
            .finish()
    }
}
