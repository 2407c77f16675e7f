//! Transport layer for RPC communication

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::{RpcError, RpcResult};

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an RPC request and get JSON response
    async fn request_json(&self, method: &str, params: Vec<Value>) -> RpcResult<Value>;
}

/// Reply computed from the request parameters
pub type MockHandler = Arc<dyn Fn(&[Value]) -> RpcResult<Value> + Send + Sync>;

#[derive(Default)]
struct MockState {
    scripted: HashMap<String, VecDeque<RpcResult<Value>>>,
    handlers: HashMap<String, MockHandler>,
    responses: HashMap<String, Value>,
    calls: Vec<(String, Vec<Value>)>,
}

/// Mock transport for testing
///
/// Replies are looked up in order: the next scripted reply for the method,
/// then a handler, then a fixed response, then a built-in default. Clones
/// share state, so a test can keep one handle and inspect the call log of a
/// session it handed the other to.
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    defaults: Arc<HashMap<String, Value>>,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        let mut defaults = HashMap::new();

        defaults.insert(
            "web3_clientVersion".to_string(),
            Value::String("mock/v0.1.0".to_string()),
        );
        defaults.insert("eth_blockNumber".to_string(), Value::String("0x00".to_string()));
        defaults.insert("eth_getBalance".to_string(), Value::String("0x00".to_string()));
        defaults.insert("eth_getTransactionCount".to_string(), Value::String("0x00".to_string()));
        defaults.insert("eth_getCode".to_string(), Value::String("0x".to_string()));
        defaults.insert("test_setChainParams".to_string(), Value::Bool(true));
        defaults.insert("test_mineBlocks".to_string(), Value::Bool(true));
        defaults.insert("test_rewindToBlock".to_string(), Value::Bool(true));
        defaults.insert("test_modifyTimestamp".to_string(), Value::Bool(true));
        defaults.insert(
            "test_getLogHash".to_string(),
            Value::String(
                "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347".to_string(),
            ),
        );
        defaults.insert(
            "eth_sendRawTransaction".to_string(),
            Value::String(
                "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b".to_string(),
            ),
        );

        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            defaults: Arc::new(defaults),
        }
    }

    /// Set a fixed response for a method
    pub fn set_response(&self, method: &str, response: Value) {
        self.state
            .lock()
            .responses
            .insert(method.to_string(), response);
    }

    /// Queue a one-shot reply for a method, consumed before any fixed response
    pub fn push_reply(&self, method: &str, reply: RpcResult<Value>) {
        self.state
            .lock()
            .scripted
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Answer a method by computing the reply from its parameters
    pub fn set_handler<F>(&self, method: &str, handler: F)
    where
        F: Fn(&[Value]) -> RpcResult<Value> + Send + Sync + 'static,
    {
        self.state
            .lock()
            .handlers
            .insert(method.to_string(), Arc::new(handler));
    }

    /// Every request seen so far, in order
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.state.lock().calls.clone()
    }

    /// Number of requests seen for one method
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    fn reply(&self, method: &str, params: &[Value]) -> RpcResult<Value> {
        let handler = {
            let mut state = self.state.lock();
            state.calls.push((method.to_string(), params.to_vec()));

            if let Some(reply) = state.scripted.get_mut(method).and_then(VecDeque::pop_front) {
                return reply;
            }
            state.handlers.get(method).cloned()
        };

        // Handler runs without the lock so it may use the transport itself
        if let Some(handler) = handler {
            return handler(params);
        }

        if let Some(response) = self.state.lock().responses.get(method).cloned() {
            return Ok(response);
        }

        if let Some(response) = self.defaults.get(method).cloned() {
            return Ok(response);
        }

        Err(RpcError::Rpc {
            code: -32601,
            message: format!("Method not found: {}", method),
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.reply(method, &params)
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    request_id: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.to_string(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.request_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id(),
            "method": method,
            "params": params,
        });

        tracing::trace!(url = %self.url, method, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response.result.ok_or_else(|| RpcError::Rpc {
            code: -32603,
            message: "No result in response".to_string(),
        })
    }
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[cfg(feature = "http")]
#[derive(serde::Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}
