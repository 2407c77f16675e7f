//! Client configuration descriptor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default endpoint of a locally running client
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8545";

/// One client build/instance under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Human readable name, also used by `--clients`
    pub name: String,
    /// Numeric id, unique within one configuration file
    #[serde(default)]
    pub id: u32,
    /// JSON-RPC endpoint URL
    pub endpoint: String,
}

impl ClientConfig {
    /// Create a configuration
    pub fn new(name: impl Into<String>, id: u32, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id,
            endpoint: endpoint.into(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("t8ntool", 0, DEFAULT_ENDPOINT)
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{}, {})", self.name, self.id, self.endpoint)
    }
}
