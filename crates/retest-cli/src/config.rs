//! Client configuration files

use retest_rpc::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CliError;

/// File name looked up inside the config directory
pub const CLIENTS_FILE: &str = "clients.toml";

/// Contents of `clients.toml`
///
/// ```toml
/// [[client]]
/// name = "geth"
/// id = 0
/// endpoint = "http://localhost:8545"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientsFile {
    /// Configured clients, in run order
    #[serde(default, rename = "client")]
    pub clients: Vec<ClientConfig>,
}

impl ClientsFile {
    /// Default config directory (`~/.retest`)
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".retest"))
    }

    /// Load `clients.toml` from `dir`; a missing file yields no clients
    pub fn load(dir: &Path) -> Result<Self, CliError> {
        let path = dir.join(CLIENTS_FILE);
        if !path.exists() {
            tracing::debug!("No client configuration at {:?}", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Clients to run against.
    ///
    /// An empty file falls back to the default client. A non-empty `names`
    /// keeps the named clients in the given order.
    pub fn select(self, names: &[String]) -> Result<Vec<ClientConfig>, CliError> {
        let clients = if self.clients.is_empty() {
            vec![ClientConfig::default()]
        } else {
            self.clients
        };
        if names.is_empty() {
            return Ok(clients);
        }
        names
            .iter()
            .map(|name| {
                clients
                    .iter()
                    .find(|c| &c.name == name)
                    .cloned()
                    .ok_or_else(|| CliError::UnknownClient(name.clone()))
            })
            .collect()
    }
}

/// Resolve the clients to run from `--config-dir` and `--clients`
pub fn load_clients(dir: Option<&Path>, names: &[String]) -> Result<Vec<ClientConfig>, CliError> {
    let file = match dir.map(Path::to_path_buf).or_else(ClientsFile::default_dir) {
        Some(dir) => ClientsFile::load(&dir)?,
        None => ClientsFile::default(),
    };
    file.select(names)
}
