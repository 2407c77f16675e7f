//! Registry binding worker identities to exclusive RPC sessions

use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::thread::ThreadId;
use tracing::debug;

use crate::client_config::ClientConfig;
use crate::error::{RpcError, RpcResult};
use crate::session::RpcSession;
use crate::transport::MockTransport;

/// Identity of a worker, taken from the OS thread it runs on
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerId(ThreadId);

impl WorkerId {
    /// Identity of the calling thread
    pub fn current() -> Self {
        WorkerId(std::thread::current().id())
    }
}

impl From<ThreadId> for WorkerId {
    fn from(id: ThreadId) -> Self {
        WorkerId(id)
    }
}

impl fmt::Debug for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkerId({:?})", self.0)
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Session lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// Idle, may be recycled by any worker
    Available,
    /// Held by its worker
    Busy,
    /// Its worker is done; the orchestrator will recycle it after joining
    HasFinished,
}

/// Opens sessions for a client configuration
pub trait Connector: Send + Sync {
    /// Open a new session against `config`
    fn connect(&self, config: &ClientConfig) -> RpcResult<RpcSession>;
}

/// Connector for real clients over HTTP JSON-RPC
#[cfg(feature = "http")]
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

#[cfg(feature = "http")]
impl Connector for HttpConnector {
    fn connect(&self, config: &ClientConfig) -> RpcResult<RpcSession> {
        let transport = crate::transport::HttpTransport::new(&config.endpoint);
        RpcSession::open(Box::new(transport))
    }
}

/// Connector handing every session a clone of one shared mock transport
#[derive(Clone, Default)]
pub struct MockConnector {
    transport: MockTransport,
}

impl MockConnector {
    /// Wrap a mock transport
    pub fn new(transport: MockTransport) -> Self {
        Self { transport }
    }

    /// The shared transport
    pub fn transport(&self) -> &MockTransport {
        &self.transport
    }
}

impl Connector for MockConnector {
    fn connect(&self, _config: &ClientConfig) -> RpcResult<RpcSession> {
        RpcSession::open(Box::new(self.transport.clone()))
    }
}

struct SessionSlot {
    status: SessionStatus,
    session: Arc<RpcSession>,
}

/// Maps each worker to the one session it may use.
///
/// Entries are keyed by [`WorkerId`], so concurrent workers never touch the
/// same entry. No lock is held while a session talks to its client.
pub struct SessionRegistry {
    sessions: DashMap<WorkerId, SessionSlot>,
    connector: Box<dyn Connector>,
    config: RwLock<Option<ClientConfig>>,
}

impl SessionRegistry {
    /// Create an empty registry that opens sessions through `connector`
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            sessions: DashMap::new(),
            connector: Box::new(connector),
            config: RwLock::new(None),
        }
    }

    /// Registry for real clients
    #[cfg(feature = "http")]
    pub fn http() -> Self {
        Self::new(HttpConnector)
    }

    /// Set the configuration used for sessions opened from now on
    pub fn configure(&self, config: ClientConfig) {
        *self.config.write() = Some(config);
    }

    /// Current configuration
    pub fn config(&self) -> Option<ClientConfig> {
        self.config.read().clone()
    }

    /// Bind a session to `worker` and mark it `Busy`.
    ///
    /// Reactivates the worker's own session, else takes over an `Available`
    /// one, else connects a new one.
    pub fn session_start(&self, worker: WorkerId) -> RpcResult<()> {
        if let Some(mut slot) = self.sessions.get_mut(&worker) {
            slot.status = SessionStatus::Busy;
            return Ok(());
        }

        let idle = self
            .sessions
            .iter()
            .find(|entry| entry.status == SessionStatus::Available)
            .map(|entry| *entry.key());
        if let Some(previous) = idle {
            let taken = self
                .sessions
                .remove_if(&previous, |_, slot| slot.status == SessionStatus::Available);
            if let Some((_, mut slot)) = taken {
                debug!(from = %previous, to = %worker, "recycling session");
                slot.status = SessionStatus::Busy;
                self.sessions.insert(worker, slot);
                return Ok(());
            }
        }

        let config = self.config().ok_or(RpcError::NotConfigured)?;
        let session = self.connector.connect(&config).map_err(|e| match e {
            RpcError::Connection(_) => e,
            other => RpcError::Connection(other.to_string()),
        })?;
        debug!(worker = %worker, client = %config.name, "opened session");
        self.sessions.insert(
            worker,
            SessionSlot {
                status: SessionStatus::Busy,
                session: Arc::new(session),
            },
        );
        Ok(())
    }

    /// Status of the worker's session, `None` if it has none
    pub fn session_status(&self, worker: WorkerId) -> Option<SessionStatus> {
        self.sessions.get(&worker).map(|slot| slot.status)
    }

    /// Move the worker's session to `status`; unknown workers are ignored
    pub fn session_end(&self, worker: WorkerId, status: SessionStatus) {
        if let Some(mut slot) = self.sessions.get_mut(&worker) {
            slot.status = status;
        }
    }

    /// The session bound to `worker`
    pub fn instance(&self, worker: WorkerId) -> RpcResult<Arc<RpcSession>> {
        self.sessions
            .get(&worker)
            .map(|slot| Arc::clone(&slot.session))
            .ok_or_else(|| RpcError::NoSession(worker.to_string()))
    }

    /// Drop every session
    pub fn clear(&self) {
        self.sessions.clear();
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions in `status`
    pub fn count_with(&self, status: SessionStatus) -> usize {
        self.sessions
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.sessions.len())
            .field("config", &*self.config.read())
            .finish()
    }
}
