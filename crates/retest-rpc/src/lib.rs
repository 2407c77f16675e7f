//! # retest-rpc
//!
//! JSON-RPC plumbing for the retest harness.
//!
//! ## Features
//!
//! - Pluggable async `Transport` (HTTP JSON-RPC, scripted mock)
//! - `RpcSession`: blocking typed calls for worker threads
//! - `SessionRegistry`: one exclusive session per worker identity
//!
//! ## Example
//!
//! ```
//! use retest_rpc::{ClientConfig, MockConnector, SessionRegistry, SessionStatus, WorkerId};
//!
//! let registry = SessionRegistry::new(MockConnector::default());
//! registry.configure(ClientConfig::default());
//!
//! let me = WorkerId::current();
//! registry.session_start(me).unwrap();
//! let session = registry.instance(me).unwrap();
//! assert_eq!(session.eth_block_number().unwrap(), "0x00");
//! registry.session_end(me, SessionStatus::HasFinished);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client_config;
mod error;
mod registry;
mod session;
mod transport;

pub use client_config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{RpcError, RpcResult};
pub use registry::{Connector, MockConnector, SessionRegistry, SessionStatus, WorkerId};
pub use session::RpcSession;
pub use transport::{MockHandler, MockTransport, Transport};

#[cfg(feature = "http")]
pub use registry::HttpConnector;
#[cfg(feature = "http")]
pub use transport::HttpTransport;
