//! # retest-state
//!
//! Account state for the retest harness.
//!
//! - `Account` / `ExpectAccount`: concrete and expectation schemas sharing
//!   the `AccountSchema` capability
//! - `State` / `ExpectState`: ordered world state and expected post state
//! - Comparison engine producing a `CompareResult`
//! - `get_remote_state`: post state read back through an `RpcSession`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod compare;
mod error;
mod remote;
mod state;

pub use account::{Account, AccountSchema, ExpectAccount, Storage, SHOULD_NOT_EXIST};
pub use compare::{compare_account, compare_states, compare_storage, CompareResult};
pub use error::{StateError, StateResult};
pub use remote::{get_remote_state, RemoteState, MAX_RANGE_ROWS};
pub use state::{ExpectState, State};
