//! Post state retrieval from a client under test

use retest_document::Document;
use retest_primitives::{canonical_hex, parse_quantity, canonical_quantity, Address, HexKind};
use retest_rpc::RpcSession;
use tracing::debug;

use crate::account::{Account, Storage};
use crate::error::{StateError, StateResult};
use crate::state::State;

/// Most rows requested from one range query
pub const MAX_RANGE_ROWS: u64 = 1000;

/// What a client reports after a block was mined
#[derive(Debug, Clone)]
pub struct RemoteState {
    /// Head block number, hex quantity
    pub block_number: String,
    /// `stateRoot` of the head block
    pub post_hash: String,
    /// Log hash of the transaction, when one was named
    pub log_hash: Option<String>,
    /// Head block as returned by the client
    pub raw_block: Document,
    /// Every account of the head state, when requested
    pub post_state: Option<State>,
}

fn hex_error(field: &str) -> impl Fn(retest_primitives::HexError) -> StateError + '_ {
    move |source| StateError::Hex {
        field: field.to_string(),
        source,
    }
}

fn quantity(field: &str, raw: &str) -> StateResult<String> {
    parse_quantity(raw)
        .map(canonical_quantity)
        .map_err(hex_error(field))
}

/// Read the head block and optionally the whole post state.
///
/// With `full_post` every account listed by `debug_accountRangeAt` is fetched
/// (balance, code, nonce and storage, at most [`MAX_RANGE_ROWS`] of each).
pub fn get_remote_state(
    session: &RpcSession,
    tx_hash: Option<&str>,
    full_post: bool,
) -> StateResult<RemoteState> {
    let block_number = session.eth_block_number()?;
    let raw_block = session.eth_get_block_by_number(&block_number, true)?;
    let post_hash = raw_block.get("stateRoot")?.as_str()?.to_string();
    let log_hash = match tx_hash {
        Some(hash) => Some(session.test_get_log_hash(hash)?),
        None => None,
    };

    let post_state = if full_post {
        let tx_index = raw_block.lookup("transactions").map_or(0, Document::len) as u64;
        Some(fetch_accounts(session, &block_number, tx_index)?)
    } else {
        None
    };

    Ok(RemoteState {
        block_number,
        post_hash,
        log_hash,
        raw_block,
        post_state,
    })
}

fn fetch_accounts(session: &RpcSession, block: &str, tx_index: u64) -> StateResult<State> {
    let range = session.debug_account_range_at(block, tx_index, "0", MAX_RANGE_ROWS)?;
    let mut state = State::new();

    for entry in range.get("addressMap")?.as_object()?.values() {
        let raw_address = entry.as_str()?;
        let address = Address::from_hex(
            &canonical_hex(raw_address, HexKind::Address).map_err(hex_error("address"))?,
        )
        .map_err(|e| StateError::Schema(e.to_string()))?;
        let hex = address.to_hex();

        let balance = quantity("balance", &session.eth_get_balance(&hex, block)?)?;
        let code = canonical_hex(&session.eth_get_code(&hex, block)?, HexKind::Bytes)
            .map_err(hex_error("code"))?;
        let nonce = quantity("nonce", &session.eth_get_transaction_count(&hex, block)?)?;

        let slots = session.debug_storage_range_at(block, tx_index, &hex, "0", MAX_RANGE_ROWS)?;
        let mut storage = Storage::new();
        for slot in slots.get("storage")?.as_object()?.values() {
            let key = quantity("storage key", slot.get("key")?.as_str()?)?;
            let value = quantity("storage value", slot.get("value")?.as_str()?)?;
            storage.insert(key, value);
        }

        debug!(account = %hex, slots = storage.len(), "fetched remote account");
        state.insert(Account::new(address, balance, nonce, code, storage));
    }

    Ok(state)
}
