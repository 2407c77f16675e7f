//! World state and expected post state

use indexmap::IndexMap;
use retest_document::{Document, Object};
use retest_primitives::Address;

use crate::account::{Account, AccountSchema, ExpectAccount};
use crate::error::{StateError, StateResult};

fn entries<'a>(what: &str, doc: &'a Document) -> StateResult<&'a Object> {
    doc.as_object().map_err(|_| {
        StateError::Schema(format!("{} must be an object, found {}", what, doc.doc_type()))
    })
}

fn duplicate_address(address: &Address) -> StateError {
    StateError::Schema(format!("duplicate account address {}", address))
}

/// Address ordered set of concrete accounts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    accounts: IndexMap<Address, Account>,
}

impl State {
    /// Empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{address: account}`
    pub fn from_document(doc: &Document) -> StateResult<Self> {
        let mut state = State::new();
        for (address, body) in entries("state", doc)? {
            let account = Account::from_document(address, body)?;
            if state.contains(account.address()) {
                return Err(duplicate_address(account.address()));
            }
            state.insert(account);
        }
        Ok(state)
    }

    /// Add or replace an account
    pub fn insert(&mut self, account: Account) {
        self.accounts.insert(*account.address(), account);
    }

    /// Account at `address`
    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// Whether `address` exists
    pub fn contains(&self, address: &Address) -> bool {
        self.accounts.contains_key(address)
    }

    /// Accounts in insertion order
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the state has no accounts
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Canonical `{address: account}` document
    pub fn to_document(&self) -> Document {
        let mut doc = Object::with_capacity(self.accounts.len());
        for (address, account) in &self.accounts {
            doc.insert(address.to_hex(), account.to_document());
        }
        Document::Object(doc)
    }
}

/// Expected post state
///
/// Only the named addresses are checked unless the set is exhaustive, in
/// which case any other address in the post state is a failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectState {
    accounts: Vec<ExpectAccount>,
    exhaustive: bool,
}

impl ExpectState {
    /// Parse `{address: expectation}`
    pub fn from_document(doc: &Document) -> StateResult<Self> {
        let mut accounts: Vec<ExpectAccount> = Vec::new();
        for (address, body) in entries("expected state", doc)? {
            let expect = ExpectAccount::from_document(address, body)?;
            if accounts.iter().any(|a| a.address() == expect.address()) {
                return Err(duplicate_address(expect.address()));
            }
            accounts.push(expect);
        }
        Ok(Self {
            accounts,
            exhaustive: false,
        })
    }

    /// Mark the expectation as exhaustive
    pub fn with_exhaustive(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Whether addresses not named here must be absent
    pub fn exhaustive(&self) -> bool {
        self.exhaustive
    }

    /// Expectations in document order
    pub fn accounts(&self) -> &[ExpectAccount] {
        &self.accounts
    }

    /// Whether `address` has an expectation
    pub fn names(&self, address: &Address) -> bool {
        self.accounts.iter().any(|a| a.address() == address)
    }
}
