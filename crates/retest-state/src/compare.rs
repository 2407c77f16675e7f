//! Comparison of expected and observed account state
//!
//! The functions are pure apart from appending human readable messages to
//! `diag`. Every discrepancy found is reported there; the returned value
//! classifies the first one.

use std::fmt;

use crate::account::{Account, AccountSchema, ExpectAccount, Storage};
use crate::state::{ExpectState, State};

/// Outcome of one comparison
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CompareResult {
    /// Everything checked matched
    Success,
    /// Address is present but must not exist
    AccountShouldNotExist,
    /// Address is absent but expected
    MissingExpectedAccount,
    /// Balance differs
    IncorrectBalance,
    /// Nonce differs
    IncorrectNonce,
    /// Code differs
    IncorrectCode,
    /// Storage differs
    IncorrectStorage,
    /// Not evaluated yet
    #[default]
    None,
}

impl CompareResult {
    /// Whether this is [`CompareResult::Success`]
    pub fn is_success(self) -> bool {
        self == CompareResult::Success
    }
}

impl fmt::Display for CompareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompareResult::Success => "Success",
            CompareResult::AccountShouldNotExist => "AccountShouldNotExist",
            CompareResult::MissingExpectedAccount => "MissingExpectedAccount",
            CompareResult::IncorrectBalance => "IncorrectBalance",
            CompareResult::IncorrectNonce => "IncorrectNonce",
            CompareResult::IncorrectCode => "IncorrectCode",
            CompareResult::IncorrectStorage => "IncorrectStorage",
            CompareResult::None => "None",
        };
        f.write_str(name)
    }
}

/// Compare storage maps. Every expected slot must be set to the same value
/// and both maps must have the same number of slots.
pub fn compare_storage(expected: &Storage, actual: &Storage, diag: &mut Vec<String>) -> CompareResult {
    let mut result = CompareResult::Success;

    for (key, want) in expected {
        match actual.get(key) {
            None => {
                diag.push(format!("expected storage key '{}' to be set", key));
                result = CompareResult::IncorrectStorage;
            }
            Some(got) if got != want => {
                diag.push(format!(
                    "incorrect storage [{}] = {}, expected [{}] = {}",
                    key, got, key, want
                ));
                result = CompareResult::IncorrectStorage;
            }
            Some(_) => {}
        }
    }

    if expected.len() != actual.len() {
        diag.push(format!(
            "storage has {} records, expected {}",
            actual.len(),
            expected.len()
        ));
        result = CompareResult::IncorrectStorage;
    }

    result
}

fn check_field(
    address: &str,
    name: &str,
    want: Option<&str>,
    got: &str,
    failure: CompareResult,
    diag: &mut Vec<String>,
) -> CompareResult {
    match want {
        Some(want) if want != got => {
            diag.push(format!("{}: incorrect {} {}, expected {}", address, name, got, want));
            failure
        }
        _ => CompareResult::Success,
    }
}

/// Compare one expectation against the account found at its address, if any
pub fn compare_account(
    expected: &ExpectAccount,
    actual: Option<&Account>,
    diag: &mut Vec<String>,
) -> CompareResult {
    let address = expected.address().to_hex();

    let actual = match (expected.should_not_exist(), actual) {
        (true, Some(_)) => {
            diag.push(format!("{}: account should not exist", address));
            return CompareResult::AccountShouldNotExist;
        }
        (true, None) => return CompareResult::Success,
        (false, None) => {
            diag.push(format!("{}: missing expected account", address));
            return CompareResult::MissingExpectedAccount;
        }
        (false, Some(account)) => account,
    };

    let checks = [
        ("balance", expected.balance(), actual.balance(), CompareResult::IncorrectBalance),
        ("nonce", expected.nonce(), actual.nonce(), CompareResult::IncorrectNonce),
        ("code", expected.code(), actual.code(), CompareResult::IncorrectCode),
    ];
    for (name, want, got, failure) in checks {
        let result = check_field(&address, name, want, got, failure, diag);
        if !result.is_success() {
            return result;
        }
    }

    if let Some(storage) = expected.storage() {
        let mut messages = Vec::new();
        let result = compare_storage(storage, actual.storage(), &mut messages);
        diag.extend(messages.into_iter().map(|m| format!("{}: {}", address, m)));
        return result;
    }

    CompareResult::Success
}

/// Compare an expected post state against an observed one.
///
/// Every expectation is evaluated (so all diagnostics are collected) and the
/// first failure is returned. Exhaustive expectations then also require that
/// no other address exists.
pub fn compare_states(expected: &ExpectState, actual: &State, diag: &mut Vec<String>) -> CompareResult {
    let mut result = CompareResult::Success;

    for account in expected.accounts() {
        let outcome = compare_account(account, actual.get(account.address()), diag);
        if result.is_success() && !outcome.is_success() {
            result = outcome;
        }
    }

    if expected.exhaustive() {
        for account in actual.accounts() {
            if !expected.names(account.address()) {
                diag.push(format!("{}: unexpected account in post state", account.address()));
                if result.is_success() {
                    result = CompareResult::AccountShouldNotExist;
                }
            }
        }
    }

    result
}
