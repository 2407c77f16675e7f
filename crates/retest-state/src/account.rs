//! Concrete and expectation account schemas

use indexmap::IndexMap;
use retest_document::{Document, DocumentError, Object};
use retest_primitives::{canonical_hex, canonical_int, Address, HexKind};

use crate::error::{StateError, StateResult};

/// Storage slots, canonical hex key to canonical hex value
pub type Storage = IndexMap<String, String>;

/// Marker key of an expectation that an address must be absent
pub const SHOULD_NOT_EXIST: &str = "shouldnotexist";

/// Shared capability of every account flavor
pub trait AccountSchema: Sized {
    /// Validate `body` against the schema and normalize it to canonical hex
    fn from_document(address: &str, body: &Document) -> StateResult<Self>;

    /// Account address
    fn address(&self) -> &Address;

    /// Canonical document form, without the address key
    fn to_document(&self) -> Document;
}

fn parse_address(raw: &str) -> StateResult<Address> {
    let canonical = canonical_hex(raw, HexKind::Address).map_err(|source| StateError::Hex {
        field: "address".to_string(),
        source,
    })?;
    Address::from_hex(&canonical).map_err(|e| StateError::Schema(e.to_string()))
}

/// Canonical hex of a scalar field; `None` when absent
fn hex_field(
    address: &str,
    body: &Document,
    key: &str,
    kind: HexKind,
) -> StateResult<Option<String>> {
    let field = || format!("{}.{}", address, key);
    match body.lookup(key) {
        None => Ok(None),
        Some(Document::String(s)) => canonical_hex(s, kind)
            .map(Some)
            .map_err(|source| StateError::Hex { field: field(), source }),
        Some(Document::Integer(i)) => canonical_int(*i, kind)
            .map(Some)
            .map_err(|source| StateError::Hex { field: field(), source }),
        Some(other) => Err(StateError::Schema(format!(
            "account {}: field '{}' must be a string, found {}",
            address,
            key,
            other.doc_type()
        ))),
    }
}

fn storage_field(address: &str, body: &Document) -> StateResult<Option<Storage>> {
    let Some(value) = body.lookup("storage") else {
        return Ok(None);
    };
    let slots = value.as_object().map_err(|_| {
        StateError::Schema(format!(
            "account {}: field 'storage' must be an object, found {}",
            address,
            value.doc_type()
        ))
    })?;

    let mut storage = Storage::with_capacity(slots.len());
    for (key, slot_value) in slots {
        let field = format!("{}.storage[{}]", address, key);
        let key = canonical_hex(key, HexKind::Quantity).map_err(|source| StateError::Hex {
            field: field.clone(),
            source,
        })?;
        let value = match slot_value {
            Document::String(s) => canonical_hex(s, HexKind::Quantity),
            Document::Integer(i) => canonical_int(*i, HexKind::Quantity),
            other => {
                return Err(StateError::Schema(format!(
                    "{} must be a string, found {}",
                    field,
                    other.doc_type()
                )))
            }
        }
        .map_err(|source| StateError::Hex { field, source })?;
        if storage.contains_key(&key) {
            return Err(StateError::Schema(format!(
                "account {}: duplicate storage key {}",
                address, key
            )));
        }
        storage.insert(key, value);
    }
    Ok(Some(storage))
}

fn required<T>(address: &str, key: &str, value: Option<T>) -> StateResult<T> {
    value.ok_or_else(|| StateError::Schema(format!("account {}: missing field '{}'", address, key)))
}

fn storage_document(storage: &Storage) -> Document {
    let mut slots = Object::with_capacity(storage.len());
    for (k, v) in storage {
        slots.insert(k.clone(), Document::from(v));
    }
    Document::Object(slots)
}

/// Account with every field present, used to build genesis state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    address: Address,
    balance: String,
    nonce: String,
    code: String,
    storage: Storage,
}

impl Account {
    /// Build from already canonical values
    pub fn new(address: Address, balance: String, nonce: String, code: String, storage: Storage) -> Self {
        Self {
            address,
            balance,
            nonce,
            code,
            storage,
        }
    }

    /// Balance, canonical quantity
    pub fn balance(&self) -> &str {
        &self.balance
    }

    /// Nonce, canonical quantity
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Code, canonical bytes
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Storage slots
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl AccountSchema for Account {
    fn from_document(address: &str, body: &Document) -> StateResult<Self> {
        if !body.is_object() {
            return Err(StateError::Schema(format!(
                "account {} must be an object, found {}",
                address,
                body.doc_type()
            )));
        }
        Ok(Self {
            address: parse_address(address)?,
            balance: required(address, "balance", hex_field(address, body, "balance", HexKind::Quantity)?)?,
            nonce: required(address, "nonce", hex_field(address, body, "nonce", HexKind::Quantity)?)?,
            code: required(address, "code", hex_field(address, body, "code", HexKind::Bytes)?)?,
            storage: required(address, "storage", storage_field(address, body)?)?,
        })
    }

    fn address(&self) -> &Address {
        &self.address
    }

    fn to_document(&self) -> Document {
        let mut doc = Object::new();
        doc.insert("balance".to_string(), Document::from(&self.balance));
        doc.insert("code".to_string(), Document::from(&self.code));
        doc.insert("nonce".to_string(), Document::from(&self.nonce));
        doc.insert("storage".to_string(), storage_document(&self.storage));
        Document::Object(doc)
    }
}

/// Expected post state of one address; each present field is checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectAccount {
    address: Address,
    should_not_exist: bool,
    balance: Option<String>,
    nonce: Option<String>,
    code: Option<String>,
    storage: Option<Storage>,
}

impl ExpectAccount {
    /// Whether the address must be absent
    pub fn should_not_exist(&self) -> bool {
        self.should_not_exist
    }

    /// Expected balance
    pub fn balance(&self) -> Option<&str> {
        self.balance.as_deref()
    }

    /// Expected nonce
    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    /// Expected code
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Expected storage
    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }
}

impl AccountSchema for ExpectAccount {
    fn from_document(address: &str, body: &Document) -> StateResult<Self> {
        let should_not_exist = body
            .contains(SHOULD_NOT_EXIST)
            .map_err(|e| match e {
                DocumentError::TypeMismatch { found, .. } => StateError::Schema(format!(
                    "expectation for {} must be an object, found {}",
                    address, found
                )),
                other => other.into(),
            })?;
        Ok(Self {
            address: parse_address(address)?,
            should_not_exist,
            balance: hex_field(address, body, "balance", HexKind::Quantity)?,
            nonce: hex_field(address, body, "nonce", HexKind::Quantity)?,
            code: hex_field(address, body, "code", HexKind::Bytes)?,
            storage: storage_field(address, body)?,
        })
    }

    fn address(&self) -> &Address {
        &self.address
    }

    fn to_document(&self) -> Document {
        let mut doc = Object::new();
        if self.should_not_exist {
            doc.insert(SHOULD_NOT_EXIST.to_string(), Document::from("1"));
        }
        if let Some(balance) = &self.balance {
            doc.insert("balance".to_string(), Document::from(balance));
        }
        if let Some(code) = &self.code {
            doc.insert("code".to_string(), Document::from(code));
        }
        if let Some(nonce) = &self.nonce {
            doc.insert("nonce".to_string(), Document::from(nonce));
        }
        if let Some(storage) = &self.storage {
            doc.insert("storage".to_string(), storage_document(storage));
        }
        Document::Object(doc)
    }
}
