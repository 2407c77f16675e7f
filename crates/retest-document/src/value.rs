//! The document value type and its keyed/indexed accessors

use crate::error::{DocumentError, DocumentResult};
use indexmap::IndexMap;
use std::fmt;

/// Insertion-ordered object body
pub type Object = IndexMap<String, Document>;

/// Variant tag of a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocType {
    /// `null`
    Null,
    /// `true` / `false`
    Bool,
    /// String
    String,
    /// 64-bit signed integer
    Integer,
    /// Ordered keyed children
    Object,
    /// Ordered children
    Array,
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocType::Null => "null",
            DocType::Bool => "bool",
            DocType::String => "string",
            DocType::Integer => "integer",
            DocType::Object => "object",
            DocType::Array => "array",
        };
        f.write_str(name)
    }
}

/// A tree-shaped, semi-structured value.
///
/// Object keys are unique and keep their insertion order; setting an existing
/// key replaces the value without moving it. Every value owns its children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Document {
    /// `null`
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// String
    String(String),
    /// Integer
    Integer(i64),
    /// Ordered map
    Object(Object),
    /// Sequence
    Array(Vec<Document>),
}

impl Document {
    /// Empty object
    pub fn object() -> Self {
        Document::Object(Object::new())
    }

    /// Empty array
    pub fn array() -> Self {
        Document::Array(Vec::new())
    }

    /// Variant tag
    pub fn doc_type(&self) -> DocType {
        match self {
            Document::Null => DocType::Null,
            Document::Bool(_) => DocType::Bool,
            Document::String(_) => DocType::String,
            Document::Integer(_) => DocType::Integer,
            Document::Object(_) => DocType::Object,
            Document::Array(_) => DocType::Array,
        }
    }

    /// Whether this is an object
    pub fn is_object(&self) -> bool {
        matches!(self, Document::Object(_))
    }

    /// Whether this is `null`
    pub fn is_null(&self) -> bool {
        matches!(self, Document::Null)
    }

    fn mismatch(&self, expected: DocType) -> DocumentError {
        DocumentError::TypeMismatch {
            expected,
            found: self.doc_type(),
        }
    }

    // ==================== Typed accessors ====================

    /// String contents
    pub fn as_str(&self) -> DocumentResult<&str> {
        match self {
            Document::String(s) => Ok(s),
            other => Err(other.mismatch(DocType::String)),
        }
    }

    /// Integer value
    pub fn as_int(&self) -> DocumentResult<i64> {
        match self {
            Document::Integer(i) => Ok(*i),
            other => Err(other.mismatch(DocType::Integer)),
        }
    }

    /// Boolean value
    pub fn as_bool(&self) -> DocumentResult<bool> {
        match self {
            Document::Bool(b) => Ok(*b),
            other => Err(other.mismatch(DocType::Bool)),
        }
    }

    /// Object body
    pub fn as_object(&self) -> DocumentResult<&Object> {
        match self {
            Document::Object(o) => Ok(o),
            other => Err(other.mismatch(DocType::Object)),
        }
    }

    /// Mutable object body
    pub fn as_object_mut(&mut self) -> DocumentResult<&mut Object> {
        match self {
            Document::Object(o) => Ok(o),
            other => Err(other.mismatch(DocType::Object)),
        }
    }

    /// Array elements
    pub fn as_array(&self) -> DocumentResult<&[Document]> {
        match self {
            Document::Array(a) => Ok(a),
            other => Err(other.mismatch(DocType::Array)),
        }
    }

    /// Mutable array elements
    pub fn as_array_mut(&mut self) -> DocumentResult<&mut Vec<Document>> {
        match self {
            Document::Array(a) => Ok(a),
            other => Err(other.mismatch(DocType::Array)),
        }
    }

    // ==================== Object operations ====================

    /// Child under `key`
    pub fn get(&self, key: &str) -> DocumentResult<&Document> {
        self.as_object()?
            .get(key)
            .ok_or_else(|| DocumentError::MissingKey(key.to_string()))
    }

    /// Mutable child under `key`
    pub fn get_mut(&mut self, key: &str) -> DocumentResult<&mut Document> {
        self.as_object_mut()?
            .get_mut(key)
            .ok_or_else(|| DocumentError::MissingKey(key.to_string()))
    }

    /// Child under `key`, `None` when absent or when this is not an object
    pub fn lookup(&self, key: &str) -> Option<&Document> {
        match self {
            Document::Object(o) => o.get(key),
            _ => None,
        }
    }

    /// Whether the object has `key`
    pub fn contains(&self, key: &str) -> DocumentResult<bool> {
        Ok(self.as_object()?.contains_key(key))
    }

    /// Insert or replace `key`; an existing key keeps its position
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Document>) -> DocumentResult<()> {
        self.as_object_mut()?.insert(key.into(), value.into());
        Ok(())
    }

    /// Child under `key`, inserting `null` at the end when absent
    pub fn entry(&mut self, key: &str) -> DocumentResult<&mut Document> {
        Ok(self
            .as_object_mut()?
            .entry(key.to_string())
            .or_insert(Document::Null))
    }

    /// Remove `key`, keeping the order of the remaining entries
    pub fn remove(&mut self, key: &str) -> DocumentResult<Option<Document>> {
        Ok(self.as_object_mut()?.shift_remove(key))
    }

    /// Move `key` to position `index` (clamped to the last slot)
    pub fn reposition(&mut self, key: &str, index: usize) -> DocumentResult<()> {
        let object = self.as_object_mut()?;
        let from = object
            .get_index_of(key)
            .ok_or_else(|| DocumentError::MissingKey(key.to_string()))?;
        let to = index.min(object.len() - 1);
        object.move_index(from, to);
        Ok(())
    }

    /// Rename `from` to `to` in place. When `to` already exists elsewhere it
    /// is replaced by the renamed entry.
    pub fn rename_key(&mut self, from: &str, to: &str) -> DocumentResult<()> {
        if from == to {
            return self.get(from).map(|_| ());
        }
        let object = self.as_object_mut()?;
        let index = object
            .get_index_of(from)
            .ok_or_else(|| DocumentError::MissingKey(from.to_string()))?;
        let value = object.shift_remove_index(index).map(|(_, v)| v).unwrap_or_default();
        object.shift_remove(to);
        let (slot, _) = object.insert_full(to.to_string(), value);
        let target = index.min(object.len() - 1);
        object.move_index(slot, target);
        Ok(())
    }

    /// Object keys in order
    pub fn keys(&self) -> DocumentResult<impl Iterator<Item = &str>> {
        Ok(self.as_object()?.keys().map(String::as_str))
    }

    // ==================== Array operations ====================

    /// Append to an array
    pub fn push(&mut self, value: impl Into<Document>) -> DocumentResult<()> {
        self.as_array_mut()?.push(value.into());
        Ok(())
    }

    /// Number of children of an object or array, zero for scalars
    pub fn len(&self) -> usize {
        match self {
            Document::Object(o) => o.len(),
            Document::Array(a) => a.len(),
            _ => 0,
        }
    }

    /// Whether [`Document::len`] is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Document::String(s.to_string())
    }
}

impl From<String> for Document {
    fn from(s: String) -> Self {
        Document::String(s)
    }
}

impl From<&String> for Document {
    fn from(s: &String) -> Self {
        Document::String(s.clone())
    }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self {
        Document::Integer(i)
    }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self {
        Document::Bool(b)
    }
}

impl From<Object> for Document {
    fn from(o: Object) -> Self {
        Document::Object(o)
    }
}

impl From<Vec<Document>> for Document {
    fn from(a: Vec<Document>) -> Self {
        Document::Array(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::object();
        doc.set("a", 1i64).unwrap();
        doc.set("b", "two").unwrap();
        doc.set("c", Document::array()).unwrap();
        doc
    }

    #[test]
    fn test_set_existing_key_keeps_position() {
        let mut doc = sample();
        doc.set("a", "replaced").unwrap();
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(doc.get("a").unwrap().as_str().unwrap(), "replaced");
    }

    #[test]
    fn test_reposition() {
        let mut doc = sample();
        doc.reposition("c", 0).unwrap();
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);

        doc.reposition("c", 99).unwrap();
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reposition_missing_key() {
        let mut doc = sample();
        assert!(matches!(
            doc.reposition("zzz", 0),
            Err(DocumentError::MissingKey(_))
        ));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = sample();
        let removed = doc.remove("a").unwrap();
        assert_eq!(removed, Some(Document::Integer(1)));
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(doc.remove("a").unwrap(), None);
    }

    #[test]
    fn test_rename_key_keeps_position() {
        let mut doc = sample();
        doc.rename_key("b", "B").unwrap();
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["a", "B", "c"]);
        assert_eq!(doc.get("B").unwrap().as_str().unwrap(), "two");
    }

    #[test]
    fn test_object_ops_on_scalar_fail() {
        let mut scalar = Document::from("x");
        assert!(matches!(
            scalar.get("a"),
            Err(DocumentError::TypeMismatch { expected: DocType::Object, found: DocType::String })
        ));
        assert!(scalar.contains("a").is_err());
        assert!(scalar.set("a", 1i64).is_err());
        assert!(scalar.remove("a").is_err());
        assert!(scalar.reposition("a", 0).is_err());
        assert!(scalar.lookup("a").is_none());
    }

    #[test]
    fn test_scalar_accessors() {
        assert_eq!(Document::from(5i64).as_int().unwrap(), 5);
        assert!(Document::from(true).as_bool().unwrap());
        assert!(matches!(
            Document::from(5i64).as_str(),
            Err(DocumentError::TypeMismatch { expected: DocType::String, found: DocType::Integer })
        ));
        assert!(Document::Null.as_array().is_err());
    }

    #[test]
    fn test_entry_and_push() {
        let mut doc = Document::object();
        *doc.entry("list").unwrap() = Document::array();
        doc.get_mut("list").unwrap().push("x").unwrap();
        assert_eq!(doc.get("list").unwrap().len(), 1);
        assert!(Document::Null.is_empty());
    }
}
