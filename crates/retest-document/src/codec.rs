//! Parsing and serialization
//!
//! JSON and YAML share one `serde` visitor so both keep key order. Floating
//! point numbers are rejected: every numeric field in a test is either an
//! integer or a hex string.

use crate::error::{DocumentError, DocumentResult};
use crate::value::{Document, Object};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Document::Null => serializer.serialize_unit(),
            Document::Bool(b) => serializer.serialize_bool(*b),
            Document::String(s) => serializer.serialize_str(s),
            Document::Integer(i) => serializer.serialize_i64(*i),
            Document::Object(o) => {
                let mut map = serializer.serialize_map(Some(o.len()))?;
                for (k, v) in o {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Document::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for v in a {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
        }
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("null, a bool, a string, an integer, an object or an array")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Document, E> {
        Ok(Document::Null)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Document, D::Error>
    where
        D: Deserializer<'de>,
    {
        Document::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> {
        Ok(Document::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> {
        Ok(Document::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
        i64::try_from(v)
            .map(Document::Integer)
            .map_err(|_| E::custom(format!("integer {} out of range, use a hex string", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
        Err(E::custom(format!("floating point number {} is not supported", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
        Ok(Document::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
        Ok(Document::String(v))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Document, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Document>()? {
            items.push(item);
        }
        Ok(Document::Array(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Document, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut object = Object::with_capacity(map.size_hint().unwrap_or(0));
        while let Some(MapKey(key)) = map.next_key::<MapKey>()? {
            let value = map.next_value::<Document>()?;
            object.insert(key, value);
        }
        Ok(Document::Object(object))
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DocumentVisitor)
    }
}

/// Object key; YAML allows scalar keys that are not strings
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapKeyVisitor;

        impl<'de> Visitor<'de> for MapKeyVisitor {
            type Value = MapKey;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a scalar object key")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> {
                Ok(MapKey(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> {
                Ok(MapKey(v.to_string()))
            }
        }

        deserializer.deserialize_any(MapKeyVisitor)
    }
}

impl Document {
    /// Parse JSON text, preserving key order
    pub fn parse(raw: &str) -> DocumentResult<Document> {
        serde_json::from_str(raw).map_err(|e| DocumentError::Parse(e.to_string()))
    }

    /// Parse YAML text, preserving key order
    pub fn parse_yaml(raw: &str) -> DocumentResult<Document> {
        serde_yaml::from_str(raw).map_err(|e| DocumentError::Parse(e.to_string()))
    }

    /// Compact JSON
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Compact JSON with object keys sorted at every level.
    ///
    /// Two documents that differ only in key order serialize identically.
    pub fn serialize_canonical(&self) -> String {
        self.sorted().serialize()
    }

    fn sorted(&self) -> Document {
        match self {
            Document::Object(object) => {
                let mut sorted: Object = object
                    .iter()
                    .map(|(key, value)| (key.clone(), value.sorted()))
                    .collect();
                sorted.sort_keys();
                Document::Object(sorted)
            }
            Document::Array(items) => Document::Array(items.iter().map(Document::sorted).collect()),
            other => other.clone(),
        }
    }

    /// Indented JSON, used for files written to disk
    pub fn serialize_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Convert into a `serde_json::Value` (RPC parameters)
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Convert from a `serde_json::Value` (RPC results)
    pub fn from_json_value(value: serde_json::Value) -> DocumentResult<Document> {
        serde_json::from_value(value).map_err(|e| DocumentError::Parse(e.to_string()))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order() {
        let doc = Document::parse(r#"{"z":1,"a":2,"m":{"y":null,"b":true}}"#).unwrap();
        let keys: Vec<_> = doc.keys().unwrap().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(doc.serialize(), r#"{"z":1,"a":2,"m":{"y":null,"b":true}}"#);
    }

    #[test]
    fn test_canonical_ignores_key_order() {
        let a = Document::parse(r#"{"t":{"env":{"b":1,"a":2},"pre":{}},"list":[{"y":1,"x":2}]}"#).unwrap();
        let b = Document::parse(r#"{"list":[{"x":2,"y":1}],"t":{"pre":{},"env":{"a":2,"b":1}}}"#).unwrap();
        assert_ne!(a.serialize(), b.serialize());
        assert_eq!(a.serialize_canonical(), b.serialize_canonical());
        assert_eq!(
            a.serialize_canonical(),
            r#"{"list":[{"x":2,"y":1}],"t":{"env":{"a":2,"b":1},"pre":{}}}"#
        );
        // Key order of the original is untouched
        assert_eq!(a.keys().unwrap().next(), Some("t"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Document::parse(r#"{"a":1"#),
            Err(DocumentError::Parse(_))
        ));
        assert!(matches!(Document::parse("[1,]"), Err(DocumentError::Parse(_))));
    }

    #[test]
    fn test_parse_rejects_floats() {
        assert!(matches!(
            Document::parse(r#"{"gas":1.5}"#),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_huge_integers() {
        assert!(Document::parse("18446744073709551615").is_err());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "test:\n  env:\n    currentNumber: 1\n    currentCoinbase: '0x2adc25665018aa1fe0e6bc666dac8fc2697ff9ba'\n  list:\n    - a\n    - 2\n";
        let doc = Document::parse_yaml(yaml).unwrap();
        let env = doc.get("test").unwrap().get("env").unwrap();
        assert_eq!(env.get("currentNumber").unwrap().as_int().unwrap(), 1);
        let keys: Vec<_> = env.keys().unwrap().collect();
        assert_eq!(keys, vec!["currentNumber", "currentCoinbase"]);
        assert_eq!(doc.get("test").unwrap().get("list").unwrap().len(), 2);
    }

    #[test]
    fn test_yaml_numeric_keys() {
        let doc = Document::parse_yaml("1: one\n").unwrap();
        assert_eq!(doc.get("1").unwrap().as_str().unwrap(), "one");
    }

    #[test]
    fn test_json_value_conversion() {
        let value = serde_json::json!({"b": "0x01", "a": [1, 2]});
        let doc = Document::from_json_value(value.clone()).unwrap();
        assert_eq!(doc.to_json_value(), value);
    }
}
