//! Whole-tree rewriting passes applied to test documents before use

use crate::error::{DocumentError, DocumentResult};
use crate::value::{Document, Object};
use retest_primitives::{canonical_hex, canonical_int, HexError, HexKind};

/// Key prefix marking an annotation entry
pub const COMMENT_PREFIX: &str = "//";

impl Document {
    /// Remove every object entry whose key starts with [`COMMENT_PREFIX`],
    /// at any depth, including objects nested inside arrays.
    pub fn strip_comments(&mut self) {
        match self {
            Document::Object(object) => {
                object.retain(|key, _| !key.starts_with(COMMENT_PREFIX));
                for child in object.values_mut() {
                    child.strip_comments();
                }
            }
            Document::Array(items) => {
                for child in items.iter_mut() {
                    child.strip_comments();
                }
            }
            _ => {}
        }
    }

    /// Rewrite the values of designated fields, found by key name anywhere in
    /// the tree, to canonical hex.
    ///
    /// A designated field holding an object (a storage map) has both its keys
    /// and its values canonicalized; one holding an array is canonicalized
    /// element by element. Running the pass twice yields the same tree.
    pub fn canonicalize_hex_fields(&mut self, fields: &[(&str, HexKind)]) -> DocumentResult<()> {
        match self {
            Document::Object(object) => {
                for (key, child) in object.iter_mut() {
                    match fields.iter().find(|(name, _)| *name == key.as_str()) {
                        Some((_, kind)) => canonicalize_value(key, child, *kind)?,
                        None => child.canonicalize_hex_fields(fields)?,
                    }
                }
                Ok(())
            }
            Document::Array(items) => {
                for child in items.iter_mut() {
                    child.canonicalize_hex_fields(fields)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn canonical_scalar(key: &str, value: &Document, kind: HexKind) -> DocumentResult<Option<String>> {
    let hex_err = |source: HexError| DocumentError::Hex {
        key: key.to_string(),
        source,
    };
    match value {
        Document::String(s) => canonical_hex(s, kind).map(Some).map_err(hex_err),
        Document::Integer(i) => canonical_int(*i, kind).map(Some).map_err(hex_err),
        _ => Ok(None),
    }
}

fn canonicalize_value(key: &str, value: &mut Document, kind: HexKind) -> DocumentResult<()> {
    match value {
        Document::Object(object) => {
            let mut rewritten = Object::with_capacity(object.len());
            for (slot, inner) in std::mem::take(object) {
                let slot = canonical_hex(&slot, kind).map_err(|source| DocumentError::Hex {
                    key: format!("{}.{}", key, slot),
                    source,
                })?;
                if rewritten.contains_key(&slot) {
                    return Err(DocumentError::DuplicateKey(format!("{}.{}", key, slot)));
                }
                let inner = match canonical_scalar(key, &inner, kind)? {
                    Some(hex) => Document::String(hex),
                    None => inner,
                };
                rewritten.insert(slot, inner);
            }
            *object = rewritten;
        }
        Document::Array(items) => {
            for item in items.iter_mut() {
                if let Some(hex) = canonical_scalar(key, item, kind)? {
                    *item = Document::String(hex);
                }
            }
        }
        other => {
            if let Some(hex) = canonical_scalar(key, other, kind)? {
                *other = Document::String(hex);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_nested() {
        let mut doc = Document::parse(
            r#"{"//top":1,"a":{"//inner":"x","b":[{"//deep":null,"c":1}]},"d":"//not a key"}"#,
        )
        .unwrap();
        doc.strip_comments();
        assert_eq!(doc.serialize(), r#"{"a":{"b":[{"c":1}]},"d":"//not a key"}"#);
    }

    #[test]
    fn test_canonicalize_fields() {
        let mut doc = Document::parse(
            r#"{"pre":{"0xA94F5374FCE5EDBC8E2A8697C15331677E6EBF0B":{"balance":"1000","nonce":0,"code":"0x6001","storage":{"0x1":"0xFF"}}}}"#,
        )
        .unwrap();
        let fields = [
            ("balance", HexKind::Quantity),
            ("nonce", HexKind::Quantity),
            ("code", HexKind::Bytes),
            ("storage", HexKind::Quantity),
        ];
        doc.canonicalize_hex_fields(&fields).unwrap();
        let account = doc
            .get("pre")
            .unwrap()
            .get("0xA94F5374FCE5EDBC8E2A8697C15331677E6EBF0B")
            .unwrap();
        assert_eq!(account.get("balance").unwrap().as_str().unwrap(), "0x03e8");
        assert_eq!(account.get("nonce").unwrap().as_str().unwrap(), "0x00");
        assert_eq!(account.get("code").unwrap().as_str().unwrap(), "0x6001");
        assert_eq!(
            account.get("storage").unwrap().get("0x01").unwrap().as_str().unwrap(),
            "0xff"
        );

        let once = doc.serialize();
        doc.canonicalize_hex_fields(&fields).unwrap();
        assert_eq!(doc.serialize(), once);
    }

    #[test]
    fn test_canonicalize_rejects_colliding_keys() {
        let mut doc = Document::parse(r#"{"storage":{"0x1":"0x05","0x01":"0x06"}}"#).unwrap();
        let err = doc
            .canonicalize_hex_fields(&[("storage", HexKind::Quantity)])
            .unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateKey(ref key) if key == "storage.0x01"));
    }

    #[test]
    fn test_canonicalize_reports_field() {
        let mut doc = Document::parse(r#"{"balance":"banana"}"#).unwrap();
        let err = doc
            .canonicalize_hex_fields(&[("balance", HexKind::Quantity)])
            .unwrap_err();
        assert!(matches!(err, DocumentError::Hex { ref key, .. } if key == "balance"));
    }
}
