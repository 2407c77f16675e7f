//! Property and fixture tests for the document model

use proptest::prelude::*;
use retest_document::{Document, HexKind, Object, COMMENT_PREFIX};

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
        "//[a-z ]{0,6}",
        "0x[0-9a-f]{1,6}",
    ]
}

fn document() -> impl Strategy<Value = Document> {
    let leaf = prop_oneof![
        Just(Document::Null),
        any::<bool>().prop_map(Document::Bool),
        any::<i64>().prop_map(Document::Integer),
        "[ -~]{0,12}".prop_map(Document::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Document::Array),
            prop::collection::vec((key(), inner), 0..6).prop_map(|entries| {
                let mut object = Object::new();
                for (k, v) in entries {
                    object.insert(k, v);
                }
                Document::Object(object)
            }),
        ]
    })
}

fn has_comment_key(doc: &Document) -> bool {
    match doc {
        Document::Object(o) => o
            .iter()
            .any(|(k, v)| k.starts_with(COMMENT_PREFIX) || has_comment_key(v)),
        Document::Array(a) => a.iter().any(has_comment_key),
        _ => false,
    }
}

proptest! {
    #[test]
    fn serialize_parse_roundtrip_is_stable(doc in document()) {
        let once = doc.serialize();
        let reparsed = Document::parse(&once).unwrap();
        prop_assert_eq!(reparsed.serialize(), once);
        prop_assert_eq!(reparsed, doc);
    }

    #[test]
    fn pretty_output_parses_back(doc in document()) {
        let reparsed = Document::parse(&doc.serialize_pretty()).unwrap();
        prop_assert_eq!(reparsed.serialize(), doc.serialize());
    }

    #[test]
    fn comment_stripping_is_total(mut doc in document()) {
        doc.strip_comments();
        prop_assert!(!has_comment_key(&doc));
    }

    #[test]
    fn storage_canonicalization_is_idempotent(
        slots in prop::collection::vec(("0x[0-9a-fA-F]{1,8}", "0x[0-9a-fA-F]{0,8}"), 0..6)
    ) {
        let mut storage = Object::new();
        for (k, v) in slots {
            storage.insert(k, Document::String(v));
        }
        let mut doc = Document::object();
        doc.set("storage", Document::Object(storage)).unwrap();

        let fields = [("storage", HexKind::Quantity)];
        doc.canonicalize_hex_fields(&fields).unwrap();
        let once = doc.serialize();
        doc.canonicalize_hex_fields(&fields).unwrap();
        prop_assert_eq!(doc.serialize(), once);
    }
}

#[test]
fn yaml_and_json_fillers_agree() {
    let json = Document::parse(
        r#"{"add11":{"env":{"currentNumber":1},"pre":{"0x095e7baea6a6c7c4c2dfeb977efac326af552d87":{"balance":"1000000000000000000","nonce":"0"}}}}"#,
    )
    .unwrap();
    let yaml = Document::parse_yaml(
        "add11:\n  env:\n    currentNumber: 1\n  pre:\n    '0x095e7baea6a6c7c4c2dfeb977efac326af552d87':\n      balance: '1000000000000000000'\n      nonce: '0'\n",
    )
    .unwrap();
    assert_eq!(json, yaml);
}

#[test]
fn info_block_can_be_moved_first() {
    let mut entry = Document::parse(r#"{"env":{},"pre":{},"post":{}}"#).unwrap();
    entry.set("_info", Document::object()).unwrap();
    entry.reposition("_info", 0).unwrap();
    assert_eq!(entry.serialize(), r#"{"_info":{},"env":{},"pre":{},"post":{}}"#);
}
