//! Test file discovery, reading and `_info` metadata

use retest_crypto::source_hash;
use retest_document::Document;
use retest_primitives::H256;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SuiteError, SuiteResult};

/// Key of the metadata block leading every compiled test entry
pub const INFO_KEY: &str = "_info";

/// Version string written into `_info`
pub const TOOL_VERSION: &str = concat!("retest-", env!("CARGO_PKG_VERSION"));

/// Compiler version written into `_info`; sources carry compiled code only
pub const COMPILER_VERSION: &str = "none";

/// A parsed test file and the fingerprint of its original content
#[derive(Debug, Clone)]
pub struct TestFileData {
    /// Parsed document
    pub data: Document,
    /// Keccak-256 of the compact serialization, taken before any rewriting
    pub hash: H256,
}

/// Files directly in `dir` with one of `extensions`, sorted by name.
///
/// A non-empty `stems` keeps only files whose stem is listed. A missing
/// directory yields no files.
pub fn get_files(dir: &Path, extensions: &[&str], stems: &[String]) -> SuiteResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!("Directory not found: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|want| want.trim_start_matches('.') == e));
        if !ext_ok {
            continue;
        }
        if !stems.is_empty() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if !stems.iter().any(|s| s == stem) {
                continue;
            }
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Read and parse a `.json` or `.yml` test file
pub fn read_test_file(path: &Path) -> SuiteResult<TestFileData> {
    let raw = fs::read_to_string(path)?;
    let data = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Document::parse(&raw)?,
        Some("yml") | Some("yaml") => Document::parse_yaml(&raw)?,
        _ => {
            return Err(SuiteError::Schema(format!(
                "unknown test format: {}",
                path.display()
            )))
        }
    };
    let hash = source_hash(&data.serialize_canonical());
    Ok(TestFileData { data, hash })
}

/// Check that every entry of `compiled` was generated from the current
/// content of `source`
pub fn check_filler_hash(compiled: &Path, source: &Path) -> SuiteResult<()> {
    let tests = Document::parse(&fs::read_to_string(compiled)?)?;
    let filler = read_test_file(source)?;

    let entries = tests.as_object().map_err(|_| {
        SuiteError::Schema(format!("{} must map test names to tests", compiled.display()))
    })?;
    for (name, entry) in entries {
        if !entry.is_object() {
            return Err(SuiteError::Schema(format!(
                "{} should contain an object under a test name",
                name
            )));
        }
        let info = entry.lookup(INFO_KEY).ok_or_else(|| {
            SuiteError::Stale(format!("_info section not set! {} in {}", compiled.display(), name))
        })?;
        let recorded = info.lookup("sourceHash").ok_or_else(|| {
            SuiteError::Stale(format!("sourceHash not found in {} in {}", compiled.display(), name))
        })?;
        let recorded = H256::from_hex(recorded.as_str()?)
            .map_err(|e| SuiteError::Stale(format!("{} in {}: {}", compiled.display(), name, e)))?;
        if recorded != filler.hash {
            return Err(SuiteError::Stale(format!(
                "Test {} in {} is outdated. Filler hash is different! ( '{}' != '{}')",
                compiled.display(),
                name,
                recorded.short_hex(4),
                filler.hash.short_hex(4)
            )));
        }
    }
    Ok(())
}

/// Put a fresh `_info` block first in every entry of a filled document.
///
/// An existing `comment` is kept.
pub fn add_client_info(
    output: &mut Document,
    source: &str,
    hash: &H256,
    client_version: &str,
) -> SuiteResult<()> {
    for (name, entry) in output.as_object_mut()?.iter_mut() {
        if !entry.is_object() {
            return Err(SuiteError::Schema(format!("filled test {} is not an object", name)));
        }
        let comment = entry
            .lookup(INFO_KEY)
            .and_then(|info| info.lookup("comment"))
            .and_then(|c| c.as_str().ok())
            .unwrap_or_default()
            .to_string();

        let mut info = Document::object();
        info.set("comment", comment)?;
        info.set("filling-rpc-server", client_version)?;
        info.set("filling-tool-version", TOOL_VERSION)?;
        info.set("compiler-version", COMPILER_VERSION)?;
        info.set("source", source)?;
        info.set("sourceHash", hash.to_plain_hex())?;

        entry.set(INFO_KEY, info)?;
        entry.reposition(INFO_KEY, 0)?;
    }
    Ok(())
}
