//! Options shared by drivers that store chunks in a key-value store

use crate::error::ValidationResult;
use crate::kvstore::KvStoreSpec;
use crate::types::{CacheRevalidation, ContextResource, OpenMode, ReadWriteMode};
use crate::validation::reader::{parse_string, ObjectReader};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkedOptions {
    pub kvstore: KvStoreSpec,
    /// Path relative to the kvstore
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(flatten)]
    pub open_mode: OpenMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck_cached_data: Option<CacheRevalidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recheck_cached_metadata: Option<CacheRevalidation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_pool: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_copy_concurrency: Option<ContextResource>,
}

impl ChunkedOptions {
    pub(crate) fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        Ok(Self {
            kvstore: reader.required("kvstore", KvStoreSpec::from_value)?,
            path: reader.optional("path", parse_string)?.unwrap_or_default(),
            open_mode: OpenMode::read(reader)?,
            recheck_cached_data: reader.optional("recheck_cached_data", CacheRevalidation::from_value)?,
            recheck_cached_metadata: reader.optional("recheck_cached_metadata", CacheRevalidation::from_value)?,
            cache_pool: reader.optional("cache_pool", ContextResource::for_field("cache_pool"))?,
            data_copy_concurrency: reader
                .optional("data_copy_concurrency", ContextResource::for_field("data_copy_concurrency"))?,
        })
    }

    /// The kvstore's path joined with the spec's path
    pub fn effective_path(&self) -> String {
        join_paths(self.kvstore.path().unwrap_or(""), &self.path)
    }

    pub fn required_access(&self) -> ReadWriteMode {
        self.open_mode.required_access()
    }
}

/// Join two key prefixes with exactly one `/` between them
pub fn join_paths(base: &str, path: &str) -> String {
    let joined = match (base.is_empty(), path.is_empty()) {
        (true, _) => path.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, path),
    };
    collapse_slashes(&joined)
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationContext;
    use serde_json::{json, Value};

    fn options(doc: Value) -> ValidationResult<ChunkedOptions> {
        let ctx = ValidationContext::default();
        let mut reader = ObjectReader::new(&doc, &ctx)?;
        ChunkedOptions::read(&mut reader)
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("a/", "/b"), "a/b");
        assert_eq!(join_paths("a", "b"), "a/b");
        assert_eq!(join_paths("", "b/"), "b/");
        assert_eq!(join_paths("a/", ""), "a/");
    }

    #[test]
    fn test_join_paths_collapses_slashes_without_base() {
        assert_eq!(join_paths("", "a//b.zarr"), "a/b.zarr");
        assert_eq!(join_paths("", "a//b.zarr"), join_paths("a/", "/b.zarr"));
        assert_eq!(join_paths("", "/a/"), "/a/");
        assert_eq!(join_paths("/images//", "slice.tif"), "/images/slice.tif");
    }

    #[test]
    fn test_effective_path() {
        let parsed = options(json!({"kvstore": "s3://bucket/prefix/", "path": "/array.zarr"})).unwrap();
        assert_eq!(parsed.effective_path(), "prefix/array.zarr");

        let parsed = options(json!({"kvstore": {"driver": "memory"}})).unwrap();
        assert_eq!(parsed.effective_path(), "");
    }

    #[test]
    fn test_kvstore_is_required() {
        let err = options(json!({"path": "x.zarr"})).unwrap_err();
        assert_eq!(err.path, "$.kvstore");
        assert_eq!(err.kind.name(), "MissingRequiredField");
    }

    #[test]
    fn test_required_access() {
        let parsed = options(json!({"kvstore": "memory://", "create": true, "delete_existing": true})).unwrap();
        assert_eq!(parsed.required_access(), ReadWriteMode::ReadWrite);
        let parsed = options(json!({"kvstore": "memory://", "open": true})).unwrap();
        assert_eq!(parsed.required_access(), ReadWriteMode::Read);
    }

    #[test]
    fn test_open_mode_and_revalidation() {
        let err = options(json!({"kvstore": "memory://", "delete_existing": true})).unwrap_err();
        assert_eq!(err.kind.name(), "InvalidOpenModeCombination");
        assert!(options(json!({"kvstore": "memory://", "recheck_cached_data": "open"})).is_ok());
        assert!(options(json!({"kvstore": "memory://", "recheck_cached_metadata": -1})).is_err());
    }
}
