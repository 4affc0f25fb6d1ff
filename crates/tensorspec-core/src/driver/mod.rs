//! Driver specs and the top-level dispatcher
//!
//! A spec document is a discriminated union keyed by `driver`. Dispatch
//! checks the discriminator against a fixed registry, then hands the whole
//! document to the selected driver's validator.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod array;
pub mod auto;
pub mod base;
pub mod chunked;
pub mod n5;
pub mod neuroglancer;
pub mod tiff;
pub mod zarr;
pub mod zarr3;

pub use array::ArraySpec;
pub use auto::AutoSpec;
pub use base::SpecBase;
pub use chunked::{join_paths, ChunkedOptions};
pub use n5::{N5Metadata, N5Spec};
pub use neuroglancer::{MultiscaleMetadata, NeuroglancerSpec, ScaleMetadata};
pub use tiff::TiffSpec;
pub use zarr::{ZarrDType, ZarrField, ZarrMetadata, ZarrSpec};
pub use zarr3::{ChunkGrid, ChunkKeyEncoding, Zarr3Metadata, Zarr3Spec};

use crate::error::{Error, ErrorKind, Result, ValidationError, ValidationResult};
use crate::kvstore::KvStoreSpec;
use crate::types::{DataType, ReadWriteMode};
use crate::validation::reader::type_name;
use crate::validation::{ValidationContext, ValidationMode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Registered drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Array,
    Auto,
    N5,
    NeuroglancerPrecomputed,
    Tiff,
    Zarr,
    Zarr3,
}

impl DriverKind {
    /// Every registered driver, sorted by name
    pub const ALL: [DriverKind; 7] = [
        Self::Array,
        Self::Auto,
        Self::N5,
        Self::NeuroglancerPrecomputed,
        Self::Tiff,
        Self::Zarr,
        Self::Zarr3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Auto => "auto",
            Self::N5 => "n5",
            Self::NeuroglancerPrecomputed => "neuroglancer_precomputed",
            Self::Tiff => "tiff",
            Self::Zarr => "zarr",
            Self::Zarr3 => "zarr3",
        }
    }

    pub fn registered_names() -> Vec<String> {
        Self::ALL.iter().map(|kind| kind.as_str().to_string()).collect()
    }

    /// Whether the driver stores chunks under `kvstore` + `path` with open-mode flags
    pub fn is_chunked(&self) -> bool {
        matches!(self, Self::N5 | Self::NeuroglancerPrecomputed | Self::Zarr | Self::Zarr3)
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverKind {
    type Err = ErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ErrorKind::UnknownDriver {
                driver: s.to_string(),
                registered: Self::registered_names(),
            })
    }
}

/// A validated spec, one variant per driver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum TensorStoreSpec {
    Array(ArraySpec),
    Auto(AutoSpec),
    N5(N5Spec),
    NeuroglancerPrecomputed(NeuroglancerSpec),
    Tiff(TiffSpec),
    Zarr(ZarrSpec),
    Zarr3(Zarr3Spec),
}

impl TensorStoreSpec {
    /// Validate a spec document rooted at `ctx`
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let Value::Object(map) = value else {
            return Err(ctx.error(ErrorKind::InvalidType {
                expected: "object".to_string(),
                actual: type_name(value).to_string(),
            }));
        };
        let kind = match map.get("driver") {
            Some(Value::String(name)) if !name.is_empty() => name
                .parse::<DriverKind>()
                .map_err(|kind| ctx.error(kind).with_document(value.clone()))?,
            _ => return Err(ctx.error(ErrorKind::MissingDiscriminator).with_document(value.clone())),
        };
        debug!(driver = %kind, mode = %ctx.mode, "dispatching spec");

        let driver_ctx = ctx.with_driver(kind.as_str());
        let result = match kind {
            DriverKind::Array => ArraySpec::from_value(value, &driver_ctx).map(Self::Array),
            DriverKind::Auto => AutoSpec::from_value(value, &driver_ctx).map(Self::Auto),
            DriverKind::N5 => N5Spec::from_value(value, &driver_ctx).map(Self::N5),
            DriverKind::NeuroglancerPrecomputed => {
                NeuroglancerSpec::from_value(value, &driver_ctx).map(Self::NeuroglancerPrecomputed)
            }
            DriverKind::Tiff => TiffSpec::from_value(value, &driver_ctx).map(Self::Tiff),
            DriverKind::Zarr => ZarrSpec::from_value(value, &driver_ctx).map(Self::Zarr),
            DriverKind::Zarr3 => Zarr3Spec::from_value(value, &driver_ctx).map(Self::Zarr3),
        };
        result.map_err(|err| {
            let document = locate(value, &ctx.path, &err.path).clone();
            err.with_driver(kind.as_str()).with_document(document)
        })
    }

    pub fn kind(&self) -> DriverKind {
        match self {
            Self::Array(_) => DriverKind::Array,
            Self::Auto(_) => DriverKind::Auto,
            Self::N5(_) => DriverKind::N5,
            Self::NeuroglancerPrecomputed(_) => DriverKind::NeuroglancerPrecomputed,
            Self::Tiff(_) => DriverKind::Tiff,
            Self::Zarr(_) => DriverKind::Zarr,
            Self::Zarr3(_) => DriverKind::Zarr3,
        }
    }

    pub fn driver(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Fields shared by every driver
    pub fn base(&self) -> &SpecBase {
        match self {
            Self::Array(spec) => &spec.base,
            Self::Auto(spec) => &spec.base,
            Self::N5(spec) => &spec.base,
            Self::NeuroglancerPrecomputed(spec) => &spec.base,
            Self::Tiff(spec) => &spec.base,
            Self::Zarr(spec) => &spec.base,
            Self::Zarr3(spec) => &spec.base,
        }
    }

    /// Options of chunked drivers
    pub fn chunked(&self) -> Option<&ChunkedOptions> {
        match self {
            Self::N5(spec) => Some(&spec.store),
            Self::NeuroglancerPrecomputed(spec) => Some(&spec.store),
            Self::Zarr(spec) => Some(&spec.store),
            Self::Zarr3(spec) => Some(&spec.store),
            Self::Array(_) | Self::Auto(_) | Self::Tiff(_) => None,
        }
    }

    pub fn kvstore(&self) -> Option<&KvStoreSpec> {
        match self {
            Self::Auto(spec) => Some(&spec.kvstore),
            Self::Tiff(spec) => Some(&spec.kvstore),
            other => other.chunked().map(|store| &store.kvstore),
        }
    }

    /// Rank declared by the common fields, else implied by driver data
    pub fn rank(&self) -> Option<usize> {
        self.base().rank().or_else(|| match self {
            Self::Array(spec) => Some(spec.shape().len()),
            Self::N5(spec) => spec.metadata.as_ref().and_then(N5Metadata::rank),
            Self::NeuroglancerPrecomputed(_) => Some(neuroglancer::VOLUME_RANK),
            Self::Zarr(spec) => spec.rank(),
            Self::Zarr3(spec) => spec.metadata.as_ref().and_then(Zarr3Metadata::rank),
            Self::Auto(_) | Self::Tiff(_) => None,
        })
    }

    /// Element type declared by the common fields, else recorded in metadata
    pub fn dtype(&self) -> Option<DataType> {
        self.base().dtype().or_else(|| match self {
            Self::N5(spec) => spec.metadata.as_ref().and_then(|m| m.data_type),
            Self::NeuroglancerPrecomputed(spec) => spec.multiscale_metadata.as_ref().and_then(|m| m.data_type),
            Self::Zarr(spec) => spec.data_type(),
            Self::Zarr3(spec) => spec.metadata.as_ref().and_then(|m| m.data_type),
            Self::Array(_) | Self::Auto(_) | Self::Tiff(_) => None,
        })
    }

    /// Location of the data within the kvstore
    pub fn effective_path(&self) -> Option<String> {
        match self {
            Self::Tiff(spec) => Some(spec.effective_path()),
            Self::Auto(spec) => Some(spec.kvstore.path().unwrap_or("").to_string()),
            other => other.chunked().map(ChunkedOptions::effective_path),
        }
    }

    /// Access an open of this spec needs
    pub fn required_access(&self) -> ReadWriteMode {
        match self {
            Self::Array(_) => ReadWriteMode::ReadWrite,
            Self::Auto(_) | Self::Tiff(_) => ReadWriteMode::Read,
            other => other
                .chunked()
                .map_or(ReadWriteMode::Read, ChunkedOptions::required_access),
        }
    }

    /// Canonical JSON form
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Merge `patch` into the top level of the canonical form and validate
    /// the result from scratch. `null` members remove the field.
    pub fn with_updates(&self, patch: &Value, mode: ValidationMode) -> Result<Self> {
        let ctx = ValidationContext::new(mode);
        let Value::Object(updates) = patch else {
            return Err(Error::Validation(ctx.error(ErrorKind::InvalidType {
                expected: "object".to_string(),
                actual: type_name(patch).to_string(),
            })));
        };
        let mut document = self.to_value()?;
        if let Value::Object(fields) = &mut document {
            for (key, value) in updates {
                if value.is_null() {
                    fields.remove(key);
                } else {
                    fields.insert(key.clone(), value.clone());
                }
            }
        }
        trace!(driver = self.driver(), fields = updates.len(), "re-validating updated spec");
        Ok(Self::from_value(&document, &ctx)?)
    }
}

impl TryFrom<Value> for TensorStoreSpec {
    type Error = ValidationError;

    fn try_from(value: Value) -> ValidationResult<Self> {
        Self::from_value(&value, &ValidationContext::default())
    }
}

impl<'de> Deserialize<'de> for TensorStoreSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for KvStoreSpec {
    type Error = ValidationError;

    fn try_from(value: Value) -> ValidationResult<Self> {
        Self::from_value(&value, &ValidationContext::default())
    }
}

impl<'de> Deserialize<'de> for KvStoreSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Split `$.a.b[2].c` into its keys and indices, relative to `root`
fn segments<'a>(root: &str, path: &'a str) -> Vec<Segment<'a>> {
    let mut rest = path.strip_prefix(root).unwrap_or("");
    let mut out = Vec::new();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('[') {
            let Some(end) = after.find(']') else { break };
            match after[..end].parse() {
                Ok(index) => out.push(Segment::Index(index)),
                Err(_) => break,
            }
            rest = &after[end + 1..];
        } else if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', '[']).unwrap_or(after.len());
            out.push(Segment::Key(&after[..end]));
            rest = &after[end..];
        } else {
            break;
        }
    }
    out
}

/// The value at `path`, or its deepest existing ancestor
fn locate<'v>(document: &'v Value, root: &str, path: &str) -> &'v Value {
    let mut current = document;
    for segment in segments(root, path) {
        let next = match segment {
            Segment::Key(key) => current.get(key),
            Segment::Index(index) => current.get(index),
        };
        match next {
            Some(value) => current = value,
            None => break,
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn spec(doc: Value) -> ValidationResult<TensorStoreSpec> {
        TensorStoreSpec::from_value(&doc, &ValidationContext::default())
    }

    #[test]
    fn test_registry_is_sorted_and_parses() {
        let names = DriverKind::registered_names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        for kind in DriverKind::ALL {
            assert_eq!(kind.as_str().parse::<DriverKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_missing_discriminator() {
        for doc in [json!({}), json!({"driver": 3}), json!({"driver": ""})] {
            let err = spec(doc).unwrap_err();
            assert_eq!(err.kind, ErrorKind::MissingDiscriminator);
            assert_eq!(err.path, "$");
        }
        let err = spec(json!(["array"])).unwrap_err();
        assert_eq!(err.kind.name(), "InvalidType");
    }

    #[test]
    fn test_unknown_driver() {
        let err = spec(json!({"driver": "unknown_x"})).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnknownDriver {
                driver: "unknown_x".to_string(),
                registered: DriverKind::registered_names(),
            }
        );
        assert!(err.to_string().contains("neuroglancer_precomputed"));
    }

    #[test]
    fn test_errors_carry_driver_and_sub_document() {
        let err = spec(json!({
            "driver": "n5",
            "kvstore": "memory://",
            "metadata": {"dimensions": [10, 10], "blockSize": [5, 5, 5]}
        }))
        .unwrap_err();
        assert_eq!(err.driver.as_deref(), Some("n5"));
        assert_eq!(err.document, Some(json!({"dimensions": [10, 10], "blockSize": [5, 5, 5]})));

        let err = spec(json!({"driver": "zarr", "path": "x.zarr"})).unwrap_err();
        assert_eq!(err.document, Some(json!({"driver": "zarr", "path": "x.zarr"})));
    }

    #[test]
    fn test_locate_walks_indices() {
        let doc = json!({"a": {"b": [1, {"c": true}]}});
        assert_eq!(locate(&doc, "$", "$.a.b[1].c"), &json!(true));
        assert_eq!(locate(&doc, "$", "$.a.missing.deeper"), &json!({"b": [1, {"c": true}]}));
    }

    #[test]
    fn test_accessors() {
        let parsed = spec(json!({
            "driver": "zarr3",
            "kvstore": "s3://bucket/root/",
            "path": "image",
            "create": true,
            "metadata": {"shape": [4, 4], "data_type": "uint16"}
        }))
        .unwrap();
        assert_eq!(parsed.driver(), "zarr3");
        assert_eq!(parsed.rank(), Some(2));
        assert_eq!(parsed.dtype(), Some(DataType::Uint16));
        assert_eq!(parsed.effective_path().as_deref(), Some("root/image"));
        assert_eq!(parsed.required_access(), ReadWriteMode::ReadWrite);
        assert_eq!(parsed.kvstore().map(KvStoreSpec::driver), Some("s3"));
    }

    #[test]
    fn test_with_updates_revalidates() {
        let parsed = spec(json!({"driver": "array", "array": [1, 2, 3], "dtype": "int32"})).unwrap();
        let updated = parsed
            .with_updates(&json!({"array": [[1, 2], [3, 4]]}), ValidationMode::Strict)
            .unwrap();
        assert_eq!(updated.rank(), Some(2));

        let err = parsed
            .with_updates(&json!({"dtype": "uint8", "array": [-1]}), ValidationMode::Strict)
            .unwrap_err();
        assert_eq!(err.kind().map(ErrorKind::name), Some("DTypeCoercionError"));

        let err = parsed.with_updates(&json!({"dtype": null}), ValidationMode::Strict).unwrap_err();
        assert_eq!(err.kind().map(ErrorKind::name), Some("MissingRequiredField"));
    }

    #[test]
    fn test_deserialize_goes_through_validation() {
        assert!(serde_json::from_str::<TensorStoreSpec>(r#"{"driver": "memory"}"#).is_err());

        let parsed: TensorStoreSpec =
            serde_json::from_value(json!({"driver": "tiff", "kvstore": "memory://"})).unwrap();
        assert_eq!(parsed.driver(), "tiff");

        let kvstore: KvStoreSpec = serde_json::from_value(json!("file:///data")).unwrap();
        assert_eq!(kvstore.driver(), "file");
    }
}
