//! Zarr v2 driver
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use super::base::{DriverConstraints, SpecBase};
use super::chunked::ChunkedOptions;
use crate::codec::zarr::{read_compressor, read_filters};
use crate::codec::{ZarrCompressor, ZarrFilter};
use crate::domain::resolve_rank;
use crate::error::{ErrorKind, ValidationResult};
use crate::types::DataType;
use crate::validation::reader::{
    parse_non_empty_string, parse_one_of, parse_positive_vec, parse_string, parse_u64, type_name, ObjectReader,
};
use crate::validation::ValidationContext;
use regex::Regex;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

/// Element kinds and sizes accepted in a NumPy type string
const TYPESTRS: [(&str, DataType); 14] = [
    ("b1", DataType::Bool),
    ("i1", DataType::Int8),
    ("i2", DataType::Int16),
    ("i4", DataType::Int32),
    ("i8", DataType::Int64),
    ("u1", DataType::Uint8),
    ("u2", DataType::Uint16),
    ("u4", DataType::Uint32),
    ("u8", DataType::Uint64),
    ("f2", DataType::Float16),
    ("f4", DataType::Float32),
    ("f8", DataType::Float64),
    ("c8", DataType::Complex64),
    ("c16", DataType::Complex128),
];

fn typestr_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([<>|])([biufc][0-9]+)$").expect("typestr pattern is a valid regex"))
}

/// Parse a NumPy type string such as `"<u2"` or `"|b1"`
fn parse_typestr(value: &Value, ctx: &ValidationContext) -> ValidationResult<(String, DataType)> {
    let typestr = parse_string(value, ctx)?;
    let unsupported = || {
        ctx.error(ErrorKind::UnsupportedDType {
            dtype: typestr.clone(),
            allowed: TYPESTRS.iter().map(|(code, _)| code.to_string()).collect(),
        })
    };
    let captures = typestr_pattern().captures(&typestr).ok_or_else(unsupported)?;
    let (order, code) = (&captures[1], &captures[2]);
    let dtype = TYPESTRS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, dtype)| *dtype)
        .ok_or_else(unsupported)?;
    let single_byte = matches!(code, "b1" | "i1" | "u1");
    if order == "|" && !single_byte {
        return Err(ctx.invalid_value("'<' or '>' byte order for multi-byte types", format!("\"{}\"", typestr)));
    }
    Ok((typestr, dtype))
}

/// One named field of a structured dtype
#[derive(Debug, Clone, PartialEq)]
pub struct ZarrField {
    pub name: String,
    pub typestr: String,
    pub data_type: DataType,
    /// Inner array shape; adds dimensions to the array's rank
    pub shape: Option<Vec<u64>>,
}

/// A zarr v2 dtype
#[derive(Debug, Clone, PartialEq)]
pub enum ZarrDType {
    Simple { typestr: String, data_type: DataType },
    Structured(Vec<ZarrField>),
}

impl ZarrDType {
    fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::String(_) => {
                let (typestr, data_type) = parse_typestr(value, ctx)?;
                Ok(Self::Simple { typestr, data_type })
            }
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(ctx.invalid_value("at least one field", "[]"));
                }
                let mut names = HashSet::new();
                let mut fields = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let field = parse_field(item, &ctx.child_index(i))?;
                    if !names.insert(field.name.clone()) {
                        return Err(ctx
                            .child_index(i)
                            .invalid_value("unique field name", format!("\"{}\"", field.name)));
                    }
                    fields.push(field);
                }
                Ok(Self::Structured(fields))
            }
            other => Err(ctx.error(ErrorKind::InvalidType {
                expected: "type string or field list".to_string(),
                actual: type_name(other).to_string(),
            })),
        }
    }
}

fn parse_field(value: &Value, ctx: &ValidationContext) -> ValidationResult<ZarrField> {
    let items = match value {
        Value::Array(items) if (2..=3).contains(&items.len()) => items,
        other => return Err(ctx.invalid_value("[name, typestr] or [name, typestr, shape]", type_name(other))),
    };
    let name = parse_non_empty_string(&items[0], &ctx.child_index(0))?;
    let (typestr, data_type) = parse_typestr(&items[1], &ctx.child_index(1))?;
    let shape = items
        .get(2)
        .map(|shape| parse_positive_vec(shape, &ctx.child_index(2)))
        .transpose()?;
    Ok(ZarrField {
        name,
        typestr,
        data_type,
        shape,
    })
}

impl Serialize for ZarrDType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Simple { typestr, .. } => serializer.serialize_str(typestr),
            Self::Structured(fields) => {
                let mut seq = serializer.serialize_seq(Some(fields.len()))?;
                for field in fields {
                    let mut entry = vec![Value::from(field.name.as_str()), Value::from(field.typestr.as_str())];
                    if let Some(shape) = &field.shape {
                        entry.push(Value::from(shape.clone()));
                    }
                    seq.serialize_element(&entry)?;
                }
                seq.end()
            }
        }
    }
}

/// `.zarray` metadata; unrecognized members are kept in `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZarrMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zarr_format: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<ZarrDType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressor: Option<Option<ZarrCompressor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Option<Vec<ZarrFilter>>>,
    /// `null` is kept: it means chunks are never implicitly filled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_separator: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    rank: Option<usize>,
}

impl ZarrMetadata {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let zarr_format = reader.optional("zarr_format", |v, c| {
            let format = parse_u64(v, c)?;
            if format != 2 {
                return Err(c.invalid_value("2", format.to_string()));
            }
            Ok(format)
        })?;
        let shape = reader.optional("shape", parse_positive_vec)?;
        let chunks = reader.optional("chunks", parse_positive_vec)?;
        let dtype = reader.optional("dtype", ZarrDType::from_value)?;
        let compressor = read_compressor(&mut reader)?;
        let filters = read_filters(&mut reader)?;
        let fill_value = reader.raw_nullable("fill_value").cloned();
        let order = reader.optional("order", |v, c| parse_one_of(v, c, &["C", "F"]))?;
        let dimension_separator = reader.optional("dimension_separator", |v, c| parse_one_of(v, c, &[".", "/"]))?;
        let extra = reader.into_extras();

        let rank = resolve_rank(
            ctx,
            None,
            &[
                ("shape", shape.as_ref().map(Vec::len)),
                ("chunks", chunks.as_ref().map(Vec::len)),
            ],
        )?;

        let fill_value = match (&dtype, fill_value) {
            (Some(ZarrDType::Simple { data_type, .. }), Some(fill)) if !fill.is_null() => {
                Some(data_type.coerce_value(&fill, &ctx.child("fill_value"))?)
            }
            (_, fill) => fill,
        };

        Ok(Self {
            zarr_format,
            shape,
            chunks,
            dtype,
            compressor,
            filters,
            fill_value,
            order,
            dimension_separator,
            extra,
            rank,
        })
    }

    /// Rank of the stored array, without any field dimensions
    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

/// Zarr v2 array spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZarrSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(flatten)]
    pub store: ChunkedOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ZarrMetadata>,
    /// Field of a structured dtype to expose
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ZarrSpec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let store = ChunkedOptions::read(&mut reader)?;
        let metadata = reader.optional("metadata", ZarrMetadata::from_value)?;
        let field = reader.optional("field", parse_non_empty_string)?;
        reader.finish()?;

        let spec = Self {
            base,
            store,
            metadata,
            field,
        };
        spec.check(ctx)?;
        Ok(spec)
    }

    fn selected_field(&self) -> Option<&ZarrField> {
        match (self.metadata.as_ref()?.dtype.as_ref()?, &self.field) {
            (ZarrDType::Structured(fields), Some(name)) => fields.iter().find(|f| &f.name == name),
            (ZarrDType::Structured(fields), None) => fields.first(),
            (ZarrDType::Simple { .. }, _) => None,
        }
    }

    /// Rank of the exposed array, counting subarray dimensions of the
    /// selected field
    pub fn rank(&self) -> Option<usize> {
        let field_rank = self.selected_field().and_then(|f| f.shape.as_ref()).map_or(0, Vec::len);
        self.metadata.as_ref()?.rank().map(|rank| rank + field_rank)
    }

    /// Element type recorded in the metadata for the exposed array
    pub fn data_type(&self) -> Option<DataType> {
        match self.metadata.as_ref()?.dtype.as_ref()? {
            ZarrDType::Simple { data_type, .. } => Some(*data_type),
            ZarrDType::Structured(_) => self.selected_field().map(|f| f.data_type),
        }
    }

    fn check(&self, ctx: &ValidationContext) -> ValidationResult<()> {
        let dtype = self.metadata.as_ref().and_then(|m| m.dtype.as_ref());
        let (stored_dtype, field_rank) = match (dtype, &self.field) {
            (Some(ZarrDType::Simple { data_type, .. }), None) => (Some(*data_type), 0),
            (Some(ZarrDType::Simple { .. }), Some(_)) => {
                return Err(ctx.child("field").invalid_value("structured metadata dtype", "simple dtype"));
            }
            (Some(ZarrDType::Structured(fields)), Some(name)) => {
                let field = fields.iter().find(|f| &f.name == name).ok_or_else(|| {
                    let known: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                    ctx.child("field")
                        .invalid_value(format!("one of {}", known.join(", ")), format!("\"{}\"", name))
                })?;
                (Some(field.data_type), field.shape.as_ref().map_or(0, Vec::len))
            }
            (Some(ZarrDType::Structured(fields)), None) if fields.len() > 1 && ctx.checks_cross_fields() => {
                return Err(ctx.child("field").error(ErrorKind::MissingRequiredField {
                    field: "field".to_string(),
                }));
            }
            (Some(ZarrDType::Structured(fields)), None) => (
                fields.first().map(|f| f.data_type),
                fields.first().and_then(|f| f.shape.as_ref()).map_or(0, Vec::len),
            ),
            (None, _) => (None, 0),
        };

        let stored_rank = self.metadata.as_ref().and_then(ZarrMetadata::rank).map(|rank| rank + field_rank);
        let allowed: Vec<DataType> = TYPESTRS.iter().map(|(_, dtype)| *dtype).collect();
        self.base.check_constraints(
            &DriverConstraints {
                dtypes: &allowed,
                stored_rank: stored_rank.map(|rank| ("metadata.shape", rank)),
                stored_dtype: stored_dtype.map(|dtype| ("metadata.dtype", dtype)),
                codec_driver: Some("zarr"),
            },
            ctx,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn zarr(doc: Value) -> ValidationResult<ZarrSpec> {
        ZarrSpec::from_value(&doc, &ValidationContext::default().with_driver("zarr"))
    }

    #[test]
    fn test_full_metadata() {
        let spec = zarr(json!({
            "driver": "zarr",
            "kvstore": {"driver": "memory"},
            "path": "x.zarr",
            "metadata": {
                "zarr_format": 2,
                "shape": [100, 100],
                "chunks": [10, 10],
                "dtype": "<u2",
                "compressor": {"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1},
                "filters": null,
                "fill_value": 0,
                "order": "C",
                "dimension_separator": "/",
                "custom": {"kept": true}
            }
        }))
        .unwrap();
        let metadata = spec.metadata.as_ref().unwrap();
        assert_eq!(metadata.rank(), Some(2));
        assert_eq!(metadata.filters, Some(None));
        assert_eq!(metadata.extra["custom"], json!({"kept": true}));
        assert_eq!(spec.store.effective_path(), "x.zarr");
    }

    #[test]
    fn test_typestrs() {
        let ctx = ValidationContext::default();
        assert_eq!(parse_typestr(&json!("|u1"), &ctx).unwrap().1, DataType::Uint8);
        assert_eq!(parse_typestr(&json!(">c16"), &ctx).unwrap().1, DataType::Complex128);
        assert_eq!(parse_typestr(&json!("<M8"), &ctx).unwrap_err().kind.name(), "UnsupportedDType");
        assert_eq!(parse_typestr(&json!("<f16"), &ctx).unwrap_err().kind.name(), "UnsupportedDType");
        assert!(parse_typestr(&json!("|f4"), &ctx).is_err());
    }

    #[test]
    fn test_chunks_rank() {
        let err = zarr(json!({
            "kvstore": "memory://",
            "metadata": {"shape": [10, 10], "chunks": [5]}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.metadata");
        assert_eq!(err.kind.name(), "RankMismatch");
    }

    #[test]
    fn test_structured_dtype_field() {
        let doc = |field: Option<&str>| {
            let mut doc = json!({
                "kvstore": "memory://",
                "metadata": {"shape": [4], "dtype": [["x", "<f4"], ["y", "<i2", [3]]]}
            });
            if let Some(field) = field {
                doc["field"] = json!(field);
            }
            doc
        };
        let spec = zarr(doc(Some("y"))).unwrap();
        assert_eq!(
            serde_json::to_value(&spec.metadata).unwrap()["dtype"],
            json!([["x", "<f4"], ["y", "<i2", [3]]])
        );
        assert!(zarr(doc(Some("z"))).is_err());
        assert_eq!(zarr(doc(None)).unwrap_err().kind.name(), "MissingRequiredField");

        let mut with_rank = doc(Some("y"));
        with_rank["rank"] = json!(2);
        assert!(zarr(with_rank).is_ok());
    }

    #[test]
    fn test_dtype_must_match_metadata() {
        let err = zarr(json!({
            "kvstore": "memory://",
            "dtype": "int16",
            "metadata": {"dtype": "<u2"}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.metadata.dtype");

        let err = zarr(json!({"kvstore": "memory://", "dtype": "string"})).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
    }

    #[test]
    fn test_fill_value_coercion() {
        let err = zarr(json!({
            "kvstore": "memory://",
            "metadata": {"dtype": "|u1", "fill_value": 1000}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.metadata.fill_value");
        let spec = zarr(json!({"kvstore": "memory://", "metadata": {"dtype": "<f4", "fill_value": null}})).unwrap();
        assert_eq!(spec.metadata.unwrap().fill_value, Some(Value::Null));
    }

    #[test]
    fn test_missing_kvstore() {
        let err = zarr(json!({"driver": "zarr", "path": "x.zarr"})).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MissingRequiredField {
                field: "kvstore".to_string()
            }
        );
    }
}
