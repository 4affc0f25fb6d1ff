//! Schema constraints shared by every driver
//!
//! A schema bundles the properties a caller may constrain independently of
//! the storage format: rank, data type, domain, chunk layout, codec, fill
//! value and dimension units. All rank-bearing members must agree.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::chunk_layout::ChunkLayout;
use crate::codec::Codec;
use crate::domain::{parse_rank, resolve_rank, IndexDomain};
use crate::error::ValidationResult;
use crate::nested::map_leaves;
use crate::types::{DataType, Unit};
use crate::validation::reader::{parse_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<IndexDomain>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_layout: Option<ChunkLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,
    /// Scalar or broadcastable nested array, coerced to `dtype` when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<Value>,
    /// One entry per dimension; `null` leaves a dimension unitless
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_units: Option<Vec<Option<Unit>>>,
    #[serde(skip)]
    effective_rank: Option<usize>,
}

fn parse_dimension_unit(value: &Value, ctx: &ValidationContext) -> ValidationResult<Option<Unit>> {
    if value.is_null() {
        Ok(None)
    } else {
        Unit::from_value(value, ctx).map(Some)
    }
}

impl Schema {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let rank = reader.optional("rank", parse_rank)?;
        let dtype = reader.optional("dtype", DataType::from_value)?;
        let domain = reader.optional("domain", IndexDomain::from_value)?;
        let chunk_layout = reader.optional("chunk_layout", ChunkLayout::from_value)?;
        let codec = reader.optional("codec", Codec::from_value)?;
        let fill_value = reader.optional("fill_value", |v, c| match dtype {
            Some(dtype) => coerce_fill_value(dtype, v, c),
            None => Ok(v.clone()),
        })?;
        let dimension_units = reader.optional("dimension_units", |v, c| parse_vec(v, c, parse_dimension_unit))?;
        reader.finish()?;

        let effective_rank = resolve_rank(
            ctx,
            rank,
            &[
                ("domain", domain.as_ref().map(IndexDomain::rank)),
                ("chunk_layout", chunk_layout.as_ref().and_then(ChunkLayout::rank)),
                ("dimension_units", dimension_units.as_ref().map(Vec::len)),
            ],
        )?;

        Ok(Self {
            rank,
            dtype,
            domain,
            chunk_layout,
            codec,
            fill_value,
            dimension_units,
            effective_rank,
        })
    }

    /// Rank implied by the explicit rank or any rank-bearing member
    pub fn effective_rank(&self) -> Option<usize> {
        self.effective_rank
    }

    /// Whether two schemas can describe the same array: every property
    /// constrained by both must agree
    pub fn is_compatible_with(&self, other: &Schema) -> bool {
        fn agree<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        agree(self.effective_rank, other.effective_rank)
            && agree(self.dtype, other.dtype)
            && agree(
                self.domain.as_ref().and_then(IndexDomain::shape),
                other.domain.as_ref().and_then(IndexDomain::shape),
            )
            && agree(self.codec.as_ref().map(Codec::driver), other.codec.as_ref().map(Codec::driver))
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Coerce every leaf of a fill value to `dtype`
pub fn coerce_fill_value(dtype: DataType, value: &Value, ctx: &ValidationContext) -> ValidationResult<Value> {
    if dtype == DataType::Json {
        return Ok(value.clone());
    }
    map_leaves(value, ctx, &|leaf, c| dtype.coerce_value(leaf, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(doc: Value) -> ValidationResult<Schema> {
        Schema::from_value(&doc, &ValidationContext::default().child("schema"))
    }

    #[test]
    fn test_effective_rank_from_members() {
        let parsed = schema(json!({
            "dtype": "uint16",
            "domain": {"shape": [100, 200]},
            "chunk_layout": {"inner_order": [1, 0]},
            "dimension_units": ["4nm", null]
        }))
        .unwrap();
        assert_eq!(parsed.effective_rank(), Some(2));
        assert_eq!(parsed.dimension_units.as_ref().unwrap()[0], Some(Unit::new(4.0, "nm")));
    }

    #[test]
    fn test_rank_mismatch_is_batched() {
        let err = schema(json!({
            "rank": 3,
            "domain": {"shape": [1, 2]},
            "dimension_units": ["nm"]
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.schema");
        match err.kind {
            ErrorKind::RankMismatch { rank, mismatches } => {
                assert_eq!(rank, 3);
                assert_eq!(mismatches.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rank_bounds() {
        assert!(schema(json!({"rank": 32})).is_ok());
        assert!(schema(json!({"rank": 33})).is_err());
    }

    #[test]
    fn test_fill_value_is_coerced() {
        let parsed = schema(json!({"dtype": "int8", "fill_value": 3.0})).unwrap();
        assert_eq!(parsed.fill_value, Some(json!(3)));

        let err = schema(json!({"dtype": "uint8", "fill_value": 256})).unwrap_err();
        assert_eq!(err.kind.name(), "DTypeCoercionError");
        assert_eq!(err.path, "$.schema.fill_value");

        let parsed = schema(json!({"dtype": "float32", "fill_value": [0.5, "NaN"]})).unwrap();
        assert_eq!(parsed.fill_value, Some(json!([0.5, "NaN"])));
    }

    #[test]
    fn test_compatibility() {
        let a = schema(json!({"dtype": "uint8", "domain": {"shape": [10, 10]}})).unwrap();
        let b = schema(json!({"rank": 2})).unwrap();
        let c = schema(json!({"dtype": "int8"})).unwrap();
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
        assert!(Schema::default().is_empty());
    }

    #[test]
    fn test_serializes_set_fields_only() {
        let parsed = schema(json!({"dtype": "uint8", "dimension_units": [[2.0, "um"], null]})).unwrap();
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!({"dtype": "uint8", "dimension_units": [[2.0, "um"], null]})
        );
    }
}
