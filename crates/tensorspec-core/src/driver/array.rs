//! In-memory array driver

use super::base::{DriverConstraints, SpecBase};
use crate::error::{ErrorKind, ValidationResult};
use crate::nested::{map_leaves, shape_of};
use crate::types::ContextResource;
use crate::validation::reader::ObjectReader;
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// An array held inline as nested JSON lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArraySpec {
    #[serde(flatten)]
    pub base: SpecBase,
    /// Elements coerced to the declared dtype
    pub array: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_copy_concurrency: Option<ContextResource>,
    #[serde(skip)]
    shape: Vec<usize>,
}

impl ArraySpec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let data = reader.required("array", |v, _| Ok(v))?;
        let data_copy_concurrency =
            reader.optional("data_copy_concurrency", ContextResource::for_field("data_copy_concurrency"))?;
        reader.finish()?;

        let dtype = base.dtype().ok_or_else(|| {
            ctx.child("dtype").error(ErrorKind::MissingRequiredField {
                field: "dtype".to_string(),
            })
        })?;
        let array_ctx = ctx.child("array");
        let shape = shape_of(data, &array_ctx)?;
        let array = map_leaves(data, &array_ctx, &|leaf, c| dtype.coerce_value(leaf, c))?;
        debug!(dtype = %dtype, shape = ?shape, "validated inline array");

        base.check_constraints(
            &DriverConstraints {
                stored_rank: Some(("array", shape.len())),
                ..Default::default()
            },
            ctx,
        )?;

        Ok(Self {
            base,
            array,
            data_copy_concurrency,
            shape,
        })
    }

    /// Extent of each dimension of the data
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use crate::validation::ValidationMode;
    use serde_json::json;

    fn array(doc: Value) -> ValidationResult<ArraySpec> {
        ArraySpec::from_value(&doc, &ValidationContext::default().with_driver("array"))
    }

    #[test]
    fn test_shape_and_coercion() {
        let spec = array(json!({"driver": "array", "array": [[1, 2, 3], [4, 5, 6]], "dtype": "int32"})).unwrap();
        assert_eq!(spec.shape(), &[2, 3]);
        assert_eq!(spec.base.dtype(), Some(DataType::Int32));

        let spec = array(json!({"driver": "array", "array": [1.0, 2.0], "dtype": "uint8"})).unwrap();
        assert_eq!(spec.array, json!([1, 2]));
    }

    #[test]
    fn test_scalar_has_rank_zero() {
        let spec = array(json!({"array": 5, "dtype": "int64"})).unwrap();
        assert!(spec.shape().is_empty());
    }

    #[test]
    fn test_dtype_is_required() {
        let err = array(json!({"array": [1, 2]})).unwrap_err();
        assert_eq!(err.path, "$.dtype");
        assert_eq!(
            err.kind,
            ErrorKind::MissingRequiredField {
                field: "dtype".to_string()
            }
        );
        assert!(array(json!({"array": [1, 2], "schema": {"dtype": "int8"}})).is_ok());
    }

    #[test]
    fn test_coercion_errors_locate_the_element() {
        let err = array(json!({"array": [[1, 2], [3, 300]], "dtype": "int8"})).unwrap_err();
        assert_eq!(err.path, "$.array[1][1]");
        assert_eq!(
            err.kind,
            ErrorKind::DTypeCoercionError {
                dtype: "int8".to_string(),
                value: "300".to_string()
            }
        );
        assert!(array(json!({"array": ["a"], "dtype": "float32"})).is_err());
    }

    #[test]
    fn test_schema_rank_must_match_data() {
        let err = array(json!({"array": [[1, 2], [3, 4]], "dtype": "int32", "schema": {"rank": 3}})).unwrap_err();
        assert_eq!(err.kind.name(), "RankMismatch");
        assert_eq!(err.driver.as_deref(), Some("array"));

        let basic = ValidationContext::new(ValidationMode::Basic);
        let doc = json!({"array": [[1, 2], [3, 4]], "dtype": "int32", "schema": {"rank": 3}});
        assert!(ArraySpec::from_value(&doc, &basic).is_ok());
    }
}
