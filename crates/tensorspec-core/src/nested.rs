//! Nested JSON arrays treated as dense multi-dimensional data

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::ValidationContext;
use serde_json::Value;

/// Shape of a rectangular nested array; a scalar has shape `[]`
///
/// Fails with [`ErrorKind::IrregularArrayShape`] when siblings at some depth
/// differ in length or mix scalars with sub-arrays, and with
/// [`ErrorKind::InvalidValue`] when any dimension is empty.
pub fn shape_of(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<usize>> {
    let mut shape = Vec::new();
    let mut cursor = value;
    while let Value::Array(items) = cursor {
        if items.is_empty() {
            return Err(ctx.invalid_value("non-empty nested array", "[]"));
        }
        shape.push(items.len());
        cursor = &items[0];
    }
    check_node(value, &shape, 0, ctx)?;
    Ok(shape)
}

fn check_node(value: &Value, shape: &[usize], depth: usize, ctx: &ValidationContext) -> ValidationResult<()> {
    match (value, shape.get(depth)) {
        (Value::Array(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(ctx.error(ErrorKind::IrregularArrayShape {
                    depth,
                    reason: format!("expected {} elements, found {}", expected, items.len()),
                }));
            }
            for (i, item) in items.iter().enumerate() {
                check_node(item, shape, depth + 1, &ctx.child_index(i))?;
            }
            Ok(())
        }
        (Value::Array(_), None) => Err(ctx.error(ErrorKind::IrregularArrayShape {
            depth,
            reason: "expected a scalar, found a nested array".to_string(),
        })),
        (_, Some(_)) => Err(ctx.error(ErrorKind::IrregularArrayShape {
            depth,
            reason: "expected a nested array, found a scalar".to_string(),
        })),
        (_, None) => Ok(()),
    }
}

/// Rebuild a nested array of known shape, transforming every leaf
pub fn map_leaves<F>(value: &Value, ctx: &ValidationContext, f: &F) -> ValidationResult<Value>
where
    F: Fn(&Value, &ValidationContext) -> ValidationResult<Value>,
{
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| map_leaves(item, &ctx.child_index(i), f))
            .collect::<ValidationResult<Vec<_>>>()
            .map(Value::Array),
        leaf => f(leaf, ctx),
    }
}
