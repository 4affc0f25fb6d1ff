//! Field readers for untyped JSON objects
//!
//! [`ObjectReader`] walks a JSON object field by field, remembers which keys
//! were consumed and, depending on the validation mode, rejects or drops the
//! rest. The free functions below parse leaf values and report the JSON path
//! of the offending value.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::ValidationContext;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Reader over the fields of one JSON object
pub struct ObjectReader<'a> {
    map: &'a Map<String, Value>,
    ctx: &'a ValidationContext,
    seen: BTreeSet<&'a str>,
}

impl<'a> ObjectReader<'a> {
    /// Fails with [`ErrorKind::InvalidType`] unless `value` is an object
    pub fn new(value: &'a Value, ctx: &'a ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                map,
                ctx,
                seen: BTreeSet::new(),
            }),
            other => Err(ctx.error(ErrorKind::InvalidType {
                expected: "object".to_string(),
                actual: type_name(other).to_string(),
            })),
        }
    }

    pub fn context(&self) -> &'a ValidationContext {
        self.ctx
    }

    /// Whether the key is present with a non-null value
    pub fn contains(&self, key: &str) -> bool {
        self.map.get(key).is_some_and(|v| !v.is_null())
    }

    /// Mark a key as consumed without reading it
    pub fn skip(&mut self, key: &str) {
        if let Some((k, _)) = self.map.get_key_value(key) {
            self.seen.insert(k.as_str());
        }
    }

    /// Consume a key; `null` reads as absent
    pub fn raw(&mut self, key: &str) -> Option<&'a Value> {
        self.raw_nullable(key).filter(|v| !v.is_null())
    }

    /// Consume a key, keeping an explicit `null`
    pub fn raw_nullable(&mut self, key: &str) -> Option<&'a Value> {
        let (k, v) = self.map.get_key_value(key)?;
        self.seen.insert(k.as_str());
        Some(v)
    }

    /// Parse a field that must be present
    pub fn required<T, F>(&mut self, key: &str, parse: F) -> ValidationResult<T>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> ValidationResult<T>,
    {
        match self.raw(key) {
            Some(value) => parse(value, &self.ctx.child(key)),
            None => Err(self.ctx.child(key).error(ErrorKind::MissingRequiredField {
                field: key.to_string(),
            })),
        }
    }

    /// Parse a field that may be absent or `null`
    pub fn optional<T, F>(&mut self, key: &str, parse: F) -> ValidationResult<Option<T>>
    where
        F: FnOnce(&'a Value, &ValidationContext) -> ValidationResult<T>,
    {
        match self.raw(key) {
            Some(value) => parse(value, &self.ctx.child(key)).map(Some),
            None => Ok(None),
        }
    }

    fn unread(&self) -> impl Iterator<Item = (&'a String, &'a Value)> + '_ {
        self.map
            .iter()
            .filter(|(key, _)| !self.seen.contains(key.as_str()))
    }

    /// Finish a closed object: strict mode rejects unread keys, the other
    /// modes drop them
    pub fn finish(self) -> ValidationResult<()> {
        for (key, _) in self.unread() {
            if self.ctx.is_strict() {
                return Err(self.ctx.child(key).error(ErrorKind::UnknownField {
                    field: key.clone(),
                }));
            }
            warn!(path = %self.ctx.path, field = %key, "dropping unknown field");
        }
        Ok(())
    }

    /// Finish an open object, returning unread keys for round-tripping
    pub fn into_extras(self) -> BTreeMap<String, Value> {
        self.unread()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// JSON type name used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Compact rendering of a value for error messages
pub fn describe(value: &Value) -> String {
    let text = value.to_string();
    if text.chars().count() > 64 {
        let head: String = text.chars().take(61).collect();
        format!("{}...", head)
    } else {
        text
    }
}

fn type_error(value: &Value, ctx: &ValidationContext, expected: &str) -> crate::ValidationError {
    ctx.error(ErrorKind::InvalidType {
        expected: expected.to_string(),
        actual: type_name(value).to_string(),
    })
}

pub fn parse_bool(value: &Value, ctx: &ValidationContext) -> ValidationResult<bool> {
    value.as_bool().ok_or_else(|| type_error(value, ctx, "boolean"))
}

pub fn parse_string(value: &Value, ctx: &ValidationContext) -> ValidationResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| type_error(value, ctx, "string"))
}

pub fn parse_non_empty_string(value: &Value, ctx: &ValidationContext) -> ValidationResult<String> {
    let s = parse_string(value, ctx)?;
    if s.is_empty() {
        return Err(ctx.invalid_value("non-empty string", "\"\""));
    }
    Ok(s)
}

pub fn parse_i64(value: &Value, ctx: &ValidationContext) -> ValidationResult<i64> {
    value.as_i64().ok_or_else(|| type_error(value, ctx, "integer"))
}

pub fn parse_u64(value: &Value, ctx: &ValidationContext) -> ValidationResult<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let n = parse_i64(value, ctx)?;
    Err(ctx.invalid_value("non-negative integer", n.to_string()))
}

pub fn parse_usize(value: &Value, ctx: &ValidationContext) -> ValidationResult<usize> {
    let n = parse_u64(value, ctx)?;
    usize::try_from(n).map_err(|_| ctx.invalid_value("integer that fits in usize", n.to_string()))
}

pub fn parse_positive_u64(value: &Value, ctx: &ValidationContext) -> ValidationResult<u64> {
    let n = parse_i64(value, ctx)?;
    if n <= 0 {
        return Err(ctx.invalid_value("positive integer", n.to_string()));
    }
    Ok(n as u64)
}

pub fn parse_f64(value: &Value, ctx: &ValidationContext) -> ValidationResult<f64> {
    value.as_f64().ok_or_else(|| type_error(value, ctx, "number"))
}

/// Parse a JSON array, validating each element at `path[i]`
pub fn parse_vec<T, F>(value: &Value, ctx: &ValidationContext, item: F) -> ValidationResult<Vec<T>>
where
    F: Fn(&Value, &ValidationContext) -> ValidationResult<T>,
{
    let items = value.as_array().ok_or_else(|| type_error(value, ctx, "array"))?;
    items
        .iter()
        .enumerate()
        .map(|(i, v)| item(v, &ctx.child_index(i)))
        .collect()
}

pub fn parse_i64_vec(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<i64>> {
    parse_vec(value, ctx, parse_i64)
}

pub fn parse_positive_vec(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<u64>> {
    parse_vec(value, ctx, parse_positive_u64)
}

pub fn parse_string_vec(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<String>> {
    parse_vec(value, ctx, parse_string)
}

/// Parse a string restricted to a closed set of values
pub fn parse_one_of(value: &Value, ctx: &ValidationContext, allowed: &[&str]) -> ValidationResult<String> {
    let s = parse_string(value, ctx)?;
    if allowed.contains(&s.as_str()) {
        Ok(s)
    } else {
        Err(ctx.invalid_value(format!("one of {}", allowed.join(", ")), format!("\"{}\"", s)))
    }
}

/// Fail with [`ErrorKind::ParameterOutOfRange`] unless `min <= actual <= max`
pub fn check_range(
    ctx: &ValidationContext,
    variant: &str,
    field: &str,
    actual: i64,
    min: i64,
    max: i64,
) -> ValidationResult<()> {
    if (min..=max).contains(&actual) {
        Ok(())
    } else {
        Err(ctx.error(ErrorKind::ParameterOutOfRange {
            variant: variant.to_string(),
            field: field.to_string(),
            min,
            max,
            actual,
        }))
    }
}

/// Read an integer field and check it against a documented interval
pub fn parse_bounded(
    value: &Value,
    ctx: &ValidationContext,
    variant: &str,
    field: &str,
    min: i64,
    max: i64,
) -> ValidationResult<i64> {
    let n = parse_i64(value, ctx)?;
    check_range(ctx, variant, field, n, min, max)?;
    Ok(n)
}
