//! Physical units such as `"4nm"` or `[0.5, "s"]`

use crate::error::ValidationResult;
use crate::validation::reader::{describe, type_name};
use crate::validation::ValidationContext;
use regex::Regex;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn unit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([-+]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][-+]?[0-9]+)?)?\s*(.*?)\s*$")
            .expect("unit pattern is a valid regex")
    })
}

/// A multiplier applied to a base unit
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub multiplier: f64,
    pub base_unit: String,
}

impl Unit {
    pub fn new<U: Into<String>>(multiplier: f64, base_unit: U) -> Self {
        Self {
            multiplier,
            base_unit: base_unit.into(),
        }
    }

    /// Accepts a number, a string with an optional leading number, or a
    /// `[multiplier, base_unit]` pair
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::Number(n) => {
                let multiplier = finite_multiplier(n.as_f64(), value, ctx)?;
                Ok(Self::new(multiplier, ""))
            }
            Value::String(s) => {
                let unit: Self = s
                    .parse()
                    .map_err(|reason: String| ctx.invalid_value("unit string such as \"4nm\"", reason))?;
                finite_multiplier(Some(unit.multiplier), value, ctx)?;
                Ok(unit)
            }
            Value::Array(items) => match items.as_slice() {
                [Value::Number(n), Value::String(base)] => {
                    let multiplier = finite_multiplier(n.as_f64(), value, ctx)?;
                    Ok(Self::new(multiplier, base.trim()))
                }
                _ => Err(ctx.invalid_value("[multiplier, base_unit]", describe(value))),
            },
            other => Err(ctx.invalid_value("number, string or [multiplier, base_unit]", type_name(other))),
        }
    }
}

/// Non-finite multipliers would serialize as `null`
fn finite_multiplier(multiplier: Option<f64>, value: &Value, ctx: &ValidationContext) -> ValidationResult<f64> {
    multiplier
        .filter(|m| m.is_finite())
        .ok_or_else(|| ctx.invalid_value("finite multiplier", describe(value)))
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = unit_pattern()
            .captures(s)
            .ok_or_else(|| format!("\"{}\"", s))?;
        let multiplier = match captures.get(1) {
            Some(m) => m
                .as_str()
                .parse::<f64>()
                .map_err(|_| format!("\"{}\"", s))?,
            None => 1.0,
        };
        let base_unit = captures.get(2).map_or("", |m| m.as_str());
        Ok(Self::new(multiplier, base_unit))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.multiplier == 1.0, self.base_unit.is_empty()) {
            (true, true) => Ok(()),
            (true, false) => f.write_str(&self.base_unit),
            (false, true) => write!(f, "{}", self.multiplier),
            (false, false) => write!(f, "{}{}", self.multiplier, self.base_unit),
        }
    }
}

impl Serialize for Unit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.multiplier)?;
        tuple.serialize_element(&self.base_unit)?;
        tuple.end()
    }
}
