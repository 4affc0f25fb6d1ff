//! Element data types
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::reader::{describe, parse_string};
use crate::validation::ValidationContext;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Array element data type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Bool,
    Int4,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float8E3m4,
    Float8E4m3fn,
    Float8E4m3fnuz,
    Float8E4m3b11fnuz,
    Float8E5m2,
    Float8E5m2fnuz,
    Float16,
    Bfloat16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    Ustring,
    Json,
}

impl DataType {
    pub const ALL: [DataType; 25] = [
        DataType::Bool,
        DataType::Int4,
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Uint8,
        DataType::Uint16,
        DataType::Uint32,
        DataType::Uint64,
        DataType::Float8E3m4,
        DataType::Float8E4m3fn,
        DataType::Float8E4m3fnuz,
        DataType::Float8E4m3b11fnuz,
        DataType::Float8E5m2,
        DataType::Float8E5m2fnuz,
        DataType::Float16,
        DataType::Bfloat16,
        DataType::Float32,
        DataType::Float64,
        DataType::Complex64,
        DataType::Complex128,
        DataType::String,
        DataType::Ustring,
        DataType::Json,
    ];

    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Float8E3m4 => "float8_e3m4",
            Self::Float8E4m3fn => "float8_e4m3fn",
            Self::Float8E4m3fnuz => "float8_e4m3fnuz",
            Self::Float8E4m3b11fnuz => "float8_e4m3b11fnuz",
            Self::Float8E5m2 => "float8_e5m2",
            Self::Float8E5m2fnuz => "float8_e5m2fnuz",
            Self::Float16 => "float16",
            Self::Bfloat16 => "bfloat16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::String => "string",
            Self::Ustring => "ustring",
            Self::Json => "json",
        }
    }

    /// Inclusive value range of integer types
    pub fn integer_range(&self) -> Option<(i128, i128)> {
        let range = match self {
            Self::Int4 => (-8, 7),
            Self::Int8 => (i8::MIN as i128, i8::MAX as i128),
            Self::Int16 => (i16::MIN as i128, i16::MAX as i128),
            Self::Int32 => (i32::MIN as i128, i32::MAX as i128),
            Self::Int64 => (i64::MIN as i128, i64::MAX as i128),
            Self::Uint8 => (0, u8::MAX as i128),
            Self::Uint16 => (0, u16::MAX as i128),
            Self::Uint32 => (0, u32::MAX as i128),
            Self::Uint64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(range)
    }

    /// Largest finite magnitude of floating-point and complex types
    pub fn max_finite(&self) -> Option<f64> {
        let max = match self {
            Self::Float8E3m4 => 15.5,
            Self::Float8E4m3fn => 448.0,
            Self::Float8E4m3fnuz => 240.0,
            Self::Float8E4m3b11fnuz => 30.0,
            Self::Float8E5m2 | Self::Float8E5m2fnuz => 57344.0,
            Self::Float16 => 65504.0,
            Self::Bfloat16 => 3.389_531_389_251_535_5e38,
            Self::Float32 | Self::Complex64 => f32::MAX as f64,
            Self::Float64 | Self::Complex128 => f64::MAX,
            _ => return None,
        };
        Some(max)
    }

    pub fn is_integer(&self) -> bool {
        self.integer_range().is_some()
    }

    pub fn is_float(&self) -> bool {
        self.max_finite().is_some() && !self.is_complex()
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }

    /// Convert a JSON scalar to this type's canonical JSON form; `None` when
    /// the value cannot be represented
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            Self::Bool => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::Number(n) => match n.as_u64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                _ => None,
            },
            Self::String | Self::Ustring => value.is_string().then(|| value.clone()),
            Self::Json => (!value.is_array()).then(|| value.clone()),
            _ if self.is_integer() => self.coerce_integer(value),
            _ => self.coerce_float(value),
        }
    }

    fn coerce_integer(&self, value: &Value) -> Option<Value> {
        let (min, max) = self.integer_range()?;
        let Value::Number(n) = value else {
            return None;
        };
        let exact = if let Some(i) = n.as_i64() {
            i as i128
        } else if let Some(u) = n.as_u64() {
            u as i128
        } else {
            let f = n.as_f64()?;
            if f.fract() != 0.0 || !f.is_finite() || f.abs() > 1.8e19 {
                return None;
            }
            f as i128
        };
        if exact < min || exact > max {
            return None;
        }
        if exact < 0 {
            Some(Value::Number(Number::from(exact as i64)))
        } else {
            Some(Value::Number(Number::from(exact as u64)))
        }
    }

    fn coerce_float(&self, value: &Value) -> Option<Value> {
        let max = self.max_finite()?;
        match value {
            Value::Number(n) => {
                let f = n.as_f64()?;
                (f.abs() <= max).then(|| value.clone())
            }
            Value::String(s) if matches!(s.as_str(), "NaN" | "Infinity" | "-Infinity") => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    /// Parse a dtype from JSON, reporting unknown names as unsupported
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let name = parse_string(value, ctx)?;
        name.parse().map_err(|_| {
            ctx.error(ErrorKind::UnsupportedDType {
                dtype: name,
                allowed: Self::ALL.iter().map(|d| d.as_str().to_string()).collect(),
            })
        })
    }

    /// Parse a dtype name that must belong to a format's allow-list
    pub fn parse_allowed(value: &Value, ctx: &ValidationContext, allowed: &[DataType]) -> ValidationResult<Self> {
        let name = parse_string(value, ctx)?;
        match name.parse::<Self>() {
            Ok(dtype) if allowed.contains(&dtype) => Ok(dtype),
            _ => Err(ctx.error(ErrorKind::UnsupportedDType {
                dtype: name,
                allowed: allowed.iter().map(|d| d.as_str().to_string()).collect(),
            })),
        }
    }

    /// Fail with [`ErrorKind::UnsupportedDType`] unless this type is in `allowed`
    pub fn check_allowed(&self, allowed: &[DataType], ctx: &ValidationContext) -> ValidationResult<()> {
        if allowed.contains(self) {
            Ok(())
        } else {
            Err(ctx.error(ErrorKind::UnsupportedDType {
                dtype: self.as_str().to_string(),
                allowed: allowed.iter().map(|d| d.as_str().to_string()).collect(),
            }))
        }
    }

    /// Coerce a scalar, failing with [`ErrorKind::DTypeCoercionError`]
    pub fn coerce_value(&self, value: &Value, ctx: &ValidationContext) -> ValidationResult<Value> {
        self.coerce(value).ok_or_else(|| {
            ctx.error(ErrorKind::DTypeCoercionError {
                dtype: self.as_str().to_string(),
                value: describe(value),
            })
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("unknown data type '{}'", s))
    }
}

impl Serialize for DataType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_allowed() {
        let ctx = ValidationContext::default().child("dataType");
        let allowed = [DataType::Uint8, DataType::Float32];
        assert_eq!(DataType::parse_allowed(&json!("uint8"), &ctx, &allowed).unwrap(), DataType::Uint8);
        for name in ["int16", "quaternion"] {
            let err = DataType::parse_allowed(&json!(name), &ctx, &allowed).unwrap_err();
            assert_eq!(
                err.kind,
                ErrorKind::UnsupportedDType {
                    dtype: name.to_string(),
                    allowed: vec!["uint8".to_string(), "float32".to_string()],
                }
            );
        }
    }

    #[test]
    fn test_names_round_trip() {
        for dtype in DataType::ALL {
            assert_eq!(dtype.as_str().parse::<DataType>().unwrap(), dtype);
            assert_eq!(serde_json::to_value(dtype).unwrap(), json!(dtype.as_str()));
        }
    }

    #[test]
    fn test_unknown_name_is_unsupported() {
        let ctx = ValidationContext::default();
        let err = DataType::from_value(&json!("int128"), &ctx).unwrap_err();
        assert_eq!(err.kind.name(), "UnsupportedDType");
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(DataType::Uint8.coerce(&json!(255)), Some(json!(255)));
        assert_eq!(DataType::Uint8.coerce(&json!(256)), None);
        assert_eq!(DataType::Uint8.coerce(&json!(-1)), None);
        assert_eq!(DataType::Int4.coerce(&json!(-8)), Some(json!(-8)));
        assert_eq!(DataType::Int4.coerce(&json!(8)), None);
        assert_eq!(DataType::Int32.coerce(&json!(2.0)), Some(json!(2)));
        assert_eq!(DataType::Int32.coerce(&json!(2.5)), None);
        assert_eq!(DataType::Int32.coerce(&json!("3")), None);
        assert_eq!(DataType::Uint64.coerce(&json!(u64::MAX)), Some(json!(u64::MAX)));
    }

    #[test]
    fn test_float_coercion() {
        assert_eq!(DataType::Float16.coerce(&json!(65504.0)), Some(json!(65504.0)));
        assert_eq!(DataType::Float16.coerce(&json!(70000.0)), None);
        assert_eq!(DataType::Float32.coerce(&json!("NaN")), Some(json!("NaN")));
        assert_eq!(DataType::Float64.coerce(&json!(true)), None);
    }

    #[test]
    fn test_bool_and_string_coercion() {
        assert_eq!(DataType::Bool.coerce(&json!(1)), Some(json!(true)));
        assert_eq!(DataType::Bool.coerce(&json!(2)), None);
        assert_eq!(DataType::String.coerce(&json!("a")), Some(json!("a")));
        assert_eq!(DataType::String.coerce(&json!(1)), None);
        assert_eq!(DataType::Json.coerce(&json!({"a": 1})), Some(json!({"a": 1})));
    }

    #[test]
    fn test_check_allowed() {
        let ctx = ValidationContext::default();
        let allowed = [DataType::Uint8];
        assert!(DataType::Uint8.check_allowed(&allowed, &ctx).is_ok());
        let err = DataType::Float32.check_allowed(&allowed, &ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnsupportedDType {
                dtype: "float32".to_string(),
                allowed: vec!["uint8".to_string()]
            }
        );
    }
}
