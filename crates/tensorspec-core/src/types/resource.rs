//! Context resources: shared cache pools, concurrency limits and flags
//!
//! A resource is either a reference to a named entry of the spec's
//! `context` (a string such as `"cache_pool#big"`) or an inline value.

use crate::error::ValidationResult;
use crate::validation::reader::{describe, parse_bool, parse_positive_u64, type_name, ObjectReader};
use crate::validation::ValidationContext;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource kinds with a typed representation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    CachePool,
    Concurrency,
    Flag,
    /// Any resource kind without a typed model
    Opaque,
}

impl ResourceKind {
    /// Kind of a context key, ignoring any `#id` suffix
    pub fn for_key(key: &str) -> Self {
        let base = key.split('#').next().unwrap_or(key);
        match base {
            "cache_pool" => Self::CachePool,
            "data_copy_concurrency"
            | "file_io_concurrency"
            | "http_request_concurrency"
            | "s3_request_concurrency"
            | "gcs_request_concurrency" => Self::Concurrency,
            "file_io_sync" | "file_io_locking_enabled" => Self::Flag,
            _ => Self::Opaque,
        }
    }
}

/// Cache pool limits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CachePool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes_limit: Option<u64>,
}

/// A concurrency limit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConcurrencyLimit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Inline resource value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    CachePool(CachePool),
    Concurrency(ConcurrencyLimit),
    Flag(bool),
    Opaque(Value),
}

/// A resource given inline or by reference
#[derive(Debug, Clone, PartialEq)]
pub enum ContextResource {
    Reference(String),
    Inline(Resource),
}

impl Serialize for ContextResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Reference(name) => serializer.serialize_str(name),
            Self::Inline(resource) => resource.serialize(serializer),
        }
    }
}

impl ContextResource {
    pub fn from_value(kind: ResourceKind, value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        if let Value::String(name) = value {
            if name.is_empty() {
                return Err(ctx.invalid_value("non-empty resource reference", "\"\""));
            }
            return Ok(Self::Reference(name.clone()));
        }
        let resource = match kind {
            ResourceKind::CachePool => Resource::CachePool(parse_cache_pool(value, ctx)?),
            ResourceKind::Concurrency => Resource::Concurrency(parse_concurrency(value, ctx)?),
            ResourceKind::Flag => Resource::Flag(parse_bool(value, ctx)?),
            ResourceKind::Opaque => Resource::Opaque(value.clone()),
        };
        Ok(Self::Inline(resource))
    }

    /// Parse a resource whose kind follows from the field name
    pub fn for_field(field: &'static str) -> impl Fn(&Value, &ValidationContext) -> ValidationResult<Self> {
        move |value, ctx| Self::from_value(ResourceKind::for_key(field), value, ctx)
    }
}

fn parse_cache_pool(value: &Value, ctx: &ValidationContext) -> ValidationResult<CachePool> {
    let mut reader = ObjectReader::new(value, ctx)?;
    let pool = CachePool {
        total_bytes_limit: reader.optional("total_bytes_limit", parse_positive_u64)?,
    };
    reader.finish()?;
    Ok(pool)
}

fn parse_concurrency(value: &Value, ctx: &ValidationContext) -> ValidationResult<ConcurrencyLimit> {
    match value {
        Value::Number(_) => Ok(ConcurrencyLimit {
            limit: Some(parse_positive_u64(value, ctx)?),
        }),
        Value::Object(_) => {
            let mut reader = ObjectReader::new(value, ctx)?;
            let limit = reader.optional("limit", parse_positive_u64)?;
            reader.finish()?;
            Ok(ConcurrencyLimit { limit })
        }
        other => Err(ctx.invalid_value("positive integer or {\"limit\": n}", type_name(other))),
    }
}

/// Named shared resources referenced from a spec
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context {
    pub resources: BTreeMap<String, ContextResource>,
}

impl Context {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let Value::Object(map) = value else {
            return Err(ctx.invalid_value("object", describe(value)));
        };
        let resources = map
            .iter()
            .map(|(key, entry)| {
                if key.is_empty() || key.starts_with('#') {
                    return Err(ctx.child(key).invalid_value("resource name", format!("\"{}\"", key)));
                }
                let resource = ContextResource::from_value(ResourceKind::for_key(key), entry, &ctx.child(key))?;
                Ok((key.clone(), resource))
            })
            .collect::<ValidationResult<BTreeMap<_, _>>>()?;
        Ok(Self { resources })
    }

    pub fn get(&self, key: &str) -> Option<&ContextResource> {
        self.resources.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_ignores_id_suffix() {
        assert_eq!(ResourceKind::for_key("cache_pool#remote"), ResourceKind::CachePool);
        assert_eq!(ResourceKind::for_key("data_copy_concurrency"), ResourceKind::Concurrency);
        assert_eq!(ResourceKind::for_key("aws_credentials"), ResourceKind::Opaque);
    }

    #[test]
    fn test_context_parses_typed_resources() {
        let ctx = ValidationContext::default();
        let context = Context::from_value(
            &json!({
                "cache_pool": {"total_bytes_limit": 100000000},
                "data_copy_concurrency": {"limit": 4},
                "file_io_concurrency": 8,
                "cache_pool#alias": "cache_pool",
                "aws_credentials": {"profile": "dev"}
            }),
            &ctx,
        )
        .unwrap();
        assert_eq!(
            context.get("file_io_concurrency"),
            Some(&ContextResource::Inline(Resource::Concurrency(ConcurrencyLimit { limit: Some(8) })))
        );
        assert_eq!(
            context.get("cache_pool#alias"),
            Some(&ContextResource::Reference("cache_pool".to_string()))
        );
        assert_eq!(
            serde_json::to_value(&context).unwrap()["file_io_concurrency"],
            json!({"limit": 8})
        );
    }

    #[test]
    fn test_limits_must_be_positive() {
        let ctx = ValidationContext::default();
        let err = Context::from_value(&json!({"cache_pool": {"total_bytes_limit": 0}}), &ctx).unwrap_err();
        assert_eq!(err.path, "$.cache_pool.total_bytes_limit");
        assert!(Context::from_value(&json!({"http_request_concurrency": {"limit": 0}}), &ctx).is_err());
        assert!(Context::from_value(&json!({"data_copy_concurrency": -2}), &ctx).is_err());
    }

    #[test]
    fn test_for_field_uses_field_kind() {
        let ctx = ValidationContext::default();
        let parse = ContextResource::for_field("cache_pool");
        assert!(parse(&json!({"total_bytes_limit": 10}), &ctx).is_ok());
        assert!(parse(&json!({"limit": 10}), &ctx).is_err());
    }
}
