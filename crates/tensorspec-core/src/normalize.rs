//! Shorthand expansion applied before union dispatch
//!
//! Several spec positions accept a bare string in place of an object:
//! codec descriptors (`"gzip"` for `{"type": "gzip"}`) and kvstores
//! (`"s3://bucket/path"`). These passes rewrite the shorthand into the
//! canonical object so that discriminator lookup only ever sees objects.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::ValidationContext;
use serde_json::{Map, Value};
use std::borrow::Cow;
use tracing::trace;

/// `"name"` becomes `{tag: "name"}`; other values pass through
pub fn expand_tag_shorthand<'a>(value: &'a Value, tag: &str) -> Cow<'a, Value> {
    match value {
        Value::String(name) => {
            trace!(tag, name = %name, "expanding codec shorthand");
            let mut map = Map::new();
            map.insert(tag.to_string(), Value::String(name.clone()));
            Cow::Owned(Value::Object(map))
        }
        other => Cow::Borrowed(other),
    }
}

/// Parse a kvstore URL into its structured form
///
/// - `file://<path>` gives `{driver: "file", path}`
/// - `memory://` or `memory://<path>` gives `{driver: "memory"[, path]}`
/// - `s3://<bucket>[/<path>]` gives `{driver: "s3", bucket[, path]}`
///
/// Returns `None` for any other form.
pub fn parse_kvstore_url(url: &str) -> Option<Map<String, Value>> {
    let mut map = Map::new();
    let mut put = |key: &str, value: &str| {
        map.insert(key.to_string(), Value::String(value.to_string()));
    };
    if let Some(path) = url.strip_prefix("file://") {
        put("driver", "file");
        put("path", path);
    } else if let Some(path) = url.strip_prefix("memory://") {
        put("driver", "memory");
        if !path.is_empty() {
            put("path", path);
        }
    } else if let Some(rest) = url.strip_prefix("s3://") {
        let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return None;
        }
        put("driver", "s3");
        put("bucket", bucket);
        if !path.is_empty() {
            put("path", path);
        }
    } else {
        return None;
    }
    Some(map)
}

/// Expand a kvstore URL string; objects pass through unchanged
pub fn expand_kvstore_shorthand<'a>(value: &'a Value, ctx: &ValidationContext) -> ValidationResult<Cow<'a, Value>> {
    match value {
        Value::String(url) => {
            let map = parse_kvstore_url(url).ok_or_else(|| {
                ctx.error(ErrorKind::InvalidKvStoreString { value: url.clone() })
            })?;
            trace!(url = %url, "expanded kvstore URL");
            Ok(Cow::Owned(Value::Object(map)))
        }
        other => Ok(Cow::Borrowed(other)),
    }
}
