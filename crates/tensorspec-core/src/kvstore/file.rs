//! Local filesystem key-value store
//!
//! The root path is normalized on validation: `~` expands to the home
//! directory, relative paths resolve against the working directory, and
//! `.`/`..` segments are folded lexically. A trailing `/` is kept.

use crate::error::{ErrorKind, ValidationResult};
use crate::types::ContextResource;
use crate::validation::reader::{parse_string, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileKvStore {
    /// Absolute, normalized root directory
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_io_concurrency: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_io_sync: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_io_mode: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_io_locking: Option<ContextResource>,
}

impl FileKvStore {
    pub(crate) fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        Ok(Self {
            path: reader.required("path", parse_root_path)?,
            file_io_concurrency: reader.optional("file_io_concurrency", ContextResource::for_field("file_io_concurrency"))?,
            file_io_sync: reader.optional("file_io_sync", ContextResource::for_field("file_io_sync"))?,
            file_io_mode: reader.optional("file_io_mode", ContextResource::for_field("file_io_mode"))?,
            file_io_locking: reader.optional("file_io_locking", ContextResource::for_field("file_io_locking"))?,
        })
    }
}

fn parse_root_path(value: &Value, ctx: &ValidationContext) -> ValidationResult<String> {
    let raw = parse_string(value, ctx)?;
    let normalized = normalize_path(&raw).map_err(|reason| {
        ctx.error(ErrorKind::InvalidPath {
            path: raw.clone(),
            reason,
        })
    })?;
    trace!(raw = %raw, normalized = %normalized, "normalized file kvstore path");
    Ok(normalized)
}

/// Expand `~`, make absolute and fold `.`/`..` segments
pub fn normalize_path(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("path must not be empty".to_string());
    }

    let expanded = if raw == "~" || raw.starts_with("~/") {
        let home = dirs::home_dir().ok_or_else(|| "home directory is unavailable".to_string())?;
        home.join(raw.trim_start_matches('~').trim_start_matches('/'))
    } else {
        PathBuf::from(raw)
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|e| format!("cannot resolve working directory: {}", e))?;
        cwd.join(expanded)
    };

    let mut text = fold_segments(&absolute)
        .into_os_string()
        .into_string()
        .map_err(|_| "path is not valid UTF-8".to_string())?;
    if raw.ends_with('/') && !text.ends_with('/') {
        text.push('/');
    }
    Ok(text)
}

fn fold_segments(path: &Path) -> PathBuf {
    let mut folded = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other.as_os_str()),
        }
    }
    folded
}
