//! Open-mode flags, access modes and cache revalidation policies

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::reader::{describe, parse_bool, ObjectReader};
use crate::validation::ValidationContext;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Flags controlling how a chunked store is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpenMode {
    #[serde(skip_serializing_if = "is_false")]
    pub open: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub create: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub delete_existing: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub assume_metadata: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub assume_cached_metadata: bool,
}

impl OpenMode {
    pub const FLAGS: [&'static str; 5] = [
        "open",
        "create",
        "delete_existing",
        "assume_metadata",
        "assume_cached_metadata",
    ];

    /// Read the flags from a spec object and check their combination
    pub fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        let mut flag = |name: &str| -> ValidationResult<bool> {
            Ok(reader.optional(name, parse_bool)?.unwrap_or(false))
        };
        let mode = Self {
            open: flag("open")?,
            create: flag("create")?,
            delete_existing: flag("delete_existing")?,
            assume_metadata: flag("assume_metadata")?,
            assume_cached_metadata: flag("assume_cached_metadata")?,
        };
        mode.check(reader.context())?;
        Ok(mode)
    }

    /// Names of the flags that are set
    pub fn flags(&self) -> Vec<String> {
        let values = [
            self.open,
            self.create,
            self.delete_existing,
            self.assume_metadata,
            self.assume_cached_metadata,
        ];
        Self::FLAGS
            .iter()
            .zip(values)
            .filter(|(_, set)| *set)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Reject mutually exclusive flag combinations
    pub fn check(&self, ctx: &ValidationContext) -> ValidationResult<()> {
        let reason = if self.delete_existing && !self.create {
            Some("'delete_existing' requires 'create'")
        } else if self.delete_existing && self.open {
            Some("'delete_existing' cannot be combined with 'open'")
        } else if self.assume_metadata && self.assume_cached_metadata {
            Some("'assume_metadata' and 'assume_cached_metadata' are mutually exclusive")
        } else if self.delete_existing && (self.assume_metadata || self.assume_cached_metadata) {
            Some("assumed metadata cannot be combined with 'delete_existing'")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(ctx.error(ErrorKind::InvalidOpenModeCombination {
                flags: self.flags(),
                reason: reason.to_string(),
            })),
            None => Ok(()),
        }
    }

    /// Access needed to honor these flags
    pub fn required_access(&self) -> ReadWriteMode {
        if self.create || self.delete_existing {
            ReadWriteMode::ReadWrite
        } else {
            ReadWriteMode::Read
        }
    }
}

/// Read/write access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadWriteMode {
    Read,
    Write,
    ReadWrite,
}

impl fmt::Display for ReadWriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
            Self::ReadWrite => write!(f, "read_write"),
        }
    }
}

/// When cached data or metadata must be revalidated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheRevalidation {
    /// `true` always revalidates, `false` never does
    Always(bool),
    /// Revalidate once when the store is opened
    Open,
    /// Revalidate entries older than this many seconds since the epoch
    NotBefore(f64),
}

impl CacheRevalidation {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::Bool(flag) => Ok(Self::Always(*flag)),
            Value::String(s) if s == "open" => Ok(Self::Open),
            Value::Number(n) => match n.as_f64() {
                Some(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(Self::NotBefore(seconds)),
                _ => Err(ctx.invalid_value("non-negative timestamp", describe(value))),
            },
            _ => Err(ctx.invalid_value("boolean, \"open\" or a timestamp", describe(value))),
        }
    }
}

impl Serialize for CacheRevalidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Always(flag) => serializer.serialize_bool(*flag),
            Self::Open => serializer.serialize_str("open"),
            Self::NotBefore(seconds) => serializer.serialize_f64(*seconds),
        }
    }
}
