//! Key-value store specs
//!
//! A kvstore is a small discriminated union of its own, keyed by `driver`
//! and scoped to the `kvstore` field of chunked drivers. URL strings such as
//! `"s3://bucket/path"` are expanded before dispatch.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod file;
pub mod memory;
pub mod s3;

pub use file::FileKvStore;
pub use memory::MemoryKvStore;
pub use s3::S3KvStore;

use crate::error::{ErrorKind, ValidationResult};
use crate::normalize::expand_kvstore_shorthand;
use crate::validation::reader::ObjectReader;
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Registered kvstore drivers, sorted
pub const KVSTORE_DRIVERS: [&str; 3] = ["file", "memory", "s3"];

/// A validated key-value store spec
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum KvStoreSpec {
    File(FileKvStore),
    Memory(MemoryKvStore),
    S3(S3KvStore),
}

impl KvStoreSpec {
    /// Validate an object or URL string at `ctx`
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let value = expand_kvstore_shorthand(value, ctx)?;
        let mut reader = ObjectReader::new(&value, ctx)?;
        let driver = match reader.raw("driver").and_then(Value::as_str) {
            Some(driver) if !driver.is_empty() => driver.to_string(),
            _ => return Err(ctx.error(ErrorKind::MissingKvStoreDiscriminator)),
        };
        debug!(path = %ctx.path, driver = %driver, "dispatching kvstore");
        let spec = match driver.as_str() {
            "file" => Self::File(FileKvStore::read(&mut reader)?),
            "memory" => Self::Memory(MemoryKvStore::read(&mut reader)?),
            "s3" => Self::S3(S3KvStore::read(&mut reader)?),
            _ => {
                return Err(ctx.error(ErrorKind::UnknownKvStoreDriver {
                    driver,
                    registered: KVSTORE_DRIVERS.iter().map(|d| d.to_string()).collect(),
                }))
            }
        };
        reader.finish()?;
        Ok(spec)
    }

    pub fn driver(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory(_) => "memory",
            Self::S3(_) => "s3",
        }
    }

    /// Key prefix within the store, if any
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::File(store) => Some(store.path.as_str()),
            Self::Memory(store) => store.path.as_deref(),
            Self::S3(store) => store.path.as_deref(),
        }
    }
}
