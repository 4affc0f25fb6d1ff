//! TIFF files read through a key-value store

use super::base::{DriverConstraints, SpecBase};
use super::chunked::join_paths;
use crate::error::ValidationResult;
use crate::kvstore::KvStoreSpec;
use crate::types::{ContextResource, DataType};
use crate::validation::reader::{parse_string, parse_u64, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;

/// Only 8-bit grayscale pages are decoded
pub const TIFF_DTYPES: [DataType; 1] = [DataType::Uint8];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiffSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    pub kvstore: KvStoreSpec,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub path: String,
    /// Image file directory to read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_pool: Option<ContextResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_copy_concurrency: Option<ContextResource>,
}

impl TiffSpec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let spec = Self {
            base,
            kvstore: reader.required("kvstore", KvStoreSpec::from_value)?,
            path: reader.optional("path", parse_string)?.unwrap_or_default(),
            page: reader.optional("page", parse_u64)?,
            cache_pool: reader.optional("cache_pool", ContextResource::for_field("cache_pool"))?,
            data_copy_concurrency: reader
                .optional("data_copy_concurrency", ContextResource::for_field("data_copy_concurrency"))?,
        };
        reader.finish()?;

        spec.base.check_constraints(
            &DriverConstraints {
                dtypes: &TIFF_DTYPES,
                ..Default::default()
            },
            ctx,
        )?;
        Ok(spec)
    }

    /// The kvstore's path joined with the spec's path
    pub fn effective_path(&self) -> String {
        join_paths(self.kvstore.path().unwrap_or(""), &self.path)
    }
}
