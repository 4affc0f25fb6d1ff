//! In-memory key-value store

use crate::error::ValidationResult;
use crate::types::ContextResource;
use crate::validation::reader::{parse_bool, parse_string, ObjectReader};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryKvStore {
    /// Logical key prefix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atomic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_key_value_store: Option<ContextResource>,
}

impl MemoryKvStore {
    pub(crate) fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        Ok(Self {
            path: reader.optional("path", parse_string)?,
            atomic: reader.optional("atomic", parse_bool)?,
            memory_key_value_store: reader
                .optional("memory_key_value_store", ContextResource::for_field("memory_key_value_store"))?,
        })
    }
}
