//! Zarr v2 compressors and filters, discriminated by `id`

use super::n5::BLOSC_CNAMES;
use super::read_tag;
use crate::error::ValidationResult;
use crate::normalize::expand_tag_shorthand;
use crate::validation::reader::{parse_bounded, parse_non_empty_string, parse_one_of, parse_u64, parse_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const VARIANTS: [&str; 4] = ["blosc", "bz2", "zlib", "zstd"];

/// Zarr v2 chunk compressor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "id", rename_all = "lowercase")]
pub enum ZarrCompressor {
    Blosc {
        #[serde(skip_serializing_if = "Option::is_none")]
        cname: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        clevel: Option<i64>,
        /// `-1` selects bit shuffle for one-byte types automatically
        #[serde(skip_serializing_if = "Option::is_none")]
        shuffle: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        blocksize: Option<u64>,
    },
    Bz2 {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
    },
    Zlib {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
    },
    Zstd {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
    },
}

impl ZarrCompressor {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let value = expand_tag_shorthand(value, "id");
        let mut reader = ObjectReader::new(&value, ctx)?;
        let tag = read_tag(&mut reader, "id", "zarr compressor", &VARIANTS)?;
        let compressor = match tag.as_str() {
            "blosc" => Self::Blosc {
                cname: reader.optional("cname", |v, c| parse_one_of(v, c, &BLOSC_CNAMES))?,
                clevel: reader.optional("clevel", |v, c| parse_bounded(v, c, "blosc", "clevel", 0, 9))?,
                shuffle: reader.optional("shuffle", |v, c| parse_bounded(v, c, "blosc", "shuffle", -1, 2))?,
                blocksize: reader.optional("blocksize", parse_u64)?,
            },
            "bz2" => Self::Bz2 {
                level: reader.optional("level", |v, c| parse_bounded(v, c, "bz2", "level", 1, 9))?,
            },
            "zlib" => Self::Zlib {
                level: reader.optional("level", |v, c| parse_bounded(v, c, "zlib", "level", 0, 9))?,
            },
            _ => Self::Zstd {
                level: reader.optional("level", |v, c| parse_bounded(v, c, "zstd", "level", -131072, 22))?,
            },
        };
        reader.finish()?;
        Ok(compressor)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Blosc { .. } => "blosc",
            Self::Bz2 { .. } => "bz2",
            Self::Zlib { .. } => "zlib",
            Self::Zstd { .. } => "zstd",
        }
    }
}

/// Parse a compressor position: `null` disables compression
pub fn parse_compressor(value: &Value, ctx: &ValidationContext) -> ValidationResult<Option<ZarrCompressor>> {
    if value.is_null() {
        Ok(None)
    } else {
        ZarrCompressor::from_value(value, ctx).map(Some)
    }
}

/// Read `compressor`, keeping an explicit `null` apart from absence
pub fn read_compressor(reader: &mut ObjectReader<'_>) -> ValidationResult<Option<Option<ZarrCompressor>>> {
    let ctx = reader.context().child("compressor");
    reader
        .raw_nullable("compressor")
        .map(|value| parse_compressor(value, &ctx))
        .transpose()
}

/// A filter in the pre-compression pipeline, kept with its parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZarrFilter {
    pub id: String,
    #[serde(flatten)]
    pub configuration: BTreeMap<String, Value>,
}

impl ZarrFilter {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let value = expand_tag_shorthand(value, "id");
        let mut reader = ObjectReader::new(&value, ctx)?;
        let id = reader.required("id", parse_non_empty_string)?;
        Ok(Self {
            id,
            configuration: reader.into_extras(),
        })
    }
}

/// Parse a filters position: `null` means no filters
pub fn parse_filters(value: &Value, ctx: &ValidationContext) -> ValidationResult<Option<Vec<ZarrFilter>>> {
    if value.is_null() {
        Ok(None)
    } else {
        parse_vec(value, ctx, ZarrFilter::from_value).map(Some)
    }
}

/// Read `filters`, keeping an explicit `null` apart from absence
pub fn read_filters(reader: &mut ObjectReader<'_>) -> ValidationResult<Option<Option<Vec<ZarrFilter>>>> {
    let ctx = reader.context().child("filters");
    reader
        .raw_nullable("filters")
        .map(|value| parse_filters(value, &ctx))
        .transpose()
}
