//! N5 block compression, discriminated by `type`

use super::read_tag;
use crate::normalize::expand_tag_shorthand;
use crate::error::ValidationResult;
use crate::validation::reader::{check_range, parse_bool, parse_bounded, parse_i64, parse_one_of, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;

pub const BLOSC_CNAMES: [&str; 6] = ["blosclz", "lz4", "lz4hc", "snappy", "zlib", "zstd"];

const VARIANTS: [&str; 6] = ["blosc", "bzip2", "gzip", "raw", "xz", "zstd"];

/// Compression applied to each N5 block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum N5Compression {
    Blosc {
        #[serde(skip_serializing_if = "Option::is_none")]
        cname: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        clevel: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        shuffle: Option<i64>,
    },
    Bzip2 {
        #[serde(rename = "blockSize", skip_serializing_if = "Option::is_none")]
        block_size: Option<i64>,
    },
    Gzip {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
        #[serde(rename = "useZlib", skip_serializing_if = "Option::is_none")]
        use_zlib: Option<bool>,
    },
    /// Big-endian values without compression
    Raw,
    Xz {
        #[serde(skip_serializing_if = "Option::is_none")]
        preset: Option<i64>,
    },
    Zstd {
        #[serde(skip_serializing_if = "Option::is_none")]
        level: Option<i64>,
    },
}

impl N5Compression {
    /// Parse a compression object or its bare-string shorthand
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let value = expand_tag_shorthand(value, "type");
        let mut reader = ObjectReader::new(&value, ctx)?;
        let tag = read_tag(&mut reader, "type", "n5 compression", &VARIANTS)?;
        let compression = match tag.as_str() {
            "blosc" => Self::Blosc {
                cname: reader.optional("cname", |v, c| parse_one_of(v, c, &BLOSC_CNAMES))?,
                clevel: reader.optional("clevel", |v, c| parse_bounded(v, c, "blosc", "clevel", 0, 9))?,
                shuffle: reader.optional("shuffle", |v, c| parse_bounded(v, c, "blosc", "shuffle", 0, 2))?,
            },
            "bzip2" => Self::Bzip2 {
                block_size: reader.optional("blockSize", |v, c| parse_bounded(v, c, "bzip2", "blockSize", 1, 9))?,
            },
            "gzip" => Self::Gzip {
                level: reader.optional("level", |v, c| parse_bounded(v, c, "gzip", "level", -1, 9))?,
                use_zlib: reader.optional("useZlib", parse_bool)?,
            },
            "raw" => Self::Raw,
            "xz" => Self::Xz {
                preset: reader.optional("preset", |v, c| parse_bounded(v, c, "xz", "preset", 0, 9))?,
            },
            _ => Self::Zstd {
                level: reader.optional("level", |v, c| {
                    let level = parse_i64(v, c)?;
                    check_range(c, "zstd", "level", level, i64::from(i32::MIN), 22)?;
                    Ok(level)
                })?,
            },
        };
        reader.finish()?;
        Ok(compression)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Blosc { .. } => "blosc",
            Self::Bzip2 { .. } => "bzip2",
            Self::Gzip { .. } => "gzip",
            Self::Raw => "raw",
            Self::Xz { .. } => "xz",
            Self::Zstd { .. } => "zstd",
        }
    }
}
