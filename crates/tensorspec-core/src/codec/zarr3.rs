//! Zarr v3 codec chains, discriminated by `name`
//!
//! Each codec is `{"name": ..., "configuration": {...}}`; a bare string is
//! shorthand for a codec with default configuration. A chain holds any
//! number of array-to-array codecs, then exactly one array-to-bytes codec,
//! then any number of bytes-to-bytes codecs. Schema codec constraints may
//! leave the array-to-bytes codec out.

use super::n5::BLOSC_CNAMES;
use super::read_tag;
use crate::chunk_layout::check_permutation;
use crate::error::{ErrorKind, LengthMismatch, ValidationResult};
use crate::normalize::expand_tag_shorthand;
use crate::validation::reader::{
    describe, parse_bool, parse_bounded, parse_i64_vec, parse_one_of, parse_positive_u64, parse_positive_vec, parse_u64,
    parse_vec, ObjectReader,
};
use crate::validation::ValidationContext;
use serde::{Serialize, Serializer};
use serde_json::Value;

const VARIANTS: [&str; 7] = ["blosc", "bytes", "crc32c", "gzip", "zstd", "transpose", "sharding_indexed"];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BloscConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clevel: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocksize: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BytesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endian: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GzipConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZstdConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<bool>,
}

/// Dimension order for the transpose codec
#[derive(Debug, Clone, PartialEq)]
pub enum TransposeOrder {
    Permutation(Vec<usize>),
    /// `"C"` (identity) or `"F"` (reversed)
    Named(String),
}

impl TransposeOrder {
    fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        match value {
            Value::String(_) => parse_one_of(value, ctx, &["C", "F"]).map(Self::Named),
            _ => {
                let values = parse_i64_vec(value, ctx)?;
                check_permutation(&values, values.len(), "order", ctx).map(Self::Permutation)
            }
        }
    }
}

impl Serialize for TransposeOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Permutation(order) => order.serialize(serializer),
            Self::Named(name) => serializer.serialize_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransposeConfig {
    pub order: TransposeOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShardingConfig {
    pub chunk_shape: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codecs: Option<Vec<Zarr3Codec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_codecs: Option<Vec<Zarr3Codec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_location: Option<String>,
}

/// One codec of a zarr v3 chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "configuration", rename_all = "snake_case")]
pub enum Zarr3Codec {
    Blosc(BloscConfig),
    Bytes(BytesConfig),
    Crc32c,
    Gzip(GzipConfig),
    Zstd(ZstdConfig),
    Transpose(TransposeConfig),
    ShardingIndexed(ShardingConfig),
}

/// Position of a codec within a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    ArrayToArray,
    ArrayToBytes,
    BytesToBytes,
}

impl Zarr3Codec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let empty = Value::Object(Default::default());
        let value = expand_tag_shorthand(value, "name");
        let mut reader = ObjectReader::new(&value, ctx)?;
        let tag = read_tag(&mut reader, "name", "zarr3 codec", &VARIANTS)?;
        let config_value = reader.raw("configuration").unwrap_or(&empty);
        reader.finish()?;

        let config_ctx = ctx.child("configuration");
        let mut config = ObjectReader::new(config_value, &config_ctx)?;
        let codec = match tag.as_str() {
            "blosc" => Self::Blosc(BloscConfig {
                cname: config.optional("cname", |v, c| parse_one_of(v, c, &BLOSC_CNAMES))?,
                clevel: config.optional("clevel", |v, c| parse_bounded(v, c, "blosc", "clevel", 0, 9))?,
                shuffle: config.optional("shuffle", |v, c| parse_one_of(v, c, &["noshuffle", "shuffle", "bitshuffle"]))?,
                typesize: config.optional("typesize", parse_positive_u64)?,
                blocksize: config.optional("blocksize", parse_u64)?,
            }),
            "bytes" => Self::Bytes(BytesConfig {
                endian: config.optional("endian", |v, c| parse_one_of(v, c, &["little", "big"]))?,
            }),
            "crc32c" => Self::Crc32c,
            "gzip" => Self::Gzip(GzipConfig {
                level: config.optional("level", |v, c| parse_bounded(v, c, "gzip", "level", 0, 9))?,
            }),
            "zstd" => Self::Zstd(ZstdConfig {
                level: config.optional("level", |v, c| parse_bounded(v, c, "zstd", "level", -131072, 22))?,
                checksum: config.optional("checksum", parse_bool)?,
            }),
            "transpose" => Self::Transpose(TransposeConfig {
                order: config.required("order", TransposeOrder::from_value)?,
            }),
            _ => Self::ShardingIndexed(ShardingConfig {
                chunk_shape: config.required("chunk_shape", parse_positive_vec)?,
                codecs: config.optional("codecs", parse_chain)?,
                index_codecs: config.optional("index_codecs", parse_chain)?,
                index_location: config.optional("index_location", |v, c| parse_one_of(v, c, &["start", "end"]))?,
            }),
        };
        config.finish()?;
        Ok(codec)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Blosc(_) => "blosc",
            Self::Bytes(_) => "bytes",
            Self::Crc32c => "crc32c",
            Self::Gzip(_) => "gzip",
            Self::Zstd(_) => "zstd",
            Self::Transpose(_) => "transpose",
            Self::ShardingIndexed(_) => "sharding_indexed",
        }
    }

    fn stage(&self) -> Stage {
        match self {
            Self::Transpose(_) => Stage::ArrayToArray,
            Self::Bytes(_) | Self::ShardingIndexed(_) => Stage::ArrayToBytes,
            Self::Blosc(_) | Self::Crc32c | Self::Gzip(_) | Self::Zstd(_) => Stage::BytesToBytes,
        }
    }
}

/// Parse a complete codec chain, as stored in metadata
pub fn parse_chain(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<Zarr3Codec>> {
    let codecs = parse_constraint_chain(value, ctx)?;
    if !codecs.iter().any(|codec| codec.stage() == Stage::ArrayToBytes) {
        return Err(ctx.invalid_value(
            "exactly one array-to-bytes codec (bytes or sharding_indexed)",
            format!("chain of {} codec(s) without one", codecs.len()),
        ));
    }
    Ok(codecs)
}

/// Parse a possibly partial codec chain and check the ordering of its stages
pub fn parse_constraint_chain(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<Zarr3Codec>> {
    let codecs = parse_vec(value, ctx, Zarr3Codec::from_value)?;
    let mut previous: Option<Stage> = None;
    for (i, codec) in codecs.iter().enumerate() {
        let stage = codec.stage();
        let misplaced = match previous {
            Some(prev) => stage < prev || (stage == Stage::ArrayToBytes && prev == Stage::ArrayToBytes),
            None => false,
        };
        if misplaced {
            return Err(ctx.child_index(i).invalid_value(
                "array-to-array codecs, then one array-to-bytes codec, then bytes-to-bytes codecs",
                format!("'{}' out of order", codec.name()),
            ));
        }
        previous = Some(stage);
    }
    Ok(codecs)
}

/// Check rank-dependent codec parameters against the chunk they encode
pub fn check_chain(
    codecs: &[Zarr3Codec],
    rank: usize,
    chunk_shape: Option<&[u64]>,
    ctx: &ValidationContext,
) -> ValidationResult<()> {
    for (i, codec) in codecs.iter().enumerate() {
        let codec_ctx = ctx.child_index(i).child("configuration");
        match codec {
            Zarr3Codec::Transpose(TransposeConfig {
                order: TransposeOrder::Permutation(order),
            }) => {
                let values: Vec<i64> = order.iter().map(|&v| v as i64).collect();
                check_permutation(&values, rank, "order", &codec_ctx.child("order"))?;
            }
            Zarr3Codec::ShardingIndexed(sharding) => {
                let inner = &sharding.chunk_shape;
                if inner.len() != rank {
                    return Err(codec_ctx.error(ErrorKind::RankMismatch {
                        rank,
                        mismatches: vec![LengthMismatch {
                            field: "chunk_shape".to_string(),
                            length: inner.len(),
                        }],
                    }));
                }
                if let Some(outer) = chunk_shape {
                    let uneven = outer.iter().zip(inner).position(|(o, i)| o % i != 0);
                    if let Some(dim) = uneven {
                        return Err(codec_ctx.child("chunk_shape").child_index(dim).invalid_value(
                            format!("divisor of outer chunk size {}", outer[dim]),
                            describe(&Value::from(inner[dim])),
                        ));
                    }
                }
                if let Some(inner_codecs) = &sharding.codecs {
                    check_chain(inner_codecs, rank, Some(inner), &codec_ctx.child("codecs"))?;
                }
            }
            _ => {}
        }
    }
    Ok(())
}
