//! Neuroglancer precomputed chunk encodings

use crate::error::ValidationResult;
use crate::validation::reader::{parse_bounded, parse_one_of, parse_positive_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    Raw,
    Jpeg,
    Png,
    CompressedSegmentation,
}

impl Encoding {
    pub const NAMES: [&'static str; 4] = ["raw", "jpeg", "png", "compressed_segmentation"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::CompressedSegmentation => "compressed_segmentation",
        }
    }

    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let name = parse_one_of(value, ctx, &Self::NAMES)?;
        Ok(match name.as_str() {
            "raw" => Self::Raw,
            "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            _ => Self::CompressedSegmentation,
        })
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding together with the parameters only meaningful for one encoding
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EncodingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_quality: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_segmentation_block_size: Option<Vec<u64>>,
}

impl EncodingOptions {
    /// Read the encoding fields of `reader` and check that each parameter
    /// accompanies its encoding
    pub fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        let ctx = reader.context();
        let options = Self {
            encoding: reader.optional("encoding", Encoding::from_value)?,
            jpeg_quality: reader.optional("jpeg_quality", |v, c| parse_bounded(v, c, "jpeg", "jpeg_quality", 0, 100))?,
            png_level: reader.optional("png_level", |v, c| parse_bounded(v, c, "png", "png_level", 0, 9))?,
            compressed_segmentation_block_size: reader.optional("compressed_segmentation_block_size", |v, c| {
                let sizes = parse_positive_vec(v, c)?;
                if sizes.len() != 3 {
                    return Err(c.invalid_value("3 block dimensions", format!("{} dimensions", sizes.len())));
                }
                Ok(sizes)
            })?,
        };
        options.check(ctx)?;
        Ok(options)
    }

    fn check(&self, ctx: &ValidationContext) -> ValidationResult<()> {
        let encoding = self.encoding.unwrap_or(Encoding::Raw);
        let dependent = [
            ("jpeg_quality", self.jpeg_quality.is_some(), Encoding::Jpeg),
            ("png_level", self.png_level.is_some(), Encoding::Png),
            (
                "compressed_segmentation_block_size",
                self.compressed_segmentation_block_size.is_some(),
                Encoding::CompressedSegmentation,
            ),
        ];
        for (field, present, required) in dependent {
            if present && encoding != required {
                return Err(ctx
                    .child(field)
                    .invalid_value(format!("only with \"{}\" encoding", required), format!("\"{}\" encoding", encoding)));
            }
        }
        Ok(())
    }
}

/// Parse the encoding of a sharded chunk's data: `raw` or `gzip`
pub fn parse_shard_data_encoding(value: &Value, ctx: &ValidationContext) -> ValidationResult<String> {
    parse_one_of(value, ctx, &["raw", "gzip"])
}
