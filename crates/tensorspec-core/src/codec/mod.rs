//! Codec families
//!
//! Every storage format describes chunk compression with its own tagged
//! union: N5 uses `type`, zarr v2 uses `id`, zarr v3 uses `name`. The
//! [`Codec`] union used in `schema.codec` wraps them, discriminated by the
//! format's `driver` name.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod n5;
pub mod neuroglancer;
pub mod zarr;
pub mod zarr3;

pub use n5::N5Compression;
pub use neuroglancer::{Encoding, EncodingOptions};
pub use zarr::{ZarrCompressor, ZarrFilter};
pub use zarr3::Zarr3Codec;

use crate::error::{ErrorKind, ValidationResult};
use crate::validation::reader::{type_name, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

/// Read a codec discriminator and check it against the family's variants
pub(crate) fn read_tag(
    reader: &mut ObjectReader<'_>,
    tag: &str,
    family: &str,
    known: &[&str],
) -> ValidationResult<String> {
    let ctx = reader.context().child(tag);
    let value = reader.raw(tag).ok_or_else(|| {
        ctx.error(ErrorKind::MissingRequiredField {
            field: tag.to_string(),
        })
    })?;
    let variant = value.as_str().ok_or_else(|| {
        ctx.error(ErrorKind::InvalidType {
            expected: "string".to_string(),
            actual: type_name(value).to_string(),
        })
    })?;
    if !known.contains(&variant) {
        return Err(ctx.error(ErrorKind::UnknownCodecVariant {
            family: family.to_string(),
            variant: variant.to_string(),
            known: known.iter().map(|k| k.to_string()).collect(),
        }));
    }
    trace!(family, variant, "selected codec variant");
    Ok(variant.to_string())
}

const DRIVERS: [&str; 4] = ["n5", "neuroglancer_precomputed", "zarr", "zarr3"];

/// Format-specific codec settings carried by a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "driver", rename_all = "snake_case")]
pub enum Codec {
    N5 {
        #[serde(skip_serializing_if = "Option::is_none")]
        compression: Option<N5Compression>,
    },
    NeuroglancerPrecomputed {
        #[serde(flatten)]
        encoding: EncodingOptions,
        #[serde(skip_serializing_if = "Option::is_none")]
        shard_data_encoding: Option<String>,
    },
    Zarr {
        /// `Some(None)` is an explicit `null`: no compression
        #[serde(skip_serializing_if = "Option::is_none")]
        compressor: Option<Option<ZarrCompressor>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        filters: Option<Option<Vec<ZarrFilter>>>,
    },
    Zarr3 {
        #[serde(skip_serializing_if = "Option::is_none")]
        codecs: Option<Vec<Zarr3Codec>>,
    },
}

impl Codec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let driver = read_tag(&mut reader, "driver", "codec", &DRIVERS)?;
        let codec = match driver.as_str() {
            "n5" => Self::N5 {
                compression: reader.optional("compression", N5Compression::from_value)?,
            },
            "neuroglancer_precomputed" => Self::NeuroglancerPrecomputed {
                encoding: EncodingOptions::read(&mut reader)?,
                shard_data_encoding: reader.optional("shard_data_encoding", neuroglancer::parse_shard_data_encoding)?,
            },
            "zarr" => Self::Zarr {
                compressor: zarr::read_compressor(&mut reader)?,
                filters: zarr::read_filters(&mut reader)?,
            },
            _ => Self::Zarr3 {
                codecs: reader.optional("codecs", zarr3::parse_constraint_chain)?,
            },
        };
        reader.finish()?;
        Ok(codec)
    }

    /// Driver whose metadata this codec describes
    pub fn driver(&self) -> &'static str {
        match self {
            Self::N5 { .. } => "n5",
            Self::NeuroglancerPrecomputed { .. } => "neuroglancer_precomputed",
            Self::Zarr { .. } => "zarr",
            Self::Zarr3 { .. } => "zarr3",
        }
    }

    /// Fail unless this codec belongs to `driver`
    pub fn check_driver(&self, driver: &str, ctx: &ValidationContext) -> ValidationResult<()> {
        if self.driver() == driver {
            Ok(())
        } else {
            Err(ctx.child("driver").invalid_value(
                format!("codec for driver \"{}\"", driver),
                format!("\"{}\"", self.driver()),
            ))
        }
    }
}
