//! Neuroglancer precomputed driver
//!
//! Volumes are always four dimensional: `x`, `y`, `z` and `channel`.

use super::base::{DriverConstraints, SpecBase};
use super::chunked::ChunkedOptions;
use crate::codec::{Encoding, EncodingOptions};
use crate::error::ValidationResult;
use crate::types::DataType;
use crate::validation::reader::{
    describe, parse_f64, parse_i64_vec, parse_non_empty_string, parse_one_of, parse_positive_u64, parse_positive_vec, parse_u64,
    parse_vec, ObjectReader,
};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;

pub const NEUROGLANCER_DTYPES: [DataType; 8] = [
    DataType::Uint8,
    DataType::Int8,
    DataType::Uint16,
    DataType::Int16,
    DataType::Uint32,
    DataType::Int32,
    DataType::Uint64,
    DataType::Float32,
];

/// `x`, `y`, `z` and `channel`
pub const VOLUME_RANK: usize = 4;

fn check_three<T>(values: Vec<T>, ctx: &ValidationContext) -> ValidationResult<Vec<T>> {
    if values.len() != 3 {
        return Err(ctx.invalid_value("3 elements (x, y, z)", format!("{} elements", values.len())));
    }
    Ok(values)
}

fn parse_xyz_positive(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<u64>> {
    check_three(parse_positive_vec(value, ctx)?, ctx)
}

fn parse_xyz_resolution(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<f64>> {
    let values = parse_vec(value, ctx, |v, c| {
        let r = parse_f64(v, c)?;
        if !(r > 0.0 && r.is_finite()) {
            return Err(c.invalid_value("positive resolution", r.to_string()));
        }
        Ok(r)
    })?;
    check_three(values, ctx)
}

/// Properties shared by every scale of a volume
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MultiscaleMetadata {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_channels: Option<u64>,
}

impl MultiscaleMetadata {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let metadata = Self {
            volume_type: reader.optional("type", |v, c| parse_one_of(v, c, &["image", "segmentation"]))?,
            data_type: reader.optional("data_type", |v, c| DataType::parse_allowed(v, c, &NEUROGLANCER_DTYPES))?,
            num_channels: reader.optional("num_channels", parse_positive_u64)?,
        };
        reader.finish()?;
        Ok(metadata)
    }
}

/// Properties of one resolution level
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScaleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voxel_offset: Option<Vec<i64>>,
    #[serde(flatten)]
    pub encoding: EncodingOptions,
    /// Sharding parameters, kept as given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharding: Option<Value>,
}

impl ScaleMetadata {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let metadata = Self {
            key: reader.optional("key", parse_non_empty_string)?,
            size: reader.optional("size", parse_xyz_positive)?,
            chunk_size: reader.optional("chunk_size", parse_xyz_positive)?,
            resolution: reader.optional("resolution", parse_xyz_resolution)?,
            voxel_offset: reader.optional("voxel_offset", |v, c| check_three(parse_i64_vec(v, c)?, c))?,
            encoding: EncodingOptions::read(&mut reader)?,
            sharding: reader.optional("sharding", |v, c| match v {
                Value::Object(_) => Ok(v.clone()),
                _ => Err(c.invalid_value("object", describe(v))),
            })?,
        };
        reader.finish()?;
        Ok(metadata)
    }
}

/// Neuroglancer precomputed volume spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeuroglancerSpec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(flatten)]
    pub store: ChunkedOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiscale_metadata: Option<MultiscaleMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_metadata: Option<ScaleMetadata>,
}

impl NeuroglancerSpec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let store = ChunkedOptions::read(&mut reader)?;
        let scale_index = reader.optional("scale_index", parse_u64)?;
        let multiscale_metadata = reader.optional("multiscale_metadata", MultiscaleMetadata::from_value)?;
        let scale_metadata = reader.optional("scale_metadata", ScaleMetadata::from_value)?;
        reader.finish()?;

        let spec = Self {
            base,
            store,
            scale_index,
            multiscale_metadata,
            scale_metadata,
        };
        spec.check(ctx)?;
        Ok(spec)
    }

    fn data_type(&self) -> Option<DataType> {
        self.multiscale_metadata
            .as_ref()
            .and_then(|m| m.data_type)
            .or_else(|| self.base.dtype())
    }

    fn check(&self, ctx: &ValidationContext) -> ValidationResult<()> {
        let stored_dtype = self.multiscale_metadata.as_ref().and_then(|m| m.data_type);
        self.base.check_constraints(
            &DriverConstraints {
                dtypes: &NEUROGLANCER_DTYPES,
                stored_rank: Some(("scale_metadata", VOLUME_RANK)),
                stored_dtype: stored_dtype.map(|dtype| ("multiscale_metadata.data_type", dtype)),
                codec_driver: Some("neuroglancer_precomputed"),
            },
            ctx,
        )?;
        if !ctx.checks_cross_fields() {
            return Ok(());
        }

        let encoding = self.scale_metadata.as_ref().and_then(|s| s.encoding.encoding);
        let (Some(encoding), Some(dtype)) = (encoding, self.data_type()) else {
            return Ok(());
        };
        let allowed: &[DataType] = match encoding {
            Encoding::Jpeg => &[DataType::Uint8],
            Encoding::CompressedSegmentation => &[DataType::Uint32, DataType::Uint64],
            Encoding::Raw | Encoding::Png => return Ok(()),
        };
        if !allowed.contains(&dtype) {
            let names: Vec<&str> = allowed.iter().map(DataType::as_str).collect();
            return Err(ctx.child("scale_metadata").child("encoding").invalid_value(
                format!("data type {} for \"{}\" encoding", names.join(" or "), encoding),
                format!("\"{}\"", dtype),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn precomputed(doc: Value) -> ValidationResult<NeuroglancerSpec> {
        NeuroglancerSpec::from_value(&doc, &ValidationContext::default().with_driver("neuroglancer_precomputed"))
    }

    #[test]
    fn test_valid_volume() {
        let spec = precomputed(json!({
            "driver": "neuroglancer_precomputed",
            "kvstore": "s3://bucket/volume",
            "scale_index": 0,
            "multiscale_metadata": {"type": "segmentation", "data_type": "uint64", "num_channels": 1},
            "scale_metadata": {
                "key": "8_8_8",
                "size": [1024, 1024, 512],
                "chunk_size": [64, 64, 64],
                "resolution": [8.0, 8.0, 8.0],
                "voxel_offset": [0, 0, 0],
                "encoding": "compressed_segmentation",
                "compressed_segmentation_block_size": [8, 8, 8]
            }
        }))
        .unwrap();
        assert_eq!(spec.scale_index, Some(0));
    }

    #[test]
    fn test_encoding_parameters() {
        let err = precomputed(json!({
            "kvstore": "memory://",
            "scale_metadata": {"encoding": "png", "jpeg_quality": 80}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.scale_metadata.jpeg_quality");

        let err = precomputed(json!({
            "kvstore": "memory://",
            "scale_metadata": {"encoding": "jpeg", "jpeg_quality": 101}
        }))
        .unwrap_err();
        assert_eq!(err.kind.name(), "ParameterOutOfRange");
    }

    #[test]
    fn test_encoding_data_type() {
        let err = precomputed(json!({
            "kvstore": "memory://",
            "multiscale_metadata": {"data_type": "uint16"},
            "scale_metadata": {"encoding": "jpeg"}
        }))
        .unwrap_err();
        assert_eq!(err.path, "$.scale_metadata.encoding");
    }

    #[test]
    fn test_three_dimensional_fields() {
        assert!(precomputed(json!({"kvstore": "memory://", "scale_metadata": {"size": [10, 10]}})).is_err());
        assert!(precomputed(json!({"kvstore": "memory://", "multiscale_metadata": {"num_channels": 0}})).is_err());
    }

    #[test]
    fn test_volume_rank_is_four() {
        let err = precomputed(json!({"kvstore": "memory://", "rank": 3})).unwrap_err();
        assert_eq!(err.kind.name(), "RankMismatch");
        assert!(precomputed(json!({"kvstore": "memory://", "rank": 4})).is_ok());
    }
}
