//! Zarr v3 driver

use super::base::{DriverConstraints, SpecBase};
use super::chunked::ChunkedOptions;
use crate::codec::zarr3::{check_chain, parse_chain};
use crate::codec::Zarr3Codec;
use crate::domain::resolve_rank;
use crate::error::ValidationResult;
use crate::normalize::expand_tag_shorthand;
use crate::types::DataType;
use crate::validation::reader::{
    parse_one_of, parse_positive_vec, parse_string, parse_u64, parse_vec, type_name, ObjectReader,
};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Element types a zarr v3 array can store
pub const ZARR3_DTYPES: [DataType; 20] = [
    DataType::Bool,
    DataType::Int4,
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Uint8,
    DataType::Uint16,
    DataType::Uint32,
    DataType::Uint64,
    DataType::Float8E4m3fn,
    DataType::Float8E4m3fnuz,
    DataType::Float8E5m2,
    DataType::Float8E5m2fnuz,
    DataType::Float16,
    DataType::Bfloat16,
    DataType::Float32,
    DataType::Float64,
    DataType::Complex64,
    DataType::Complex128,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegularChunkGrid {
    pub chunk_shape: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "configuration", rename_all = "snake_case")]
pub enum ChunkGrid {
    Regular(RegularChunkGrid),
}

impl ChunkGrid {
    fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.required("name", |v, c| parse_one_of(v, c, &["regular"]))?;
        let grid = reader.required("configuration", |v, c| {
            let mut config = ObjectReader::new(v, c)?;
            let chunk_shape = config.required("chunk_shape", parse_positive_vec)?;
            config.finish()?;
            Ok(RegularChunkGrid { chunk_shape })
        })?;
        reader.finish()?;
        Ok(Self::Regular(grid))
    }

    pub fn chunk_shape(&self) -> &[u64] {
        match self {
            Self::Regular(grid) => &grid.chunk_shape,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyEncodingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// How chunk coordinates map to storage keys
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "name", content = "configuration", rename_all = "snake_case")]
pub enum ChunkKeyEncoding {
    /// `c/0/1` style keys
    Default(KeyEncodingConfig),
    /// `0.1` style keys
    V2(KeyEncodingConfig),
}

impl ChunkKeyEncoding {
    fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let value = expand_tag_shorthand(value, "name");
        let mut reader = ObjectReader::new(&value, ctx)?;
        let name = reader.required("name", |v, c| parse_one_of(v, c, &["default", "v2"]))?;
        let config = reader
            .optional("configuration", |v, c| {
                let mut config = ObjectReader::new(v, c)?;
                let separator = config.optional("separator", |v, c| parse_one_of(v, c, &["/", "."]))?;
                config.finish()?;
                Ok(KeyEncodingConfig { separator })
            })?
            .unwrap_or_default();
        reader.finish()?;
        Ok(if name == "default" {
            Self::Default(config)
        } else {
            Self::V2(config)
        })
    }
}

fn parse_dimension_name(value: &Value, ctx: &ValidationContext) -> ValidationResult<Option<String>> {
    if value.is_null() {
        Ok(None)
    } else {
        parse_string(value, ctx).map(Some)
    }
}

/// `zarr.json` array metadata; unrecognized members are kept in `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Zarr3Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zarr_format: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_grid: Option<ChunkGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_key_encoding: Option<ChunkKeyEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codecs: Option<Vec<Zarr3Codec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    rank: Option<usize>,
}

impl Zarr3Metadata {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let zarr_format = reader.optional("zarr_format", |v, c| {
            let format = parse_u64(v, c)?;
            if format != 3 {
                return Err(c.invalid_value("3", format.to_string()));
            }
            Ok(format)
        })?;
        let node_type = reader.optional("node_type", |v, c| parse_one_of(v, c, &["array"]))?;
        let shape = reader.optional("shape", parse_positive_vec)?;
        let data_type = reader.optional("data_type", |v, c| DataType::parse_allowed(v, c, &ZARR3_DTYPES))?;
        let chunk_grid = reader.optional("chunk_grid", ChunkGrid::from_value)?;
        let chunk_key_encoding = reader.optional("chunk_key_encoding", ChunkKeyEncoding::from_value)?;
        let fill_value = reader.optional("fill_value", |v, c| match data_type {
            Some(dtype) => dtype.coerce_value(v, c),
            None => Ok(v.clone()),
        })?;
        let codecs = reader.optional("codecs", parse_chain)?;
        let dimension_names = reader.optional("dimension_names", |v, c| parse_vec(v, c, parse_dimension_name))?;
        let attributes = reader.optional("attributes", |v, c| match v {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(c.invalid_value("object", type_name(v))),
        })?;
        let extra = reader.into_extras();

        let chunk_shape = chunk_grid.as_ref().map(ChunkGrid::chunk_shape);
        let rank = resolve_rank(
            ctx,
            None,
            &[
                ("shape", shape.as_ref().map(Vec::len)),
                ("chunk_grid.configuration.chunk_shape", chunk_shape.map(<[u64]>::len)),
                ("dimension_names", dimension_names.as_ref().map(Vec::len)),
            ],
        )?;
        if let (Some(codecs), Some(rank)) = (&codecs, rank) {
            check_chain(codecs, rank, chunk_shape, &ctx.child("codecs"))?;
        }

        Ok(Self {
            zarr_format,
            node_type,
            shape,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            dimension_names,
            attributes,
            extra,
            rank,
        })
    }

    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

/// Zarr v3 array spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zarr3Spec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(flatten)]
    pub store: ChunkedOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Zarr3Metadata>,
}

impl Zarr3Spec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let store = ChunkedOptions::read(&mut reader)?;
        let metadata = reader.optional("metadata", Zarr3Metadata::from_value)?;
        reader.finish()?;

        base.check_constraints(
            &DriverConstraints {
                dtypes: &ZARR3_DTYPES,
                stored_rank: metadata.as_ref().and_then(Zarr3Metadata::rank).map(|rank| ("metadata.shape", rank)),
                stored_dtype: metadata
                    .as_ref()
                    .and_then(|m| m.data_type)
                    .map(|dtype| ("metadata.data_type", dtype)),
                codec_driver: Some("zarr3"),
            },
            ctx,
        )?;
        Ok(Self { base, store, metadata })
    }
}
