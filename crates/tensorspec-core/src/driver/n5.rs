//! N5 driver

use super::base::{DriverConstraints, SpecBase};
use super::chunked::ChunkedOptions;
use crate::codec::N5Compression;
use crate::domain::resolve_rank;
use crate::error::ValidationResult;
use crate::types::DataType;
use crate::validation::reader::{parse_f64, parse_positive_vec, parse_string_vec, parse_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Element types N5 can store
pub const N5_DTYPES: [DataType; 10] = [
    DataType::Uint8,
    DataType::Uint16,
    DataType::Uint32,
    DataType::Uint64,
    DataType::Int8,
    DataType::Int16,
    DataType::Int32,
    DataType::Int64,
    DataType::Float32,
    DataType::Float64,
];

/// `attributes.json` of an N5 dataset; unrecognized members are kept in
/// `extra`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct N5Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<u64>>,
    #[serde(rename = "blockSize", skip_serializing_if = "Option::is_none")]
    pub block_size: Option<Vec<u64>>,
    #[serde(rename = "dataType", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<N5Compression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    rank: Option<usize>,
}

fn parse_resolution(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<f64>> {
    parse_vec(value, ctx, |v, c| {
        let r = parse_f64(v, c)?;
        if !(r > 0.0 && r.is_finite()) {
            return Err(c.invalid_value("positive resolution", r.to_string()));
        }
        Ok(r)
    })
}

impl N5Metadata {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let dimensions = reader.optional("dimensions", parse_positive_vec)?;
        let block_size = reader.optional("blockSize", parse_positive_vec)?;
        let data_type = reader.optional("dataType", |v, c| DataType::parse_allowed(v, c, &N5_DTYPES))?;
        let compression = reader.optional("compression", N5Compression::from_value)?;
        let axes = reader.optional("axes", parse_string_vec)?;
        let units = reader.optional("units", parse_string_vec)?;
        let resolution = reader.optional("resolution", parse_resolution)?;
        let extra = reader.into_extras();

        let rank = resolve_rank(
            ctx,
            None,
            &[
                ("dimensions", dimensions.as_ref().map(Vec::len)),
                ("blockSize", block_size.as_ref().map(Vec::len)),
                ("axes", axes.as_ref().map(Vec::len)),
                ("units", units.as_ref().map(Vec::len)),
                ("resolution", resolution.as_ref().map(Vec::len)),
            ],
        )?;

        Ok(Self {
            dimensions,
            block_size,
            data_type,
            compression,
            axes,
            units,
            resolution,
            extra,
            rank,
        })
    }

    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

/// N5 dataset spec
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct N5Spec {
    #[serde(flatten)]
    pub base: SpecBase,
    #[serde(flatten)]
    pub store: ChunkedOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<N5Metadata>,
}

impl N5Spec {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        reader.skip("driver");
        let base = SpecBase::read(&mut reader)?;
        let store = ChunkedOptions::read(&mut reader)?;
        let metadata = reader.optional("metadata", N5Metadata::from_value)?;
        reader.finish()?;

        base.check_constraints(
            &DriverConstraints {
                dtypes: &N5_DTYPES,
                stored_rank: metadata.as_ref().and_then(N5Metadata::rank).map(|rank| ("metadata.dimensions", rank)),
                stored_dtype: metadata
                    .as_ref()
                    .and_then(|m| m.data_type)
                    .map(|dtype| ("metadata.dataType", dtype)),
                codec_driver: Some("n5"),
            },
            ctx,
        )?;
        Ok(Self { base, store, metadata })
    }
}
