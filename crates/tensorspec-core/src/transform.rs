//! Index transforms mapping input coordinates to output coordinates
//!
//! The input side follows the same rank and bounds rules as
//! [`IndexDomain`](crate::domain::IndexDomain), with every field prefixed by
//! `input_`. Each output dimension is produced by one [`OutputIndexMap`].
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::domain::{parse_rank, resolve_rank, Bounds};
use crate::error::{ErrorKind, LengthMismatch, ValidationResult};
use crate::nested;
use crate::validation::reader::{describe, parse_i64, parse_i64_vec, parse_usize, parse_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// How one output dimension is computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputIndexMap {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stride: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_dimension: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_array: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_array_bounds: Option<[i64; 2]>,
}

impl OutputIndexMap {
    fn from_value(value: &Value, input_rank: usize, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let offset = reader.optional("offset", parse_i64)?;
        let stride = reader.optional("stride", parse_i64)?;
        let input_dimension = reader.optional("input_dimension", parse_usize)?;
        let index_array_raw = reader.raw("index_array");
        let index_array_bounds = reader.optional("index_array_bounds", parse_interval)?;
        reader.finish()?;

        match (input_dimension, index_array_raw) {
            (Some(_), Some(_)) => return Err(ctx.error(ErrorKind::AmbiguousOutputMap)),
            (None, None) => return Err(ctx.error(ErrorKind::UnderspecifiedOutputMap)),
            _ => {}
        }
        if let Some(dim) = input_dimension {
            if dim >= input_rank {
                return Err(ctx.child("input_dimension").error(ErrorKind::OutputDimensionOutOfRange {
                    input_dimension: dim,
                    input_rank,
                }));
            }
        }
        if stride == Some(0) {
            return Err(ctx.child("stride").error(ErrorKind::ZeroStride));
        }
        if index_array_bounds.is_some() && index_array_raw.is_none() {
            return Err(ctx.child("index_array_bounds").error(ErrorKind::MisplacedIndexArrayBounds));
        }
        let index_array = match index_array_raw {
            Some(array) => Some(check_index_array(array, input_rank, index_array_bounds, &ctx.child("index_array"))?),
            None => None,
        };
        Ok(Self {
            offset,
            stride,
            input_dimension,
            index_array,
            index_array_bounds,
        })
    }
}

fn parse_interval(value: &Value, ctx: &ValidationContext) -> ValidationResult<[i64; 2]> {
    match parse_i64_vec(value, ctx)?.as_slice() {
        [lo, hi] if lo <= hi => Ok([*lo, *hi]),
        _ => Err(ctx.invalid_value("[inclusive_min, inclusive_max] with min <= max", describe(value))),
    }
}

fn check_index_array(
    array: &Value,
    input_rank: usize,
    bounds: Option<[i64; 2]>,
    ctx: &ValidationContext,
) -> ValidationResult<Value> {
    let shape = nested::shape_of(array, ctx)?;
    if shape.len() != input_rank {
        return Err(ctx.error(ErrorKind::RankMismatch {
            rank: input_rank,
            mismatches: vec![LengthMismatch {
                field: "index_array".to_string(),
                length: shape.len(),
            }],
        }));
    }
    nested::map_leaves(array, ctx, &|leaf, ctx| {
        let index = parse_i64(leaf, ctx)?;
        if let Some([lo, hi]) = bounds {
            if index < lo || index > hi {
                return Err(ctx.invalid_value(format!("index within [{}, {}]", lo, hi), index.to_string()));
            }
        }
        Ok(leaf.clone())
    })
}

/// Mapping from an input domain to output coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct IndexTransform {
    pub input_rank: Option<usize>,
    pub input: Bounds,
    pub output_rank: Option<usize>,
    /// `None` is the identity map
    pub output: Option<Vec<OutputIndexMap>>,
    effective_input_rank: usize,
}

impl IndexTransform {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let input_rank = reader.optional("input_rank", parse_rank)?;
        let input = Bounds::read(&mut reader, "input_")?;
        let output_rank = reader.optional("output_rank", parse_rank)?;
        let output_raw = reader.raw("output");
        reader.finish()?;

        let effective_input_rank = input.check(input_rank, "input_", ctx)?;
        let output = match output_raw {
            Some(raw) => {
                let out_ctx = ctx.child("output");
                let maps = parse_vec(raw, &out_ctx, |v, c| OutputIndexMap::from_value(v, effective_input_rank, c))?;
                resolve_rank(ctx, output_rank, &[("output", Some(maps.len()))])?;
                Some(maps)
            }
            None => {
                resolve_rank(ctx, output_rank, &[("input_rank", Some(effective_input_rank))])?;
                None
            }
        };
        Ok(Self {
            input_rank,
            input,
            output_rank,
            output,
            effective_input_rank,
        })
    }

    /// Rank of the input domain
    pub fn input_rank(&self) -> usize {
        self.effective_input_rank
    }

    /// Rank of the output space
    pub fn output_rank(&self) -> usize {
        self.output.as_ref().map_or(self.effective_input_rank, Vec::len)
    }

    pub fn input_shape(&self) -> Option<Vec<u64>> {
        self.input.shape()
    }
}

impl Serialize for IndexTransform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::new();
        if let Some(rank) = self.input_rank {
            map.insert("input_rank".to_string(), Value::from(rank));
        }
        self.input.write("input_", &mut map);
        if let Some(rank) = self.output_rank {
            map.insert("output_rank".to_string(), Value::from(rank));
        }
        if let Some(output) = &self.output {
            let output = serde_json::to_value(output).map_err(serde::ser::Error::custom)?;
            map.insert("output".to_string(), output);
        }
        map.serialize(serializer)
    }
}
