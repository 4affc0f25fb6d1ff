//! Chunk layout constraints
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::domain::{parse_rank, resolve_rank};
use crate::error::{ErrorKind, ValidationResult};
use crate::validation::reader::{parse_f64, parse_i64, parse_i64_vec, parse_vec, ObjectReader};
use crate::validation::ValidationContext;
use serde::Serialize;
use serde_json::Value;

/// Hard and soft constraints on one chunk grid
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkLayoutGrid {
    /// `0` leaves a dimension unconstrained, `-1` means the full extent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape_soft_constraint: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio_soft_constraint: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elements_soft_constraint: Option<u64>,
}

fn parse_grid_shape(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<i64>> {
    parse_vec(value, ctx, |v, c| {
        let n = parse_i64(v, c)?;
        if n < -1 {
            return Err(c.invalid_value("non-negative size or -1", n.to_string()));
        }
        Ok(n)
    })
}

fn parse_aspect_ratio(value: &Value, ctx: &ValidationContext) -> ValidationResult<Vec<f64>> {
    parse_vec(value, ctx, |v, c| {
        let ratio = parse_f64(v, c)?;
        if !(ratio >= 0.0 && ratio.is_finite()) {
            return Err(c.invalid_value("non-negative ratio", ratio.to_string()));
        }
        Ok(ratio)
    })
}

fn parse_elements(value: &Value, ctx: &ValidationContext) -> ValidationResult<u64> {
    let n = parse_i64(value, ctx)?;
    if n < 1 {
        return Err(ctx.invalid_value("at least 1 element", n.to_string()));
    }
    Ok(n as u64)
}

impl ChunkLayoutGrid {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let grid = Self {
            shape: reader.optional("shape", parse_grid_shape)?,
            shape_soft_constraint: reader.optional("shape_soft_constraint", parse_grid_shape)?,
            aspect_ratio: reader.optional("aspect_ratio", parse_aspect_ratio)?,
            aspect_ratio_soft_constraint: reader.optional("aspect_ratio_soft_constraint", parse_aspect_ratio)?,
            elements: reader.optional("elements", parse_elements)?,
            elements_soft_constraint: reader.optional("elements_soft_constraint", parse_elements)?,
        };
        reader.finish()?;
        Ok(grid)
    }

    fn rank_fields(&self, prefix: &str) -> Vec<(String, Option<usize>)> {
        vec![
            (format!("{}.shape", prefix), self.shape.as_ref().map(Vec::len)),
            (format!("{}.shape_soft_constraint", prefix), self.shape_soft_constraint.as_ref().map(Vec::len)),
            (format!("{}.aspect_ratio", prefix), self.aspect_ratio.as_ref().map(Vec::len)),
            (
                format!("{}.aspect_ratio_soft_constraint", prefix),
                self.aspect_ratio_soft_constraint.as_ref().map(Vec::len),
            ),
        ]
    }
}

/// Chunking and storage-order constraints for an array
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkLayout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_origin: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_origin_soft_constraint: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_order: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_order_soft_constraint: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_chunk: Option<ChunkLayoutGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_chunk: Option<ChunkLayoutGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec_chunk: Option<ChunkLayoutGrid>,
    /// Applies to both read and write chunks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkLayoutGrid>,
    #[serde(skip)]
    effective_rank: Option<usize>,
}

impl ChunkLayout {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let rank = reader.optional("rank", parse_rank)?;
        let grid_origin = reader.optional("grid_origin", parse_i64_vec)?;
        let grid_origin_soft_constraint = reader.optional("grid_origin_soft_constraint", parse_i64_vec)?;
        let inner_order_raw = reader.optional("inner_order", parse_i64_vec)?;
        let inner_order_soft_raw = reader.optional("inner_order_soft_constraint", parse_i64_vec)?;
        let write_chunk = reader.optional("write_chunk", ChunkLayoutGrid::from_value)?;
        let read_chunk = reader.optional("read_chunk", ChunkLayoutGrid::from_value)?;
        let codec_chunk = reader.optional("codec_chunk", ChunkLayoutGrid::from_value)?;
        let chunk = reader.optional("chunk", ChunkLayoutGrid::from_value)?;
        reader.finish()?;

        let mut fields: Vec<(String, Option<usize>)> = vec![
            ("grid_origin".to_string(), grid_origin.as_ref().map(Vec::len)),
            ("grid_origin_soft_constraint".to_string(), grid_origin_soft_constraint.as_ref().map(Vec::len)),
            ("inner_order".to_string(), inner_order_raw.as_ref().map(Vec::len)),
            ("inner_order_soft_constraint".to_string(), inner_order_soft_raw.as_ref().map(Vec::len)),
        ];
        for (name, grid) in [
            ("write_chunk", &write_chunk),
            ("read_chunk", &read_chunk),
            ("codec_chunk", &codec_chunk),
            ("chunk", &chunk),
        ] {
            if let Some(grid) = grid {
                fields.extend(grid.rank_fields(name));
            }
        }
        let borrowed: Vec<(&str, Option<usize>)> = fields.iter().map(|(n, l)| (n.as_str(), *l)).collect();
        let effective_rank = resolve_rank(ctx, rank, &borrowed)?;

        let permutation_rank = |values: &[i64]| effective_rank.unwrap_or(values.len());
        let inner_order = match inner_order_raw {
            Some(values) => Some(check_permutation(
                &values,
                permutation_rank(&values),
                "inner_order",
                &ctx.child("inner_order"),
            )?),
            None => None,
        };
        let inner_order_soft_constraint = match inner_order_soft_raw {
            Some(values) => Some(check_permutation(
                &values,
                permutation_rank(&values),
                "inner_order_soft_constraint",
                &ctx.child("inner_order_soft_constraint"),
            )?),
            None => None,
        };

        Ok(Self {
            rank,
            grid_origin,
            grid_origin_soft_constraint,
            inner_order,
            inner_order_soft_constraint,
            write_chunk,
            read_chunk,
            codec_chunk,
            chunk,
            effective_rank,
        })
    }

    /// Rank implied by any rank-bearing field
    pub fn rank(&self) -> Option<usize> {
        self.effective_rank
    }
}

/// Fail with [`ErrorKind::InvalidPermutation`] unless `values` sorted is
/// exactly `0..rank`
pub fn check_permutation(
    values: &[i64],
    rank: usize,
    field: &str,
    ctx: &ValidationContext,
) -> ValidationResult<Vec<usize>> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let is_permutation = sorted.len() == rank && sorted.iter().enumerate().all(|(i, v)| *v == i as i64);
    if !is_permutation {
        return Err(ctx.error(ErrorKind::InvalidPermutation {
            field: field.to_string(),
            values: values.to_vec(),
            rank,
        }));
    }
    Ok(values.iter().map(|v| *v as usize).collect())
}
