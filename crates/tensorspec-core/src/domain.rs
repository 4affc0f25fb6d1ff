//! Index domains and the rank reconciliation shared with index transforms
//!
//! A domain may describe its rank through several optional fields. The
//! effective rank comes from the first populated field, in this order:
//! explicit rank, inclusive_min, exclusive_max, inclusive_max, shape,
//! labels, implicit flags. Every other populated field must agree with it;
//! all disagreeing fields are reported together.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{ErrorKind, LengthMismatch, ValidationResult};
use crate::types::MAX_RANK;
use crate::validation::reader::{parse_bool, parse_i64_vec, parse_positive_vec, parse_string_vec, parse_usize, parse_vec, ObjectReader};
use crate::validation::{ValidationContext, ValidationMode};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Reconcile the lengths of rank-bearing fields
///
/// `fields` lists `(name, length)` pairs in priority order. Returns the
/// effective rank, or `None` when nothing carries one. Every field whose
/// length disagrees is collected into a single [`ErrorKind::RankMismatch`].
pub fn resolve_rank(
    ctx: &ValidationContext,
    explicit: Option<usize>,
    fields: &[(&str, Option<usize>)],
) -> ValidationResult<Option<usize>> {
    let rank = explicit.or_else(|| fields.iter().find_map(|(_, len)| *len));
    let Some(rank) = rank else {
        return Ok(None);
    };
    if rank > MAX_RANK {
        return Err(ctx.invalid_value(format!("rank at most {}", MAX_RANK), rank.to_string()));
    }
    let mismatches: Vec<LengthMismatch> = fields
        .iter()
        .filter_map(|(field, len)| match len {
            Some(len) if *len != rank => Some(LengthMismatch {
                field: field.to_string(),
                length: *len,
            }),
            _ => None,
        })
        .collect();
    if mismatches.is_empty() {
        Ok(Some(rank))
    } else {
        Err(ctx.error(ErrorKind::RankMismatch { rank, mismatches }))
    }
}

/// Parse an explicit rank field
pub fn parse_rank(value: &Value, ctx: &ValidationContext) -> ValidationResult<usize> {
    let rank = parse_usize(value, ctx)?;
    if rank > MAX_RANK {
        return Err(ctx.invalid_value(format!("rank at most {}", MAX_RANK), rank.to_string()));
    }
    Ok(rank)
}

/// Per-dimension bounds, shape and labels
///
/// Used with an empty field prefix by [`IndexDomain`] and with `input_` by
/// the input side of an index transform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bounds {
    pub inclusive_min: Option<Vec<i64>>,
    pub exclusive_max: Option<Vec<i64>>,
    pub inclusive_max: Option<Vec<i64>>,
    pub shape: Option<Vec<u64>>,
    pub labels: Option<Vec<String>>,
    pub implicit_lower_bounds: Option<Vec<bool>>,
    pub implicit_upper_bounds: Option<Vec<bool>>,
}

impl Bounds {
    pub(crate) fn read(reader: &mut ObjectReader<'_>, prefix: &str) -> ValidationResult<Self> {
        let key = |name: &str| format!("{}{}", prefix, name);
        let parse_flags = |v: &Value, ctx: &ValidationContext| parse_vec(v, ctx, parse_bool);
        Ok(Self {
            inclusive_min: reader.optional(&key("inclusive_min"), parse_i64_vec)?,
            exclusive_max: reader.optional(&key("exclusive_max"), parse_i64_vec)?,
            inclusive_max: reader.optional(&key("inclusive_max"), parse_i64_vec)?,
            shape: reader.optional(&key("shape"), parse_positive_vec)?,
            labels: reader.optional(&key("labels"), parse_string_vec)?,
            implicit_lower_bounds: reader.optional(&key("implicit_lower_bounds"), parse_flags)?,
            implicit_upper_bounds: reader.optional(&key("implicit_upper_bounds"), parse_flags)?,
        })
    }

    fn upper_fields(&self, prefix: &str) -> Vec<String> {
        [
            ("exclusive_max", self.exclusive_max.is_some()),
            ("inclusive_max", self.inclusive_max.is_some()),
            ("shape", self.shape.is_some()),
        ]
        .into_iter()
        .filter(|(_, present)| *present)
        .map(|(name, _)| format!("{}{}", prefix, name))
        .collect()
    }

    /// Run the rank, bounds and label checks; returns the effective rank
    pub(crate) fn check(
        &self,
        explicit_rank: Option<usize>,
        prefix: &str,
        ctx: &ValidationContext,
    ) -> ValidationResult<usize> {
        let names: Vec<String> = [
            "inclusive_min",
            "exclusive_max",
            "inclusive_max",
            "shape",
            "labels",
            "implicit_lower_bounds",
            "implicit_upper_bounds",
        ]
        .iter()
        .map(|name| format!("{}{}", prefix, name))
        .collect();
        let lengths = [
            self.inclusive_min.as_ref().map(Vec::len),
            self.exclusive_max.as_ref().map(Vec::len),
            self.inclusive_max.as_ref().map(Vec::len),
            self.shape.as_ref().map(Vec::len),
            self.labels.as_ref().map(Vec::len),
            self.implicit_lower_bounds.as_ref().map(Vec::len),
            self.implicit_upper_bounds.as_ref().map(Vec::len),
        ];
        let fields: Vec<(&str, Option<usize>)> = names.iter().map(String::as_str).zip(lengths).collect();
        let rank = resolve_rank(ctx, explicit_rank, &fields)?.ok_or_else(|| ctx.error(ErrorKind::RankIndeterminate))?;

        let upper = self.upper_fields(prefix);
        if upper.len() > 1 {
            if ctx.mode == ValidationMode::Strict {
                return Err(ctx.error(ErrorKind::ConflictingBoundsSpecification { fields: upper }));
            }
            self.check_extents(prefix, ctx)?;
        }
        self.check_ordering(prefix, ctx)?;
        self.check_labels(prefix, ctx)?;
        Ok(rank)
    }

    fn lower(&self, i: usize) -> i64 {
        self.inclusive_min.as_ref().map_or(0, |min| min[i])
    }

    /// Shape and bounds given together must describe the same extents
    fn check_extents(&self, prefix: &str, ctx: &ValidationContext) -> ValidationResult<()> {
        if let (Some(exclusive), Some(inclusive)) = (&self.exclusive_max, &self.inclusive_max) {
            for (i, (hi, incl)) in exclusive.iter().zip(inclusive).enumerate() {
                if *hi != incl.saturating_add(1) {
                    return Err(ctx.child(format!("{}inclusive_max", prefix)).child_index(i).invalid_value(
                        format!("{} (exclusive_max - 1)", hi.saturating_sub(1)),
                        incl.to_string(),
                    ));
                }
            }
        }
        let Some(shape) = &self.shape else {
            return Ok(());
        };
        for (i, size) in shape.iter().enumerate() {
            let extent = match (&self.exclusive_max, &self.inclusive_max) {
                (Some(hi), _) => hi[i].saturating_sub(self.lower(i)),
                (None, Some(hi)) => hi[i].saturating_sub(self.lower(i)).saturating_add(1),
                (None, None) => continue,
            };
            let size = i64::try_from(*size).unwrap_or(i64::MAX);
            if size != extent {
                return Err(ctx.error(ErrorKind::BoundsShapeMismatch {
                    dimension: i,
                    shape: size,
                    extent,
                }));
            }
        }
        Ok(())
    }

    fn check_ordering(&self, prefix: &str, ctx: &ValidationContext) -> ValidationResult<()> {
        let Some(min) = &self.inclusive_min else {
            return Ok(());
        };
        if let Some(max) = &self.exclusive_max {
            for (i, (lo, hi)) in min.iter().zip(max).enumerate() {
                if hi < lo {
                    return Err(ctx
                        .child(format!("{}exclusive_max", prefix))
                        .child_index(i)
                        .invalid_value(format!("value >= inclusive_min {}", lo), hi.to_string()));
                }
            }
        }
        if let Some(max) = &self.inclusive_max {
            for (i, (lo, hi)) in min.iter().zip(max).enumerate() {
                if hi.saturating_add(1) < *lo {
                    return Err(ctx
                        .child(format!("{}inclusive_max", prefix))
                        .child_index(i)
                        .invalid_value(format!("value >= inclusive_min - 1 ({})", lo.saturating_sub(1)), hi.to_string()));
                }
            }
        }
        Ok(())
    }

    fn check_labels(&self, prefix: &str, ctx: &ValidationContext) -> ValidationResult<()> {
        let Some(labels) = &self.labels else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        for (i, label) in labels.iter().enumerate() {
            if !label.is_empty() && !seen.insert(label.as_str()) {
                return Err(ctx
                    .child(format!("{}labels", prefix))
                    .child_index(i)
                    .error(ErrorKind::DuplicateLabel { label: label.clone() }));
            }
        }
        Ok(())
    }

    /// Extent of each dimension, when derivable
    pub fn shape(&self) -> Option<Vec<u64>> {
        if let Some(shape) = &self.shape {
            return Some(shape.clone());
        }
        let rank = self.exclusive_max.as_ref().or(self.inclusive_max.as_ref())?.len();
        let extents = (0..rank)
            .map(|i| match (&self.exclusive_max, &self.inclusive_max) {
                (Some(hi), _) => hi[i].saturating_sub(self.lower(i)),
                (None, Some(hi)) => hi[i].saturating_sub(self.lower(i)).saturating_add(1),
                (None, None) => 0,
            })
            .map(|extent| u64::try_from(extent).unwrap_or(0))
            .collect();
        Some(extents)
    }

    pub(crate) fn write(&self, prefix: &str, map: &mut Map<String, Value>) {
        let mut put = |name: &str, value: Option<Value>| {
            if let Some(value) = value {
                map.insert(format!("{}{}", prefix, name), value);
            }
        };
        put("inclusive_min", self.inclusive_min.as_ref().map(|v| Value::from(v.clone())));
        put("exclusive_max", self.exclusive_max.as_ref().map(|v| Value::from(v.clone())));
        put("inclusive_max", self.inclusive_max.as_ref().map(|v| Value::from(v.clone())));
        put("shape", self.shape.as_ref().map(|v| Value::from(v.clone())));
        put("labels", self.labels.as_ref().map(|v| Value::from(v.clone())));
        put("implicit_lower_bounds", self.implicit_lower_bounds.as_ref().map(|v| Value::from(v.clone())));
        put("implicit_upper_bounds", self.implicit_upper_bounds.as_ref().map(|v| Value::from(v.clone())));
    }
}

/// The coordinate space of an array
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDomain {
    /// Explicit rank, when given
    pub rank: Option<usize>,
    pub bounds: Bounds,
    effective_rank: usize,
}

impl IndexDomain {
    pub fn from_value(value: &Value, ctx: &ValidationContext) -> ValidationResult<Self> {
        let mut reader = ObjectReader::new(value, ctx)?;
        let rank = reader.optional("rank", parse_rank)?;
        let bounds = Bounds::read(&mut reader, "")?;
        reader.finish()?;
        let effective_rank = bounds.check(rank, "", ctx)?;
        Ok(Self {
            rank,
            bounds,
            effective_rank,
        })
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.effective_rank
    }

    /// Extent of each dimension, when the domain bounds it
    pub fn shape(&self) -> Option<Vec<u64>> {
        self.bounds.shape()
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.bounds.labels.as_deref()
    }
}

impl Serialize for IndexDomain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::new();
        if let Some(rank) = self.rank {
            map.insert("rank".to_string(), Value::from(rank));
        }
        self.bounds.write("", &mut map);
        map.serialize(serializer)
    }
}
