//! Fields common to every driver spec and the cross-object checks that
//! relate them to driver-specific data

use crate::domain::{parse_rank, resolve_rank};
use crate::error::ValidationResult;
use crate::schema::{coerce_fill_value, Schema};
use crate::transform::IndexTransform;
use crate::types::{Context, DataType};
use crate::validation::reader::ObjectReader;
use crate::validation::ValidationContext;
use serde::Serialize;

/// `dtype`/`rank` shortcuts, `context`, `schema` and `transform`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpecBase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<IndexTransform>,
}

/// What a driver's own fields imply about the array
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DriverConstraints<'a> {
    /// Allowed element types; empty accepts any
    pub dtypes: &'a [DataType],
    /// Rank of the stored array and the field it was derived from
    pub stored_rank: Option<(&'a str, usize)>,
    /// Element type recorded in driver metadata and the field holding it
    pub stored_dtype: Option<(&'a str, DataType)>,
    /// Driver a `schema.codec` must belong to
    pub codec_driver: Option<&'a str>,
}

impl SpecBase {
    pub(crate) fn read(reader: &mut ObjectReader<'_>) -> ValidationResult<Self> {
        let base = Self {
            dtype: reader.optional("dtype", DataType::from_value)?,
            rank: reader.optional("rank", parse_rank)?,
            context: reader.optional("context", Context::from_value)?,
            schema: reader.optional("schema", Schema::from_value)?,
            transform: reader.optional("transform", IndexTransform::from_value)?,
        };
        base.check(reader.context())?;
        Ok(base)
    }

    /// Shortcuts must agree with the schema; the transform's input rank is
    /// the spec's rank
    fn check(&self, ctx: &ValidationContext) -> ValidationResult<()> {
        if !ctx.checks_cross_fields() {
            return Ok(());
        }
        let schema = self.schema.as_ref();
        if let (Some(shortcut), Some(inner)) = (self.dtype, schema.and_then(|s| s.dtype)) {
            if shortcut != inner {
                return Err(ctx
                    .child("schema")
                    .child("dtype")
                    .invalid_value(format!("\"{}\" to match dtype", shortcut), format!("\"{}\"", inner)));
            }
        }
        resolve_rank(
            ctx,
            self.rank,
            &[
                ("schema.rank", schema.and_then(Schema::effective_rank)),
                ("transform.input_rank", self.transform.as_ref().map(IndexTransform::input_rank)),
            ],
        )?;
        if let (Some(dtype), Some(fill)) = (self.dtype, schema.and_then(|s| s.fill_value.as_ref())) {
            coerce_fill_value(dtype, fill, &ctx.child("schema").child("fill_value"))?;
        }
        Ok(())
    }

    /// Element type from the shortcut or the schema
    pub fn dtype(&self) -> Option<DataType> {
        self.dtype.or_else(|| self.schema.as_ref().and_then(|s| s.dtype))
    }

    /// Rank from the shortcut, the schema or the transform's input
    pub fn rank(&self) -> Option<usize> {
        self.rank
            .or_else(|| self.schema.as_ref().and_then(Schema::effective_rank))
            .or_else(|| self.transform.as_ref().map(IndexTransform::input_rank))
    }

    fn dtype_field(&self) -> &'static str {
        if self.dtype.is_some() {
            "dtype"
        } else {
            "schema.dtype"
        }
    }

    /// Relate the common fields to what the driver's own fields imply
    pub(crate) fn check_constraints(&self, constraints: &DriverConstraints<'_>, ctx: &ValidationContext) -> ValidationResult<()> {
        if !ctx.checks_cross_fields() {
            return Ok(());
        }

        if let Some(dtype) = self.dtype() {
            if !constraints.dtypes.is_empty() {
                dtype.check_allowed(constraints.dtypes, &ctx.child(self.dtype_field()))?;
            }
            if let Some((field, stored)) = constraints.stored_dtype {
                if stored != dtype {
                    return Err(ctx
                        .child(field)
                        .invalid_value(format!("\"{}\" to match {}", dtype, self.dtype_field()), format!("\"{}\"", stored)));
                }
            }
        }

        if let Some((field, stored_rank)) = constraints.stored_rank {
            // The stored array is the transform's output space when there is one
            let fields = match &self.transform {
                Some(transform) => vec![
                    (field, Some(stored_rank)),
                    ("transform.output_rank", Some(transform.output_rank())),
                ],
                None => vec![
                    (field, Some(stored_rank)),
                    ("rank", self.rank),
                    ("schema.rank", self.schema.as_ref().and_then(Schema::effective_rank)),
                ],
            };
            resolve_rank(ctx, None, &fields)?;
        }

        if let (Some(driver), Some(codec)) = (constraints.codec_driver, self.schema.as_ref().and_then(|s| s.codec.as_ref())) {
            codec.check_driver(driver, &ctx.child("schema").child("codec"))?;
        }
        Ok(())
    }
}
