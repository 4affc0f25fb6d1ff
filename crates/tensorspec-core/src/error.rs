//! Error types for TensorStore spec validation
//!
//! Every validation failure is a [`ValidationError`]: an [`ErrorKind`] that
//! callers can branch on, plus the JSON path locating the failure and, where
//! known, the driver and the offending sub-document.
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A rank-bearing field whose length disagrees with the effective rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LengthMismatch {
    /// Field name as it appears in the document
    pub field: String,
    /// Actual length of the field
    pub length: usize,
}

impl fmt::Display for LengthMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (length {})", self.field, self.length)
    }
}

fn join_mismatches(mismatches: &[LengthMismatch]) -> String {
    mismatches
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Kinds of validation failure
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// Text could not be parsed as JSON
    #[error("malformed input: {message}")]
    MalformedInput { message: String },

    #[error("missing or non-string 'driver' discriminator")]
    MissingDiscriminator,

    #[error("unknown driver '{driver}' (registered drivers: {})", .registered.join(", "))]
    UnknownDriver {
        #[serde(rename = "requested")]
        driver: String,
        registered: Vec<String>,
    },

    #[error("missing or non-string kvstore 'driver' discriminator")]
    MissingKvStoreDiscriminator,

    #[error("unknown kvstore driver '{driver}' (registered drivers: {})", .registered.join(", "))]
    UnknownKvStoreDriver {
        #[serde(rename = "requested")]
        driver: String,
        registered: Vec<String>,
    },

    #[error("invalid kvstore URL '{value}': expected file://, memory:// or s3://")]
    InvalidKvStoreString { value: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        #[serde(rename = "value")]
        path: String,
        reason: String,
    },

    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    #[error("expected {expected}, but found {actual}")]
    InvalidType { expected: String, actual: String },

    #[error("invalid value: expected {expected}, but found {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("unknown field '{field}'")]
    UnknownField { field: String },

    #[error("rank cannot be determined: no rank-bearing field is present")]
    RankIndeterminate,

    #[error("rank mismatch: expected rank {rank}, but found {}", join_mismatches(.mismatches))]
    RankMismatch {
        rank: usize,
        mismatches: Vec<LengthMismatch>,
    },

    #[error("conflicting bounds specification: only one of {} may be given", .fields.join(", "))]
    ConflictingBoundsSpecification { fields: Vec<String> },

    #[error("shape {shape} at dimension {dimension} does not match bounds extent {extent}")]
    BoundsShapeMismatch {
        dimension: usize,
        shape: i64,
        extent: i64,
    },

    #[error("duplicate dimension label '{label}'")]
    DuplicateLabel { label: String },

    #[error("output map specifies both 'input_dimension' and 'index_array'")]
    AmbiguousOutputMap,

    #[error("output map specifies neither 'input_dimension' nor 'index_array'")]
    UnderspecifiedOutputMap,

    #[error("input dimension {input_dimension} is out of range for input rank {input_rank}")]
    OutputDimensionOutOfRange {
        input_dimension: usize,
        input_rank: usize,
    },

    #[error("stride must be nonzero")]
    ZeroStride,

    #[error("'index_array_bounds' is only valid together with 'index_array'")]
    MisplacedIndexArrayBounds,

    #[error("'{field}' must be a permutation of 0..{rank}, but found {values:?}")]
    InvalidPermutation {
        field: String,
        values: Vec<i64>,
        rank: usize,
    },

    #[error("{variant}.{field} = {actual} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        variant: String,
        field: String,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("unknown {family} '{variant}' (expected one of: {})", .known.join(", "))]
    UnknownCodecVariant {
        family: String,
        variant: String,
        known: Vec<String>,
    },

    #[error("unsupported data type '{dtype}' (supported: {})", .allowed.join(", "))]
    UnsupportedDType { dtype: String, allowed: Vec<String> },

    #[error("cannot convert {value} to {dtype}")]
    DTypeCoercionError { dtype: String, value: String },

    #[error("irregular array shape at depth {depth}: {reason}")]
    IrregularArrayShape { depth: usize, reason: String },

    #[error("invalid open mode: {reason}")]
    InvalidOpenModeCombination { flags: Vec<String>, reason: String },
}

impl ErrorKind {
    /// Stable name of the kind, used in reports and CLI output
    pub fn name(&self) -> &'static str {
        match self {
            Self::MalformedInput { .. } => "MalformedInput",
            Self::MissingDiscriminator => "MissingDiscriminator",
            Self::UnknownDriver { .. } => "UnknownDriver",
            Self::MissingKvStoreDiscriminator => "MissingKvStoreDiscriminator",
            Self::UnknownKvStoreDriver { .. } => "UnknownKvStoreDriver",
            Self::InvalidKvStoreString { .. } => "InvalidKvStoreString",
            Self::InvalidPath { .. } => "InvalidPath",
            Self::MissingRequiredField { .. } => "MissingRequiredField",
            Self::InvalidType { .. } => "InvalidType",
            Self::InvalidValue { .. } => "InvalidValue",
            Self::UnknownField { .. } => "UnknownField",
            Self::RankIndeterminate => "RankIndeterminate",
            Self::RankMismatch { .. } => "RankMismatch",
            Self::ConflictingBoundsSpecification { .. } => "ConflictingBoundsSpecification",
            Self::BoundsShapeMismatch { .. } => "BoundsShapeMismatch",
            Self::DuplicateLabel { .. } => "DuplicateLabel",
            Self::AmbiguousOutputMap => "AmbiguousOutputMap",
            Self::UnderspecifiedOutputMap => "UnderspecifiedOutputMap",
            Self::OutputDimensionOutOfRange { .. } => "OutputDimensionOutOfRange",
            Self::ZeroStride => "ZeroStride",
            Self::MisplacedIndexArrayBounds => "MisplacedIndexArrayBounds",
            Self::InvalidPermutation { .. } => "InvalidPermutation",
            Self::ParameterOutOfRange { .. } => "ParameterOutOfRange",
            Self::UnknownCodecVariant { .. } => "UnknownCodecVariant",
            Self::UnsupportedDType { .. } => "UnsupportedDType",
            Self::DTypeCoercionError { .. } => "DTypeCoercionError",
            Self::IrregularArrayShape { .. } => "IrregularArrayShape",
            Self::InvalidOpenModeCombination { .. } => "InvalidOpenModeCombination",
        }
    }

    /// Whether the failure happened while selecting a variant, before any
    /// variant-specific validation ran
    pub fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. }
                | Self::MissingDiscriminator
                | Self::UnknownDriver { .. }
                | Self::MissingKvStoreDiscriminator
                | Self::UnknownKvStoreDriver { .. }
                | Self::InvalidKvStoreString { .. }
        )
    }
}

/// Spec validation error with path context
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub struct ValidationError {
    /// JSON path where the error occurred
    pub path: String,
    /// What went wrong
    #[serde(flatten)]
    pub kind: ErrorKind,
    /// Driver of the spec being validated, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    /// The sub-document the error refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(driver) = &self.driver {
            write!(f, "[{}] ", driver)?;
        }
        write!(f, "Validation error at '{}': {}", self.path, self.kind)
    }
}

impl ValidationError {
    /// Create a new validation error
    pub fn new<P: Into<String>>(path: P, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
            driver: None,
            document: None,
        }
    }

    /// Tag the error with a driver name unless it already carries one
    pub fn with_driver<D: Into<String>>(mut self, driver: D) -> Self {
        if self.driver.is_none() {
            self.driver = Some(driver.into());
        }
        self
    }

    /// Attach the raw sub-document the error refers to
    pub fn with_document(mut self, document: Value) -> Self {
        self.document = Some(document);
        self
    }

    /// Shorthand for [`ErrorKind::InvalidValue`]
    pub fn invalid_value<P, E, A>(path: P, expected: E, actual: A) -> Self
    where
        P: Into<String>,
        E: Into<String>,
        A: Into<String>,
    {
        Self::new(
            path,
            ErrorKind::InvalidValue {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Multiple validation errors that can occur during batch validation
#[derive(Debug, Clone, Error, Serialize)]
pub struct ValidationErrors {
    /// List of validation errors
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors occurred:")?;
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

impl ValidationErrors {
    /// Create a new validation errors collection
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Ok if no errors were collected
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Default for ValidationErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        let mut errors = Self::new();
        errors.add(error);
        errors
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

/// Failure reported by an external array runtime during round-trip checks
#[derive(Error, Debug)]
#[error("Runtime verification failed: {message}")]
pub struct RuntimeError {
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl RuntimeError {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source<M: Into<String>>(message: M, source: anyhow::Error) -> Self {
        Self {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Main error type for spec operations
#[derive(Error, Debug)]
pub enum Error {
    /// The document violates the spec data model
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An injected runtime collaborator failed; never produced by validation itself
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Serializing a validated spec failed
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// The validation failure, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            _ => None,
        }
    }

    /// The validation error kind, if this is a validation failure
    pub fn kind(&self) -> Option<&ErrorKind> {
        self.as_validation().map(|error| &error.kind)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;
