//! Tensorspec Core - validating data model for array storage specs
//!
//! A spec is a JSON document describing how a multidimensional array is
//! stored: its driver (in-memory, zarr, zarr3, n5, neuroglancer precomputed,
//! tiff or auto), element type, domain, chunk layout, codec and the
//! key-value store holding its chunks. This crate turns untyped documents
//! into strongly typed [`TensorStoreSpec`] values or reports precisely where
//! and why a document is invalid.
//!
//! # Main Components
//!
//! - **Dispatch**: [`TensorStoreSpec::from_value`] selects a driver by its
//!   `driver` discriminator and validates the document against it
//! - **Shape/domain model**: [`domain::IndexDomain`], [`transform::IndexTransform`]
//!   and [`chunk_layout::ChunkLayout`] reconcile rank across representations
//! - **Codecs**: per-format compression descriptors in [`codec`]
//! - **Key-value stores**: [`KvStoreSpec`] with URL shorthand expansion
//! - **Errors**: every failure is a [`ValidationError`] with an
//!   [`ErrorKind`], a JSON path, and the driver and sub-document when known
//!
//! # Quick Start
//!
//! ```rust
//! use tensorspec_core::{validate_spec, ErrorKind};
//! use serde_json::json;
//!
//! let spec = validate_spec(&json!({
//!     "driver": "array",
//!     "array": [[1, 2, 3], [4, 5, 6]],
//!     "dtype": "int32"
//! }))
//! .unwrap();
//! assert_eq!(spec.rank(), Some(2));
//!
//! let err = validate_spec(&json!({"driver": "zarr", "path": "x.zarr"})).unwrap_err();
//! assert_eq!(
//!     err.kind,
//!     ErrorKind::MissingRequiredField { field: "kvstore".to_string() }
//! );
//! ```
//!
//! # Validation Modes
//!
//! - **Strict**: every rule; unknown fields on closed objects are errors
//! - **Partial**: unknown fields are dropped with a warning and redundant
//!   bounds are accepted when consistent
//! - **Basic**: like partial, without cross-object consistency checks
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod chunk_layout;
pub mod codec;
pub mod domain;
pub mod driver;
pub mod error;
pub mod kvstore;
pub mod nested;
pub mod normalize;
pub mod schema;
pub mod transform;
pub mod types;
pub mod validation;
pub mod validator;

// Re-export main types for convenience
pub use driver::{DriverKind, TensorStoreSpec};
pub use error::{Error, ErrorKind, LengthMismatch, Result, RuntimeError, ValidationError, ValidationErrors, ValidationResult};
pub use kvstore::KvStoreSpec;
pub use schema::Schema;
pub use types::{DataType, OpenMode, ReadWriteMode, Unit};
pub use validation::{ValidationConfig, ValidationContext, ValidationMode};
pub use validator::{
    parse_json, validate_json, validate_spec, validate_spec_with_mode, validate_specs_batch, RuntimeSpecSource,
    RuntimeVerifier, SpecInput, SpecValidator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
