//! Entry points: validate documents from any accepted source
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::driver::TensorStoreSpec;
use crate::error::{Error, ErrorKind, Result, RuntimeError, ValidationError, ValidationErrors, ValidationResult};
use crate::validation::{ValidationConfig, ValidationContext, ValidationMode};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

/// Checks a validated spec against a live array runtime
pub trait RuntimeVerifier {
    fn verify(&self, spec: &TensorStoreSpec) -> std::result::Result<(), RuntimeError>;
}

/// A runtime handle or spec object that can describe itself as JSON
pub trait RuntimeSpecSource {
    fn to_spec_json(&self) -> std::result::Result<Value, RuntimeError>;
}

/// Accepted input forms
pub enum SpecInput<'a> {
    Value(&'a Value),
    Json(&'a str),
    /// An already validated spec
    Spec(&'a TensorStoreSpec),
    Runtime(&'a dyn RuntimeSpecSource),
}

impl fmt::Debug for SpecInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Json(text) => f.debug_tuple("Json").field(text).finish(),
            Self::Spec(spec) => f.debug_tuple("Spec").field(spec).finish(),
            Self::Runtime(_) => f.write_str("Runtime(..)"),
        }
    }
}

impl<'a> From<&'a Value> for SpecInput<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Value(value)
    }
}

impl<'a> From<&'a str> for SpecInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Json(text)
    }
}

impl<'a> From<&'a TensorStoreSpec> for SpecInput<'a> {
    fn from(spec: &'a TensorStoreSpec) -> Self {
        Self::Spec(spec)
    }
}

/// Parse JSON text, reporting syntax errors as [`ErrorKind::MalformedInput`]
pub fn parse_json(text: &str) -> ValidationResult<Value> {
    serde_json::from_str(text).map_err(|err| {
        ValidationError::new(
            "$",
            ErrorKind::MalformedInput {
                message: err.to_string(),
            },
        )
    })
}

/// Validate a spec document in strict mode
pub fn validate_spec(value: &Value) -> ValidationResult<TensorStoreSpec> {
    validate_spec_with_mode(value, ValidationMode::Strict)
}

pub fn validate_spec_with_mode(value: &Value, mode: ValidationMode) -> ValidationResult<TensorStoreSpec> {
    TensorStoreSpec::from_value(value, &ValidationContext::new(mode))
}

/// Validate JSON text in strict mode
pub fn validate_json(text: &str) -> ValidationResult<TensorStoreSpec> {
    validate_spec(&parse_json(text)?)
}

/// Validate many documents; errors are located under `$[i]`
pub fn validate_specs_batch(
    specs: &[Value],
    config: &ValidationConfig,
) -> std::result::Result<Vec<TensorStoreSpec>, ValidationErrors> {
    let context = ValidationContext::new(config.mode);
    let mut validated = Vec::with_capacity(specs.len());
    let mut errors = ValidationErrors::new();

    for (i, spec) in specs.iter().enumerate() {
        match TensorStoreSpec::from_value(spec, &context.child_index(i)) {
            Ok(spec) => validated.push(spec),
            Err(error) => {
                errors.add(error);
                if config.should_stop(errors.len()) {
                    break;
                }
            }
        }
    }

    debug!(total = specs.len(), failed = errors.len(), "batch validation finished");
    errors.into_result().map(|()| validated)
}

/// Validator with a mode and an optional runtime round-trip check
pub struct SpecValidator {
    mode: ValidationMode,
    revalidate: bool,
    verifier: Option<Box<dyn RuntimeVerifier>>,
}

impl Default for SpecValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpecValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecValidator")
            .field("mode", &self.mode)
            .field("revalidate", &self.revalidate)
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

impl SpecValidator {
    pub fn new() -> Self {
        Self {
            mode: ValidationMode::Strict,
            revalidate: false,
            verifier: None,
        }
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Re-run validation on already validated specs instead of passing
    /// them through
    pub fn revalidate(mut self, revalidate: bool) -> Self {
        self.revalidate = revalidate;
        self
    }

    pub fn with_verifier<V: RuntimeVerifier + 'static>(mut self, verifier: V) -> Self {
        self.verifier = Some(Box::new(verifier));
        self
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate `input`, then run the verifier once if one is configured
    pub fn validate<'a, I: Into<SpecInput<'a>>>(&self, input: I) -> Result<TensorStoreSpec> {
        let ctx = ValidationContext::new(self.mode);
        let spec = match input.into() {
            SpecInput::Value(value) => TensorStoreSpec::from_value(value, &ctx)?,
            SpecInput::Json(text) => TensorStoreSpec::from_value(&parse_json(text)?, &ctx)?,
            SpecInput::Spec(spec) if self.revalidate => TensorStoreSpec::from_value(&spec.to_value()?, &ctx)?,
            SpecInput::Spec(spec) => spec.clone(),
            SpecInput::Runtime(source) => {
                let value = source.to_spec_json()?;
                TensorStoreSpec::from_value(&value, &ctx)?
            }
        };

        if let Some(verifier) = &self.verifier {
            info!(driver = spec.driver(), "verifying spec against runtime");
            if let Err(err) = verifier.verify(&spec) {
                warn!(driver = spec.driver(), error = %err, "runtime verification failed");
                return Err(Error::Runtime(err));
            }
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingVerifier {
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    impl RuntimeVerifier for CountingVerifier {
        fn verify(&self, _spec: &TensorStoreSpec) -> std::result::Result<(), RuntimeError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(RuntimeError::new("shape differs"))
            } else {
                Ok(())
            }
        }
    }

    struct Handle;

    impl RuntimeSpecSource for Handle {
        fn to_spec_json(&self) -> std::result::Result<Value, RuntimeError> {
            Ok(json!({"driver": "array", "array": [1.5, 2.5], "dtype": "float32"}))
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = validate_json("{\"driver\": ").unwrap_err();
        assert_eq!(err.kind.name(), "MalformedInput");
        assert!(err.kind.is_dispatch_error());
    }

    #[test]
    fn test_verifier_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let validator = SpecValidator::new().with_verifier(CountingVerifier {
            calls: Rc::clone(&calls),
            fail: false,
        });
        let spec = validator.validate(SpecInput::Runtime(&Handle)).unwrap();
        assert_eq!(spec.driver(), "array");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_verifier_failure_is_a_runtime_error() {
        let validator = SpecValidator::new().with_verifier(CountingVerifier {
            calls: Rc::new(Cell::new(0)),
            fail: true,
        });
        let err = validator
            .validate(r#"{"driver": "array", "array": [1], "dtype": "int8"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));
        assert!(err.kind().is_none());
    }

    #[test]
    fn test_verifier_not_called_on_invalid_spec() {
        let calls = Rc::new(Cell::new(0));
        let validator = SpecValidator::new().with_verifier(CountingVerifier {
            calls: Rc::clone(&calls),
            fail: false,
        });
        assert!(validator.validate(r#"{"driver": "zarr"}"#).is_err());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_batch_respects_limits() {
        let docs = vec![
            json!({"driver": "nope"}),
            json!({"driver": "array", "array": [1], "dtype": "int8"}),
            json!({}),
        ];
        let errors = validate_specs_batch(&docs, &ValidationConfig::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.errors[1].path, "$[2]");

        let errors = validate_specs_batch(&docs, &ValidationConfig::default().with_fail_fast()).unwrap_err();
        assert_eq!(errors.len(), 1);

        let ok = validate_specs_batch(&docs[1..2], &ValidationConfig::default()).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
