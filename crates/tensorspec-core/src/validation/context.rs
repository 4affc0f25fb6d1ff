//! Validation modes and the path-tracking validation context
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

use crate::error::{ErrorKind, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How strictly a document is checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Every rule; unknown fields on closed objects are rejected
    #[default]
    Strict,
    /// Every rule, but unknown fields are dropped and redundant bounds are
    /// accepted when consistent
    Partial,
    /// Like partial, without cross-object consistency checks
    Basic,
}

impl ValidationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Partial => "partial",
            Self::Basic => "basic",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "partial" => Ok(Self::Partial),
            "basic" => Ok(Self::Basic),
            other => Err(format!(
                "unknown validation mode '{}' (expected strict, partial or basic)",
                other
            )),
        }
    }
}

/// Validation context carrying the current JSON path
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Current JSON path
    pub path: String,
    /// Validation mode
    pub mode: ValidationMode,
    /// Driver of the spec being validated, once dispatch has selected one
    pub driver: Option<&'static str>,
}

impl ValidationContext {
    /// Create a root context
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            path: "$".to_string(),
            mode,
            driver: None,
        }
    }

    /// Create a child context with updated path
    pub fn child<P: AsRef<str>>(&self, path_segment: P) -> Self {
        Self {
            path: format!("{}.{}", self.path, path_segment.as_ref()),
            mode: self.mode,
            driver: self.driver,
        }
    }

    /// Create a child context for array index
    pub fn child_index(&self, index: usize) -> Self {
        Self {
            path: format!("{}[{}]", self.path, index),
            mode: self.mode,
            driver: self.driver,
        }
    }

    /// Context scoped to a driver; errors created from it carry the name
    pub fn with_driver(&self, driver: &'static str) -> Self {
        Self {
            path: self.path.clone(),
            mode: self.mode,
            driver: Some(driver),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.mode == ValidationMode::Strict
    }

    /// Whether spec-level consistency between sibling objects is checked
    pub fn checks_cross_fields(&self) -> bool {
        self.mode != ValidationMode::Basic
    }

    /// Error located at this context's path
    pub fn error(&self, kind: ErrorKind) -> ValidationError {
        let error = ValidationError::new(self.path.clone(), kind);
        match self.driver {
            Some(driver) => error.with_driver(driver),
            None => error,
        }
    }

    /// [`ErrorKind::InvalidValue`] at this context's path
    pub fn invalid_value<E: Into<String>, A: Into<String>>(
        &self,
        expected: E,
        actual: A,
    ) -> ValidationError {
        self.error(ErrorKind::InvalidValue {
            expected: expected.into(),
            actual: actual.into(),
        })
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(ValidationMode::Strict)
    }
}
