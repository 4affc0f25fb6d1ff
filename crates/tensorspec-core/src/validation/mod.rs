//! Validation infrastructure shared by every spec component
//!
//! - [`ValidationContext`] tracks the JSON path and [`ValidationMode`]
//! - [`ObjectReader`] and the `parse_*` helpers read untyped JSON
//! - [`ValidationConfig`] controls batch validation
//!
//! Copyright (c) 2025 Tensorspec Team
//! Licensed under the Apache-2.0 license

pub mod context;
pub mod reader;

pub use context::{ValidationContext, ValidationMode};
pub use reader::ObjectReader;

/// Validation configuration for batch operations
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Validation mode to use
    pub mode: ValidationMode,
    /// Whether to stop on first error or collect all errors
    pub fail_fast: bool,
    /// Maximum number of errors to collect (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict,
            fail_fast: false,
            max_errors: 0,
        }
    }
}

impl ValidationConfig {
    /// Create a configuration for strict validation
    pub fn strict() -> Self {
        Self::default()
    }

    /// Create a configuration for partial validation
    pub fn partial() -> Self {
        Self {
            mode: ValidationMode::Partial,
            ..Self::default()
        }
    }

    /// Create a configuration for basic validation
    pub fn basic() -> Self {
        Self {
            mode: ValidationMode::Basic,
            ..Self::default()
        }
    }

    /// Enable fail-fast mode
    pub fn with_fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Set maximum number of errors to collect
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Whether collection should stop after `collected` errors
    pub fn should_stop(&self, collected: usize) -> bool {
        (self.fail_fast && collected > 0) || (self.max_errors > 0 && collected >= self.max_errors)
    }
}
