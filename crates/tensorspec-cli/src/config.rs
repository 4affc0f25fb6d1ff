//! Configuration management for the CLI
//!
//! Configuration is layered from:
//! - Default values
//! - A configuration file (TOML, YAML or JSON, chosen by extension)
//! - Environment variables
//! - Command-line arguments

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tensorspec_core::{ValidationConfig, ValidationMode};
use tracing::{debug, warn};

/// File name stem used for project and home-directory configs
const CONFIG_STEM: &str = ".tensorspec";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Validation defaults
    pub validation: ValidationSettings,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingSettings,
}

/// Validation defaults applied when the command line does not override them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// strict, partial or basic
    pub mode: String,

    /// Stop at the first invalid document
    pub fail_fast: bool,

    /// Stop after this many invalid documents (0 = unlimited)
    pub max_errors: usize,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Show progress indicators
    pub progress: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: String,

    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            mode: ValidationMode::Strict.to_string(),
            fail_fast: false,
            max_errors: 0,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            progress: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: None,
            format: "compact".to_string(),
            file: None,
        }
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config = match extension(path) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };

        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to load config, trying next location");
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations, then
    /// apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) if !path.exists() => {
                return Err(Error::config(format!("config file {} does not exist", path.display())))
            }
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env();
        Ok(config)
    }

    /// Get default configuration file paths to check, in priority order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Self::project_config_candidates();

        if let Some(user_path) = Self::user_config_path() {
            paths.push(user_path);
        }

        if let Some(home_dir) = dirs::home_dir() {
            for ext in ["toml", "yaml", "json"] {
                paths.push(home_dir.join(format!("{}.{}", CONFIG_STEM, ext)));
            }
        }

        paths
    }

    fn project_config_candidates() -> Vec<PathBuf> {
        ["toml", "yaml", "yml", "json"]
            .iter()
            .map(|ext| PathBuf::from(format!("{}.{}", CONFIG_STEM, ext)))
            .collect()
    }

    /// `<config dir>/tensorspec/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tensorspec").join("config.toml"))
    }

    /// Project config in the working directory, if one exists
    pub fn find_project_config() -> Option<PathBuf> {
        Self::project_config_candidates().into_iter().find(|p| p.exists())
    }

    /// Apply `TENSORSPEC_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(mode) = std::env::var("TENSORSPEC_MODE") {
            self.validation.mode = mode;
        }
        if let Ok(format) = std::env::var("TENSORSPEC_OUTPUT_FORMAT") {
            self.output.format = format;
        }
        if let Ok(color) = std::env::var("TENSORSPEC_OUTPUT_COLOR") {
            self.output.color = color.to_lowercase() == "true" || color == "1";
        }
        if let Ok(level) = std::env::var("TENSORSPEC_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
    }

    /// Check every value that is stored as text
    pub fn validate(&self) -> Result<()> {
        self.validation_mode()?;
        self.output_format()?;
        if !["compact", "full", "json"].contains(&self.logging.format.as_str()) {
            return Err(Error::config(format!(
                "logging.format must be compact, full or json, got '{}'",
                self.logging.format
            )));
        }
        if let Some(level) = &self.logging.level {
            if !["trace", "debug", "info", "warn", "error"].contains(&level.to_lowercase().as_str()) {
                return Err(Error::config(format!("unknown logging.level '{}'", level)));
            }
        }
        Ok(())
    }

    pub fn validation_mode(&self) -> Result<ValidationMode> {
        self.validation
            .mode
            .parse()
            .map_err(|e: String| Error::config(format!("validation.mode: {}", e)))
    }

    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.output.format, true)
            .map_err(|e| Error::config(format!("output.format: {}", e)))
    }

    /// Batch settings with command-line overrides applied
    pub fn validation_config(
        &self,
        mode: Option<ValidationMode>,
        fail_fast: bool,
        max_errors: Option<usize>,
    ) -> Result<ValidationConfig> {
        let mut config = ValidationConfig {
            mode: match mode {
                Some(mode) => mode,
                None => self.validation_mode()?,
            },
            ..ValidationConfig::default()
        };
        if fail_fast || self.validation.fail_fast {
            config = config.with_fail_fast();
        }
        Ok(config.with_max_errors(max_errors.unwrap_or(self.validation.max_errors)))
    }

    /// Get a configuration value by dotted key
    pub fn get_value(&self, key: &str) -> Result<String> {
        let value = match key {
            "validation.mode" => self.validation.mode.clone(),
            "validation.fail_fast" => self.validation.fail_fast.to_string(),
            "validation.max_errors" => self.validation.max_errors.to_string(),
            "output.format" => self.output.format.clone(),
            "output.color" => self.output.color.to_string(),
            "output.progress" => self.output.progress.to_string(),
            "logging.level" => self.logging.level.clone().unwrap_or_default(),
            "logging.format" => self.logging.format.clone(),
            "logging.file" => self
                .logging
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            _ => return Err(Error::config(format!("Unknown configuration key: {}", key))),
        };
        Ok(value)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match extension(path) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e)))?,
            _ => serde_json::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}
