//! Shared configuration loader for the pyfmt binaries.
//!
//! `defaults/pyfmt.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. The binaries layer a project file, an explicit
//! `--config` file and command-line flags on top of those defaults via [`Loader`]
//! before deserializing into [`PyfmtConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use pyfmt::FormatOptions;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/pyfmt.default.toml");

/// Name of the project file picked up from the working directory.
pub const PROJECT_FILE: &str = "pyfmt.toml";

/// Top-level configuration consumed by the pyfmt binaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PyfmtConfig {
    pub formatting: FormattingConfig,
    pub cli: CliConfig,
}

/// The formatter's knobs. Everything else about the layout is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FormattingConfig {
    pub indent_width: usize,
    pub max_blank_lines: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Worker threads; `0` lets the pool pick one per core.
    pub jobs: usize,
    pub check: bool,
}

impl PyfmtConfig {
    pub fn to_format_options(&self) -> FormatOptions {
        FormatOptions {
            indent_width: self.formatting.indent_width,
            max_blank_lines: self.formatting.max_blank_lines,
        }
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.formatting.indent_width == 0 {
            return Err(ConfigError::Message(
                "formatting.indent_width must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for command-line flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder, deserialize and check the resulting configuration.
    pub fn build(self) -> Result<PyfmtConfig, ConfigError> {
        self.builder
            .build()?
            .try_deserialize::<PyfmtConfig>()?
            .validate()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<PyfmtConfig, ConfigError> {
    Loader::new().build()
}
