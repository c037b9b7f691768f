//! Configuration loading traits and types.
//!
//! Every UDC binary reads one TOML file holding a `[shared]` table (logging
//! and instance name) and a `[ps]` table describing the power-supply
//! modules managed by this controller.
//!
//! # Usage
//!
//! ```rust,no_run
//! use udc_common::config::{ConfigLoader, ConfigError, UdcConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = UdcConfig::load(Path::new("udc.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::MAX_PS_MODULES;
use crate::ps::PsModel;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

/// Common configuration fields shared across all UDC applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "udc-sim-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Power-supply topology handled by this controller.
///
/// Read once at start-up; drives `IpcRegion::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PsConfig {
    /// Power-supply model written into every module status word.
    pub model: PsModel,
    /// Number of active modules (`0..=MAX_PS_MODULES`).
    #[serde(default = "default_num_ps_modules")]
    pub num_ps_modules: u8,
}

fn default_num_ps_modules() -> u8 {
    1
}

impl Default for PsConfig {
    fn default() -> Self {
        Self {
            model: PsModel::Uninitialized,
            num_ps_modules: default_num_ps_modules(),
        }
    }
}

impl PsConfig {
    /// Validate the module count against the region capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_ps_modules as usize > MAX_PS_MODULES {
            return Err(ConfigError::ValidationError(format!(
                "num_ps_modules = {} exceeds MAX_PS_MODULES = {}",
                self.num_ps_modules, MAX_PS_MODULES
            )));
        }
        Ok(())
    }
}

/// Top-level UDC configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdcConfig {
    /// Logging and instance identification.
    pub shared: SharedConfig,
    /// Power-supply topology.
    #[serde(default)]
    pub ps: PsConfig,
}

impl UdcConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.ps.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for every `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
