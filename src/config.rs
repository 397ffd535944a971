//! Configuration management for wheelwright
//!
//! This module provides a configuration system that loads settings from
//! environment variables with sensible defaults. Configuration covers the
//! package index endpoint, caching options, dependency-evaluation defaults
//! and the conventions used when generating install manifests.
//!
//! # Environment Variables
//!
//! - `WHEELWRIGHT_INDEX_URL`: Package index base URL - default: "https://pypi.org/pypi"
//! - `WHEELWRIGHT_LOG_LEVEL`: Logging level - default: "info"
//! - `WHEELWRIGHT_CACHE_ENABLED`: Enable index response caching (true|false) - default: "true"
//! - `WHEELWRIGHT_CACHE_DIR`: Cache directory path - default: user cache dir + "wheelwright"
//! - `WHEELWRIGHT_REQUEST_TIMEOUT`: Index request timeout in seconds - default: "30"
//! - `WHEELWRIGHT_PYTHON_VERSION`: Python version for marker evaluation - default: "3.11"
//! - `WHEELWRIGHT_LABEL_PREFIX`: Prefix for generated dependency targets - default: "pypi__"
//! - `WHEELWRIGHT_SHIM_SHEBANG`: Shebang for generated entry point shims - default: "#!/usr/bin/env python3"
//!
//! # Example
//!
//! ```no_run
//! use wheelwright::WheelwrightConfig;
//!
//! // Load configuration from environment with defaults
//! let config = WheelwrightConfig::default();
//!
//! // Validate configuration
//! config.validate().expect("Invalid configuration");
//! ```

use crate::requirement::MarkerEnvironment;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default values for configuration
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_CACHE_ENABLED: bool = true;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PYTHON_VERSION: &str = "3.11";

/// Shebang written into generated console script shims.
pub const DEFAULT_SHIM_SHEBANG: &str = "#!/usr/bin/env python3";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// No usable cache directory on this system
    #[error("Could not determine a cache directory. Set WHEELWRIGHT_CACHE_DIR")]
    CacheDirUnavailable,
}

/// Main configuration structure for wheelwright
///
/// This struct holds all configuration parameters needed for wheelwright to
/// operate. It can be constructed using `Default::default()` which loads from
/// environment variables with sensible fallback defaults.
#[derive(Debug, Clone)]
pub struct WheelwrightConfig {
    /// Package index base URL (release metadata is fetched from
    /// `{index_url}/{name}/{version}/json`)
    pub index_url: String,

    /// Enable caching of index responses
    pub cache_enabled: bool,

    /// Cache directory override
    pub cache_dir: Option<PathBuf>,

    /// Index request timeout in seconds
    pub request_timeout_secs: u64,

    /// Python version used for environment marker evaluation (`X.Y`)
    pub python_version: String,

    /// Prefix for generated dependency repository targets
    pub label_prefix: String,

    /// Shebang line for generated entry point shims
    pub shim_shebang: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for WheelwrightConfig {
    /// Creates a new configuration by loading from environment variables with defaults
    ///
    /// This will read WHEELWRIGHT_* environment variables and fall back to
    /// sensible defaults for any missing values.
    fn default() -> Self {
        let index_url =
            env::var("WHEELWRIGHT_INDEX_URL").unwrap_or_else(|_| DEFAULT_INDEX_URL.to_string());

        // Caching configuration
        let cache_enabled = env::var("WHEELWRIGHT_CACHE_ENABLED")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(DEFAULT_CACHE_ENABLED);

        let cache_dir = env::var("WHEELWRIGHT_CACHE_DIR").ok().map(PathBuf::from);

        // Runtime parameters
        let request_timeout_secs = env::var("WHEELWRIGHT_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let python_version = env::var("WHEELWRIGHT_PYTHON_VERSION")
            .unwrap_or_else(|_| DEFAULT_PYTHON_VERSION.to_string());

        let label_prefix = env::var("WHEELWRIGHT_LABEL_PREFIX")
            .unwrap_or_else(|_| crate::naming::DEFAULT_LABEL_PREFIX.to_string());

        let shim_shebang = env::var("WHEELWRIGHT_SHIM_SHEBANG")
            .unwrap_or_else(|_| DEFAULT_SHIM_SHEBANG.to_string());

        // Logging configuration
        let log_level = env::var("WHEELWRIGHT_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            index_url,
            cache_enabled,
            cache_dir,
            request_timeout_secs,
            python_version,
            label_prefix,
            shim_shebang,
            log_level,
        }
    }
}

impl WheelwrightConfig {
    /// Validates the configuration
    ///
    /// Checks that:
    /// - Numeric values are in valid ranges
    /// - The index URL and Python version are well formed
    /// - The label prefix is safe for generated target names
    /// - Log level is valid
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any validation fails
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate timeout is reasonable (at least 1 second, max 10 minutes)
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !self.index_url.starts_with("http://") && !self.index_url.starts_with("https://") {
            return Err(ConfigError::ValidationFailed(format!(
                "Index URL must start with http:// or https://, got {}",
                self.index_url
            )));
        }

        // Python version is "major.minor", optionally "major.minor.patch"
        let parts: Vec<&str> = self.python_version.split('.').collect();
        if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.parse::<u32>().is_err()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid Python version: {}. Expected a version like 3.11",
                self.python_version
            )));
        }

        // The prefix ends up in generated target names
        if self.label_prefix.is_empty()
            || !self
                .label_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid label prefix: {}. Only letters, digits and underscores are allowed",
                self.label_prefix
            )));
        }

        if !self.shim_shebang.starts_with("#!") {
            return Err(ConfigError::ValidationFailed(format!(
                "Shim shebang must start with #!, got {}",
                self.shim_shebang
            )));
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Resolves the cache directory
    ///
    /// Uses the configured override when set, otherwise the per-user cache
    /// directory plus "wheelwright".
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::CacheDirUnavailable` if no cache directory can
    /// be determined for this system
    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }

        dirs::cache_dir()
            .map(|dir| dir.join("wheelwright"))
            .ok_or(ConfigError::CacheDirUnavailable)
    }

    /// Builds the marker evaluation environment for the configured Python version
    ///
    /// `python_version` carries at most `major.minor` per the marker spec;
    /// `python_full_version` is padded to three components.
    pub fn marker_environment(&self) -> MarkerEnvironment {
        let parts: Vec<&str> = self.python_version.split('.').collect();
        let short = if parts.len() > 2 {
            parts[..2].join(".")
        } else {
            self.python_version.clone()
        };
        let full = if parts.len() >= 3 {
            self.python_version.clone()
        } else {
            format!("{}.0", short)
        };

        MarkerEnvironment {
            python_version: short,
            python_full_version: full,
            ..MarkerEnvironment::default()
        }
    }

    /// Converts configuration to a display map for output formatting
    ///
    /// # Returns
    ///
    /// A HashMap suitable for JSON/YAML serialization or display
    pub fn to_display_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();

        map.insert("index_url".to_string(), self.index_url.clone());
        map.insert("cache_enabled".to_string(), self.cache_enabled.to_string());
        if let Some(ref dir) = self.cache_dir {
            map.insert("cache_dir".to_string(), dir.display().to_string());
        }
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("python_version".to_string(), self.python_version.clone());
        map.insert("label_prefix".to_string(), self.label_prefix.clone());
        map.insert("shim_shebang".to_string(), self.shim_shebang.clone());
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for WheelwrightConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Wheelwright Configuration:")?;
        writeln!(f, "  Index URL: {}", self.index_url)?;
        writeln!(f, "  Cache Enabled: {}", self.cache_enabled)?;
        if let Some(ref dir) = self.cache_dir {
            writeln!(f, "  Cache Dir: {}", dir.display())?;
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Python Version: {}", self.python_version)?;
        writeln!(f, "  Label Prefix: {}", self.label_prefix)?;
        writeln!(f, "  Shim Shebang: {}", self.shim_shebang)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
