//! Configuration schema types
//!
//! This module defines the configuration structure mapped from `nsexport.toml`.

use crate::config::SecretString;
use crate::domain::request::parse_date_bound;
use crate::domain::DataType;
use serde::{Deserialize, Serialize};

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NsExportConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Upstream Nightscout source
    #[serde(default)]
    pub source: SourceConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Artifact verification configuration
    #[serde(default)]
    pub verification: VerificationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NsExportConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.source.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration for window requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per window before the run fails
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds (0 retries immediately)
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 || self.max_retries > 10 {
            return Err(format!(
                "source.retry.max_retries must be between 1 and 10, got {}",
                self.max_retries
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(format!(
                "source.retry.backoff_multiplier must be >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }

        if self.initial_delay_ms > self.max_delay_ms {
            return Err(format!(
                "source.retry.initial_delay_ms ({}) cannot exceed max_delay_ms ({})",
                self.initial_delay_ms, self.max_delay_ms
            ));
        }

        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Upstream Nightscout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the Nightscout site; a missing scheme is resolved at runtime
    #[serde(default)]
    pub base_url: String,

    /// Optional access token sent as the `token` query parameter
    #[serde(default)]
    pub api_token: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// TLS certificate verification enabled
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Value of the `count` parameter sent with every request
    #[serde(default = "default_record_count")]
    pub record_count: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.trim().is_empty() {
            return Err("source.base_url cannot be empty".to_string());
        }

        if self
            .api_token
            .as_ref()
            .map(|t| t.expose_secret().is_empty())
            .unwrap_or(false)
        {
            return Err("source.api_token cannot be empty when set".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("source.timeout_seconds must be > 0".to_string());
        }

        if self.connect_timeout_seconds == 0 {
            return Err("source.connect_timeout_seconds must be > 0".to_string());
        }

        if self.record_count == 0 {
            return Err("source.record_count must be > 0".to_string());
        }

        self.retry.validate()
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: None,
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            tls_verify: true,
            record_count: default_record_count(),
            retry: RetryConfig::default(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Collections to export, in order
    #[serde(default = "default_data_types")]
    pub data_types: Vec<DataType>,

    /// Directory receiving artifacts and metadata sidecars
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Newest date to export (`YYYY-MM-DD` or RFC 3339); today when unset
    #[serde(default)]
    pub before_date: Option<String>,

    /// Oldest date to export; hard floors apply when unset
    #[serde(default)]
    pub after_date: Option<String>,

    /// Replace identifying fields with run-scoped tokens
    #[serde(default = "default_true")]
    pub anonymize: bool,

    /// Seed for the token generator; random per run when unset
    #[serde(default)]
    pub anonymization_seed: Option<u64>,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.data_types.is_empty() {
            return Err("export.data_types cannot be empty".to_string());
        }

        if self.output_dir.trim().is_empty() {
            return Err("export.output_dir cannot be empty".to_string());
        }

        let before = self
            .before_date
            .as_deref()
            .map(parse_date_bound)
            .transpose()
            .map_err(|e| format!("export.before_date: {e}"))?;
        let after = self
            .after_date
            .as_deref()
            .map(parse_date_bound)
            .transpose()
            .map_err(|e| format!("export.after_date: {e}"))?;

        if let (Some(before), Some(after)) = (before, after) {
            if after >= before {
                return Err("export.after_date must be earlier than export.before_date".to_string());
            }
        }

        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_types: default_data_types(),
            output_dir: default_output_dir(),
            before_date: None,
            after_date: None,
            anonymize: true,
            anonymization_seed: None,
        }
    }
}

/// Artifact verification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VerificationConfig {
    /// Re-read every artifact after finalization
    #[serde(default)]
    pub enable_verification: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_connect_timeout_seconds() -> u64 {
    30
}

fn default_record_count() -> u64 {
    1_000_000
}

fn default_max_retries() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_data_types() -> Vec<DataType> {
    DataType::ALL.to_vec()
}

fn default_output_dir() -> String {
    "./nsexport-output".to_string()
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
