//! Configuration management.
//!
//! # Overview
//!
//! The exporter reads a TOML configuration file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `NSEXPORT_<SECTION>_<KEY>` overrides
//! - Default values for every optional setting
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [source]
//! base_url = "https://my-site.herokuapp.com"
//! api_token = "${NSEXPORT_TOKEN}"
//!
//! [source.retry]
//! max_retries = 4
//!
//! [export]
//! data_types = ["entries", "treatments", "devicestatus", "profile"]
//! output_dir = "./nsexport-output"
//! after_date = "2020-01-01"
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use nightscout_export::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("nsexport.toml")?;
//! println!("Source: {}", config.source.base_url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config_file, parse_data_type_list};
pub use schema::{
    ApplicationConfig, ExportConfig, LoggingConfig, NsExportConfig, RetryConfig, SourceConfig,
    VerificationConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
