//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the exporter configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after parsing
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2); // Configuration error exit code
            }
        };

        let data_types: Vec<&str> = config.export.data_types.iter().map(|t| t.as_str()).collect();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Nightscout Site: {}", config.source.base_url);
        println!(
            "  API Token: {}",
            if config.source.api_token.is_some() {
                "configured"
            } else {
                "none"
            }
        );
        println!("  Max Retries: {}", config.source.retry.max_retries);
        println!("  Data Types: {}", data_types.join(", "));
        println!("  Output Directory: {}", config.export.output_dir);
        println!(
            "  Date Range: {} to {}",
            config.export.after_date.as_deref().unwrap_or("earliest"),
            config.export.before_date.as_deref().unwrap_or("today")
        );
        println!("  Anonymize: {}", config.export.anonymize);
        println!(
            "  Verification: {}",
            config.verification.enable_verification
        );
        println!();
        Ok(0)
    }
}
