//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "nsexport.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing nsexport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set source.base_url to your Nightscout site");
                println!("  2. If the site requires a token, set NSEXPORT_TOKEN in .env");
                println!("  3. Validate configuration: nsexport validate-config");
                println!("  4. Run export: nsexport export --after 2020-01-01");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Sample configuration with every section and its defaults
    fn generate_config() -> String {
        r#"# nsexport configuration
# Exports Nightscout collections to gzip JSON files

[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

[source]
# Nightscout site; path and query are ignored, https is assumed
base_url = "https://my-site.herokuapp.com"

# Read token, only needed when the site is not public
# api_token = "${NSEXPORT_TOKEN}"

# Request timeouts in seconds
timeout_seconds = 120
connect_timeout_seconds = 30

# Verify TLS certificates
tls_verify = true

# Value sent as the `count` query parameter
record_count = 1000000

[source.retry]
# Attempts per window before the run fails
max_retries = 4
initial_delay_ms = 500
max_delay_ms = 8000
backoff_multiplier = 2.0

[export]
# Collections to export, one file each
data_types = ["entries", "treatments", "devicestatus", "profile"]
output_dir = "./nsexport-output"

# Date range (YYYY-MM-DD or RFC 3339); before defaults to today
# before_date = "2024-01-01"
# after_date = "2020-01-01"

# Replace identifying fields (enteredBy, device) with random tokens
anonymize = true
# anonymization_seed = 42

[verification]
# Re-read every artifact and confirm its checksum and JSON
enable_verification = false

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"  # daily | hourly | never
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NsExportConfig;

    #[test]
    fn test_sample_config_parses() {
        let config: NsExportConfig = toml::from_str(&InitArgs::generate_config()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.export.data_types.len(), 4);
        assert!(config.source.api_token.is_none());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nsexport.toml");
        fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# existing");

        let args = InitArgs {
            force: true,
            ..args
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        assert!(fs::read_to_string(&output).unwrap().contains("[source.retry]"));
    }
}
