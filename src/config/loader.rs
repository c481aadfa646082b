//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::NsExportConfig;
use super::secret::secret_string;
use crate::domain::errors::ExportError;
use crate::domain::result::Result;
use crate::domain::DataType;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into NsExportConfig
/// 4. Applies environment variable overrides (NSEXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is missing
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use nightscout_export::config::loader::load_config;
///
/// let config = load_config("nsexport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<NsExportConfig> {
    let mut config = parse_config_file(path)?;

    config.validate().map_err(|e| {
        ExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Reads, substitutes and parses a configuration file without validating it
///
/// Callers that apply CLI overrides use this and validate afterwards.
pub fn parse_config_file(path: impl AsRef<Path>) -> Result<NsExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: NsExportConfig = toml::from_str(&contents)
        .map_err(|e| ExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExportError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using NSEXPORT_* prefix
///
/// Environment variables follow the pattern: NSEXPORT_<SECTION>_<KEY>
/// For example: NSEXPORT_SOURCE_BASE_URL, NSEXPORT_EXPORT_AFTER_DATE
fn apply_env_overrides(config: &mut NsExportConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("NSEXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Ok(val) = std::env::var("NSEXPORT_SOURCE_BASE_URL") {
        config.source.base_url = val;
    }
    if let Ok(val) = std::env::var("NSEXPORT_SOURCE_API_TOKEN") {
        config.source.api_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("NSEXPORT_SOURCE_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.source.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("NSEXPORT_SOURCE_TLS_VERIFY") {
        config.source.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("NSEXPORT_SOURCE_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.source.retry.max_retries = retries;
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("NSEXPORT_EXPORT_DATA_TYPES") {
        config.export.data_types = parse_data_type_list(&val)?;
    }
    if let Ok(val) = std::env::var("NSEXPORT_EXPORT_OUTPUT_DIR") {
        config.export.output_dir = val;
    }
    if let Ok(val) = std::env::var("NSEXPORT_EXPORT_BEFORE_DATE") {
        config.export.before_date = Some(val);
    }
    if let Ok(val) = std::env::var("NSEXPORT_EXPORT_AFTER_DATE") {
        config.export.after_date = Some(val);
    }
    if let Ok(val) = std::env::var("NSEXPORT_EXPORT_ANONYMIZE") {
        config.export.anonymize = val.parse().unwrap_or(true);
    }

    // Verification overrides
    if let Ok(val) = std::env::var("NSEXPORT_VERIFICATION_ENABLE_VERIFICATION") {
        config.verification.enable_verification = val.parse().unwrap_or(false);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("NSEXPORT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("NSEXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

/// Parses a comma-separated list of data types
///
/// # Errors
///
/// Returns a configuration error naming the first unknown entry
pub fn parse_data_type_list(input: &str) -> Result<Vec<DataType>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<DataType>().map_err(ExportError::Configuration))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("NSEXPORT_TEST_TOKEN_VAR", "test_value");
        let input = "api_token = \"${NSEXPORT_TEST_TOKEN_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_token = \"test_value\"\n");
        std::env::remove_var("NSEXPORT_TEST_TOKEN_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("NSEXPORT_MISSING_VAR");
        let input = "api_token = \"${NSEXPORT_MISSING_VAR}\"";
        assert!(substitute_env_vars(input).is_err());
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        let input = "# api_token = \"${NSEXPORT_NEVER_SET_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_parse_data_type_list() {
        let types = parse_data_type_list("entries, profile").unwrap();
        assert_eq!(types, vec![DataType::Entries, DataType::Profile]);
        assert!(parse_data_type_list("entries,food").is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent-nsexport.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[source]
base_url = "https://ns.example.com"

[source.retry]
max_retries = 4
initial_delay_ms = 0

[export]
data_types = ["entries", "devicestatus"]
before_date = "2020-01-10"
after_date = "2020-01-01"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.source.base_url, "https://ns.example.com");
        assert_eq!(config.source.retry.initial_delay_ms, 0);
        assert_eq!(
            config.export.data_types,
            vec![DataType::Entries, DataType::DeviceStatus]
        );
        assert!(config.export.anonymize);
    }
}
