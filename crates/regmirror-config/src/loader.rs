// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for regmirror.
//!
//! # Loading pipeline
//!
//! 1. Parse the file (JSON, YAML, or TOML by extension)
//! 2. Apply `REGMIRROR_*` environment-variable overrides
//! 3. Validate
//!
//! # Environment overrides
//!
//! ```text
//! REGMIRROR_POLL_MS=250
//! REGMIRROR_MODBUS_IP=10.1.2.3
//! REGMIRROR_MODBUS_PORT=1502
//! REGMIRROR_MODBUS_UNIT_ID=2
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::MirrorConfig;

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (the documented convention).
    Json,
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use regmirror_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("config.json").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,
    /// Whether environment overrides are applied.
    apply_env: bool,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    pub fn new() -> Self {
        Self {
            env_prefix: "REGMIRROR".to_string(),
            apply_env: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment overrides.
    pub fn with_env_overrides(mut self, enabled: bool) -> Self {
        self.apply_env = enabled;
        self
    }

    /// Loads, overrides, and validates a configuration file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<MirrorConfig> {
        let path = path.as_ref();
        info!("loading configuration from {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let format = ConfigFormat::from_path(path)?;

        let mut config: MirrorConfig =
            self.parse_str(&content, format).map_err(|e| match e {
                ConfigError::Serialization { message } => ConfigError::parse(path, message),
                other => other,
            })?;

        if self.apply_env {
            self.apply_env_overrides(&mut config)?;
        }

        config.validate()?;

        debug!(
            plcs = config.plcs.len(),
            links = config.plcs.iter().map(|p| p.links.len()).sum::<usize>(),
            poll_ms = config.poll_ms,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Parses and validates configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<MirrorConfig> {
        let mut config = self.parse_str(content, format)?;
        if self.apply_env {
            self.apply_env_overrides(&mut config)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn parse_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<MirrorConfig> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ConfigError::serialization(e.to_string())),
            ConfigFormat::Yaml => yaml_parse(content),
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
        }
    }

    fn apply_env_overrides(&self, config: &mut MirrorConfig) -> ConfigResult<()> {
        if let Ok(value) = env::var(format!("{}_POLL_MS", self.env_prefix)) {
            config.poll_ms = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_POLL_MS", self.env_prefix),
                    "expected a millisecond count",
                )
            })?;
        }
        if let Ok(value) = env::var(format!("{}_MODBUS_IP", self.env_prefix)) {
            config.modbus.ip = value;
        }
        if let Ok(value) = env::var(format!("{}_MODBUS_PORT", self.env_prefix)) {
            config.modbus.port = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_MODBUS_PORT", self.env_prefix),
                    "expected a port number",
                )
            })?;
        }
        if let Ok(value) = env::var(format!("{}_MODBUS_UNIT_ID", self.env_prefix)) {
            config.modbus.unit_id = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_MODBUS_UNIT_ID", self.env_prefix),
                    "expected a unit id (0-255)",
                )
            })?;
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// YAML parsing through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let parsed = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    parsed
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads a configuration file with default loader settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<MirrorConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "PollMs": 100,
            "DefaultSwapBytes": false,
            "Plcs": [
                { "Ip": "192.168.30.244",
                  "Links": [ { "Plc": "R01001", "Modbus": "400001", "Count": 4 } ] }
            ]
        }"#
    }

    #[test]
    fn loads_json_files() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        let config = ConfigLoader::new()
            .with_env_overrides(false)
            .load(file.path())
            .unwrap();
        assert_eq!(config.poll_ms, 100);
        assert_eq!(config.plcs.len(), 1);
    }

    #[test]
    fn loads_yaml_files() {
        let yaml = r#"
PollMs: 500
Plcs:
  - Ip: 10.0.0.1
    Links:
      - Plc: R1
        Modbus: "0"
        Count: 1
"#;
        let config = ConfigLoader::new()
            .with_env_overrides(false)
            .load_from_str(yaml, ConfigFormat::Yaml)
            .unwrap();
        assert_eq!(config.poll_ms, 500);
        assert_eq!(config.plcs[0].links[0].count, 1);
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("config.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let result = ConfigLoader::new().load("/nonexistent/regmirror.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn parse_errors_carry_the_path() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = ConfigLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        // A loader-specific prefix keeps this test isolated from the
        // process environment.
        env::set_var("RMTEST_POLL_MS", "750");
        env::set_var("RMTEST_MODBUS_IP", "172.16.0.9");

        let config = ConfigLoader::new()
            .with_env_prefix("RMTEST")
            .load_from_str(sample_json(), ConfigFormat::Json)
            .unwrap();

        assert_eq!(config.poll_ms, 750);
        assert_eq!(config.modbus.ip, "172.16.0.9");

        env::remove_var("RMTEST_POLL_MS");
        env::remove_var("RMTEST_MODBUS_IP");
    }

    #[test]
    fn bad_env_override_is_an_error() {
        env::set_var("RMBAD_POLL_MS", "soon");

        let err = ConfigLoader::new()
            .with_env_prefix("RMBAD")
            .load_from_str(sample_json(), ConfigFormat::Json)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));

        env::remove_var("RMBAD_POLL_MS");
    }
}
