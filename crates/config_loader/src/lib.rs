//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `StationConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("station.toml")).unwrap();
//! println!("Store: {}", config.store.path.display());
//! ```

mod parser;
mod validator;

pub use contracts::StationConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<StationConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<StationConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate an already-built configuration (e.g. after CLI overrides)
    pub fn validate(config: &StationConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize StationConfig to TOML string
    pub fn to_toml(config: &StationConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize StationConfig to JSON string
    pub fn to_json(config: &StationConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<StationConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATION_TOML: &str = r#"
[serial]
port = "/dev/ttyACM0"
baud_rate = 57600

[store]
path = "fencing_data.db"

[simulator]
fault_probability = 0.05
seed = 42

[ingest]
max_records = 300
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(STATION_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.ingest.max_records, 300);
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config = ConfigLoader::load_from_str("", ConfigFormat::Toml).unwrap();
        assert_eq!(config.store.table, "data");
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(STATION_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.serial.port, config2.serial.port);
        assert_eq!(config.simulator.seed, config2.simulator.seed);
        assert_eq!(config.store.path, config2.store.path);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(STATION_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.ingest.max_records, config2.ingest.max_records);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[simulator]
fault_min_cycles = 9
fault_max_cycles = 2
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("fault_min_cycles"));
    }

    #[test]
    fn test_nan_probability_rejected() {
        let content = "[simulator]\nfault_probability = nan\n";
        let err = ConfigLoader::load_from_str(content, ConfigFormat::Toml).unwrap_err();
        match err {
            ContractError::ConfigValidation { field, .. } => {
                assert_eq!(field, "simulator.fault_probability")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("station.json");
        std::fs::write(&path, r#"{ "store": { "table": "samples" } }"#).unwrap();
        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.store.table, "samples");

        let bad = dir.path().join("station.yaml");
        std::fs::write(&bad, "store: {}").unwrap();
        assert!(ConfigLoader::load_from_path(&bad).is_err());
    }
}
