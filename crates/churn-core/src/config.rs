//! Configuration for the churn service
//!
//! The schema section must describe exactly the columns the model artifact
//! was trained on. When it is omitted the built-in churn schema is used.
//!
//! ```toml
//! [server]
//! addr = "127.0.0.1:7071"
//!
//! [model]
//! path = "model/churn_model.json"
//!
//! [schema]
//! numeric_columns = ["tenure"]
//! one_hot_columns = ["gender_Female", "gender_Male"]
//! integer_fields = []
//!
//! [schema.ranges.tenure]
//! min = 0
//! max = 72
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schema::{FeatureSchema, SchemaConfig};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CHURN_CONFIG";
/// Environment variable overriding the listen address
pub const ADDR_ENV: &str = "CHURN_ADDR";
/// Environment variable overriding the model artifact path
pub const MODEL_PATH_ENV: &str = "CHURN_MODEL_PATH";

/// Service-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChurnConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:7071".to_string(),
        }
    }
}

/// Where the trained model artifact lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model/churn_model.json"),
        }
    }
}

impl ChurnConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a file, TOML unless it ends in `.json`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Resolve configuration from the environment.
    ///
    /// Reads the file named by `CHURN_CONFIG` if set, then applies
    /// `CHURN_ADDR` and `CHURN_MODEL_PATH` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_file(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ADDR_ENV).ok(),
            std::env::var(MODEL_PATH_ENV).ok(),
        );
        Ok(config)
    }

    /// Replace address and model path when given
    pub fn apply_overrides(&mut self, addr: Option<String>, model_path: Option<String>) {
        if let Some(addr) = addr {
            self.server.addr = addr;
        }
        if let Some(path) = model_path {
            self.model.path = PathBuf::from(path);
        }
    }

    /// Validate configuration values and build the feature schema
    pub fn validate(&self) -> Result<FeatureSchema, ConfigError> {
        if self.server.addr.trim().is_empty() {
            return Err(ConfigError::Invalid("server.addr must not be empty".to_string()));
        }
        if self.model.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("model.path must not be empty".to_string()));
        }
        self.schema.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChurnConfig::new();
        let schema = config.validate().unwrap();
        assert_eq!(schema.width(), 46);
        assert_eq!(config.server.addr, "127.0.0.1:7071");
    }

    #[test]
    fn test_partial_toml_keeps_default_schema() {
        let config = ChurnConfig::from_toml(
            r#"
[server]
addr = "0.0.0.0:9000"
"#,
        )
        .unwrap();
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.model.path, PathBuf::from("model/churn_model.json"));
        assert_eq!(config.schema, SchemaConfig::default());
    }

    #[test]
    fn test_custom_schema_from_toml() {
        let config = ChurnConfig::from_toml(
            r#"
[schema]
numeric_columns = ["tenure"]
one_hot_columns = ["SeniorCitizen_0", "SeniorCitizen_1", "gender_Female"]
integer_fields = ["SeniorCitizen"]

[schema.ranges.tenure]
min = 0
max = 72
"#,
        )
        .unwrap();

        let schema = config.validate().unwrap();
        assert_eq!(
            schema.column_names(),
            vec!["tenure", "SeniorCitizen_0", "SeniorCitizen_1", "gender_Female"]
        );
        assert_eq!(schema.range("tenure").unwrap().max, 72.0);
    }

    #[test]
    fn test_invalid_schema_fails_validation() {
        let config = ChurnConfig::from_toml(
            r#"
[schema]
numeric_columns = ["tenure"]
one_hot_columns = ["gender_Female"]
ranges = {}
"#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRange(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ChurnConfig::new();
        let toml_str = config.to_toml().unwrap();
        let parsed = ChurnConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.schema, config.schema);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(br#"{"model": {"path": "/srv/models/churn.json"}}"#)
            .unwrap();
        file.flush().unwrap();

        let config = ChurnConfig::from_file(file.path()).unwrap();
        assert_eq!(config.model.path, PathBuf::from("/srv/models/churn.json"));
    }

    #[test]
    fn test_overrides() {
        let mut config = ChurnConfig::new();
        config.apply_overrides(Some("0.0.0.0:80".to_string()), None);
        assert_eq!(config.server.addr, "0.0.0.0:80");
        assert_eq!(config.model.path, PathBuf::from("model/churn_model.json"));

        config.apply_overrides(None, Some("other.json".to_string()));
        assert_eq!(config.model.path, PathBuf::from("other.json"));
    }

    #[test]
    fn test_empty_addr_rejected() {
        let mut config = ChurnConfig::new();
        config.server.addr = " ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_empty_model_path_rejected() {
        let mut config = ChurnConfig::new();
        config.model.path = PathBuf::new();

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("model.path"));
    }
}
