//! Configuration model.

use std::path::Path;

use cartera_core::types::DEFAULT_SCALE;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Largest supported money scale.
const MAX_SCALE: u32 = 10;

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarteraConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Money rounding.
    pub money: MoneyConfig,
    /// Batch transfer rules.
    pub batch: BatchConfig,
    /// Portfolio classifier settings.
    pub classifier: ClassifierSettings,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl CarteraConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: CarteraConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Ok(Self::default()),
        }
    }

    /// Checks value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.money.scale > MAX_SCALE {
            return Err(ConfigError::invalid(
                "money.scale",
                format!("must be at most {MAX_SCALE}, got {}", self.money.scale),
            ));
        }
        if self.classifier.parallel_threshold == 0 {
            return Err(ConfigError::invalid(
                "classifier.parallel_threshold",
                "must be greater than zero",
            ));
        }
        if self.storage.path.trim().is_empty() {
            return Err(ConfigError::invalid("storage.path", "must not be empty"));
        }
        Ok(())
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the redb database file.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./data/cartera.redb".to_string(),
        }
    }
}

/// Money rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyConfig {
    /// Decimal places kept on ledger amounts (half-up rounding).
    pub scale: u32,
}

impl Default for MoneyConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
        }
    }
}

/// Batch transfer rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Allow distributions larger than the source balance.
    pub allow_overdraft: bool,
    /// Description used when a batch request carries none.
    pub transfer_description: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            allow_overdraft: false,
            transfer_description: "Batch transfer".to_string(),
        }
    }
}

/// Portfolio classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Use rayon when the `parallel` feature is compiled in.
    pub parallel: bool,
    /// Minimum loan count before going parallel.
    pub parallel_threshold: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 500,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,cartera=debug".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CarteraConfig::default();
        assert_eq!(config.money.scale, 2);
        assert!(!config.batch.allow_overdraft);
        assert_eq!(config.classifier.parallel_threshold, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = CarteraConfig::from_toml_str(
            r#"
            [storage]
            path = "/var/lib/cartera/ledger.redb"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.path, "/var/lib/cartera/ledger.redb");
        assert_eq!(config.money.scale, 2);
        assert_eq!(config.logging.filter, "info,cartera=debug");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let err = CarteraConfig::from_toml_str("[money]\nscale = 20\n").unwrap_err();
        assert!(err.to_string().contains("money.scale"));

        let err =
            CarteraConfig::from_toml_str("[classifier]\nparallel_threshold = 0\n").unwrap_err();
        assert!(err.to_string().contains("parallel_threshold"));
    }

    #[test]
    fn test_parse_error() {
        let err = CarteraConfig::from_toml_str("[money\nscale = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[batch]\ntransfer_description = \"Weekly sweep\"").unwrap();
        let config = CarteraConfig::from_file(file.path()).unwrap();
        assert_eq!(config.batch.transfer_description, "Weekly sweep");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            CarteraConfig::load_or_default(Some(Path::new("/nonexistent/cartera.toml"))).unwrap();
        assert_eq!(config, CarteraConfig::default());
    }
}
