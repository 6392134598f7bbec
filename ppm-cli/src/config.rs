//! Settings file for `ppm-estimator`.
//!
//! Every section is optional; missing keys fall back to defaults and
//! command-line flags override whatever the file says.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "moves.db"
//!
//! [estimator]
//! base_fee = "350.00"
//! rate_per_cwt = "58.25"
//! latency_ms = 0
//!
//! [logging]
//! level = "info"
//! file = "ppm-estimator.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use ppm_core::calculations::FlatRateSchedule;
use ppm_core::db::DbConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DbConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Flat-rate stand-in for the remote estimate service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_base_fee")]
    pub base_fee: Decimal,

    /// Dollars per hundred pounds.
    #[serde(default = "default_rate_per_cwt")]
    pub rate_per_cwt: Decimal,

    /// Artificial delay before each estimate is returned.
    #[serde(default)]
    pub latency_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Bare level or full `EnvFilter` directive. `RUST_LOG` wins when set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_base_fee() -> Decimal {
    Decimal::new(35000, 2)
}

fn default_rate_per_cwt() -> Decimal {
    Decimal::new(5825, 2)
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            rate_per_cwt: default_rate_per_cwt(),
            latency_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.database
            .validate()
            .map_err(|e| ConfigError::Validation(format!("[database] {e}")))?;
        if self.estimator.base_fee.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "[estimator] base_fee must not be negative (got {})",
                self.estimator.base_fee
            )));
        }
        if self.estimator.rate_per_cwt <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "[estimator] rate_per_cwt must be positive (got {})",
                self.estimator.rate_per_cwt
            )));
        }
        Ok(())
    }

    pub fn schedule(&self) -> FlatRateSchedule {
        FlatRateSchedule {
            base_fee: self.estimator.base_fee,
            rate_per_cwt: self.estimator.rate_per_cwt,
        }
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.estimator.latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database, DbConfig::sqlite("moves.db"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn full_file_is_read() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            backend = "sqlite"
            connection_string = ":memory:"

            [estimator]
            base_fee = "100"
            rate_per_cwt = "50.5"
            latency_ms = 250

            [logging]
            level = "debug"
            file = "out.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.connection_string, ":memory:");
        assert_eq!(
            config.schedule(),
            FlatRateSchedule {
                base_fee: dec!(100),
                rate_per_cwt: dec!(50.5),
            }
        );
        assert_eq!(config.latency(), Duration::from_millis(250));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = AppConfig::from_toml("[estimator]\nrate_per_cwt = \"60\"\n").unwrap();

        assert_eq!(config.estimator.base_fee, dec!(350.00));
        assert_eq!(config.estimator.rate_per_cwt, dec!(60));
    }

    #[test]
    fn unusable_database_section_is_rejected() {
        let err = AppConfig::from_toml("[database]\nconnection_string = \"\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Validation(msg) if msg.starts_with("[database]")));
    }

    #[test]
    fn negative_base_fee_is_rejected() {
        let err = AppConfig::from_toml("[estimator]\nbase_fee = \"-1\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("base_fee")));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let err = AppConfig::from_toml("[estimator]\nrate_per_cwt = \"0\"\n").unwrap_err();

        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("rate_per_cwt")));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[database\nbackend = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            AppConfig::load_or_default(Some(Path::new("/definitely/not/here.toml"))),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(AppConfig::load_or_default(None).unwrap(), AppConfig::default());
    }
}
