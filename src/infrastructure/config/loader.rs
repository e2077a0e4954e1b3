use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid start_n: {0}. Must be at least 1")]
    InvalidStartN(usize),

    #[error("Invalid max_n: {0}. Must be at least start_n ({1})")]
    InvalidMaxN(usize, usize),

    #[error("Invalid max_turns: {0}. Must be at least 1")]
    InvalidMaxTurns(u32),

    #[error("Invalid timeout_secs: {0}. Must be positive")]
    InvalidTimeout(u64),

    #[error("Invalid num_samples: {0}. Must be at least 1")]
    InvalidNumSamples(usize),

    #[error("Invalid temperature range: {0}..{1}. Must satisfy 0 <= min <= max")]
    InvalidTemperatureRange(f64, f64),

    #[error("Solution filename cannot be empty")]
    EmptySolutionFilename,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .summit/config.yaml (project config)
    /// 3. .summit/local.yaml (project local overrides, optional)
    /// 4. Environment variables (SUMMIT_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.summit/) so several
    /// search runs on one machine can use different settings.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".summit/config.yaml"))
            .merge(Yaml::file(".summit/local.yaml"))
            .merge(Env::prefixed("SUMMIT_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or fails validation.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.search.start_n == 0 {
            return Err(ConfigError::InvalidStartN(config.search.start_n));
        }

        if config.search.max_n < config.search.start_n {
            return Err(ConfigError::InvalidMaxN(
                config.search.max_n,
                config.search.start_n,
            ));
        }

        if config.search.max_turns == 0 {
            return Err(ConfigError::InvalidMaxTurns(config.search.max_turns));
        }

        if config.search.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.search.timeout_secs));
        }

        if config.sampling.num_samples == 0 {
            return Err(ConfigError::InvalidNumSamples(config.sampling.num_samples));
        }

        if config.sampling.temperature_min < 0.0
            || config.sampling.temperature_max < config.sampling.temperature_min
        {
            return Err(ConfigError::InvalidTemperatureRange(
                config.sampling.temperature_min,
                config.sampling.temperature_max,
            ));
        }

        if config.sampling.solution_filename.is_empty() {
            return Err(ConfigError::EmptySolutionFilename);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.start_n, 2);
        assert_eq!(config.search.max_n, 16);
        assert_eq!(config.sampling.num_samples, 4);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
search:
  start_n: 4
  max_n: 32
  max_turns: 5
  timeout_secs: 60
sampling:
  num_samples: 8
  temperature_min: 0.2
  temperature_max: 0.9
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.search.start_n, 4);
        assert_eq!(config.search.max_n, 32);
        assert_eq!(config.search.max_turns, 5);
        assert_eq!(config.search.timeout_secs, 60);
        assert_eq!(config.sampling.num_samples, 8);
        assert!((config.sampling.temperature_min - 0.2).abs() < f64::EPSILON);
        assert!((config.sampling.temperature_max - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_start_n() {
        let mut config = Config::default();
        config.search.start_n = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidStartN(0)));
    }

    #[test]
    fn test_validate_max_n_below_start_n() {
        let mut config = Config::default();
        config.search.start_n = 8;
        config.search.max_n = 4;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidMaxN(4, 8)
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.search.timeout_secs = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(result.unwrap_err(), ConfigError::InvalidTimeout(0)));
    }

    #[test]
    fn test_validate_zero_samples() {
        let mut config = Config::default();
        config.sampling.num_samples = 0;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidNumSamples(0)
        ));
    }

    #[test]
    fn test_validate_inverted_temperature_range() {
        let mut config = Config::default();
        config.sampling.temperature_min = 0.9;
        config.sampling.temperature_max = 0.3;

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidTemperatureRange(_, _)
        ));
    }

    #[test]
    fn test_validate_empty_solution_filename() {
        let mut config = Config::default();
        config.sampling.solution_filename = String::new();

        let result = ConfigLoader::validate(&config);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::EmptySolutionFilename
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        let result = ConfigLoader::validate(&config);
        match result.unwrap_err() {
            ConfigError::InvalidLogFormat(format) => assert_eq!(format, "xml"),
            other => panic!("Expected InvalidLogFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "search:\n  start_n: 2\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "search:\n  start_n: 4\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.search.start_n, 4, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
    }
}
