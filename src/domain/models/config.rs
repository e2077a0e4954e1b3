use serde::{Deserialize, Serialize};

/// Main configuration structure for Summit
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Best-of-N search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Parallel sampling configuration
    #[serde(default)]
    pub sampling: SamplingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Best-of-N and adaptive scaling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SearchConfig {
    /// Starting N for adaptive scaling
    #[serde(default = "default_start_n")]
    pub start_n: usize,

    /// Cap on N across adaptive rounds
    #[serde(default = "default_max_n")]
    pub max_n: usize,

    /// Maximum generation turns per candidate
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Per-candidate verification timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_start_n() -> usize {
    2
}

const fn default_max_n() -> usize {
    16
}

const fn default_max_turns() -> u32 {
    10
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            start_n: default_start_n(),
            max_n: default_max_n(),
            max_turns: default_max_turns(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Parallel sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SamplingConfig {
    /// Number of samples per sampling call
    #[serde(default = "default_num_samples")]
    pub num_samples: usize,

    /// Lower bound of the temperature schedule
    #[serde(default = "default_temperature_min")]
    pub temperature_min: f64,

    /// Upper bound of the temperature schedule
    #[serde(default = "default_temperature_max")]
    pub temperature_max: f64,

    /// Solution artifact filename inside each workspace
    #[serde(default = "default_solution_filename")]
    pub solution_filename: String,
}

const fn default_num_samples() -> usize {
    4
}

const fn default_temperature_min() -> f64 {
    0.3
}

const fn default_temperature_max() -> f64 {
    0.7
}

fn default_solution_filename() -> String {
    "regex.txt".to_string()
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            num_samples: default_num_samples(),
            temperature_min: default_temperature_min(),
            temperature_max: default_temperature_max(),
            solution_filename: default_solution_filename(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional directory for rolling file output
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Whether to also log to stdout
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const fn default_enable_stdout() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_enable_stdout(),
        }
    }
}
