//! Configuration system
//!
//! Centralized configuration with config-file loading, environment variable
//! overrides, runtime defaults, and validation. The loaded [`Config`] is
//! passed explicitly to adapter and client constructors at startup; nothing
//! reads the environment after load time.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Data source selection and file-backend paths
    pub sources: SourcesConfig,

    /// Remote table store connection
    pub remote_table: RemoteTableConfig,

    /// External inference service and local fallbacks
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// "files" or "table"
    pub backend: String,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteTableConfig {
    /// Base URL of the table service, e.g. `https://account.table.host`
    pub endpoint: String,
    pub table: String,
    /// Device listing endpoint (POST `{custID}`)
    pub devices_url: String,
    pub customer_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Local model runner binary used when the HTTP endpoint is down.
    /// `None` disables the subprocess fallbacks entirely.
    pub runner_command: Option<String>,
    /// Alternate model paths tried, in order, after the configured model.
    pub model_candidates: Vec<String>,
    pub runner_timeout_secs: u64,
    pub candidate_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            sources: SourcesConfig::default(),
            remote_table: RemoteTableConfig::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
            directory: PathBuf::from("logs"),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            backend: "files".to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for RemoteTableConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            table: "K2hourlyOEEreport".to_string(),
            devices_url: String::new(),
            customer_id: String::new(),
            timeout_secs: 10,
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:1234/v1/completions".to_string(),
            model: "vocalis".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            timeout_secs: 60,
            runner_command: Some("ollama".to_string()),
            model_candidates: vec![
                "./models/Vocalis-q4_k_m.gguf".to_string(),
                "./Vocalis-q4_k_m.gguf".to_string(),
                "vocalis".to_string(),
            ],
            runner_timeout_secs: 45,
            candidate_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional config file, and
    /// environment variable overrides, then validate.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = explicit_path {
            config = Self::load_from_file(path)?;
        } else {
            let config_paths = [
                PathBuf::from("machine-insight.toml"),
                PathBuf::from(".machine-insight.toml"),
                dirs::config_dir()
                    .map(|d| d.join("machine-insight").join("config.toml"))
                    .unwrap_or_default(),
            ];
            for path in &config_paths {
                if path.exists() {
                    config = Self::load_from_file(path)?;
                    break;
                }
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("MACHINE_INSIGHT_BACKEND") {
            self.sources.backend = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_DATA_DIR") {
            self.sources.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = env::var("MACHINE_INSIGHT_TABLE_ENDPOINT") {
            self.remote_table.endpoint = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_TABLE_NAME") {
            self.remote_table.table = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_DEVICES_URL") {
            self.remote_table.devices_url = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_CUSTOMER_ID") {
            self.remote_table.customer_id = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_TABLE_TIMEOUT_SECS") {
            self.remote_table.timeout_secs = val
                .parse()
                .context("Invalid MACHINE_INSIGHT_TABLE_TIMEOUT_SECS")?;
        }

        if let Ok(val) = env::var("MACHINE_INSIGHT_INFERENCE_ENDPOINT") {
            self.inference.endpoint = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_MODEL") {
            self.inference.model = val;
        }
        if let Ok(val) = env::var("MACHINE_INSIGHT_INFERENCE_TIMEOUT_SECS") {
            self.inference.timeout_secs = val
                .parse()
                .context("Invalid MACHINE_INSIGHT_INFERENCE_TIMEOUT_SECS")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        match self.sources.backend.as_str() {
            "files" | "table" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown data source backend '{}', expected 'files' or 'table'",
                    other
                ));
            }
        }

        if self.sources.backend == "table" && self.remote_table.endpoint.is_empty() {
            return Err(anyhow::anyhow!(
                "Table backend selected but remote_table.endpoint is not set"
            ));
        }

        if self.remote_table.timeout_secs == 0 || self.inference.timeout_secs == 0 {
            return Err(anyhow::anyhow!("External call timeouts must be non-zero"));
        }

        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(anyhow::anyhow!(
                "Inference temperature must be within 0.0..=2.0, got {}",
                self.inference.temperature
            ));
        }

        if self.logging.output != "console" && !self.logging.directory.exists() {
            fs::create_dir_all(&self.logging.directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }
}
