//! Configuration management for bodyfit
//!
//! Config stored at: ~/.config/bodyfit/config.json

use std::path::PathBuf;

use bodyfit_domain::service::{QualityThresholds, HEAD_LENGTH_CM};
use bodyfit_types::{ConfigError, OutputFormat, Result};
use bodyfit_vision::DEFAULT_MAX_DIMENSION;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Where height/weight refinement prompts are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorBackend {
    /// OpenAI-compatible chat-completions API
    #[default]
    Openai,
    /// Local command reading the prompt on stdin
    Command,
}

impl std::fmt::Display for EstimatorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimatorBackend::Openai => write!(f, "openai"),
            EstimatorBackend::Command => write!(f, "command"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Estimator backend (openai, command)
    #[serde(default)]
    pub backend: EstimatorBackend,

    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the chat-completions API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Estimator request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Command line for the `command` estimator backend
    #[serde(default)]
    pub estimator_command: Option<String>,

    /// Pose detector command line (called with `--image <path>`)
    #[serde(default)]
    pub pose_command: Option<String>,

    /// Face attribute estimator command line (called with `--image <path>`)
    #[serde(default)]
    pub face_command: Option<String>,

    /// Images larger than this on either side are downscaled before verification
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,

    /// Nose-to-shoulder reference length in cm
    #[serde(default = "default_head_length_cm")]
    pub head_length_cm: f64,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Quality gate thresholds
    #[serde(default)]
    pub thresholds: QualityThresholds,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_image_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_head_length_cm() -> f64 {
    HEAD_LENGTH_CM
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: EstimatorBackend::default(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            estimator_command: None,
            pose_command: None,
            face_command: None,
            max_image_dimension: default_max_image_dimension(),
            head_length_cm: default_head_length_cm(),
            output_format: OutputFormat::default(),
            thresholds: QualityThresholds::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("bodyfit");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSetting(format!("environment variable {}", self.api_key_env)).into())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn or_unset(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("(not set)")
        }

        writeln!(f, "Bodyfit Configuration")?;
        writeln!(f, "=====================")?;
        writeln!(f)?;
        writeln!(f, "Backend:           {}", self.backend)?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "API base URL:      {}", self.api_base_url)?;
        writeln!(f, "API key env:       {}", self.api_key_env)?;
        writeln!(f, "Timeout:           {}s", self.timeout_secs)?;
        writeln!(f, "Estimator command: {}", or_unset(&self.estimator_command))?;
        writeln!(f, "Pose command:      {}", or_unset(&self.pose_command))?;
        writeln!(f, "Face command:      {}", or_unset(&self.face_command))?;
        writeln!(f, "Max image side:    {}px", self.max_image_dimension)?;
        writeln!(f, "Head length:       {} cm", self.head_length_cm)?;
        writeln!(f, "Output format:     {}", self.output_format)?;
        writeln!(f)?;
        writeln!(f, "Quality thresholds")?;
        let t = &self.thresholds;
        writeln!(f, "  Brightness:      {} - {}", t.brightness_min, t.brightness_max)?;
        writeln!(f, "  Max body ratio:  {}", t.max_body_ratio)?;
        writeln!(
            f,
            "  Bend angles:     upright >= {}, mild >= {}, severe < {}",
            t.upright_angle, t.mild_bend_angle, t.severe_bend_angle
        )?;
        writeln!(f, "  Core visibility: {}", t.core_visibility)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:       {}", path.display())?;
        }

        Ok(())
    }
}
