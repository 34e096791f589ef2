//! Configuration system for StepForge.
//!
//! Load iteration budgets and animation settings from TOML or YAML files
//! without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use stepforge_config::SolverConfig;
//!
//! let config = SolverConfig::from_toml_str(r#"
//!     max_iterations = 5000
//!     pipeline_max_iterations = 200000
//!
//!     [animation]
//!     steps_per_frame = 10
//! "#).unwrap();
//!
//! assert_eq!(config.max_iterations_for(false), 5000);
//! assert_eq!(config.max_iterations_for(true), 200_000);
//! assert_eq!(config.animation.steps_per_frame, 10);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use stepforge_config::SolverConfig;
//!
//! let config = SolverConfig::load("solver.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stepforge_core::{DEFAULT_MAX_ITERATIONS, DEFAULT_PIPELINE_MAX_ITERATIONS};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Iteration budget for plain solvers.
    #[serde(default)]
    pub max_iterations: Option<u64>,

    /// Iteration budget for pipelines.
    #[serde(default)]
    pub pipeline_max_iterations: Option<u64>,

    /// Animation settings for interactive stepping.
    #[serde(default)]
    pub animation: AnimationConfig,
}

impl SolverConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::from_toml_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the plain solver iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Sets the pipeline iteration budget.
    pub fn with_pipeline_max_iterations(mut self, max_iterations: u64) -> Self {
        self.pipeline_max_iterations = Some(max_iterations);
        self
    }

    /// Sets how many steps the animator runs per frame.
    pub fn with_steps_per_frame(mut self, steps_per_frame: u64) -> Self {
        self.animation.steps_per_frame = steps_per_frame;
        self
    }

    /// Returns the effective iteration budget for a plain solver or a pipeline.
    pub fn max_iterations_for(&self, pipeline: bool) -> u64 {
        if pipeline {
            self.pipeline_max_iterations
                .unwrap_or(DEFAULT_PIPELINE_MAX_ITERATIONS)
        } else {
            self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS)
        }
    }

    /// Checks that budgets and animation settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == Some(0) {
            return Err(ConfigError::Invalid(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.pipeline_max_iterations == Some(0) {
            return Err(ConfigError::Invalid(
                "pipeline_max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.animation.steps_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "animation.steps_per_frame must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Animation configuration for frame-driven stepping.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AnimationConfig {
    /// Steps executed per animation frame.
    #[serde(default = "default_steps_per_frame")]
    pub steps_per_frame: u64,

    /// Target interval between frames in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

impl AnimationConfig {
    /// Returns the frame interval as a Duration.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            steps_per_frame: default_steps_per_frame(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

fn default_steps_per_frame() -> u64 {
    1
}

fn default_frame_interval_ms() -> u64 {
    16
}
