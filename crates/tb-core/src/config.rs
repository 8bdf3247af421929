//! Static model configuration.

use serde::{Deserialize, Serialize};

/// Default in-browser model.
pub const DEFAULT_MODEL: &str = "Hermes-3-Llama-3.1-8B-q4f16_1-MLC";

/// Maximum accepted sampling temperature.
const TEMPERATURE_MAX: f32 = 2.0;

/// Model settings handed to the bridge at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Model identifier understood by the host engine
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

impl BridgeConfig {
    /// Create a validated config.
    pub fn new(model: impl Into<String>, temperature: f32) -> Result<Self, ConfigError> {
        let config = Self {
            model: model.into(),
            temperature,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the model name and temperature range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel);
        }
        if !(0.0..=TEMPERATURE_MAX).contains(&self.temperature) {
            return Err(ConfigError::Temperature(self.temperature));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Model identifier must not be empty")]
    EmptyModel,

    #[error("Temperature {0} outside [0.0, 2.0]")]
    Temperature(f32),

    #[error("Missing setting: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Config parse error: {0}")]
    Parse(String),
}
