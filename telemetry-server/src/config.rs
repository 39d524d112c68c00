//! Configuration module

use std::env;
use telemetry_core::{ConfigError, PipelineConfig};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Source + scheduler settings
    pub pipeline: PipelineConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(p) => p
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: p })?,
            Err(_) => 8080,
        };

        Ok(Self {
            port,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            pipeline: PipelineConfig::from_env()?,
        })
    }

    pub fn with_pipeline(pipeline: PipelineConfig) -> Self {
        Self {
            port: 8080,
            environment: "development".to_string(),
            pipeline,
        }
    }
}
