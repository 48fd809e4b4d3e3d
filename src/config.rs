//! Configuration loading using Figment.
//!
//! Settings are loaded from:
//! 1. a TOML file (base configuration)
//! 2. environment variables prefixed with `SPECTRUM_DAQ_`
//!
//! # Example
//!
//! ```toml
//! [application]
//! name = "Bench analyzers"
//! log_level = "debug"
//!
//! [[analyzers]]
//! id = "hp"
//! config = { family = "HP856x", start_hz = 1.0e9, stop_hz = 2.0e9 }
//!
//! [[analyzers]]
//! id = "keysight"
//! enabled = false
//! config = { default_trace = 2 }
//! ```

use crate::error::{Result, SpectrumError};
use crate::factory::{AnalyzerConfig, SpectrumAnalyzerFactory};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/spectrum_daq.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SPECTRUM_DAQ_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Application settings
    #[serde(default)]
    pub application: ApplicationConfig,
    /// Analyzer definitions
    #[serde(default)]
    pub analyzers: Vec<AnalyzerDefinition>,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// One analyzer entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerDefinition {
    /// Unique identifier
    pub id: String,
    /// Whether this analyzer is used
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Driver configuration, see [`AnalyzerConfig`]
    #[serde(default = "empty_table")]
    pub config: toml::Value,
}

fn default_name() -> String {
    "spectrum_daq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_enabled() -> bool {
    true
}

fn empty_table() -> toml::Value {
    toml::Value::Table(toml::Table::new())
}

impl Settings {
    /// Load from [`DEFAULT_CONFIG_PATH`] and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file and the environment.
    ///
    /// Environment variables override the file, e.g.
    /// `SPECTRUM_DAQ_APPLICATION__LOG_LEVEL=debug`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(settings)
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.application.log_level.as_str()) {
            return Err(SpectrumError::Config(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.application.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        let mut ids = HashSet::new();
        for analyzer in &self.analyzers {
            if !ids.insert(&analyzer.id) {
                return Err(SpectrumError::Config(format!(
                    "Duplicate analyzer ID: {}",
                    analyzer.id
                )));
            }
        }

        let factory = SpectrumAnalyzerFactory;
        for analyzer in self.enabled_analyzers() {
            factory.validate(&analyzer.config).map_err(|e| {
                SpectrumError::Config(format!("analyzer '{}': {}", analyzer.id, e))
            })?;
        }
        Ok(())
    }

    /// All enabled analyzers.
    pub fn enabled_analyzers(&self) -> impl Iterator<Item = &AnalyzerDefinition> {
        self.analyzers.iter().filter(|a| a.enabled)
    }

    /// Look up an analyzer by id.
    pub fn analyzer(&self, id: &str) -> Option<&AnalyzerDefinition> {
        self.analyzers.iter().find(|a| a.id == id)
    }
}

impl AnalyzerDefinition {
    /// Parse and validate this entry's driver configuration.
    pub fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        SpectrumAnalyzerFactory.validate(&self.config)
    }
}
