//! Engine configuration
//!
//! Loads the engine configuration from `rollup.toml` or `.rolluprc.json` in
//! a directory. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! # rollup.toml
//!
//! [engine]
//! parallel = true   # run independent steps concurrently
//! workers = 8       # 0 = auto-detect
//!
//! [steps]
//! disabled = ["last-commit"]
//!
//! [views]
//! max_period_index = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{ComputeError, Result};
use crate::measure::MAX_PERIOD_INDEX;
use crate::steps::DEFAULT_VIEWS_MAX_PERIOD_INDEX;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub engine: ExecutionConfig,

    #[serde(default)]
    pub steps: StepsConfig,

    #[serde(default)]
    pub views: ViewsConfig,
}

/// How the sequencer runs the steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Run steps whose dependencies are complete concurrently
    #[serde(default)]
    pub parallel: bool,

    /// Worker threads in parallel mode (0 = auto-detect)
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepsConfig {
    /// Names of the steps to skip
    #[serde(default)]
    pub disabled: Vec<String>,
}

impl StepsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.iter().any(|d| d == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Highest period index views carry variations for
    #[serde(default = "default_views_max_period_index")]
    pub max_period_index: usize,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            max_period_index: default_views_max_period_index(),
        }
    }
}

fn default_views_max_period_index() -> usize {
    DEFAULT_VIEWS_MAX_PERIOD_INDEX
}

impl EngineConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ComputeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.views.max_period_index > MAX_PERIOD_INDEX {
            return Err(ComputeError::Config(format!(
                "views.max_period_index must be at most {}, got {}",
                MAX_PERIOD_INDEX, self.views.max_period_index
            )));
        }
        Ok(())
    }
}

/// Load the engine configuration of `dir`
///
/// Tries `rollup.toml` then `.rolluprc.json`. A missing or broken file falls
/// back to the defaults.
pub fn load_engine_config(dir: &Path) -> EngineConfig {
    let toml_path = dir.join("rollup.toml");
    if toml_path.exists() {
        match load_toml_config(&toml_path) {
            Ok(config) => {
                debug!("Loaded engine config from {}", toml_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", toml_path.display(), e);
            }
        }
    }

    let json_path = dir.join(".rolluprc.json");
    if json_path.exists() {
        match load_json_config(&json_path) {
            Ok(config) => {
                debug!("Loaded engine config from {}", json_path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {}", json_path.display(), e);
            }
        }
    }

    debug!("No engine config found, using defaults");
    EngineConfig::default()
}

fn load_toml_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(EngineConfig::from_toml_str(&content)?)
}

fn load_json_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
