use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::features::{TailPolicy, WindowParams};
use crate::ingest::parse_address;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

// ============================================================
// Analysis Config
// ============================================================

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    #[serde(default = "default_step_hours")]
    pub step_hours: u32,
    /// Length of the baseline period, counted from the earliest transaction.
    #[serde(default = "default_baseline_days")]
    pub baseline_days: u32,
    #[serde(default = "default_std_dev_multiplier")]
    pub std_dev_multiplier: f64,
    #[serde(default)]
    pub tail_policy: TailPolicy,
    /// Refuse to analyze histories larger than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_transactions: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_hours: 24,
            step_hours: 6,
            baseline_days: 30,
            std_dev_multiplier: 3.0,
            tail_policy: TailPolicy::Snap,
            max_transactions: None,
        }
    }
}

fn default_window_hours() -> u32 {
    24
}

fn default_step_hours() -> u32 {
    6
}

fn default_baseline_days() -> u32 {
    30
}

fn default_std_dev_multiplier() -> f64 {
    3.0
}

impl AnalysisConfig {
    pub fn window_params(&self) -> WindowParams {
        WindowParams::from_hours(self.window_hours, self.step_hours, self.tail_policy)
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.window_hours == 0 {
            return Err(eyre::eyre!("window_hours must be at least 1"));
        }
        if self.step_hours == 0 {
            return Err(eyre::eyre!("step_hours must be at least 1"));
        }
        if !self.std_dev_multiplier.is_finite() || self.std_dev_multiplier < 0.0 {
            return Err(eyre::eyre!(
                "std_dev_multiplier must be a finite, non-negative number (got {})",
                self.std_dev_multiplier
            ));
        }
        if self.max_transactions == Some(0) {
            return Err(eyre::eyre!("max_transactions must be at least 1 when set"));
        }
        Ok(())
    }
}

// ============================================================
// Logging Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================
// Targets
// ============================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TargetConfig {
    pub address: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check analysis parameters and target addresses. An empty target list is
    /// allowed here since targets may still come from the command line.
    pub fn validate(&self) -> eyre::Result<()> {
        self.analysis.validate()?;
        for target in &self.targets {
            parse_address(&target.address).map_err(|e| {
                eyre::eyre!("Target with input '{}': {}", target.input.display(), e)
            })?;
        }
        Ok(())
    }
}
