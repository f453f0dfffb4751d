//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pmm_mm::{RiskParameters, StrategyKind};

use crate::error::{AppError, AppResult};

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Perp market symbol, used in logs.
    #[serde(default = "default_market_name")]
    pub market_name: String,

    /// Maker account address. Resting orders with this owner are counted
    /// as the maker's own open orders. Empty disables the lookup.
    #[serde(default)]
    pub owner_address: String,

    /// Decision cycle period (ms).
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,

    /// Deadline for fetching all three snapshots (ms). At most one period.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Deadline for one submission (ms). At most one period.
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,

    /// Stop after this many cycles. Unbounded when unset.
    #[serde(default)]
    pub max_cycles: Option<u64>,

    /// Directory holding `dlob.json`, `user.json` and `market.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub strategy: StrategyKind,

    #[serde(default)]
    pub risk: RiskParameters,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            market_name: default_market_name(),
            owner_address: String::new(),
            cycle_period_ms: default_cycle_period_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            submit_timeout_ms: default_submit_timeout_ms(),
            max_cycles: None,
            data_dir: default_data_dir(),
            strategy: StrategyKind::default(),
            risk: RiskParameters::default(),
        }
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse from a TOML string.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Reject configurations that cannot run. Called before the engine starts.
    pub fn validate(&self) -> AppResult<()> {
        if self.cycle_period_ms == 0 {
            return Err(AppError::Config("cycle_period_ms must be positive".to_string()));
        }
        if self.fetch_timeout_ms == 0 || self.fetch_timeout_ms > self.cycle_period_ms {
            return Err(AppError::Config(format!(
                "fetch_timeout_ms must be in 1..={}, got {}",
                self.cycle_period_ms, self.fetch_timeout_ms
            )));
        }
        if self.submit_timeout_ms == 0 || self.submit_timeout_ms > self.cycle_period_ms {
            return Err(AppError::Config(format!(
                "submit_timeout_ms must be in 1..={}, got {}",
                self.cycle_period_ms, self.submit_timeout_ms
            )));
        }
        if self.max_cycles == Some(0) {
            return Err(AppError::Config("max_cycles must be at least 1".to_string()));
        }
        self.risk
            .validate()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }
}

fn default_market_name() -> String {
    "SOL-PERP".to_string()
}
fn default_cycle_period_ms() -> u64 {
    12_000 // 12 seconds
}
fn default_fetch_timeout_ms() -> u64 {
    5_000
}
fn default_submit_timeout_ms() -> u64 {
    5_000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
