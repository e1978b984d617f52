//! Serializable run configuration.
//!
//! A run is described by one TOML document:
//!
//! ```toml
//! require_data = true
//!
//! [window]
//! days = 30
//!
//! [universe]
//! source = "coingecko"
//! min_market_cap = 10000000.0
//! max_market_cap = 5000000000.0
//!
//! [pacing]
//! mode = "staggered"
//! delay_ms = 25000
//!
//! [strategy]
//! type = "greedy"
//! target_size = 5
//! threshold = 0.2
//!
//! [output]
//! dir = "output"
//! ```
//!
//! Every section and field is optional; missing values take the defaults below.

use chrono::{DateTime, Utc};
use decorr_core::data::{CoinGeckoConfig, UniverseFile};
use decorr_core::domain::{TimeWindow, Universe};
use decorr_core::selection::SelectionStrategy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::pacing::PacingPolicy;

pub const DEFAULT_TOP_K: usize = 46;
pub const DEFAULT_TARGET_SIZE: i64 = 5;
pub const DEFAULT_THRESHOLD: f64 = 0.2;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const DEFAULT_DELAY_MS: u64 = 25_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Full configuration of one selection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Fail the run when no series could be fetched for any asset.
    pub require_data: bool,
    pub window: WindowConfig,
    pub universe: UniverseConfig,
    pub pacing: PacingConfig,
    pub strategy: StrategyConfig,
    pub output: OutputConfig,
}

impl RunConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reject settings that cannot describe a run.
    ///
    /// Strategy sizes are not range-checked: a zero `k` or a non-positive
    /// `target_size` are legal and produce empty results.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.strategy.threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "strategy.threshold must be a finite non-negative number, got {threshold}"
            )));
        }

        let (min, max) = (self.universe.min_market_cap, self.universe.max_market_cap);
        if min.partial_cmp(&max) != Some(Ordering::Less) {
            return Err(ConfigError::Invalid(format!(
                "universe market cap band is empty: min {min} must be below max {max}"
            )));
        }

        self.window.resolve(Utc::now())?;

        if self.universe.source == UniverseKind::Static
            && self.universe.assets.is_empty()
            && self.universe.file.is_none()
        {
            return Err(ConfigError::Invalid(
                "static universe needs `assets` or `file`".into(),
            ));
        }

        Ok(())
    }

    pub fn selection_strategy(&self) -> SelectionStrategy {
        self.strategy.to_strategy()
    }

    pub fn pacing_policy(&self) -> PacingPolicy {
        self.pacing.to_policy()
    }
}

/// Fetch window: either explicit unix bounds or the trailing `days` from now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub days: u32,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_WINDOW_DAYS,
            start: None,
            end: None,
        }
    }
}

impl WindowConfig {
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<TimeWindow, ConfigError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => TimeWindow::from_unix(start, end)
                .map_err(|e| ConfigError::Invalid(format!("window: {e}"))),
            (None, None) => TimeWindow::trailing_days(now, self.days)
                .map_err(|e| ConfigError::Invalid(format!("window: {e}"))),
            _ => Err(ConfigError::Invalid(
                "window.start and window.end must be given together".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UniverseKind {
    #[default]
    Coingecko,
    Static,
}

/// Where the candidate universe comes from and how it is filtered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    pub source: UniverseKind,
    /// Asset ids for a static universe, in priority order.
    pub assets: Vec<String>,
    /// Universe file for a static universe; appended after `assets`.
    pub file: Option<PathBuf>,
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub vs_currency: String,
    pub per_page: u32,
    pub base_url: Option<String>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let cg = CoinGeckoConfig::default();
        Self {
            source: UniverseKind::default(),
            assets: Vec::new(),
            file: None,
            min_market_cap: cg.min_market_cap,
            max_market_cap: cg.max_market_cap,
            vs_currency: cg.vs_currency,
            per_page: cg.per_page,
            base_url: None,
        }
    }
}

impl UniverseConfig {
    pub fn coingecko(&self) -> CoinGeckoConfig {
        let mut cg = CoinGeckoConfig {
            min_market_cap: self.min_market_cap,
            max_market_cap: self.max_market_cap,
            vs_currency: self.vs_currency.clone(),
            per_page: self.per_page,
            ..CoinGeckoConfig::default()
        };
        if let Some(url) = &self.base_url {
            cg.base_url = url.clone();
        }
        cg
    }

    /// The static universe: inline `assets` followed by the file's assets.
    pub fn static_universe(&self) -> Result<Universe, ConfigError> {
        let mut ids = self.assets.clone();
        if let Some(path) = &self.file {
            let file = UniverseFile::from_file(path)
                .map_err(|e| ConfigError::Invalid(format!("universe.file: {e}")))?;
            ids.extend(file.assets);
        }
        Ok(Universe::new(ids))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PacingMode {
    Sequential,
    #[default]
    Staggered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub mode: PacingMode,
    pub delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            mode: PacingMode::default(),
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl PacingConfig {
    pub fn to_policy(&self) -> PacingPolicy {
        let delay = Duration::from_millis(self.delay_ms);
        match self.mode {
            PacingMode::Sequential => PacingPolicy::Sequential { delay },
            PacingMode::Staggered => PacingPolicy::Staggered { delay },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    TopK,
    #[default]
    Greedy,
}

/// Strategy selection plus the parameters of both strategies.
///
/// Only the parameters of the chosen `type` are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    pub k: usize,
    pub target_size: i64,
    pub threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::default(),
            k: DEFAULT_TOP_K,
            target_size: DEFAULT_TARGET_SIZE,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl StrategyConfig {
    pub fn to_strategy(&self) -> SelectionStrategy {
        match self.kind {
            StrategyKind::TopK => SelectionStrategy::TopK { k: self.k },
            StrategyKind::Greedy => SelectionStrategy::Greedy {
                target_size: self.target_size,
                threshold: self.threshold,
            },
        }
    }
}

/// Which artifacts to write, and where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Write the fetched series as `data.json`.
    pub snapshot: bool,
    /// Write the full pair matrix as `pairs.csv`.
    pub csv: bool,
    /// Write the run report as `selection.json`.
    pub json: bool,
    /// Print the report to stdout.
    pub console: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            snapshot: true,
            csv: true,
            json: true,
            console: true,
        }
    }
}
