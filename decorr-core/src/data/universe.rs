//! Static universe files.
//!
//! A universe file is a TOML document listing asset ids in the order they
//! should be considered:
//!
//! ```toml
//! assets = ["chainlink", "render-token", "injective-protocol"]
//! ```
//!
//! Order matters: the greedy selector gives earlier assets priority.

use crate::domain::Universe;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UniverseFileError {
    #[error("read universe file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize universe TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// On-disk form of a static universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseFile {
    pub assets: Vec<String>,
}

impl UniverseFile {
    pub fn from_file(path: &Path) -> Result<Self, UniverseFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, UniverseFileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, UniverseFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The ordered, de-duplicated universe.
    pub fn to_universe(&self) -> Universe {
        Universe::new(self.assets.iter().map(String::as_str))
    }

    /// A handful of mid-cap coins, useful as an offline starting point.
    pub fn default_crypto() -> Self {
        Self {
            assets: [
                "chainlink",
                "render-token",
                "injective-protocol",
                "the-graph",
                "fetch-ai",
                "thorchain",
                "arweave",
                "gala",
                "axie-infinity",
                "theta-token",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}
