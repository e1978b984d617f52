use super::ids::{AssetId, DatasetHash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered prices for one asset, indexed by position.
///
/// Series are compared position-wise, never by timestamp, so callers must
/// supply series sampled over matching windows at the same cadence.
/// An empty series is valid and means "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(pub Vec<f64>);

impl PriceSeries {
    pub fn new(prices: Vec<f64>) -> Self {
        Self(prices)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(prices: Vec<f64>) -> Self {
        Self(prices)
    }
}

impl AsRef<[f64]> for PriceSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Price series keyed by asset (`seriesByAsset`).
///
/// Lookups for an asset with no entry return `None`; the correlation engine
/// treats that the same as an empty series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: HashMap<AssetId, PriceSeries>,
}

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, asset: impl Into<AssetId>, series: impl Into<PriceSeries>) {
        self.series.insert(asset.into(), series.into());
    }

    pub fn get(&self, asset: &str) -> Option<&[f64]> {
        self.series.get(asset).map(PriceSeries::as_slice)
    }

    /// Series for `asset`, or an empty slice when absent.
    pub fn get_or_empty(&self, asset: &str) -> &[f64] {
        self.get(asset).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Deterministic BLAKE3 hash over the series of `order`, in that order.
    ///
    /// Absent assets hash as zero-length series so two sets that differ only
    /// in a missing entry still hash differently from a set with data.
    pub fn dataset_hash(&self, order: &[AssetId]) -> DatasetHash {
        let mut hasher = blake3::Hasher::new();
        for asset in order {
            let prices = self.get_or_empty(asset.as_str());
            hasher.update(asset.as_str().as_bytes());
            hasher.update(&(prices.len() as u64).to_le_bytes());
            for p in prices {
                hasher.update(&p.to_le_bytes());
            }
        }
        DatasetHash(hasher.finalize().to_hex().to_string())
    }
}

impl<A: Into<AssetId>, S: Into<PriceSeries>> FromIterator<(A, S)> for SeriesSet {
    fn from_iter<I: IntoIterator<Item = (A, S)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (asset, series) in iter {
            set.insert(asset, series);
        }
        set
    }
}
