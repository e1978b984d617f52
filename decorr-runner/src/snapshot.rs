//! Raw series snapshots (`data.json`).
//!
//! A snapshot stores every fetched series next to the asset ids and window
//! it was fetched for, so a run can be repeated offline with identical input.
//! Series are stored positionally (one array per asset, in universe order);
//! missing or non-finite prices are written as `null` and read back as NaN,
//! so infinities are not preserved. The stored dataset hash covers the series
//! as stored.
//!
//! All snapshots carry a `schema_version`. Newer versions are rejected on load.

use chrono::{DateTime, Utc};
use decorr_core::domain::{AssetId, DatasetHash, PriceSeries, SeriesSet, TimeWindow, Universe};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("snapshot lists {assets} assets but {series} series")]
    Inconsistent { assets: usize, series: usize },
}

/// Series of one fetch batch, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSnapshot {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub assets: Vec<AssetId>,
    pub series: Vec<Vec<Option<f64>>>,
    pub dataset_hash: DatasetHash,
}

impl SeriesSnapshot {
    /// Snapshot `series` for the assets of `universe`, in that order.
    pub fn capture(universe: &[AssetId], series: &SeriesSet, window: TimeWindow) -> Self {
        let stored = universe
            .iter()
            .map(|asset| {
                series
                    .get_or_empty(asset.as_str())
                    .iter()
                    .map(|p| p.is_finite().then_some(*p))
                    .collect()
            })
            .collect();

        let mut snapshot = Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            created_at: Utc::now(),
            window,
            assets: universe.to_vec(),
            series: stored,
            dataset_hash: DatasetHash(String::new()),
        };
        snapshot.dataset_hash = snapshot.to_series_set().dataset_hash(universe);
        snapshot
    }

    pub fn universe(&self) -> Universe {
        Universe::from(self.assets.clone())
    }

    /// The stored series keyed by asset; `null` prices come back as NaN.
    pub fn to_series_set(&self) -> SeriesSet {
        self.assets
            .iter()
            .zip(&self.series)
            .map(|(asset, prices)| {
                let prices: Vec<f64> = prices.iter().map(|p| p.unwrap_or(f64::NAN)).collect();
                (asset.clone(), PriceSeries::new(prices))
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and check a snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if snapshot.assets.len() != snapshot.series.len() {
            return Err(SnapshotError::Inconsistent {
                assets: snapshot.assets.len(),
                series: snapshot.series.len(),
            });
        }

        let recomputed = snapshot.to_series_set().dataset_hash(&snapshot.assets);
        if recomputed != snapshot.dataset_hash {
            tracing::warn!(
                stored = %snapshot.dataset_hash,
                %recomputed,
                "snapshot dataset hash does not match its contents"
            );
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, self.to_json()?).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Vec<AssetId>, SeriesSet, TimeWindow) {
        let universe = vec![AssetId::new("alpha"), AssetId::new("beta"), AssetId::new("gamma")];
        let mut series = SeriesSet::new();
        series.insert("alpha", vec![1.5, 2.25, 3.125]);
        series.insert("beta", vec![10.0, f64::NAN, 12.0]);
        // gamma never fetched
        let window = TimeWindow::from_unix(1_710_277_894, 1_712_858_541).unwrap();
        (universe, series, window)
    }

    #[test]
    fn save_and_load_preserve_series() {
        let (universe, series, window) = fixture();
        let snapshot = SeriesSnapshot::capture(&universe, &series, window);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        snapshot.save(&path).unwrap();
        let loaded = SeriesSnapshot::load(&path).unwrap();

        assert_eq!(loaded.assets, universe);
        assert_eq!(loaded.window, window);
        assert_eq!(loaded.dataset_hash, snapshot.dataset_hash);

        let restored = loaded.to_series_set();
        assert_eq!(restored.get("alpha"), Some(&[1.5, 2.25, 3.125][..]));
        let beta = restored.get("beta").unwrap();
        assert_eq!(beta[0], 10.0);
        assert!(beta[1].is_nan());
        assert_eq!(restored.get("gamma"), Some(&[][..]));
    }

    #[test]
    fn missing_prices_are_written_as_null() {
        let (universe, series, window) = fixture();
        let json = SeriesSnapshot::capture(&universe, &series, window)
            .to_json()
            .unwrap();
        assert!(json.contains("[10.0,null,12.0]"));
        assert!(json.contains("\"schema_version\":1"));
    }

    #[test]
    fn infinite_prices_reload_as_nan_without_hash_mismatch() {
        let universe = vec![AssetId::new("alpha"), AssetId::new("beta")];
        let mut series = SeriesSet::new();
        series.insert("alpha", vec![1.0, f64::INFINITY, 3.0]);
        series.insert("beta", vec![f64::NEG_INFINITY, 2.0]);
        let window = TimeWindow::from_unix(0, 7_200).unwrap();

        let snapshot = SeriesSnapshot::capture(&universe, &series, window);
        assert_eq!(snapshot.series[0], vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(snapshot.series[1], vec![None, Some(2.0)]);

        let loaded = SeriesSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let restored = loaded.to_series_set();
        assert!(restored.get("alpha").unwrap()[1].is_nan());
        assert!(restored.get("beta").unwrap()[0].is_nan());
        assert_eq!(restored.dataset_hash(&universe), loaded.dataset_hash);
    }

    #[test]
    fn universe_keeps_snapshot_order() {
        let (universe, series, window) = fixture();
        let snapshot = SeriesSnapshot::capture(&universe, &series, window);
        assert_eq!(snapshot.universe().assets(), universe.as_slice());
    }

    #[test]
    fn rejects_future_schema_version() {
        let (universe, series, window) = fixture();
        let mut snapshot = SeriesSnapshot::capture(&universe, &series, window);
        snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&snapshot).unwrap();

        let err = SeriesSnapshot::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { found: 2, supported: 1 }
        ));
    }

    #[test]
    fn rejects_misaligned_series() {
        let (universe, series, window) = fixture();
        let mut snapshot = SeriesSnapshot::capture(&universe, &series, window);
        snapshot.series.pop();
        let json = serde_json::to_string(&snapshot).unwrap();

        let err = SeriesSnapshot::from_json(&json).unwrap_err();
        assert!(matches!(err, SnapshotError::Inconsistent { assets: 3, series: 2 }));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            SeriesSnapshot::from_json("[[1,2],[3,4]]"),
            Err(SnapshotError::Json(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SeriesSnapshot::load(Path::new("/no/such/data.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
