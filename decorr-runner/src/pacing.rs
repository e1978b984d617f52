//! Paced series fetching.
//!
//! Fetches one series per asset through a [`SeriesSource`] and reassembles
//! them in universe order. The pacing policy decides how the fetches are
//! spread over time so that rate-limited providers are not hammered.

use decorr_core::data::SeriesSource;
use decorr_core::domain::{AssetId, PriceSeries, SeriesSet, TimeWindow};
use std::time::Duration;

/// How fetches are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    /// One fetch at a time, waiting `delay` between consecutive fetches.
    Sequential { delay: Duration },
    /// All fetches in flight at once, fetch `i` starting `i * delay` after the first.
    Staggered { delay: Duration },
}

impl PacingPolicy {
    /// Back-to-back sequential fetches, for in-memory and offline sources.
    pub fn immediate() -> Self {
        Self::Sequential {
            delay: Duration::ZERO,
        }
    }

    /// Offset of fetch `index` from the start of a staggered batch.
    fn offset(delay: Duration, index: usize) -> Duration {
        delay.saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::immediate()
    }
}

/// Progress callbacks for a fetch batch.
///
/// Called from worker threads under [`PacingPolicy::Staggered`].
pub trait FetchProgress: Send + Sync {
    fn on_start(&self, asset: &AssetId, index: usize, total: usize);

    /// `points` is zero when the source produced no data.
    fn on_complete(&self, asset: &AssetId, index: usize, total: usize, points: usize);

    fn on_batch_complete(&self, summary: &FetchSummary);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl FetchProgress for LogProgress {
    fn on_start(&self, asset: &AssetId, index: usize, total: usize) {
        tracing::debug!(%asset, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(&self, asset: &AssetId, index: usize, total: usize, points: usize) {
        if points == 0 {
            tracing::warn!(%asset, "[{}/{}] no data", index + 1, total);
        } else {
            tracing::info!(%asset, points, "[{}/{}] fetched", index + 1, total);
        }
    }

    fn on_batch_complete(&self, summary: &FetchSummary) {
        tracing::info!(
            total = summary.total,
            with_data = summary.with_data,
            empty = summary.empty.len(),
            "fetch batch complete"
        );
    }
}

/// Discards all progress events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl FetchProgress for NoProgress {
    fn on_start(&self, _: &AssetId, _: usize, _: usize) {}
    fn on_complete(&self, _: &AssetId, _: usize, _: usize, _: usize) {}
    fn on_batch_complete(&self, _: &FetchSummary) {}
}

/// Outcome counts of a fetch batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub total: usize,
    pub with_data: usize,
    /// Assets whose series came back empty, in universe order.
    pub empty: Vec<AssetId>,
}

impl FetchSummary {
    pub fn any_data(&self) -> bool {
        self.with_data > 0
    }
}

/// Fetch the series of every asset in `universe` over `window`.
///
/// The returned set holds an entry for every asset; a fetch that yields no
/// data (or whose worker panics) is stored as an empty series.
pub fn fetch_all(
    universe: &[AssetId],
    window: &TimeWindow,
    source: &dyn SeriesSource,
    policy: PacingPolicy,
    progress: &dyn FetchProgress,
) -> (SeriesSet, FetchSummary) {
    let total = universe.len();

    let fetched: Vec<PriceSeries> = match policy {
        PacingPolicy::Sequential { delay } => universe
            .iter()
            .enumerate()
            .map(|(i, asset)| {
                if i > 0 && !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                fetch_one(source, asset, window, i, total, progress)
            })
            .collect(),
        PacingPolicy::Staggered { delay } => std::thread::scope(|scope| {
            let handles: Vec<_> = universe
                .iter()
                .enumerate()
                .map(|(i, asset)| {
                    scope.spawn(move || {
                        let wait = PacingPolicy::offset(delay, i);
                        if !wait.is_zero() {
                            std::thread::sleep(wait);
                        }
                        fetch_one(source, asset, window, i, total, progress)
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(universe)
                .map(|(handle, asset)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!(%asset, "fetch worker panicked, using empty series");
                        PriceSeries::empty()
                    })
                })
                .collect()
        }),
    };

    let mut summary = FetchSummary {
        total,
        ..FetchSummary::default()
    };
    let mut series = SeriesSet::new();
    for (asset, prices) in universe.iter().zip(fetched) {
        if prices.is_empty() {
            summary.empty.push(asset.clone());
        } else {
            summary.with_data += 1;
        }
        series.insert(asset.clone(), prices);
    }

    progress.on_batch_complete(&summary);
    (series, summary)
}

fn fetch_one(
    source: &dyn SeriesSource,
    asset: &AssetId,
    window: &TimeWindow,
    index: usize,
    total: usize,
    progress: &dyn FetchProgress,
) -> PriceSeries {
    progress.on_start(asset, index, total);
    let prices = source.series(asset, window);
    progress.on_complete(asset, index, total, prices.len());
    prices
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    fn window() -> TimeWindow {
        TimeWindow::from_unix(0, 3_600).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| AssetId::new(*n)).collect()
    }

    /// Source whose series encodes the asset name length; records call order.
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<String>>,
    }

    impl SeriesSource for Recording {
        fn series(&self, asset: &AssetId, _window: &TimeWindow) -> PriceSeries {
            self.calls.lock().unwrap().push(asset.to_string());
            if asset.as_str().starts_with("empty") {
                return PriceSeries::empty();
            }
            PriceSeries::new(vec![asset.as_str().len() as f64; 3])
        }
    }

    /// Later assets finish first.
    struct ReverseLatency {
        total: usize,
    }

    impl SeriesSource for ReverseLatency {
        fn series(&self, asset: &AssetId, _window: &TimeWindow) -> PriceSeries {
            let index: usize = asset.as_str().trim_start_matches('a').parse().unwrap();
            std::thread::sleep(Duration::from_millis(((self.total - index) * 10) as u64));
            PriceSeries::new(vec![index as f64, index as f64 + 1.0])
        }
    }

    struct Panicking;

    impl SeriesSource for Panicking {
        fn series(&self, asset: &AssetId, _window: &TimeWindow) -> PriceSeries {
            if asset.as_str() == "boom" {
                panic!("source exploded");
            }
            PriceSeries::new(vec![1.0, 2.0])
        }
    }

    #[derive(Default)]
    struct Counting {
        starts: Mutex<usize>,
        completes: Mutex<usize>,
        batches: Mutex<Vec<FetchSummary>>,
    }

    impl FetchProgress for Counting {
        fn on_start(&self, _: &AssetId, _: usize, _: usize) {
            *self.starts.lock().unwrap() += 1;
        }
        fn on_complete(&self, _: &AssetId, _: usize, _: usize, _: usize) {
            *self.completes.lock().unwrap() += 1;
        }
        fn on_batch_complete(&self, summary: &FetchSummary) {
            self.batches.lock().unwrap().push(summary.clone());
        }
    }

    #[test]
    fn sequential_fetches_in_universe_order() {
        let universe = ids(&["bitcoin", "eth", "empty-coin", "sol"]);
        let source = Recording::default();

        let (series, summary) = fetch_all(
            &universe,
            &window(),
            &source,
            PacingPolicy::immediate(),
            &NoProgress,
        );

        assert_eq!(
            *source.calls.lock().unwrap(),
            vec!["bitcoin", "eth", "empty-coin", "sol"]
        );
        assert_eq!(series.len(), 4);
        assert_eq!(series.get("eth"), Some(&[3.0, 3.0, 3.0][..]));
        assert_eq!(series.get("empty-coin"), Some(&[][..]));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.with_data, 3);
        assert_eq!(summary.empty, ids(&["empty-coin"]));
    }

    #[test]
    fn staggered_results_keep_universe_order() {
        let universe = ids(&["a0", "a1", "a2", "a3", "a4"]);
        let source = ReverseLatency { total: 5 };

        let (series, summary) = fetch_all(
            &universe,
            &window(),
            &source,
            PacingPolicy::Staggered {
                delay: Duration::ZERO,
            },
            &NoProgress,
        );

        assert!(summary.any_data());
        for (i, asset) in universe.iter().enumerate() {
            assert_eq!(
                series.get(asset.as_str()),
                Some(&[i as f64, i as f64 + 1.0][..]),
                "series for {asset} is misplaced"
            );
        }
    }

    #[test]
    fn staggered_spaces_out_fetch_starts() {
        let universe = ids(&["x", "y", "z"]);
        let source = Recording::default();
        let started = Instant::now();

        fetch_all(
            &universe,
            &window(),
            &source,
            PacingPolicy::Staggered {
                delay: Duration::from_millis(20),
            },
            &NoProgress,
        );

        // the last fetch starts 2 * 20ms after the first
        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(source.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn sequential_waits_between_fetches_only() {
        let universe = ids(&["x", "y"]);
        let started = Instant::now();

        fetch_all(
            &universe,
            &window(),
            &Recording::default(),
            PacingPolicy::Sequential {
                delay: Duration::from_millis(25),
            },
            &NoProgress,
        );

        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn panicking_worker_yields_empty_series() {
        let universe = ids(&["fine", "boom", "also-fine"]);

        let (series, summary) = fetch_all(
            &universe,
            &window(),
            &Panicking,
            PacingPolicy::Staggered {
                delay: Duration::ZERO,
            },
            &NoProgress,
        );

        assert_eq!(series.get("boom"), Some(&[][..]));
        assert_eq!(series.get("also-fine"), Some(&[1.0, 2.0][..]));
        assert_eq!(summary.empty, ids(&["boom"]));
    }

    #[test]
    fn progress_sees_every_fetch() {
        let universe = ids(&["p", "q", "r"]);
        let progress = Counting::default();

        fetch_all(
            &universe,
            &window(),
            &Recording::default(),
            PacingPolicy::Staggered {
                delay: Duration::ZERO,
            },
            &progress,
        );

        assert_eq!(*progress.starts.lock().unwrap(), 3);
        assert_eq!(*progress.completes.lock().unwrap(), 3);
        let batches = progress.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].with_data, 3);
    }

    #[test]
    fn empty_universe_fetches_nothing() {
        let (series, summary) = fetch_all(
            &[],
            &window(),
            &Recording::default(),
            PacingPolicy::Staggered {
                delay: Duration::from_secs(60),
            },
            &NoProgress,
        );
        assert!(series.is_empty());
        assert!(!summary.any_data());
    }

    #[test]
    fn staggered_offset_is_linear() {
        let d = Duration::from_millis(25_000);
        assert_eq!(PacingPolicy::offset(d, 0), Duration::ZERO);
        assert_eq!(PacingPolicy::offset(d, 3), Duration::from_millis(75_000));
    }
}
