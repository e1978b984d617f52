//! Market data collaborator contracts and structured error types.
//!
//! Two layers:
//! - [`MarketDataProvider`] is the fallible provider trait (CoinGecko, synthetic,
//!   test doubles). It reports *why* a fetch failed.
//! - [`UniverseSource`] and [`SeriesSource`] are the contracts the pipeline
//!   consumes. They never fail: a failed fetch is an empty universe or an
//!   empty series, which the correlation engine already treats as degenerate.
//!
//! [`Lenient`] turns any provider into both sources, logging what it swallows.

use crate::domain::{AssetId, PriceSeries, SeriesSet, TimeWindow, Universe};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("asset not found: {asset}")]
    AssetNotFound { asset: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("data error: {0}")]
    Other(String),
}

/// A fallible market data provider.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the ordered candidate universe.
    fn fetch_universe(&self) -> Result<Universe, DataError>;

    /// Fetch one asset's prices over `window`, oldest first.
    fn fetch_series(&self, asset: &AssetId, window: &TimeWindow) -> Result<PriceSeries, DataError>;

    /// Whether the provider is currently accepting requests.
    fn is_available(&self) -> bool {
        true
    }
}

/// Source of the asset universe. Returns an empty universe on failure.
pub trait UniverseSource: Send + Sync {
    fn universe(&self) -> Universe;
}

/// Source of per-asset price series. Returns an empty series on failure or
/// missing data; may be invoked once per asset, from several threads.
pub trait SeriesSource: Send + Sync {
    fn series(&self, asset: &AssetId, window: &TimeWindow) -> PriceSeries;
}

/// An already-fetched set of series used as a source; the window is ignored.
impl SeriesSource for SeriesSet {
    fn series(&self, asset: &AssetId, _window: &TimeWindow) -> PriceSeries {
        PriceSeries::new(self.get_or_empty(asset.as_str()).to_vec())
    }
}

/// A fixed universe used as a source.
impl UniverseSource for Universe {
    fn universe(&self) -> Universe {
        self.clone()
    }
}

/// Adapts a [`MarketDataProvider`] to the never-failing source contracts.
pub struct Lenient<P> {
    provider: P,
}

impl<P: MarketDataProvider> Lenient<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: MarketDataProvider> UniverseSource for Lenient<P> {
    fn universe(&self) -> Universe {
        match self.provider.fetch_universe() {
            Ok(universe) => universe,
            Err(e) => {
                tracing::error!(provider = self.provider.name(), error = %e, "universe fetch failed");
                Universe::empty()
            }
        }
    }
}

impl<P: MarketDataProvider> SeriesSource for Lenient<P> {
    fn series(&self, asset: &AssetId, window: &TimeWindow) -> PriceSeries {
        match self.provider.fetch_series(asset, window) {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    %asset,
                    error = %e,
                    "series fetch failed, using empty series"
                );
                PriceSeries::empty()
            }
        }
    }
}
