//! CoinGecko market data provider.
//!
//! Universe: `/coins/markets` ordered by volume, filtered to a market-cap band.
//! Series: `/coins/{id}/market_chart/range`, keeping the price of each
//! `[timestamp, price]` point in the order returned (oldest first).
//!
//! The public API is aggressively rate limited. Requests go through the
//! circuit breaker, 429s are retried with exponential backoff, and a 403
//! opens the breaker immediately.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{AssetId, PriceSeries, TimeWindow, Universe};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Connection and universe-filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub vs_currency: String,
    /// Number of coins requested from the markets endpoint (one page).
    pub per_page: u32,
    /// Coins must have `min_market_cap < market_cap < max_market_cap`.
    pub min_market_cap: f64,
    pub max_market_cap: f64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            per_page: 100,
            min_market_cap: 10_000_000.0,
            max_market_cap: 5_000_000_000.0,
            max_retries: 3,
            base_delay_ms: 1_000,
            timeout_secs: 30,
        }
    }
}

/// One row of the `/coins/markets` response. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct MarketCoin {
    id: String,
    market_cap: Option<f64>,
}

/// `/coins/{id}/market_chart/range` response. Only prices are used.
#[derive(Debug, Deserialize)]
struct RangeResponse {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
}

/// CoinGecko data provider (blocking HTTP).
pub struct CoinGeckoProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    config: CoinGeckoConfig,
}

impl CoinGeckoProvider {
    pub fn new(
        config: CoinGeckoConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("decorr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            config,
        })
    }

    fn markets_url(&self) -> String {
        format!("{}/coins/markets", self.config.base_url.trim_end_matches('/'))
    }

    fn range_url(&self, asset: &AssetId) -> String {
        format!(
            "{}/coins/{}/market_chart/range",
            self.config.base_url.trim_end_matches('/'),
            asset
        )
    }

    /// Keep coins inside the market-cap band, in response order.
    fn filter_by_market_cap(&self, coins: Vec<MarketCoin>) -> Universe {
        let (min, max) = (self.config.min_market_cap, self.config.max_market_cap);
        coins
            .into_iter()
            .filter(|c| c.market_cap.is_some_and(|cap| cap > min && cap < max))
            .map(|c| AssetId::new(c.id))
            .collect()
    }

    /// Price component of each point; a null price becomes NaN so the pair is
    /// reported by the matrix builder instead of silently shifting positions.
    fn prices_from_range(resp: RangeResponse) -> PriceSeries {
        resp.prices
            .into_iter()
            .map(|(_, price)| price.unwrap_or(f64::NAN))
            .collect::<Vec<_>>()
            .into()
    }

    /// GET `url` and decode JSON, with retry and circuit breaker logic.
    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        asset: Option<&AssetId>,
    ) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let base_delay = Duration::from_millis(self.config.base_delay_ms);
        let mut last_error = None;
        let mut retry_after = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = retry_delay(base_delay, attempt, retry_after.take());
                tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, "retrying");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).query(query).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let hint = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                retry_after = hint.map(Duration::from_secs);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: hint.unwrap_or(60),
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(match asset {
                    Some(a) => DataError::AssetNotFound {
                        asset: a.to_string(),
                    },
                    None => DataError::Other(format!("HTTP {status} for {url}")),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {url}")));
                continue;
            }

            let body = resp.json::<T>().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response from {url}: {e}"))
            })?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Wait before retry `attempt` (1-based): exponential backoff from `base`,
/// but never shorter than a server `retry-after` hint.
fn retry_delay(base: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    let backoff = base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
    retry_after.map_or(backoff, |hint| hint.max(backoff))
}

impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn fetch_universe(&self) -> Result<Universe, DataError> {
        let query = [
            ("vs_currency", self.config.vs_currency.clone()),
            ("order", "volume_desc".to_string()),
            ("per_page", self.config.per_page.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("locale", "en".to_string()),
            ("precision", "3".to_string()),
        ];
        let coins: Vec<MarketCoin> = self.get_json(&self.markets_url(), &query, None)?;
        let fetched = coins.len();
        let universe = self.filter_by_market_cap(coins);
        tracing::info!(fetched, kept = universe.len(), "fetched universe");
        Ok(universe)
    }

    fn fetch_series(&self, asset: &AssetId, window: &TimeWindow) -> Result<PriceSeries, DataError> {
        let query = [
            ("vs_currency", self.config.vs_currency.clone()),
            ("from", window.start_unix().to_string()),
            ("to", window.end_unix().to_string()),
            ("precision", "3".to_string()),
        ];
        let resp: RangeResponse = self.get_json(&self.range_url(asset), &query, Some(asset))?;
        let series = Self::prices_from_range(resp);
        tracing::debug!(%asset, points = series.len(), "fetched series");
        Ok(series)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
