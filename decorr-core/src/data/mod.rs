//! Market data sources

pub mod circuit_breaker;
pub mod coingecko;
pub mod provider;
pub mod synthetic;
pub mod universe;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use coingecko::{CoinGeckoConfig, CoinGeckoProvider};
pub use provider::{DataError, Lenient, MarketDataProvider, SeriesSource, UniverseSource};
pub use synthetic::{synthetic_series, SyntheticProvider};
pub use universe::{UniverseFile, UniverseFileError};
