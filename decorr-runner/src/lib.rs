//! Decorr Runner: orchestration around the correlation core.
//!
//! This crate builds on `decorr-core` to provide:
//! - TOML run configuration with validation
//! - Paced series fetching (sequential or staggered)
//! - `data.json` series snapshots for offline re-runs
//! - Run reports and result sinks (JSON, CSV, console)
//! - The end-to-end selection pipeline
//! - `tracing` subscriber setup

pub mod config;
pub mod logging;
pub mod pacing;
pub mod pipeline;
pub mod sink;
pub mod snapshot;

pub use config::{ConfigError, RunConfig};
pub use logging::{init_logging, LogConfig, LogFormat, LoggingError};
pub use pacing::{fetch_all, FetchProgress, FetchSummary, LogProgress, NoProgress, PacingPolicy};
pub use pipeline::{run_pipeline, PipelineError, PipelineOptions, RunOutput};
pub use sink::{
    export_pairs_csv, render_console, sinks_for, ConsoleSink, CsvSink, DataOrigin, JsonSink,
    ResultSink, RunReport, SinkError,
};
pub use snapshot::{SeriesSnapshot, SnapshotError};
