//! Selection pipeline: universe → paced fetch → strategy → sinks.
//!
//! The pipeline never fails on bad data. Missing series are empty, which the
//! correlation engine scores as uncorrelated, and sink failures are logged.
//! The one fatal condition is an opt-in: with `require_data`, a run whose
//! fetch produced no data for any asset is refused.

use chrono::Utc;
use decorr_core::data::{SeriesSource, UniverseSource};
use decorr_core::domain::{SeriesSet, TimeWindow};
use decorr_core::selection::SelectionStrategy;
use std::path::PathBuf;
use thiserror::Error;

use crate::pacing::{fetch_all, FetchProgress, FetchSummary, PacingPolicy};
use crate::sink::{DataOrigin, ResultSink, RunReport, REPORT_SCHEMA_VERSION};
use crate::snapshot::SeriesSnapshot;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no price data fetched for any of {assets} assets")]
    NoData { assets: usize },
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub window: TimeWindow,
    pub pacing: PacingPolicy,
    pub strategy: SelectionStrategy,
    pub origin: DataOrigin,
    pub require_data: bool,
    /// Where to write the fetched series; `None` skips the snapshot.
    pub snapshot_path: Option<PathBuf>,
}

/// What a pipeline run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    pub series: SeriesSet,
    pub fetch: FetchSummary,
}

/// Run the whole pipeline and emit the report to every sink.
pub fn run_pipeline(
    universe_source: &dyn UniverseSource,
    series_source: &dyn SeriesSource,
    opts: &PipelineOptions,
    progress: &dyn FetchProgress,
    sinks: &[Box<dyn ResultSink>],
) -> Result<RunOutput, PipelineError> {
    let universe = universe_source.universe();
    tracing::info!(
        assets = universe.len(),
        pairs = universe.pair_count(),
        strategy = %opts.strategy,
        "starting selection run"
    );
    if universe.is_empty() {
        tracing::warn!("universe is empty, nothing to select from");
    }

    let (series, fetch) = fetch_all(
        universe.assets(),
        &opts.window,
        series_source,
        opts.pacing,
        progress,
    );

    if opts.require_data && !fetch.any_data() {
        return Err(PipelineError::NoData {
            assets: universe.len(),
        });
    }

    if let Some(path) = &opts.snapshot_path {
        let snapshot = SeriesSnapshot::capture(universe.assets(), &series, opts.window);
        match snapshot.save(path) {
            Ok(()) => tracing::info!(path = %path.display(), "wrote series snapshot"),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "failed to write snapshot"),
        }
    }

    let outcome = opts.strategy.apply(universe.assets(), &series);
    let (pairs, skipped) = match outcome.matrix {
        Some(matrix) => (matrix.pairs().to_vec(), matrix.skipped().to_vec()),
        None => (Vec::new(), Vec::new()),
    };
    tracing::info!(selected = outcome.result.len(), skipped = skipped.len(), "selection complete");

    let report = RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        created_at: Utc::now(),
        window: opts.window,
        dataset_hash: series.dataset_hash(universe.assets()),
        universe,
        strategy: opts.strategy,
        result: outcome.result,
        pairs,
        skipped,
        data_origin: opts.origin,
        assets_with_data: fetch.with_data,
    };

    for sink in sinks {
        sink.emit(&report);
    }

    Ok(RunOutput {
        report,
        series,
        fetch,
    })
}
