//! Run reports and the sinks that publish them.
//!
//! A [`RunReport`] captures everything needed to interpret a selection run.
//! Sinks are fire-and-forget: [`ResultSink::emit`] logs a failed write and
//! carries on, so one broken output never hides the others.
//!
//! Output formats:
//! - **JSON**: `selection.json`, the full report with schema versioning
//! - **CSV**: `pairs.csv`, every computed pair for external analysis tools
//! - **Console**: the human-readable listing on stdout

use chrono::{DateTime, Utc};
use decorr_core::correlation::{PairFailure, PairRecord};
use decorr_core::domain::{DatasetHash, TimeWindow, Universe};
use decorr_core::selection::{top_k, SelectionResult, SelectionStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::config::OutputConfig;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

pub const REPORT_FILE: &str = "selection.json";
pub const PAIRS_FILE: &str = "pairs.csv";
pub const SNAPSHOT_FILE: &str = "data.json";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("pairs CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported report schema version {found} (max supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

/// Where the series of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,
    Snapshot,
    Synthetic,
}

impl DataOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic)
    }
}

/// Everything a selection run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub window: TimeWindow,
    pub universe: Universe,
    pub strategy: SelectionStrategy,
    pub result: SelectionResult,
    /// Every computed pair in matrix order; empty when the strategy builds no matrix.
    pub pairs: Vec<PairRecord>,
    pub skipped: Vec<PairFailure>,
    pub data_origin: DataOrigin,
    pub dataset_hash: DatasetHash,
    /// Assets whose series came back non-empty.
    pub assets_with_data: usize,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, SinkError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a report, rejecting unknown schema versions.
    pub fn from_json(json: &str) -> Result<Self, SinkError> {
        let report: Self = serde_json::from_str(json)?;
        if report.schema_version > REPORT_SCHEMA_VERSION {
            return Err(SinkError::UnsupportedVersion {
                found: report.schema_version,
                supported: REPORT_SCHEMA_VERSION,
            });
        }
        Ok(report)
    }

    pub fn load(path: &Path) -> Result<Self, SinkError> {
        let json = std::fs::read_to_string(path).map_err(|source| io_error(path, source))?;
        Self::from_json(&json)
    }
}

/// Destination for a finished run report.
pub trait ResultSink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, report: &RunReport) -> Result<(), SinkError>;

    /// Write the report, logging instead of returning a failure.
    fn emit(&self, report: &RunReport) {
        if let Err(e) = self.write(report) {
            tracing::error!(sink = self.name(), error = %e, "failed to emit run report");
        }
    }
}

/// Writes `selection.json` into a directory.
#[derive(Debug, Clone)]
pub struct JsonSink {
    dir: PathBuf,
}

impl JsonSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }
}

impl ResultSink for JsonSink {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&self, report: &RunReport) -> Result<(), SinkError> {
        ensure_dir(&self.dir)?;
        let path = self.path();
        std::fs::write(&path, report.to_json()?).map_err(|source| io_error(&path, source))?;
        tracing::info!(path = %path.display(), "wrote run report");
        Ok(())
    }
}

/// Writes `pairs.csv` into a directory.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(PAIRS_FILE)
    }
}

impl ResultSink for CsvSink {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&self, report: &RunReport) -> Result<(), SinkError> {
        if report.pairs.is_empty() {
            tracing::debug!("no pair matrix in report, skipping {PAIRS_FILE}");
            return Ok(());
        }
        ensure_dir(&self.dir)?;
        let path = self.path();
        std::fs::write(&path, export_pairs_csv(&report.pairs)?)
            .map_err(|source| io_error(&path, source))?;
        tracing::info!(path = %path.display(), pairs = report.pairs.len(), "wrote pair matrix");
        Ok(())
    }
}

/// Prints [`render_console`] output to a writer (stdout by default).
pub struct ConsoleSink<W: Write + Send = std::io::Stdout> {
    out: Mutex<W>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> ResultSink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, report: &RunReport) -> Result<(), SinkError> {
        let text = render_console(report);
        let mut out = self
            .out
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|source| SinkError::Io {
                path: "<console>".into(),
                source,
            })
    }
}

/// Sinks enabled by an output configuration, in the order they should run.
pub fn sinks_for(output: &OutputConfig) -> Vec<Box<dyn ResultSink>> {
    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    if output.json {
        sinks.push(Box::new(JsonSink::new(&output.dir)));
    }
    if output.csv {
        sinks.push(Box::new(CsvSink::new(&output.dir)));
    }
    if output.console {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    sinks
}

/// Export pairs as CSV.
///
/// Columns: pair (`a:b`), a, b, correlation
pub fn export_pairs_csv(pairs: &[PairRecord]) -> Result<String, SinkError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["pair", "a", "b", "correlation"])?;
    for p in pairs {
        wtr.write_record([
            &p.to_string(),
            p.a.as_str(),
            p.b.as_str(),
            &p.correlation.to_string(),
        ])?;
    }
    let data = wtr.into_inner().map_err(|e| SinkError::Io {
        path: "<csv buffer>".into(),
        source: e.into_error(),
    })?;
    // every field came from a &str
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Human-readable report.
///
/// Greedy runs list the selected assets. Top-K runs list the ranked pairs,
/// then every pair of the matrix from strongest to weakest.
pub fn render_console(report: &RunReport) -> String {
    let mut out = String::with_capacity(1024);

    let _ = writeln!(
        out,
        "window: {} to {} ({} assets, {} with data)",
        report.window.start_unix(),
        report.window.end_unix(),
        report.universe.len(),
        report.assets_with_data
    );
    if report.data_origin.is_synthetic() {
        let _ = writeln!(out, "data: SYNTHETIC (results are not market data)");
    }
    let _ = writeln!(out, "strategy: {}", report.strategy);
    let _ = writeln!(out);

    match &report.result {
        SelectionResult::Uncorrelated(assets) => {
            let _ = writeln!(out, "{} uncorrelated assets:", assets.len());
            for asset in assets {
                let _ = writeln!(out, "  {asset}");
            }
        }
        SelectionResult::Ranked(pairs) => {
            let _ = writeln!(
                out,
                "Top {} pairs by absolute correlation:",
                pairs.len()
            );
            for pair in pairs {
                let _ = writeln!(out, "  {pair} {}", pair.correlation);
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "All pairs with correlation:");
            for pair in top_k(&report.pairs, report.pairs.len()) {
                let _ = writeln!(out, "  {pair} {}", pair.correlation);
            }
        }
    }

    if !report.skipped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} pairs skipped:", report.skipped.len());
        for skip in &report.skipped {
            let _ = writeln!(out, "  {}:{} ({})", skip.a, skip.b, skip.reason);
        }
    }

    out
}

fn ensure_dir(dir: &Path) -> Result<(), SinkError> {
    std::fs::create_dir_all(dir).map_err(|source| io_error(dir, source))
}

fn io_error(path: &Path, source: std::io::Error) -> SinkError {
    SinkError::Io {
        path: path.display().to_string(),
        source,
    }
}
