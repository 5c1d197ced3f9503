pub mod csv;
pub mod jsonl;
pub mod parquet;

use std::path::Path;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::debug;

use crate::record::ViewingRecord;
use crate::sessions::Session;
use crate::stats::Analysis;

#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub total_views: u64,
    pub sessions: u64,
    pub binge_sessions: u64,
    pub active_days: u64,
    pub movies: u64,
    pub tv_shows: u64,
    pub first_view: Option<NaiveDateTime>,
    pub last_view: Option<NaiveDateTime>,
    pub gap_threshold_hours: f64,
}

impl RunSummary {
    pub fn from_analysis(run_id: &str, analysis: &Analysis, gap_threshold_hours: f64) -> Self {
        let s = &analysis.summary;
        Self {
            run_id: run_id.to_string(),
            total_views: s.total_views as u64,
            sessions: analysis.sessions.len() as u64,
            binge_sessions: analysis.binge.binge_sessions as u64,
            active_days: s.active_days as u64,
            movies: s.movies as u64,
            tv_shows: s.tv_shows as u64,
            first_view: analysis.records.iter().map(|r| r.timestamp).min(),
            last_view: analysis.records.iter().map(|r| r.timestamp).max(),
            gap_threshold_hours,
        }
    }
}

/// Provenance stamped onto every exported row.
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub run_id: String,
    pub tool_version: String,
    pub config_hash: String,
    pub source_path: String,
    pub source_sha256: String,
}

impl ExportContext {
    pub fn new(
        run_id: &str,
        tool_version: &str,
        config_hash: &str,
        source_path: &Path,
        source_sha256: &str,
    ) -> Self {
        Self {
            run_id: run_id.to_string(),
            tool_version: tool_version.to_string(),
            config_hash: config_hash.to_string(),
            source_path: source_path.to_string_lossy().to_string(),
            source_sha256: source_sha256.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportBackendKind {
    Jsonl,
    Csv,
    Parquet,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("other error: {0}")]
    Other(String),
}

/// Structured output for the normalized table, the session table and the
/// run summary.
///
/// # Example
/// ```rust
/// use std::path::Path;
/// use watchlens::export::{self, ExportBackendKind, ExportContext, RunSummary};
///
/// let out = std::env::temp_dir().join("watchlens_export_example");
/// let ctx = ExportContext::new("example_run", "0.1.0", "", Path::new("history.csv"), "");
/// let mut sink = export::build_sink(ExportBackendKind::Jsonl, &ctx, &out, 1024).unwrap();
///
/// let summary = RunSummary {
///     run_id: "example_run".to_string(),
///     total_views: 0,
///     sessions: 0,
///     binge_sessions: 0,
///     active_days: 0,
///     movies: 0,
///     tv_shows: 0,
///     first_view: None,
///     last_view: None,
///     gap_threshold_hours: 6.0,
/// };
/// sink.record_run_summary(&summary).unwrap();
/// sink.flush().unwrap();
/// ```
pub trait TableSink {
    fn record_viewing(&mut self, record: &ViewingRecord, session_id: u32)
    -> Result<(), ExportError>;
    fn record_session(&mut self, session: &Session) -> Result<(), ExportError>;
    fn record_run_summary(&mut self, summary: &RunSummary) -> Result<(), ExportError>;
    fn flush(&mut self) -> Result<(), ExportError>;
}

pub fn build_sink(
    backend: ExportBackendKind,
    ctx: &ExportContext,
    run_output_dir: &Path,
    parquet_row_group_size: usize,
) -> Result<Box<dyn TableSink>, ExportError> {
    match backend {
        ExportBackendKind::Jsonl => Ok(Box::new(jsonl::JsonlSink::new(ctx, run_output_dir)?)),
        ExportBackendKind::Csv => Ok(Box::new(csv::CsvSink::new(ctx, run_output_dir)?)),
        ExportBackendKind::Parquet => Ok(Box::new(parquet::ParquetSink::new(
            ctx,
            run_output_dir,
            parquet_row_group_size,
        )?)),
    }
}

/// Write every record, every session and the run summary, then flush.
pub fn export_analysis(
    sink: &mut dyn TableSink,
    analysis: &Analysis,
    summary: &RunSummary,
) -> Result<(), ExportError> {
    for (idx, record) in analysis.records.iter().enumerate() {
        let session_id = analysis.sessions.membership.get(idx).copied().ok_or_else(|| {
            ExportError::Other(format!("record {idx} has no session assignment"))
        })?;
        sink.record_viewing(record, session_id)?;
    }
    for session in &analysis.sessions.sessions {
        sink.record_session(session)?;
    }
    sink.record_run_summary(summary)?;
    sink.flush()?;
    debug!(
        "exported {} records and {} sessions",
        analysis.records.len(),
        analysis.sessions.len()
    );
    Ok(())
}

pub(crate) fn to_micros(value: NaiveDateTime) -> i64 {
    let utc = value.and_utc();
    let seconds = utc.timestamp();
    let micros = i64::from(utc.timestamp_subsec_micros());
    seconds.saturating_mul(1_000_000).saturating_add(micros)
}

pub(crate) fn to_i64(value: u64) -> Result<i64, ExportError> {
    i64::try_from(value).map_err(|_| ExportError::Other("value exceeds i64 range".to_string()))
}
