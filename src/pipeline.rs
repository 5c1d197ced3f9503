//! # Pipeline
//!
//! One analysis run: discover and read the source, normalize, segment and
//! aggregate, print the report, export the tables. Everything is loaded
//! into memory before any output is produced.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::export::{self, ExportBackendKind, ExportContext, RunSummary};
use crate::normalize::{self, NormalizeError, TimestampFormats};
use crate::record::ViewingRecord;
use crate::report::{self, ReportOptions};
use crate::source::{self, SourceError};
use crate::stats::Analysis;
use crate::util;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Normalized records plus where they came from.
#[derive(Debug, Clone)]
pub struct LoadedHistory {
    pub path: PathBuf,
    pub sha256: String,
    pub records: Vec<ViewingRecord>,
}

pub fn load_history(
    candidates: &[PathBuf],
    base_dir: &Path,
    formats: &TimestampFormats,
) -> Result<LoadedHistory, LoadError> {
    let path = source::discover(candidates, base_dir)?;
    let table = source::read_source(&path)?;
    info!(
        "loaded {} with {} rows (columns: {})",
        path.display(),
        table.rows.len(),
        table.headers.join(", ")
    );
    let records = normalize::normalize(&table.rows, formats)?;
    Ok(LoadedHistory {
        path: table.path,
        sha256: table.sha256,
        records,
    })
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub candidates: Vec<PathBuf>,
    pub search_dir: PathBuf,
    pub output_dir: PathBuf,
    /// `None` skips the export.
    pub export_backend: Option<ExportBackendKind>,
    pub config_hash: String,
    pub tool_version: String,
}

#[derive(Debug)]
pub enum RunOutcome {
    /// No candidate file existed; nothing was produced.
    NoSource { searched: Vec<PathBuf> },
    Completed {
        analysis: Analysis,
        run_output_dir: Option<PathBuf>,
    },
}

pub fn run_analysis<W: Write>(cfg: &Config, opts: &RunOptions, out: &mut W) -> Result<RunOutcome> {
    let formats = TimestampFormats::from_config(cfg);
    let history = match load_history(&opts.candidates, &opts.search_dir, &formats) {
        Ok(history) => history,
        Err(LoadError::Source(SourceError::NoSourceFound { searched })) => {
            warn!("no viewing history file found");
            return Ok(RunOutcome::NoSource { searched });
        }
        Err(err) => return Err(err).context("failed to load viewing history"),
    };

    let analysis = Analysis::build(history.records, cfg.gap_threshold(), cfg.top_titles);
    info!(
        "segmented {} records into {} sessions ({} binge)",
        analysis.records.len(),
        analysis.sessions.len(),
        analysis.binge.binge_sessions
    );

    report::render(out, &analysis, &ReportOptions::from_config(cfg))?;
    out.flush()?;

    let run_output_dir = match opts.export_backend {
        Some(backend) => {
            let dir = opts.output_dir.join(&cfg.run_id);
            util::ensure_output_dir(&dir)?;
            let ctx = ExportContext::new(
                &cfg.run_id,
                &opts.tool_version,
                &opts.config_hash,
                &history.path,
                &history.sha256,
            );
            let mut sink = export::build_sink(backend, &ctx, &dir, cfg.parquet_row_group_size)?;
            let summary = RunSummary::from_analysis(&cfg.run_id, &analysis, cfg.gap_threshold_hours);
            export::export_analysis(sink.as_mut(), &analysis, &summary)?;
            info!("tables written to {}", dir.display());
            Some(dir)
        }
        None => {
            debug!("export disabled");
            None
        }
    };

    Ok(RunOutcome::Completed {
        analysis,
        run_output_dir,
    })
}
