use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::export::{ExportContext, ExportError, RunSummary, TableSink};
use crate::record::ViewingRecord;
use crate::sessions::Session;

pub struct CsvSink {
    ctx: ExportContext,
    viewing_writer: csv::Writer<File>,
    sessions_writer: csv::Writer<File>,
    run_writer: csv::Writer<File>,
}

#[derive(Serialize)]
struct ViewingRecordCsv<'a> {
    run_id: &'a str,
    source_row: usize,
    title: &'a str,
    timestamp: String,
    profile_name: Option<&'a str>,
    year: i32,
    month: u32,
    weekday_name: &'a str,
    hour: u32,
    is_movie: bool,
    is_tv_show: bool,
    content_kind: &'a str,
    session_id: u32,
    tool_version: &'a str,
    config_hash: &'a str,
    source_path: &'a str,
    source_sha256: &'a str,
}

#[derive(Serialize)]
struct SessionCsv<'a> {
    run_id: &'a str,
    session_id: u32,
    view_count: usize,
    start_time: String,
    end_time: String,
    duration_hours: f64,
    is_binge: bool,
    tool_version: &'a str,
    config_hash: &'a str,
    source_path: &'a str,
    source_sha256: &'a str,
}

#[derive(Serialize)]
struct RunSummaryCsv<'a> {
    run_id: &'a str,
    total_views: u64,
    sessions: u64,
    binge_sessions: u64,
    active_days: u64,
    movies: u64,
    tv_shows: u64,
    first_view: Option<String>,
    last_view: Option<String>,
    gap_threshold_hours: f64,
    tool_version: &'a str,
    config_hash: &'a str,
    source_path: &'a str,
    source_sha256: &'a str,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

impl CsvSink {
    pub fn new(ctx: &ExportContext, run_output_dir: &Path) -> Result<Self, ExportError> {
        let tables_dir = run_output_dir.join("tables");
        std::fs::create_dir_all(&tables_dir)?;

        let viewing_file = File::create(tables_dir.join("viewing_records.csv"))?;
        let sessions_file = File::create(tables_dir.join("sessions.csv"))?;
        let run_file = File::create(tables_dir.join("run_summary.csv"))?;

        let mut viewing_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(viewing_file);
        let mut sessions_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sessions_file);
        let mut run_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(run_file);

        viewing_writer.write_record([
            "run_id",
            "source_row",
            "title",
            "timestamp",
            "profile_name",
            "year",
            "month",
            "weekday_name",
            "hour",
            "is_movie",
            "is_tv_show",
            "content_kind",
            "session_id",
            "tool_version",
            "config_hash",
            "source_path",
            "source_sha256",
        ])?;

        sessions_writer.write_record([
            "run_id",
            "session_id",
            "view_count",
            "start_time",
            "end_time",
            "duration_hours",
            "is_binge",
            "tool_version",
            "config_hash",
            "source_path",
            "source_sha256",
        ])?;

        run_writer.write_record([
            "run_id",
            "total_views",
            "sessions",
            "binge_sessions",
            "active_days",
            "movies",
            "tv_shows",
            "first_view",
            "last_view",
            "gap_threshold_hours",
            "tool_version",
            "config_hash",
            "source_path",
            "source_sha256",
        ])?;

        Ok(Self {
            ctx: ctx.clone(),
            viewing_writer,
            sessions_writer,
            run_writer,
        })
    }
}

impl TableSink for CsvSink {
    fn record_viewing(
        &mut self,
        record: &ViewingRecord,
        session_id: u32,
    ) -> Result<(), ExportError> {
        let row = ViewingRecordCsv {
            run_id: &self.ctx.run_id,
            source_row: record.source_row,
            title: &record.title,
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            profile_name: record.profile_name.as_deref(),
            year: record.year,
            month: record.month,
            weekday_name: record.weekday_name,
            hour: record.hour,
            is_movie: record.is_movie,
            is_tv_show: record.is_tv_show,
            content_kind: record.content_kind().label(),
            session_id,
            tool_version: &self.ctx.tool_version,
            config_hash: &self.ctx.config_hash,
            source_path: &self.ctx.source_path,
            source_sha256: &self.ctx.source_sha256,
        };
        self.viewing_writer.serialize(row)?;
        Ok(())
    }

    fn record_session(&mut self, session: &Session) -> Result<(), ExportError> {
        let row = SessionCsv {
            run_id: &self.ctx.run_id,
            session_id: session.session_id,
            view_count: session.view_count,
            start_time: session.start_time.format(TIMESTAMP_FORMAT).to_string(),
            end_time: session.end_time.format(TIMESTAMP_FORMAT).to_string(),
            duration_hours: session.duration_hours,
            is_binge: session.is_binge(),
            tool_version: &self.ctx.tool_version,
            config_hash: &self.ctx.config_hash,
            source_path: &self.ctx.source_path,
            source_sha256: &self.ctx.source_sha256,
        };
        self.sessions_writer.serialize(row)?;
        Ok(())
    }

    fn record_run_summary(&mut self, summary: &RunSummary) -> Result<(), ExportError> {
        let row = RunSummaryCsv {
            run_id: &summary.run_id,
            total_views: summary.total_views,
            sessions: summary.sessions,
            binge_sessions: summary.binge_sessions,
            active_days: summary.active_days,
            movies: summary.movies,
            tv_shows: summary.tv_shows,
            first_view: summary
                .first_view
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            last_view: summary
                .last_view
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
            gap_threshold_hours: summary.gap_threshold_hours,
            tool_version: &self.ctx.tool_version,
            config_hash: &self.ctx.config_hash,
            source_path: &self.ctx.source_path,
            source_sha256: &self.ctx.source_sha256,
        };
        self.run_writer.serialize(row)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        self.viewing_writer.flush()?;
        self.sessions_writer.flush()?;
        self.run_writer.flush()?;
        Ok(())
    }
}
