use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::export::{ExportContext, ExportError, RunSummary, TableSink};
use crate::record::ViewingRecord;
use crate::sessions::Session;

pub struct JsonlSink {
    ctx: ExportContext,
    viewing_writer: BufWriter<File>,
    sessions_writer: BufWriter<File>,
    run_writer: BufWriter<File>,
}

#[derive(Serialize)]
struct Provenance<'a> {
    run_id: &'a str,
    tool_version: &'a str,
    config_hash: &'a str,
    source_path: &'a str,
    source_sha256: &'a str,
}

#[derive(Serialize)]
struct ViewingLine<'a> {
    #[serde(flatten)]
    record: &'a ViewingRecord,
    session_id: u32,
    #[serde(flatten)]
    provenance: Provenance<'a>,
}

#[derive(Serialize)]
struct SessionLine<'a> {
    #[serde(flatten)]
    session: &'a Session,
    #[serde(flatten)]
    provenance: Provenance<'a>,
}

#[derive(Serialize)]
struct RunSummaryLine<'a> {
    #[serde(flatten)]
    summary: &'a RunSummary,
    tool_version: &'a str,
    config_hash: &'a str,
    source_path: &'a str,
    source_sha256: &'a str,
}

impl JsonlSink {
    pub fn new(ctx: &ExportContext, run_output_dir: &Path) -> Result<Self, ExportError> {
        let tables_dir = run_output_dir.join("tables");
        std::fs::create_dir_all(&tables_dir)?;
        let open = |name: &str| -> Result<BufWriter<File>, ExportError> {
            Ok(BufWriter::new(File::create(tables_dir.join(name))?))
        };
        Ok(Self {
            ctx: ctx.clone(),
            viewing_writer: open("viewing_records.jsonl")?,
            sessions_writer: open("sessions.jsonl")?,
            run_writer: open("run_summary.jsonl")?,
        })
    }
}

fn provenance(ctx: &ExportContext) -> Provenance<'_> {
    Provenance {
        run_id: &ctx.run_id,
        tool_version: &ctx.tool_version,
        config_hash: &ctx.config_hash,
        source_path: &ctx.source_path,
        source_sha256: &ctx.source_sha256,
    }
}

fn write_line<T: Serialize>(writer: &mut BufWriter<File>, value: &T) -> Result<(), ExportError> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

impl TableSink for JsonlSink {
    fn record_viewing(
        &mut self,
        record: &ViewingRecord,
        session_id: u32,
    ) -> Result<(), ExportError> {
        let line = ViewingLine {
            record,
            session_id,
            provenance: provenance(&self.ctx),
        };
        write_line(&mut self.viewing_writer, &line)
    }

    fn record_session(&mut self, session: &Session) -> Result<(), ExportError> {
        let line = SessionLine {
            session,
            provenance: provenance(&self.ctx),
        };
        write_line(&mut self.sessions_writer, &line)
    }

    fn record_run_summary(&mut self, summary: &RunSummary) -> Result<(), ExportError> {
        let line = RunSummaryLine {
            summary,
            tool_version: &self.ctx.tool_version,
            config_hash: &self.ctx.config_hash,
            source_path: &self.ctx.source_path,
            source_sha256: &self.ctx.source_sha256,
        };
        write_line(&mut self.run_writer, &line)
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        self.viewing_writer.flush()?;
        self.sessions_writer.flush()?;
        self.run_writer.flush()?;
        Ok(())
    }
}
