use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::builder::{
    BooleanBuilder,
    Float64Builder,
    Int32Builder,
    Int64Builder,
    StringBuilder,
    TimestampMicrosecondBuilder,
};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef, TimeUnit};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::export::{ExportContext, ExportError, RunSummary, TableSink, to_i64, to_micros};
use crate::record::ViewingRecord;
use crate::sessions::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParquetTable {
    ViewingRecords,
    Sessions,
    RunSummary,
}

impl ParquetTable {
    fn filename(self) -> &'static str {
        match self {
            ParquetTable::ViewingRecords => "viewing_records.parquet",
            ParquetTable::Sessions => "sessions.parquet",
            ParquetTable::RunSummary => "run_summary.parquet",
        }
    }
}

#[derive(Debug, Clone)]
struct ViewingRow {
    source_row: i64,
    title: String,
    timestamp: i64,
    profile_name: Option<String>,
    year: i32,
    month: i32,
    weekday_name: &'static str,
    hour: i32,
    is_movie: bool,
    session_id: i64,
}

#[derive(Debug, Clone)]
struct SessionRow {
    session_id: i64,
    view_count: i64,
    start_time: i64,
    end_time: i64,
    duration_hours: f64,
}

#[derive(Debug, Clone)]
struct RunSummaryRow {
    total_views: i64,
    sessions: i64,
    binge_sessions: i64,
    active_days: i64,
    movies: i64,
    tv_shows: i64,
    first_view: Option<i64>,
    last_view: Option<i64>,
    gap_threshold_hours: f64,
}

enum TableBuffer {
    Viewing(Vec<ViewingRow>),
    Sessions(Vec<SessionRow>),
    Summary(Vec<RunSummaryRow>),
}

struct TableWriter {
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    buffer: TableBuffer,
    row_group_size: usize,
    context: Arc<ExportContext>,
    finished: bool,
}

impl TableWriter {
    fn new(
        path: PathBuf,
        table: ParquetTable,
        row_group_size: usize,
        context: Arc<ExportContext>,
    ) -> Result<Self, ExportError> {
        let schema = schema_for_table(table);
        let props = WriterProperties::builder()
            .set_max_row_group_size(row_group_size.max(1))
            .build();
        let file = File::create(path)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))
            .map_err(|err| ExportError::Other(format!("parquet writer error: {err}")))?;
        let buffer = match table {
            ParquetTable::ViewingRecords => TableBuffer::Viewing(Vec::new()),
            ParquetTable::Sessions => TableBuffer::Sessions(Vec::new()),
            ParquetTable::RunSummary => TableBuffer::Summary(Vec::new()),
        };
        Ok(Self {
            schema,
            writer,
            buffer,
            row_group_size: row_group_size.max(1),
            context,
            finished: false,
        })
    }

    fn append_viewing(&mut self, row: ViewingRow) -> Result<(), ExportError> {
        match &mut self.buffer {
            TableBuffer::Viewing(rows) => rows.push(row),
            _ => return Err(ExportError::Other("viewing row on non-viewing table".to_string())),
        }
        self.maybe_flush()
    }

    fn append_session(&mut self, row: SessionRow) -> Result<(), ExportError> {
        match &mut self.buffer {
            TableBuffer::Sessions(rows) => rows.push(row),
            _ => return Err(ExportError::Other("session row on non-session table".to_string())),
        }
        self.maybe_flush()
    }

    fn append_summary(&mut self, row: RunSummaryRow) -> Result<(), ExportError> {
        match &mut self.buffer {
            TableBuffer::Summary(rows) => rows.push(row),
            _ => {
                return Err(ExportError::Other(
                    "run summary row on non-summary table".to_string(),
                ));
            }
        }
        self.maybe_flush()
    }

    fn maybe_flush(&mut self) -> Result<(), ExportError> {
        if self.buffer_len() >= self.row_group_size {
            self.flush_buffer()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<(), ExportError> {
        if self.buffer_len() == 0 {
            return Ok(());
        }
        let batch = match &mut self.buffer {
            TableBuffer::Viewing(rows) => {
                let batch = build_viewing_batch(&self.context, rows, &self.schema)?;
                rows.clear();
                batch
            }
            TableBuffer::Sessions(rows) => {
                let batch = build_sessions_batch(&self.context, rows, &self.schema)?;
                rows.clear();
                batch
            }
            TableBuffer::Summary(rows) => {
                let batch = build_summary_batch(&self.context, rows, &self.schema)?;
                rows.clear();
                batch
            }
        };
        self.writer
            .write(&batch)
            .map_err(|err| ExportError::Other(format!("parquet write error: {err}")))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ExportError> {
        if self.finished {
            return Ok(());
        }
        self.flush_buffer()?;
        self.writer
            .finish()
            .map_err(|err| ExportError::Other(format!("parquet finish error: {err}")))?;
        self.finished = true;
        Ok(())
    }

    fn buffer_len(&self) -> usize {
        match &self.buffer {
            TableBuffer::Viewing(rows) => rows.len(),
            TableBuffer::Sessions(rows) => rows.len(),
            TableBuffer::Summary(rows) => rows.len(),
        }
    }
}

/// Parquet tables under `<run>/parquet/`. Every table file is created up
/// front, so an empty run still leaves three files with their schemas.
pub struct ParquetSink {
    viewing_records: TableWriter,
    sessions: TableWriter,
    run_summary: TableWriter,
}

impl ParquetSink {
    pub fn new(
        ctx: &ExportContext,
        run_output_dir: &Path,
        row_group_size: usize,
    ) -> Result<Self, ExportError> {
        let parquet_dir = run_output_dir.join("parquet");
        std::fs::create_dir_all(&parquet_dir)?;
        let context = Arc::new(ctx.clone());
        let open = |table: ParquetTable| {
            TableWriter::new(
                parquet_dir.join(table.filename()),
                table,
                row_group_size,
                Arc::clone(&context),
            )
        };
        Ok(Self {
            viewing_records: open(ParquetTable::ViewingRecords)?,
            sessions: open(ParquetTable::Sessions)?,
            run_summary: open(ParquetTable::RunSummary)?,
        })
    }
}

impl TableSink for ParquetSink {
    fn record_viewing(
        &mut self,
        record: &ViewingRecord,
        session_id: u32,
    ) -> Result<(), ExportError> {
        let row = ViewingRow {
            source_row: to_i64(record.source_row as u64)?,
            title: record.title.clone(),
            timestamp: to_micros(record.timestamp),
            profile_name: record.profile_name.clone(),
            year: record.year,
            month: record.month as i32,
            weekday_name: record.weekday_name,
            hour: record.hour as i32,
            is_movie: record.is_movie,
            session_id: i64::from(session_id),
        };
        self.viewing_records.append_viewing(row)
    }

    fn record_session(&mut self, session: &Session) -> Result<(), ExportError> {
        let row = SessionRow {
            session_id: i64::from(session.session_id),
            view_count: to_i64(session.view_count as u64)?,
            start_time: to_micros(session.start_time),
            end_time: to_micros(session.end_time),
            duration_hours: session.duration_hours,
        };
        self.sessions.append_session(row)
    }

    fn record_run_summary(&mut self, summary: &RunSummary) -> Result<(), ExportError> {
        let row = RunSummaryRow {
            total_views: to_i64(summary.total_views)?,
            sessions: to_i64(summary.sessions)?,
            binge_sessions: to_i64(summary.binge_sessions)?,
            active_days: to_i64(summary.active_days)?,
            movies: to_i64(summary.movies)?,
            tv_shows: to_i64(summary.tv_shows)?,
            first_view: summary.first_view.map(to_micros),
            last_view: summary.last_view.map(to_micros),
            gap_threshold_hours: summary.gap_threshold_hours,
        };
        self.run_summary.append_summary(row)
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        self.viewing_records.finish()?;
        self.sessions.finish()?;
        self.run_summary.finish()
    }
}

fn provenance_fields() -> Vec<Field> {
    vec![
        Field::new("run_id", DataType::Utf8, false),
        Field::new("tool_version", DataType::Utf8, false),
        Field::new("config_hash", DataType::Utf8, false),
        Field::new("source_path", DataType::Utf8, false),
        Field::new("source_sha256", DataType::Utf8, false),
    ]
}

fn schema_for_table(table: ParquetTable) -> SchemaRef {
    let mut fields = provenance_fields();
    match table {
        ParquetTable::ViewingRecords => fields.extend([
            Field::new("source_row", DataType::Int64, false),
            Field::new("title", DataType::Utf8, false),
            Field::new(
                "timestamp",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
            Field::new("profile_name", DataType::Utf8, true),
            Field::new("year", DataType::Int32, false),
            Field::new("month", DataType::Int32, false),
            Field::new("weekday_name", DataType::Utf8, false),
            Field::new("hour", DataType::Int32, false),
            Field::new("is_movie", DataType::Boolean, false),
            Field::new("is_tv_show", DataType::Boolean, false),
            Field::new("session_id", DataType::Int64, false),
        ]),
        ParquetTable::Sessions => fields.extend([
            Field::new("session_id", DataType::Int64, false),
            Field::new("view_count", DataType::Int64, false),
            Field::new(
                "start_time",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
            Field::new(
                "end_time",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                false,
            ),
            Field::new("duration_hours", DataType::Float64, false),
        ]),
        ParquetTable::RunSummary => fields.extend([
            Field::new("total_views", DataType::Int64, false),
            Field::new("sessions", DataType::Int64, false),
            Field::new("binge_sessions", DataType::Int64, false),
            Field::new("active_days", DataType::Int64, false),
            Field::new("movies", DataType::Int64, false),
            Field::new("tv_shows", DataType::Int64, false),
            Field::new(
                "first_view",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new(
                "last_view",
                DataType::Timestamp(TimeUnit::Microsecond, None),
                true,
            ),
            Field::new("gap_threshold_hours", DataType::Float64, false),
        ]),
    }
    Arc::new(Schema::new(fields))
}

struct ProvenanceColumns {
    run_id: StringBuilder,
    tool_version: StringBuilder,
    config_hash: StringBuilder,
    source_path: StringBuilder,
    source_sha256: StringBuilder,
}

impl ProvenanceColumns {
    fn new() -> Self {
        Self {
            run_id: StringBuilder::new(),
            tool_version: StringBuilder::new(),
            config_hash: StringBuilder::new(),
            source_path: StringBuilder::new(),
            source_sha256: StringBuilder::new(),
        }
    }

    fn append(&mut self, ctx: &ExportContext) {
        self.run_id.append_value(&ctx.run_id);
        self.tool_version.append_value(&ctx.tool_version);
        self.config_hash.append_value(&ctx.config_hash);
        self.source_path.append_value(&ctx.source_path);
        self.source_sha256.append_value(&ctx.source_sha256);
    }

    fn finish(mut self) -> Vec<ArrayRef> {
        vec![
            Arc::new(self.run_id.finish()),
            Arc::new(self.tool_version.finish()),
            Arc::new(self.config_hash.finish()),
            Arc::new(self.source_path.finish()),
            Arc::new(self.source_sha256.finish()),
        ]
    }
}

fn build_viewing_batch(
    ctx: &ExportContext,
    rows: &[ViewingRow],
    schema: &SchemaRef,
) -> Result<RecordBatch, ExportError> {
    let mut provenance = ProvenanceColumns::new();
    let mut source_row = Int64Builder::new();
    let mut title = StringBuilder::new();
    let mut timestamp = TimestampMicrosecondBuilder::new();
    let mut profile_name = StringBuilder::new();
    let mut year = Int32Builder::new();
    let mut month = Int32Builder::new();
    let mut weekday_name = StringBuilder::new();
    let mut hour = Int32Builder::new();
    let mut is_movie = BooleanBuilder::new();
    let mut is_tv_show = BooleanBuilder::new();
    let mut session_id = Int64Builder::new();

    for row in rows {
        provenance.append(ctx);
        source_row.append_value(row.source_row);
        title.append_value(&row.title);
        timestamp.append_value(row.timestamp);
        profile_name.append_option(row.profile_name.as_deref());
        year.append_value(row.year);
        month.append_value(row.month);
        weekday_name.append_value(row.weekday_name);
        hour.append_value(row.hour);
        is_movie.append_value(row.is_movie);
        is_tv_show.append_value(!row.is_movie);
        session_id.append_value(row.session_id);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(source_row.finish()),
        Arc::new(title.finish()),
        Arc::new(timestamp.finish()),
        Arc::new(profile_name.finish()),
        Arc::new(year.finish()),
        Arc::new(month.finish()),
        Arc::new(weekday_name.finish()),
        Arc::new(hour.finish()),
        Arc::new(is_movie.finish()),
        Arc::new(is_tv_show.finish()),
        Arc::new(session_id.finish()),
    ];
    let mut arrays = provenance.finish();
    arrays.extend(columns);

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|err| ExportError::Other(format!("parquet batch error: {err}")))
}

fn build_sessions_batch(
    ctx: &ExportContext,
    rows: &[SessionRow],
    schema: &SchemaRef,
) -> Result<RecordBatch, ExportError> {
    let mut provenance = ProvenanceColumns::new();
    let mut session_id = Int64Builder::new();
    let mut view_count = Int64Builder::new();
    let mut start_time = TimestampMicrosecondBuilder::new();
    let mut end_time = TimestampMicrosecondBuilder::new();
    let mut duration_hours = Float64Builder::new();

    for row in rows {
        provenance.append(ctx);
        session_id.append_value(row.session_id);
        view_count.append_value(row.view_count);
        start_time.append_value(row.start_time);
        end_time.append_value(row.end_time);
        duration_hours.append_value(row.duration_hours);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(session_id.finish()),
        Arc::new(view_count.finish()),
        Arc::new(start_time.finish()),
        Arc::new(end_time.finish()),
        Arc::new(duration_hours.finish()),
    ];
    let mut arrays = provenance.finish();
    arrays.extend(columns);

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|err| ExportError::Other(format!("parquet batch error: {err}")))
}

fn build_summary_batch(
    ctx: &ExportContext,
    rows: &[RunSummaryRow],
    schema: &SchemaRef,
) -> Result<RecordBatch, ExportError> {
    let mut provenance = ProvenanceColumns::new();
    let mut total_views = Int64Builder::new();
    let mut sessions = Int64Builder::new();
    let mut binge_sessions = Int64Builder::new();
    let mut active_days = Int64Builder::new();
    let mut movies = Int64Builder::new();
    let mut tv_shows = Int64Builder::new();
    let mut first_view = TimestampMicrosecondBuilder::new();
    let mut last_view = TimestampMicrosecondBuilder::new();
    let mut gap_threshold_hours = Float64Builder::new();

    for row in rows {
        provenance.append(ctx);
        total_views.append_value(row.total_views);
        sessions.append_value(row.sessions);
        binge_sessions.append_value(row.binge_sessions);
        active_days.append_value(row.active_days);
        movies.append_value(row.movies);
        tv_shows.append_value(row.tv_shows);
        first_view.append_option(row.first_view);
        last_view.append_option(row.last_view);
        gap_threshold_hours.append_value(row.gap_threshold_hours);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(total_views.finish()),
        Arc::new(sessions.finish()),
        Arc::new(binge_sessions.finish()),
        Arc::new(active_days.finish()),
        Arc::new(movies.finish()),
        Arc::new(tv_shows.finish()),
        Arc::new(first_view.finish()),
        Arc::new(last_view.finish()),
        Arc::new(gap_threshold_hours.finish()),
    ];
    let mut arrays = provenance.finish();
    arrays.extend(columns);

    RecordBatch::try_new(Arc::clone(schema), arrays)
        .map_err(|err| ExportError::Other(format!("parquet batch error: {err}")))
}
