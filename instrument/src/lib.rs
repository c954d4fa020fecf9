//! Event logging for simulation runs.
//!
//! A `tracing` subscriber files every info-level event into a table named by
//! its target, one typed column per field. Tables convert to polars frames
//! and export as CSV.
//!
//! # Usage
//!
//! ```ignore
//! // In simulation code:
//! tracing::info!(target: "layoff", step, worker_id, x, y);
//!
//! // In a test:
//! tracing::subscriber::with_default(instrument::EventLogSubscriber, || run());
//! let log = instrument::drain();
//! let layoffs = log.table("layoff").unwrap().to_dataframe()?;
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

pub use polars::prelude::{DataFrame, PolarsResult};
use polars::prelude::*;

// === TABLES ===

/// One field's values across all rows of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::U64(v) => v.len(),
            ColumnData::I64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill with the type's zero value up to `len` rows.
    fn pad_to(&mut self, len: usize) {
        let missing = len.saturating_sub(self.len());
        match self {
            ColumnData::U64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::I64(v) => v.extend(std::iter::repeat_n(0, missing)),
            ColumnData::F64(v) => v.extend(std::iter::repeat_n(0.0, missing)),
            ColumnData::Bool(v) => v.extend(std::iter::repeat_n(false, missing)),
            ColumnData::Str(v) => v.extend(std::iter::repeat_n(String::new(), missing)),
        }
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            ColumnData::U64(v) => Column::new(name.into(), v),
            ColumnData::I64(v) => Column::new(name.into(), v),
            ColumnData::F64(v) => Column::new(name.into(), v),
            ColumnData::Bool(v) => Column::new(name.into(), v),
            ColumnData::Str(v) => Column::new(name.into(), v),
        }
    }
}

/// Rows of one event kind. Columns keep first-seen field order; a row that
/// lacks a field gets the zero value for that column.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    columns: Vec<(String, ColumnData)>,
    rows: usize,
}

impl EventTable {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Column for `name`, created zero-filled for earlier rows on first use.
    fn column_mut(&mut self, name: &str, empty: fn() -> ColumnData) -> &mut ColumnData {
        let pos = match self.columns.iter().position(|(n, _)| n == name) {
            Some(pos) => pos,
            None => {
                let mut col = empty();
                col.pad_to(self.rows);
                self.columns.push((name.to_string(), col));
                self.columns.len() - 1
            }
        };
        &mut self.columns[pos].1
    }

    fn finish_row(&mut self) {
        self.rows += 1;
        for (_, col) in &mut self.columns {
            col.pad_to(self.rows);
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(
            self.columns
                .iter()
                .map(|(name, col)| col.to_column(name))
                .collect(),
        )
    }
}

/// Every table recorded on this thread, keyed by tracing target.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    tables: BTreeMap<String, EventTable>,
}

impl EventLog {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(name, table)| Ok((name.clone(), table.to_dataframe()?)))
            .collect()
    }
}

thread_local! {
    static LOG: RefCell<EventLog> = RefCell::default();
}

/// Take everything recorded on this thread so far.
pub fn drain() -> EventLog {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

pub fn clear() {
    LOG.with(|log| *log.borrow_mut() = EventLog::default());
}

// === SUBSCRIBER ===

struct RowVisitor<'a> {
    table: &'a mut EventTable,
}

impl Visit for RowVisitor<'_> {
    fn record_u64(&mut self, field: &Field, value: u64) {
        let column = self.table.column_mut(field.name(), || ColumnData::U64(Vec::new()));
        if let ColumnData::U64(v) = column {
            v.push(value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        let column = self.table.column_mut(field.name(), || ColumnData::I64(Vec::new()));
        if let ColumnData::I64(v) = column {
            v.push(value);
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let column = self.table.column_mut(field.name(), || ColumnData::F64(Vec::new()));
        if let ColumnData::F64(v) = column {
            v.push(value);
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        let column = self.table.column_mut(field.name(), || ColumnData::Bool(Vec::new()));
        if let ColumnData::Bool(v) = column {
            v.push(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        let column = self.table.column_mut(field.name(), || ColumnData::Str(Vec::new()));
        if let ColumnData::Str(v) = column {
            v.push(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Files info-level events into the thread-local [`EventLog`]. Spans are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct EventLogSubscriber;

impl Subscriber for EventLogSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let target = event.metadata().target();
        LOG.with(|log| {
            let mut log = log.borrow_mut();
            let table = log.tables.entry(target.to_string()).or_default();
            event.record(&mut RowVisitor { table: &mut *table });
            table.finish_row();
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install [`EventLogSubscriber`] process-wide. Later calls are no-ops.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(EventLogSubscriber);
}

// === FRAMES AND EXPORT ===

/// One frame from step-aligned series: a leading `step` column, then one
/// `f64` column per series in iteration order.
pub fn series_frame<'a>(
    steps: &[u64],
    series: impl IntoIterator<Item = (&'a str, &'a [f64])>,
) -> PolarsResult<DataFrame> {
    let mut columns = vec![Column::new("step".into(), steps)];
    columns.extend(series.into_iter().map(|(name, values)| Column::new(name.into(), values)));
    DataFrame::new(columns)
}

fn io_err(e: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: e.into(),
        msg: None,
    }
}

/// Write each frame to `<dir>/<name>.csv`, creating `dir` if needed.
pub fn write_csv(frames: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_err)?;
    for (name, df) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{name}.csv"))).map_err(io_err)?;
        CsvWriter::new(file).include_header(true).finish(df)?;
    }
    Ok(())
}

/// Keep ASCII alphanumerics, `-` and `_`; anything else becomes `_`.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Captures the events of one run on the current thread and writes them as
/// CSV when dropped.
///
/// ```ignore
/// let mut rec = instrument::RunRecorder::new("data", "sector_shock");
/// controller.run();
/// rec.add_frame("metrics", controller.metrics().to_dataframe()?);
/// // rec drops -> data/sector_shock/{hire,layoff,...,metrics}.csv
/// ```
pub struct RunRecorder {
    run_dir: PathBuf,
    frames: Option<BTreeMap<String, DataFrame>>,
    extra: BTreeMap<String, DataFrame>,
    _guard: tracing::subscriber::DefaultGuard,
}

impl RunRecorder {
    /// Clears this thread's log and routes its events to [`EventLogSubscriber`]
    /// until the recorder is dropped.
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        clear();
        let guard = tracing::subscriber::set_default(EventLogSubscriber);
        Self {
            run_dir: parent.into().join(sanitize(name)),
            frames: None,
            extra: BTreeMap::new(),
            _guard: guard,
        }
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    /// Attach a frame that was not produced by events, e.g. a metrics table.
    pub fn add_frame(&mut self, name: &str, df: DataFrame) {
        self.extra.insert(name.to_string(), df);
    }

    /// Event tables recorded so far. The first call drains the thread's log.
    pub fn frames(&mut self) -> PolarsResult<&BTreeMap<String, DataFrame>> {
        if self.frames.is_none() {
            self.frames = Some(drain().to_dataframes()?);
        }
        Ok(self.frames.get_or_insert_with(BTreeMap::new))
    }

    fn collect(&mut self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        let mut frames = match self.frames.take() {
            Some(frames) => frames,
            None => drain().to_dataframes()?,
        };
        frames.append(&mut self.extra);
        Ok(frames)
    }
}

impl Drop for RunRecorder {
    fn drop(&mut self) {
        let mut frames = match self.collect() {
            Ok(frames) => frames,
            Err(e) => {
                eprintln!("RunRecorder({}): {e}", self.run_dir.display());
                return;
            }
        };
        if frames.is_empty() {
            return;
        }
        match write_csv(&mut frames, &self.run_dir) {
            Ok(()) => eprintln!(
                "RunRecorder: wrote {} tables to {}",
                frames.len(),
                self.run_dir.display()
            ),
            Err(e) => eprintln!(
                "RunRecorder({}): failed to write csv: {e}",
                self.run_dir.display()
            ),
        }
    }
}
