//! Append stats records to one CSV file per endpoint.
//!
//! Output is meant to be easy to consume in spreadsheets or warehouse loaders:
//! comma separated, minimal quoting, `\n` line endings, UTF-8.
//!
//! The header is written once, when the file is created. On later runs the
//! existing header is read back and rows are written in that column order, so
//! a reordered API response cannot shift values into the wrong columns. A
//! batch with a different column set is rejected instead of appended.

use std::fs::{File, OpenOptions, create_dir_all};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::domain::{Endpoint, Record};
use crate::error::AppError;

/// What a single `append` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub path: PathBuf,
    pub rows: usize,
    /// `true` when the file was new and a header was written.
    pub created: bool,
}

#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, endpoint: Endpoint) -> PathBuf {
        self.dir.join(endpoint.file_name())
    }

    /// Append `records` to `<dir>/<endpoint>.csv`.
    ///
    /// An empty batch touches nothing on disk.
    pub fn append(&self, endpoint: Endpoint, records: &[Record]) -> Result<SinkReport, AppError> {
        let path = self.path_for(endpoint);
        let Some(first) = records.first() else {
            return Ok(SinkReport {
                path,
                rows: 0,
                created: false,
            });
        };

        create_dir_all(&self.dir).map_err(|e| {
            AppError::output(format!(
                "Failed to create output dir '{}': {e}",
                self.dir.display()
            ))
        })?;

        let batch_columns: Vec<String> = first.keys().cloned().collect();
        let existing = read_header(&path)?;
        let created = existing.is_none();
        let columns = match existing {
            None => batch_columns,
            Some(header) => {
                ensure_same_columns(&header, &batch_columns, &path)?;
                header
            }
        };

        for (idx, record) in records.iter().enumerate() {
            if let Some(extra) = record.keys().find(|k| !columns.contains(k)) {
                return Err(AppError::output(format!(
                    "Record {idx} has field `{extra}` that is not a column of '{}'.",
                    path.display()
                )));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::output(format!("Failed to open '{}': {e}", path.display())))?;

        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(file);

        if created {
            writer
                .write_record(&columns)
                .map_err(|e| AppError::output(format!("Failed to write CSV header: {e}")))?;
        }

        for record in records {
            let row = columns
                .iter()
                .map(|c| record.get(c).map(cell).unwrap_or_default());
            writer
                .write_record(row)
                .map_err(|e| AppError::output(format!("Failed to write CSV row: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| AppError::output(format!("Failed to flush '{}': {e}", path.display())))?;

        Ok(SinkReport {
            path,
            rows: records.len(),
            created,
        })
    }
}

/// Header of an existing, non-empty CSV file.
fn read_header(path: &Path) -> Result<Option<Vec<String>>, AppError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::output(format!(
                "Failed to open '{}': {e}",
                path.display()
            )));
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(file);

    match reader.records().next() {
        None => Ok(None),
        Some(Ok(record)) => Ok(Some(record.iter().map(str::to_string).collect())),
        Some(Err(e)) => Err(AppError::output(format!(
            "Failed to read header of '{}': {e}",
            path.display()
        ))),
    }
}

fn ensure_same_columns(header: &[String], batch: &[String], path: &Path) -> Result<(), AppError> {
    let missing: Vec<&str> = header
        .iter()
        .filter(|c| !batch.contains(c))
        .map(String::as_str)
        .collect();
    let added: Vec<&str> = batch
        .iter()
        .filter(|c| !header.contains(c))
        .map(String::as_str)
        .collect();

    if missing.is_empty() && added.is_empty() {
        return Ok(());
    }
    Err(AppError::output(format!(
        "Columns changed for '{}' (missing: [{}], new: [{}]); refusing to append.",
        path.display(),
        missing.join(", "),
        added.join(", ")
    )))
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        // Nested values should not appear in a flat record; keep them as JSON.
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
