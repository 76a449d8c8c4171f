mod normalizer;
mod parser;

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::wellness::domain::{ShiftRecord, UserIdentity};
use parser::RawRow;

/// Document-level ingestion failures. Malformed *values* inside a row
/// never land here; they coerce to defaults at the parse boundary.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read record store: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON record data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV record data: {0}")]
    Csv(#[from] csv::Error),
}

/// Parses a JSON array of raw shift rows (either field-name generation,
/// mixed shapes allowed) into canonical records, preserving input order.
pub fn records_from_json<R: Read>(reader: R) -> Result<Vec<ShiftRecord>, IngestError> {
    let rows: Vec<RawRow> = serde_json::from_reader(reader)?;
    Ok(rows.iter().map(parser::record_from_row).collect())
}

/// Parses a headered CSV export using the same row contract as the JSON
/// store.
pub fn records_from_csv<R: Read>(reader: R) -> Result<Vec<ShiftRecord>, IngestError> {
    Ok(raw_rows_from_csv(reader)?
        .iter()
        .map(parser::record_from_row)
        .collect())
}

/// Loads records from a file, dispatching on the `.csv` extension and
/// treating everything else as the JSON store format.
pub fn records_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ShiftRecord>, IngestError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    {
        records_from_csv(file)
    } else {
        records_from_json(file)
    }
}

/// Converts in-memory raw rows (e.g. an HTTP request body) into canonical
/// records. Non-object entries are skipped rather than failing the batch.
pub fn records_from_values(rows: &[Value]) -> Vec<ShiftRecord> {
    rows.iter()
        .filter_map(Value::as_object)
        .map(parser::record_from_row)
        .collect()
}

pub fn users_from_json<R: Read>(reader: R) -> Result<Vec<UserIdentity>, IngestError> {
    let rows: Vec<RawRow> = serde_json::from_reader(reader)?;
    Ok(rows.iter().map(parser::user_from_row).collect())
}

pub fn users_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<UserIdentity>, IngestError> {
    let file = std::fs::File::open(path)?;
    users_from_json(file)
}

/// Normalizes a caller-supplied filter date through the same rules as
/// record ingestion, so filter comparisons stay exact string equality.
pub(crate) fn normalize_filter_date(value: &str) -> String {
    normalizer::normalize_date(value)
}

pub fn find_user<'a>(users: &'a [UserIdentity], username: &str) -> Option<&'a UserIdentity> {
    users
        .iter()
        .find(|user| user.username.eq_ignore_ascii_case(username.trim()))
}

fn raw_rows_from_csv<R: Read>(reader: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let mut row = RawRow::new();
        for (header, field) in headers.iter().zip(record.iter()) {
            row.insert(header.to_string(), Value::String(field.to_string()));
        }
        rows.push(row);
    }

    Ok(rows)
}
