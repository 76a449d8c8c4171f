use super::{sort_canonical, ReportError};
use crate::wellness::domain::ShiftRecord;

/// Contractual CSV column set, in order. Fields a record shape never
/// carried are emitted as empty strings by the display helpers.
pub const CSV_COLUMNS: [&str; 9] = [
    "site",
    "date",
    "employee_name",
    "shift_start",
    "shift_end",
    "rest_minutes",
    "stress_level",
    "emotional_state",
    "comment",
];

/// Renders records as UTF-8 CSV bytes: header row, rows sorted ascending
/// by `(site, date, employee_name)`, no index column. Empty input yields
/// a header-only export.
pub fn records_csv(records: &[ShiftRecord]) -> Result<Vec<u8>, ReportError> {
    let mut sorted = records.to_vec();
    sort_canonical(&mut sorted);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_COLUMNS)?;
    for record in &sorted {
        let start = record.shift_start.display();
        let end = record.shift_end.display();
        let rest = record.rest_minutes.to_string();
        let stress = record.stress_level.to_string();
        writer.write_record([
            record.site.as_str(),
            record.date.as_str(),
            record.employee_name.as_str(),
            start.as_str(),
            end.as_str(),
            rest.as_str(),
            stress.as_str(),
            record.emotional_state.label(),
            record.comment.as_str(),
        ])?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| ReportError::Io(err.into_error()))
}

/// Artifact name for a CSV export: `reporte_<site>.csv`, falling back to
/// the all-sites name when unscoped.
pub fn csv_file_name(site: Option<&str>) -> String {
    match site.map(str::trim).filter(|site| !site.is_empty()) {
        Some(site) => format!("reporte_{}.csv", super::artifact_slug(site)),
        None => "reporte_todas.csv".to_string(),
    }
}
