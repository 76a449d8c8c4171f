mod export;
mod layout;
mod pdf;

pub use export::{records_csv, csv_file_name, CSV_COLUMNS};
pub use layout::{paginate, DrawOp, LaidOutPage, PageLayout};
pub use pdf::render_pdf;

use crate::wellness::domain::{Alert, ShiftRecord, UserIdentity};
use crate::wellness::filter::{filter_records, RecordFilter};
use crate::wellness::kpi::{ChartSpec, KpiSnapshot};

/// Rendering failures are infrastructure-only: font registration, byte
/// serialization, buffer flushing. Data-driven edge cases (empty input,
/// malformed rows, missing charts) degrade inside the document instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to prepare PDF fonts: {0}")]
    Font(#[source] printpdf::Error),
    #[error("failed to serialize PDF document: {0}")]
    Pdf(#[source] printpdf::Error),
    #[error("failed to encode CSV export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),
}

/// Content blocks a document is composed of. Composition decides what a
/// report says; the paginating layout engine decides where it lands.
#[derive(Debug, Clone)]
pub enum Block {
    Heading(String),
    KpiSummary(KpiSummaryBlock),
    Notice(String),
    Chart(ChartSpec),
    Table(TableBlock),
}

#[derive(Debug, Clone)]
pub struct KpiSummaryBlock {
    pub mean_stress: f64,
    pub pct_adequate_rest: f64,
    pub alert_count: usize,
    pub item_count: usize,
}

impl KpiSummaryBlock {
    pub fn from_snapshot(snapshot: &KpiSnapshot, item_count: usize) -> Self {
        Self {
            mean_stress: snapshot.mean_stress,
            pct_adequate_rest: snapshot.pct_adequate_rest,
            alert_count: snapshot.alert_count,
            item_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableBlock {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

/// A composed report ready for rendering, carrying its contractual
/// artifact file name.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub file_name: String,
    pub blocks: Vec<Block>,
}

const RECORD_TABLE_COLUMNS: [&str; 9] = [
    "Site", "Date", "Employee", "Start", "End", "Rest", "Stress", "State", "Comment",
];
const ALERT_TABLE_COLUMNS: [&str; 5] = ["Site", "Employee", "Reason", "Stress", "Date"];

/// General records report (`registros_filtrados.pdf`): KPI summary over
/// the supplied (already filtered) records plus the full listing in
/// canonical order.
pub fn records_report(records: &[ShiftRecord], kpis: &KpiSnapshot) -> ReportDocument {
    let mut blocks = vec![Block::KpiSummary(KpiSummaryBlock::from_snapshot(
        kpis,
        records.len(),
    ))];
    push_records_listing(&mut blocks, records, RecordOrder::Canonical, "No records for the selected filters.");

    ReportDocument {
        title: "Shift wellness records".to_string(),
        file_name: "registros_filtrados.pdf".to_string(),
        blocks,
    }
}

/// Alerts report (`alertas_filtradas.pdf`).
pub fn alerts_report(alerts: &[Alert]) -> ReportDocument {
    let blocks = if alerts.is_empty() {
        vec![Block::Notice("No alerts detected.".to_string())]
    } else {
        let mut sorted = alerts.to_vec();
        sorted.sort_by(|a, b| {
            (&a.site, &a.date, &a.employee_name).cmp(&(&b.site, &b.date, &b.employee_name))
        });
        let rows = sorted
            .iter()
            .map(|alert| {
                vec![
                    alert.site.clone(),
                    alert.employee_name.clone(),
                    alert.reason.clone(),
                    alert.stress_level.to_string(),
                    alert.date.clone(),
                ]
            })
            .collect();
        vec![Block::Table(TableBlock {
            columns: ALERT_TABLE_COLUMNS.to_vec(),
            rows,
        })]
    };

    ReportDocument {
        title: "Wellness alerts".to_string(),
        file_name: "alertas_filtradas.pdf".to_string(),
        blocks,
    }
}

/// KPI and charts report (`reporte_graficos.pdf`). Each chart is attached
/// independently; an unavailable chart is omitted rather than failing the
/// document.
pub fn charts_report(records: &[ShiftRecord], kpis: &KpiSnapshot) -> ReportDocument {
    let mut blocks = vec![Block::KpiSummary(KpiSummaryBlock::from_snapshot(
        kpis,
        records.len(),
    ))];

    let mut any_chart = false;
    if let Some(chart) = kpis.weekly_chart() {
        blocks.push(Block::Chart(chart));
        any_chart = true;
    }
    if let Some(chart) = kpis.state_chart() {
        blocks.push(Block::Chart(chart));
        any_chart = true;
    }
    if !any_chart {
        blocks.push(Block::Notice("No chart data available.".to_string()));
    }

    ReportDocument {
        title: "Wellness KPIs and charts".to_string(),
        file_name: "reporte_graficos.pdf".to_string(),
        blocks,
    }
}

/// Per-site report (`reporte_<site>.pdf`): the general contract restricted
/// to one site; an unknown or empty site produces a "no data" document.
pub fn site_report(
    records: &[ShiftRecord],
    site: &str,
    policy: &crate::wellness::policy::AlertPolicy,
) -> ReportDocument {
    let scoped = filter_records(records, &RecordFilter::by_site(site));

    let blocks = if scoped.is_empty() {
        vec![Block::Notice("No data for this site.".to_string())]
    } else {
        let kpis = crate::wellness::kpi::compute_kpis(&scoped, policy);
        let mut blocks = vec![Block::KpiSummary(KpiSummaryBlock::from_snapshot(
            &kpis,
            scoped.len(),
        ))];
        push_records_listing(&mut blocks, &scoped, RecordOrder::Canonical, "No data for this site.");
        blocks
    };

    ReportDocument {
        title: format!("Site report: {site}"),
        file_name: format!("reporte_{}.pdf", artifact_slug(site)),
        blocks,
    }
}

/// Personal report (`mis_registros_<employee>.pdf`): only the requesting
/// user's records, most recent first, not the canonical ordering used
/// everywhere else.
pub fn personal_report(records: &[ShiftRecord], user: &UserIdentity) -> ReportDocument {
    let name = user.record_name();
    let mine: Vec<ShiftRecord> = records
        .iter()
        .filter(|record| record.employee_name == name)
        .cloned()
        .collect();

    let mut blocks = Vec::new();
    push_records_listing(&mut blocks, &mine, RecordOrder::DateDescending, "No records yet.");

    ReportDocument {
        title: format!("My shift records: {name}"),
        file_name: format!("mis_registros_{}.pdf", artifact_slug(name)),
        blocks,
    }
}

#[derive(Debug, Clone, Copy)]
enum RecordOrder {
    Canonical,
    DateDescending,
}

fn push_records_listing(
    blocks: &mut Vec<Block>,
    records: &[ShiftRecord],
    order: RecordOrder,
    empty_notice: &str,
) {
    if records.is_empty() {
        blocks.push(Block::Notice(empty_notice.to_string()));
        return;
    }

    let mut sorted = records.to_vec();
    match order {
        RecordOrder::Canonical => sort_canonical(&mut sorted),
        RecordOrder::DateDescending => sorted.sort_by(|a, b| b.date.cmp(&a.date)),
    }

    let rows = sorted.iter().map(record_row).collect();
    blocks.push(Block::Table(TableBlock {
        columns: RECORD_TABLE_COLUMNS.to_vec(),
        rows,
    }));
}

fn record_row(record: &ShiftRecord) -> Vec<String> {
    vec![
        record.site.clone(),
        record.date.clone(),
        record.employee_name.clone(),
        record.shift_start.display(),
        record.shift_end.display(),
        record.rest_minutes.to_string(),
        record.stress_level.to_string(),
        record.emotional_state.label().to_string(),
        record.comment.clone(),
    ]
}

pub(crate) fn sort_canonical(records: &mut [ShiftRecord]) {
    records.sort_by(|a, b| {
        (&a.site, &a.date, &a.employee_name).cmp(&(&b.site, &b.date, &b.employee_name))
    });
}

/// File-name-safe rendition of a site or employee name: path separators
/// and whitespace runs become single underscores.
fn artifact_slug(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_whitespace() {
                ' '
            } else {
                c
            }
        })
        .collect();
    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        "sin_nombre".to_string()
    } else {
        joined
    }
}
