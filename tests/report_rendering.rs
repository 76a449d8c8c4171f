use std::io::Cursor;

use bienestar_engine::wellness::report::{
    alerts_report, charts_report, csv_file_name, paginate, personal_report, records_csv,
    records_report, render_pdf, site_report, PageLayout,
};
use bienestar_engine::wellness::{
    compute_kpis, detect_alerts, filter_records, ingest, AlertPolicy, ClockField,
    EmotionalState, RecordFilter, Role, ShiftRecord, UserIdentity,
};

fn record(site: &str, date: &str, name: &str, stress: u8) -> ShiftRecord {
    ShiftRecord {
        site: site.to_string(),
        date: date.to_string(),
        employee_name: name.to_string(),
        shift_start: ClockField::At(
            chrono::NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        ),
        shift_end: ClockField::At(
            chrono::NaiveTime::from_hms_opt(16, 0, 0).expect("valid time"),
        ),
        rest_minutes: 45,
        stress_level: stress,
        emotional_state: EmotionalState::Normal,
        comment: "steady shift".to_string(),
    }
}

#[test]
fn csv_round_trips_in_canonical_order() {
    let records = vec![
        record("Norte", "2024-01-05", "Luis", 6),
        record("Centro", "2024-01-06", "Marta", 3),
        record("Centro", "2024-01-05", "Ana", 9),
    ];

    let bytes = records_csv(&records).expect("csv renders");
    let parsed = ingest::records_from_csv(Cursor::new(bytes)).expect("csv parses back");

    let tuples: Vec<(String, String, String, u8)> = parsed
        .iter()
        .map(|r| {
            (
                r.site.clone(),
                r.date.clone(),
                r.employee_name.clone(),
                r.stress_level,
            )
        })
        .collect();
    assert_eq!(
        tuples,
        vec![
            (
                "Centro".to_string(),
                "2024-01-05".to_string(),
                "Ana".to_string(),
                9
            ),
            (
                "Centro".to_string(),
                "2024-01-06".to_string(),
                "Marta".to_string(),
                3
            ),
            (
                "Norte".to_string(),
                "2024-01-05".to_string(),
                "Luis".to_string(),
                6
            ),
        ]
    );
}

#[test]
fn csv_for_a_site_without_records_is_header_only() {
    let records = vec![record("Centro", "2024-01-05", "Ana", 5)];
    let scoped = filter_records(&records, &RecordFilter::by_site("NonExistent"));
    let bytes = records_csv(&scoped).expect("empty csv renders");

    let text = String::from_utf8(bytes).expect("utf-8 output");
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("site,date,employee_name"));
    assert_eq!(csv_file_name(Some("NonExistent")), "reporte_NonExistent.csv");
}

#[test]
fn records_report_paginates_hundreds_of_rows_with_header_redraw() {
    let records: Vec<ShiftRecord> = (0..400)
        .map(|index| {
            record(
                "Centro",
                "2024-01-05",
                &format!("Employee {index:03}"),
                (index % 10) as u8,
            )
        })
        .collect();
    let kpis = compute_kpis(&records, &AlertPolicy::default());
    let document = records_report(&records, &kpis);

    let pages = paginate(&document, &PageLayout::default());
    assert!(pages.len() > 3, "400 rows should span several pages");
    for page in &pages {
        let bold = page.bold_texts();
        assert!(
            bold.contains(&"Site") && bold.contains(&"Employee"),
            "table header redrawn on every page"
        );
    }

    let bytes = render_pdf(&document).expect("large report renders");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn alerts_report_renders_detected_alerts() {
    let mut flagged = record("Centro", "2024-01-05", "Ana", 9);
    flagged.rest_minutes = 10;
    let alerts = detect_alerts(&[flagged], &AlertPolicy::default());
    assert_eq!(alerts.len(), 1);

    let document = alerts_report(&alerts);
    assert_eq!(document.file_name, "alertas_filtradas.pdf");
    let bytes = render_pdf(&document).expect("alerts report renders");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn charts_report_survives_unparseable_dates() {
    // No parseable date: the weekly chart is omitted, the document still
    // renders with the distribution chart.
    let records = vec![record("Centro", "proximamente", "Ana", 5)];
    let kpis = compute_kpis(&records, &AlertPolicy::default());
    let document = charts_report(&records, &kpis);

    let bytes = render_pdf(&document).expect("charts report renders");
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn site_report_degrades_to_no_data_messaging() {
    let records = vec![record("Centro", "2024-01-05", "Ana", 5)];
    let document = site_report(&records, "Inexistente", &AlertPolicy::default());
    assert_eq!(document.file_name, "reporte_Inexistente.pdf");

    let pages = paginate(&document, &PageLayout::default());
    assert_eq!(pages.len(), 1);
    let has_notice = pages[0].ops.iter().any(|op| {
        matches!(
            op,
            bienestar_engine::wellness::report::DrawOp::Text { text, .. }
                if text == "No data for this site."
        )
    });
    assert!(has_notice);

    render_pdf(&document).expect("no-data report renders");
}

#[test]
fn personal_report_orders_most_recent_first() {
    let records = vec![
        record("Centro", "2024-01-05", "Ana", 5),
        record("Centro", "2024-01-09", "Ana", 4),
        record("Centro", "2024-01-07", "Ana", 6),
        record("Centro", "2024-01-08", "Luis", 2),
    ];
    let user = UserIdentity {
        username: "ana.r".to_string(),
        display_name: "Ana".to_string(),
        site: "Centro".to_string(),
        role: Role::Employee,
    };

    let document = personal_report(&records, &user);
    assert_eq!(document.file_name, "mis_registros_Ana.pdf");

    let pages = paginate(&document, &PageLayout::default());
    let dates: Vec<&str> = pages
        .iter()
        .flat_map(|page| page.ops.iter())
        .filter_map(|op| match op {
            bienestar_engine::wellness::report::DrawOp::Text { text, bold: false, .. }
                if text.starts_with("2024-") =>
            {
                Some(text.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(dates, vec!["2024-01-09", "2024-01-07", "2024-01-05"]);

    render_pdf(&document).expect("personal report renders");
}

#[test]
fn empty_everything_still_renders_documents() {
    let policy = AlertPolicy::default();
    let kpis = compute_kpis(&[], &policy);

    for document in [
        records_report(&[], &kpis),
        alerts_report(&[]),
        charts_report(&[], &kpis),
    ] {
        let bytes = render_pdf(&document).expect("empty document renders");
        assert!(bytes.starts_with(b"%PDF"));
    }
}
