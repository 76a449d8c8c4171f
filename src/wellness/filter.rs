use super::domain::ShiftRecord;

/// Narrowing criteria for a record collection. An omitted dimension (or
/// the "All"/"Todas" site sentinel the admin UI sends) leaves that
/// dimension unconstrained.
#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub date: Option<String>,
    pub site: Option<String>,
}

impl RecordFilter {
    pub fn by_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            site: None,
        }
    }

    pub fn by_site(site: impl Into<String>) -> Self {
        Self {
            date: None,
            site: Some(site.into()),
        }
    }

    fn effective_site(&self) -> Option<&str> {
        self.site
            .as_deref()
            .map(str::trim)
            .filter(|site| !site.is_empty())
            .filter(|site| {
                !site.eq_ignore_ascii_case("all") && !site.eq_ignore_ascii_case("todas")
            })
    }

    fn effective_date(&self) -> Option<String> {
        self.date
            .as_deref()
            .map(super::ingest::normalize_filter_date)
            .filter(|date| !date.is_empty())
    }
}

/// Keeps records matching the filter by exact equality, preserving input
/// order. The input is never mutated; empty input yields empty output.
pub fn filter_records(records: &[ShiftRecord], filter: &RecordFilter) -> Vec<ShiftRecord> {
    let date = filter.effective_date();
    let site = filter.effective_site();

    records
        .iter()
        .filter(|record| date.as_deref().is_none_or(|wanted| record.date == wanted))
        .filter(|record| site.is_none_or(|wanted| record.site == wanted))
        .cloned()
        .collect()
}

/// Distinct non-empty sites in first-seen order, for per-site report
/// fan-out.
pub fn distinct_sites(records: &[ShiftRecord]) -> Vec<String> {
    let mut sites: Vec<String> = Vec::new();
    for record in records {
        let site = record.site.trim();
        if !site.is_empty() && !sites.iter().any(|seen| seen.as_str() == site) {
            sites.push(site.to_string());
        }
    }
    sites
}
