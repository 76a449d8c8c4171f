use std::collections::HashSet;

use chrono::Duration;

use super::domain::{Alert, ShiftRecord};
use super::policy::AlertPolicy;

/// Evaluates every record against the wellness rule set and returns one
/// alert per flagged record, with all triggered reasons joined into a
/// single comma-separated motive. Exact duplicates on
/// `(site, employee_name, reason, date)` collapse; output is sorted
/// ascending by `(site, date, employee_name)`.
pub fn detect_alerts(records: &[ShiftRecord], policy: &AlertPolicy) -> Vec<Alert> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut alerts = Vec::new();

    for record in records {
        let reasons = triggered_reasons(record, policy);
        if reasons.is_empty() {
            continue;
        }

        let reason = reasons.join(", ");
        let key = (
            record.site.clone(),
            record.employee_name.clone(),
            reason.clone(),
            record.date.clone(),
        );
        if !seen.insert(key) {
            continue;
        }

        alerts.push(Alert {
            site: record.site.clone(),
            employee_name: record.employee_name.clone(),
            date: record.date.clone(),
            reason,
            stress_level: record.stress_level,
        });
    }

    alerts.sort_by(|a, b| {
        (&a.site, &a.date, &a.employee_name).cmp(&(&b.site, &b.date, &b.employee_name))
    });
    alerts
}

fn triggered_reasons(record: &ShiftRecord, policy: &AlertPolicy) -> Vec<String> {
    let mut reasons = Vec::new();

    if record.stress_level >= policy.high_stress_threshold {
        reasons.push(format!("high stress ({})", record.stress_level));
    }

    if record.rest_minutes < policy.insufficient_rest_minutes {
        reasons.push(format!("insufficient rest ({} min)", record.rest_minutes));
    }

    if policy.is_critical_state(record.emotional_state) {
        reasons.push(format!(
            "critical emotional state ({})",
            record.emotional_state.label()
        ));
    }

    // Clock-based rules only apply where the relevant reading parsed.
    // An unreadable value skips them; only a truly absent checkout is
    // itself a finding.
    if let (Some(start), Some(end)) = (record.shift_start.time(), record.shift_end.time()) {
        let mut worked = end - start;
        if worked < Duration::zero() {
            // Overnight shift: the checkout lands on the next day.
            worked = worked + Duration::hours(24);
        }
        if worked > Duration::hours(policy.max_shift_hours) {
            reasons.push(format!("shift longer than {}h", policy.max_shift_hours));
        }
    }

    if let Some(start) = record.shift_start.time() {
        use chrono::Timelike;
        if start.hour() >= policy.late_start_hour {
            reasons.push(format!("late start ({})", record.shift_start.display()));
        }
    }

    if record.shift_end.is_missing() {
        reasons.push("missing checkout".to_string());
    }

    reasons
}
