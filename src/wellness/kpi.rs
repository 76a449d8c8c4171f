use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::alerts::detect_alerts;
use super::domain::{EmotionalState, ShiftRecord};
use super::policy::AlertPolicy;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStress {
    pub date: NaiveDate,
    pub mean_stress: f64,
}

/// Aggregate statistics over one record collection at query time. Callers
/// pre-filter by site/date/employee; the aggregator never re-filters.
#[derive(Debug, Clone, Serialize)]
pub struct KpiSnapshot {
    pub mean_stress: f64,
    pub pct_adequate_rest: f64,
    pub alert_count: usize,
    pub weekly_series: Vec<DailyStress>,
    pub state_distribution: BTreeMap<EmotionalState, usize>,
}

impl KpiSnapshot {
    pub fn empty() -> Self {
        Self {
            mean_stress: 0.0,
            pct_adequate_rest: 0.0,
            alert_count: 0,
            weekly_series: Vec::new(),
            state_distribution: BTreeMap::new(),
        }
    }

    /// What to plot for the trailing-week trend; None when no record
    /// carried a parseable date, which omits the chart downstream.
    pub fn weekly_chart(&self) -> Option<ChartSpec> {
        if self.weekly_series.is_empty() {
            return None;
        }

        let bars = self
            .weekly_series
            .iter()
            .map(|day| ChartBar {
                label: day.date.format("%Y-%m-%d").to_string(),
                value: day.mean_stress,
                caption: format!("{:.1}", day.mean_stress),
            })
            .collect();

        Some(ChartSpec {
            title: "Mean stress, last 7 days".to_string(),
            bars,
            // Stress lives on a fixed 0-10 scale; keep bars comparable
            // across documents rather than stretching to the local max.
            max_value: 10.0,
        })
    }

    /// What to plot for the emotional-state distribution; None when the
    /// input held no records.
    pub fn state_chart(&self) -> Option<ChartSpec> {
        let total: usize = self.state_distribution.values().sum();
        if total == 0 {
            return None;
        }

        let max_count = self
            .state_distribution
            .values()
            .copied()
            .max()
            .unwrap_or(0) as f64;

        let bars = EmotionalState::ordered()
            .into_iter()
            .filter_map(|state| {
                self.state_distribution.get(&state).map(|count| ChartBar {
                    label: state.label().to_string(),
                    value: *count as f64,
                    caption: format!("{} ({:.0}%)", count, 100.0 * *count as f64 / total as f64),
                })
            })
            .collect();

        Some(ChartSpec {
            title: "Emotional state distribution".to_string(),
            bars,
            max_value: max_count,
        })
    }
}

/// Declarative chart content: the series, buckets, and labels to draw.
/// Turning bars into pixels (or PDF strokes) is the renderer's business.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub bars: Vec<ChartBar>,
    pub max_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub caption: String,
}

pub fn compute_kpis(records: &[ShiftRecord], policy: &AlertPolicy) -> KpiSnapshot {
    if records.is_empty() {
        return KpiSnapshot::empty();
    }

    let total = records.len() as f64;
    let mean_stress = records
        .iter()
        .map(|record| record.stress_level as f64)
        .sum::<f64>()
        / total;

    let adequate = records
        .iter()
        .filter(|record| record.rest_minutes >= policy.adequate_rest_minutes)
        .count() as f64;
    let pct_adequate_rest = 100.0 * adequate / total;

    let mut state_distribution: BTreeMap<EmotionalState, usize> = BTreeMap::new();
    for record in records {
        *state_distribution.entry(record.emotional_state).or_insert(0) += 1;
    }

    KpiSnapshot {
        mean_stress,
        pct_adequate_rest,
        alert_count: detect_alerts(records, policy).len(),
        weekly_series: weekly_series(records),
        state_distribution,
    }
}

/// The trailing seven calendar days ending at the latest parseable date in
/// the input, zero-filled for days without records. Records whose date did
/// not parse are absent from the pool entirely.
fn weekly_series(records: &[ShiftRecord]) -> Vec<DailyStress> {
    let dated: Vec<(NaiveDate, u8)> = records
        .iter()
        .filter_map(|record| record.parsed_date().map(|date| (date, record.stress_level)))
        .collect();

    let Some(max_date) = dated.iter().map(|(date, _)| *date).max() else {
        return Vec::new();
    };

    (0..7)
        .map(|offset| {
            let day = max_date - Duration::days(6 - offset);
            let levels: Vec<f64> = dated
                .iter()
                .filter(|(date, _)| *date == day)
                .map(|(_, stress)| *stress as f64)
                .collect();
            let mean_stress = if levels.is_empty() {
                0.0
            } else {
                levels.iter().sum::<f64>() / levels.len() as f64
            };
            DailyStress {
                date: day,
                mean_stress,
            }
        })
        .collect()
}
