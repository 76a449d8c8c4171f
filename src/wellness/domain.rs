use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EmotionalState {
    Happy,
    Calm,
    Normal,
    Stressed,
    Exhausted,
    Unspecified,
}

impl EmotionalState {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::Happy,
            Self::Calm,
            Self::Normal,
            Self::Stressed,
            Self::Exhausted,
            Self::Unspecified,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Calm => "Calm",
            Self::Normal => "Normal",
            Self::Stressed => "Stressed",
            Self::Exhausted => "Exhausted",
            Self::Unspecified => "Unspecified",
        }
    }
}

/// A clock reading as it survived ingestion. `Missing` (no value supplied)
/// and `Unreadable` (a value that did not parse as a time of day) drive
/// different alert rules, so the distinction is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClockField {
    #[default]
    Missing,
    Unreadable(String),
    At(NaiveTime),
}

impl ClockField {
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            Self::At(time) => Some(*time),
            _ => None,
        }
    }

    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Unreadable(raw) => raw.clone(),
            Self::At(time) => time.format("%H:%M").to_string(),
        }
    }
}

/// One employee's self-reported data for a single shift. Produced only by
/// the ingestion boundary; immutable afterwards. Every downstream stage
/// reads records and emits derived alert/KPI values.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftRecord {
    pub site: String,
    pub date: String,
    pub employee_name: String,
    pub shift_start: ClockField,
    pub shift_end: ClockField,
    pub rest_minutes: u32,
    pub stress_level: u8,
    pub emotional_state: EmotionalState,
    pub comment: String,
}

impl ShiftRecord {
    /// Calendar view of the `date` field. Unparseable dates stay out of
    /// calendar computations but keep filtering and exporting by exact
    /// string equality.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }
}

/// Derived flag for a record that matched at least one wellness rule.
/// Recomputed on every query; two alerts are the same alert when
/// `(site, employee_name, reason, date)` match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub site: String,
    pub employee_name: String,
    pub date: String,
    pub reason: String,
    pub stress_level: u8,
}

impl Alert {
    pub fn identity(&self) -> (&str, &str, &str, &str) {
        (&self.site, &self.employee_name, &self.reason, &self.date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Employee => "Employee",
        }
    }
}

/// Already-resolved identity handed over by the auth collaborator. The
/// engine never authenticates; it only scopes the personal report and the
/// default site filter.
#[derive(Debug, Clone, PartialEq)]
pub struct UserIdentity {
    pub username: String,
    pub display_name: String,
    pub site: String,
    pub role: Role,
}

impl UserIdentity {
    /// Name used to match records: display name when present, username
    /// otherwise (older record stores only carried the username).
    pub fn record_name(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }
}
