pub mod alerts;
pub mod domain;
pub mod filter;
pub mod ingest;
pub mod kpi;
pub mod policy;
pub mod report;

pub use alerts::detect_alerts;
pub use domain::{Alert, ClockField, EmotionalState, Role, ShiftRecord, UserIdentity};
pub use filter::{distinct_sites, filter_records, RecordFilter};
pub use kpi::{compute_kpis, ChartSpec, KpiSnapshot};
pub use policy::AlertPolicy;
