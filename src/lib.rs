//! Analytics and reporting engine for retail-store shift wellness
//! records: ingestion of raw shift rows, exact-match filtering, rule-based
//! alert detection, KPI aggregation, and CSV/PDF report rendering.
//!
//! Every engine entry point is a synchronous pure function of its inputs;
//! storage, authentication, and pixel rendering stay with external
//! collaborators.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod wellness;
