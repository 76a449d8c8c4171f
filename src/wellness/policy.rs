use serde::{Deserialize, Serialize};

use super::domain::EmotionalState;

// Canonical rule cutoffs. Earlier app generations shipped a stress cutoff
// of 7 and an 8-hour shift ceiling; 8 and 9h are the values the majority
// of deployments converged on.
pub const DEFAULT_HIGH_STRESS_THRESHOLD: u8 = 8;
pub const DEFAULT_INSUFFICIENT_REST_MINUTES: u32 = 30;
pub const DEFAULT_ADEQUATE_REST_MINUTES: u32 = 45;
pub const DEFAULT_MAX_SHIFT_HOURS: i64 = 9;
pub const DEFAULT_LATE_START_HOUR: u32 = 10;

/// Policy dials backing alert detection and the rest-compliance KPI.
/// Every threshold lives here; rule code never hard-codes a cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    pub high_stress_threshold: u8,
    pub insufficient_rest_minutes: u32,
    pub adequate_rest_minutes: u32,
    pub max_shift_hours: i64,
    pub late_start_hour: u32,
    pub critical_states: Vec<EmotionalState>,
}

impl AlertPolicy {
    pub fn is_critical_state(&self, state: EmotionalState) -> bool {
        self.critical_states.contains(&state)
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            high_stress_threshold: DEFAULT_HIGH_STRESS_THRESHOLD,
            insufficient_rest_minutes: DEFAULT_INSUFFICIENT_REST_MINUTES,
            adequate_rest_minutes: DEFAULT_ADEQUATE_REST_MINUTES,
            max_shift_hours: DEFAULT_MAX_SHIFT_HOURS,
            late_start_hour: DEFAULT_LATE_START_HOUR,
            critical_states: vec![EmotionalState::Stressed, EmotionalState::Exhausted],
        }
    }
}
