use serde_json::{Map, Value};

use super::normalizer::{clamp_stress, normalize_date, parse_clock, parse_state};
use crate::wellness::domain::{Role, ShiftRecord, UserIdentity};
use crate::wellness::policy::DEFAULT_ADEQUATE_REST_MINUTES;

// Field spellings observed across app generations. The first present key
// wins; later spellings are the older Spanish capture forms.
const SITE_KEYS: [&str; 2] = ["site", "sede"];
const DATE_KEYS: [&str; 2] = ["date", "fecha"];
const NAME_KEYS: [&str; 4] = ["employee_name", "nombre", "employee", "name"];
const START_KEYS: [&str; 2] = ["shift_start", "hora_inicio"];
const END_KEYS: [&str; 2] = ["shift_end", "hora_salida"];
const REST_MINUTE_KEYS: [&str; 4] = [
    "rest_minutes",
    "descanso",
    "descanso_min",
    "minutos_descanso",
];
const REST_FULFILLED_KEYS: [&str; 3] = ["rest_fulfilled", "descanso_cumplido", "rest_cumplido"];
const STRESS_KEYS: [&str; 3] = ["stress_level", "estres", "nivel_estres"];
const STATE_KEYS: [&str; 3] = ["emotional_state", "estado", "estado_emocional"];
const COMMENT_KEYS: [&str; 2] = ["comment", "comentario"];

const USERNAME_KEYS: [&str; 2] = ["username", "usuario"];
const DISPLAY_NAME_KEYS: [&str; 3] = ["display_name", "nombre", "name"];
const ROLE_KEYS: [&str; 2] = ["role", "rol"];

pub(crate) type RawRow = Map<String, Value>;

/// Collapses one raw key/value row into the canonical record. Every field
/// is resolved here exactly once; malformed values coerce to their
/// documented defaults instead of failing the row.
pub(crate) fn record_from_row(row: &RawRow) -> ShiftRecord {
    let rest_minutes = match numeric_field(row, &REST_MINUTE_KEYS) {
        Some(minutes) => minutes.max(0) as u32,
        // Older rows carry a fulfilled/not-fulfilled flag instead of
        // minutes. True maps to the adequate-rest cutoff, false to zero,
        // which keeps both the insufficient-rest rule and the rest KPI
        // meaningful for that generation.
        None => match bool_field(row, &REST_FULFILLED_KEYS) {
            Some(true) => DEFAULT_ADEQUATE_REST_MINUTES,
            Some(false) => 0,
            None => 0,
        },
    };

    ShiftRecord {
        site: text_field(row, &SITE_KEYS).unwrap_or_default(),
        date: normalize_date(&text_field(row, &DATE_KEYS).unwrap_or_default()),
        employee_name: text_field(row, &NAME_KEYS).unwrap_or_default(),
        shift_start: parse_clock(text_field(row, &START_KEYS).as_deref()),
        shift_end: parse_clock(text_field(row, &END_KEYS).as_deref()),
        rest_minutes,
        stress_level: clamp_stress(numeric_field(row, &STRESS_KEYS).unwrap_or(0)),
        emotional_state: parse_state(&text_field(row, &STATE_KEYS).unwrap_or_default()),
        comment: text_field(row, &COMMENT_KEYS).unwrap_or_default(),
    }
}

pub(crate) fn user_from_row(row: &RawRow) -> UserIdentity {
    let role = match text_field(row, &ROLE_KEYS).as_deref() {
        Some(raw) if raw.eq_ignore_ascii_case("admin") => Role::Admin,
        _ => Role::Employee,
    };

    UserIdentity {
        username: text_field(row, &USERNAME_KEYS).unwrap_or_default(),
        display_name: text_field(row, &DISPLAY_NAME_KEYS).unwrap_or_default(),
        site: text_field(row, &SITE_KEYS).unwrap_or_default(),
        role,
    }
}

fn lookup<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| row.get(*key))
        .filter(|value| !value.is_null())
}

fn text_field(row: &RawRow, keys: &[&str]) -> Option<String> {
    match lookup(row, keys)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn numeric_field(row: &RawRow, keys: &[&str]) -> Option<i64> {
    match lookup(row, keys)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.round() as i64)),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .map(|float| float.round() as i64),
        _ => None,
    }
}

fn bool_field(row: &RawRow, keys: &[&str]) -> Option<bool> {
    match lookup(row, keys)? {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|float| float != 0.0),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "si" | "sí" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wellness::domain::{ClockField, EmotionalState};

    fn row(json: &str) -> RawRow {
        serde_json::from_str(json).expect("valid row json")
    }

    #[test]
    fn spanish_generation_rows_normalize() {
        let record = record_from_row(&row(
            r#"{
                "sede": "Centro",
                "fecha": "2024-01-05",
                "nombre": "Ana",
                "hora_inicio": "08:00",
                "hora_salida": "17:00",
                "descanso": 45,
                "estres": 6,
                "estado": "Tranquilo",
                "comentario": "sin novedades"
            }"#,
        ));

        assert_eq!(record.site, "Centro");
        assert_eq!(record.date, "2024-01-05");
        assert_eq!(record.employee_name, "Ana");
        assert_eq!(record.rest_minutes, 45);
        assert_eq!(record.stress_level, 6);
        assert_eq!(record.emotional_state, EmotionalState::Calm);
        assert_eq!(record.comment, "sin novedades");
        assert!(matches!(record.shift_start, ClockField::At(_)));
    }

    #[test]
    fn boolean_rest_generation_maps_to_minutes() {
        let fulfilled = record_from_row(&row(
            r#"{"site": "Norte", "employee_name": "Luis", "rest_fulfilled": true}"#,
        ));
        assert_eq!(fulfilled.rest_minutes, 45);

        let skipped = record_from_row(&row(
            r#"{"site": "Norte", "employee_name": "Luis", "descanso_cumplido": "no"}"#,
        ));
        assert_eq!(skipped.rest_minutes, 0);
    }

    #[test]
    fn stress_accepts_digit_strings_and_clamps() {
        let stringly = record_from_row(&row(r#"{"estres": "9"}"#));
        assert_eq!(stringly.stress_level, 9);

        let oversized = record_from_row(&row(r#"{"stress_level": 14}"#));
        assert_eq!(oversized.stress_level, 10);

        let garbage = record_from_row(&row(r#"{"estres": "mucho"}"#));
        assert_eq!(garbage.stress_level, 0);
    }

    #[test]
    fn missing_keys_default_without_failing() {
        let record = record_from_row(&row(r#"{}"#));
        assert_eq!(record.site, "");
        assert_eq!(record.date, "");
        assert_eq!(record.rest_minutes, 0);
        assert_eq!(record.stress_level, 0);
        assert_eq!(record.emotional_state, EmotionalState::Unspecified);
        assert_eq!(record.shift_start, ClockField::Missing);
        assert_eq!(record.shift_end, ClockField::Missing);
    }

    #[test]
    fn user_rows_accept_both_role_spellings() {
        let admin = user_from_row(&row(
            r#"{"usuario": "marta", "nombre": "Marta", "rol": "admin", "sede": "Centro"}"#,
        ));
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.username, "marta");
        assert_eq!(admin.display_name, "Marta");

        let employee = user_from_row(&row(
            r#"{"username": "luis", "display_name": "Luis", "role": "empleado"}"#,
        ));
        assert_eq!(employee.role, Role::Employee);
    }
}
