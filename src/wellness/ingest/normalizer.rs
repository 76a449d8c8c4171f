use chrono::{NaiveDate, NaiveTime};

use crate::wellness::domain::{ClockField, EmotionalState};

/// Strips decorative noise from a free-text label: BOM and zero-width
/// characters, emoji suffixes, collapsed whitespace, lowercased.
pub(crate) fn normalize_label(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps a raw emotional-state label onto the canonical set. Both the
/// Spanish labels the capture form ships and their English counterparts
/// are accepted; anything else lands on `Unspecified`.
pub(crate) fn parse_state(value: &str) -> EmotionalState {
    match normalize_label(value).as_str() {
        "feliz" | "happy" => EmotionalState::Happy,
        "tranquilo" | "tranquila" | "calm" => EmotionalState::Calm,
        "normal" => EmotionalState::Normal,
        "estresado" | "estresada" | "stressed" => EmotionalState::Stressed,
        "agotado" | "agotada" | "exhausted" => EmotionalState::Exhausted,
        _ => EmotionalState::Unspecified,
    }
}

const TIME_FORMATS: [&str; 2] = ["%H:%M", "%H:%M:%S"];

pub(crate) fn parse_clock(value: Option<&str>) -> ClockField {
    let raw = match value {
        Some(raw) if !raw.trim().is_empty() => raw.trim(),
        _ => return ClockField::Missing,
    };

    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, format) {
            return ClockField::At(time);
        }
    }

    ClockField::Unreadable(raw.to_string())
}

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Normalizes a calendar date to `YYYY-MM-DD`. Values that match no known
/// format keep their trimmed raw text so exact-equality filtering and
/// exports still see them.
pub(crate) fn normalize_date(value: &str) -> String {
    let trimmed = value.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    trimmed.to_string()
}

pub(crate) fn clamp_stress(value: i64) -> u8 {
    value.clamp(0, 10) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_normalization_drops_emoji_and_case() {
        assert_eq!(normalize_label("Feliz 😊"), "feliz");
        assert_eq!(normalize_label("\u{feff}  Agotado  "), "agotado");
        assert_eq!(normalize_label("MUY  Estresado"), "muy estresado");
    }

    #[test]
    fn state_parsing_accepts_both_label_generations() {
        assert_eq!(parse_state("Feliz"), EmotionalState::Happy);
        assert_eq!(parse_state("Happy"), EmotionalState::Happy);
        assert_eq!(parse_state("Estresado 😣"), EmotionalState::Stressed);
        assert_eq!(parse_state("agotada"), EmotionalState::Exhausted);
        assert_eq!(parse_state("meh"), EmotionalState::Unspecified);
        assert_eq!(parse_state(""), EmotionalState::Unspecified);
    }

    #[test]
    fn clock_parsing_keeps_missing_and_unreadable_apart() {
        assert_eq!(parse_clock(None), ClockField::Missing);
        assert_eq!(parse_clock(Some("   ")), ClockField::Missing);
        assert_eq!(
            parse_clock(Some("09:30")),
            ClockField::At(NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"))
        );
        assert_eq!(
            parse_clock(Some("17:45:12")),
            ClockField::At(NaiveTime::from_hms_opt(17, 45, 12).expect("valid time"))
        );
        assert_eq!(
            parse_clock(Some("half past nine")),
            ClockField::Unreadable("half past nine".to_string())
        );
    }

    #[test]
    fn date_normalization_converges_on_iso() {
        assert_eq!(normalize_date(" 2024-01-05 "), "2024-01-05");
        assert_eq!(normalize_date("05/01/2024"), "2024-01-05");
        assert_eq!(normalize_date("2024/01/05"), "2024-01-05");
        assert_eq!(normalize_date("soon"), "soon");
    }

    #[test]
    fn stress_clamps_into_scale() {
        assert_eq!(clamp_stress(-3), 0);
        assert_eq!(clamp_stress(7), 7);
        assert_eq!(clamp_stress(99), 10);
    }
}
