use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::models::Normalized;

const THOUSANDS_SEPARATORS: [char; 3] = [' ', '\u{00a0}', '\u{202f}'];

#[derive(Clone, Copy)]
enum YearPosition {
    Leading,
    Trailing,
    Short,
}

/// Tried in order; the first match wins even when a later one is also valid.
const DATE_FORMATS: [(&str, char, YearPosition); 4] = [
    ("%Y-%m-%d", '-', YearPosition::Leading),
    ("%Y/%m/%d", '/', YearPosition::Leading),
    ("%d-%m-%Y", '-', YearPosition::Trailing),
    ("%d/%m/%y", '/', YearPosition::Short),
];

/// Parses `"1 234,50"` style amounts. Missing or malformed input gives `0.0`.
pub fn swedish_float(raw: Option<&str>) -> Normalized<f64> {
    let Some(text) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Normalized::fallback(0.0);
    };

    let cleaned: String = text
        .chars()
        .filter(|c| !THOUSANDS_SEPARATORS.contains(c))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Normalized::parsed(value),
        _ => Normalized::fallback(0.0),
    }
}

pub fn parse_swedish_float(raw: Option<&str>) -> f64 {
    swedish_float(raw).value
}

pub fn int_or(raw: Option<&str>, default: i64) -> Normalized<i64> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(text) => text
            .parse::<i64>()
            .map(Normalized::parsed)
            .unwrap_or_else(|_| Normalized::fallback(default)),
        None => Normalized::fallback(default),
    }
}

pub fn parse_int(raw: Option<&str>, default: i64) -> i64 {
    int_or(raw, default).value
}

pub fn parse_date_flex(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;

    DATE_FORMATS
        .iter()
        .filter(|(_, sep, position)| year_width_matches(text, *sep, *position))
        .find_map(|(fmt, _, _)| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_iso(text))
}

fn year_width_matches(text: &str, sep: char, position: YearPosition) -> bool {
    let year = match position {
        YearPosition::Leading => text.split(sep).next(),
        YearPosition::Trailing => text.rsplit(sep).next(),
        YearPosition::Short => return true,
    };
    year.is_some_and(|y| y.len() == 4 && y.chars().all(|c| c.is_ascii_digit()))
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.date());
        }
    }

    // Basic format, e.g. 20240305.
    if text.len() == 8 && text.chars().all(|c| c.is_ascii_digit()) {
        let year = text[0..4].parse().ok()?;
        let month = text[4..6].parse().ok()?;
        let day = text[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    None
}
