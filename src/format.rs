use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;

use crate::models::{DeviceSummary, SeverityStats, SiteSummary, WeeklyCost};

/// `1234.5` becomes `"1 234,50"`. Non-finite input renders as `"0,00"`.
pub fn format_sek(value: f64) -> String {
    format_decimal_comma_grouped(value, 2, true)
}

pub fn format_decimal_comma(value: f64, places: usize) -> String {
    format_decimal_comma_grouped(value, places, false)
}

fn format_decimal_comma_grouped(value: f64, places: usize, grouped: bool) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    // -0.001 rounds to zero and should not keep its sign.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    for (i, digit) in int_part.chars().enumerate() {
        if grouped && i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(digit);
    }
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub width: usize,
    pub align: Align,
}

impl Column {
    pub const fn left(width: usize) -> Self {
        Self {
            width,
            align: Align::Left,
        }
    }

    pub const fn right(width: usize) -> Self {
        Self {
            width,
            align: Align::Right,
        }
    }

    pub const fn center(width: usize) -> Self {
        Self {
            width,
            align: Align::Center,
        }
    }
}

/// Pads each value to its column and joins with `sep`, ending in a newline.
pub fn format_columns<T: Display>(values: &[T], columns: &[Column], sep: &str) -> String {
    let cells: Vec<String> = values
        .iter()
        .zip(columns)
        .map(|(value, column)| {
            let width = column.width;
            match column.align {
                Align::Left => format!("{value:<width$}"),
                Align::Right => format!("{value:>width$}"),
                Align::Center => format!("{value:^width$}"),
            }
        })
        .collect();

    let mut line = cells.join(sep);
    line.push('\n');
    line
}

/// Display order: critical, high, medium, low, then everything else.
pub fn severity_rank(severity: &str) -> u8 {
    match severity {
        "critical" => 1,
        "high" => 2,
        "medium" => 3,
        "low" => 4,
        _ => 99,
    }
}

pub fn ordered_severities(
    per_severity: &BTreeMap<String, SeverityStats>,
) -> Vec<(&str, &SeverityStats)> {
    let mut ordered: Vec<(&str, &SeverityStats)> = per_severity
        .iter()
        .map(|(severity, stats)| (severity.as_str(), stats))
        .collect();
    ordered.sort_by_key(|(severity, _)| severity_rank(severity));
    ordered
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteRow {
    #[serde(rename = "Site")]
    pub site: String,
    #[serde(rename = "Total Incidents")]
    pub total: usize,
    #[serde(rename = "Critical Incidents")]
    pub critical: usize,
    #[serde(rename = "High Incidents")]
    pub high: usize,
    #[serde(rename = "Medium Incidents")]
    pub medium: usize,
    #[serde(rename = "Low Incidents")]
    pub low: usize,
    #[serde(rename = "Avg Resolution (min)")]
    pub avg_resolution: String,
    #[serde(rename = "Total Cost (SEK)")]
    pub total_cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub device_hostname: String,
    pub site: String,
    pub device_type: String,
    pub incident_count: usize,
    pub avg_severity_score: String,
    pub total_cost_sek: String,
    pub avg_affected_users: String,
    pub in_last_weeks_warnings: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyRow {
    pub week_number: i64,
    pub avg_impact_score: String,
    pub total_cost_sek: String,
}

pub fn site_rows(summaries: &[SiteSummary]) -> Vec<SiteRow> {
    summaries
        .iter()
        .map(|s| SiteRow {
            site: s.site.clone(),
            total: s.count,
            critical: s.critical,
            high: s.high,
            medium: s.medium,
            low: s.low,
            avg_resolution: format!("{:.1}", s.avg_resolution_minutes),
            total_cost: format_sek(s.total_cost_sek),
        })
        .collect()
}

pub fn device_rows(summaries: &[DeviceSummary]) -> Vec<DeviceRow> {
    summaries
        .iter()
        .map(|d| DeviceRow {
            device_hostname: d.hostname.clone(),
            site: d.site.clone(),
            device_type: d.device_type.to_string(),
            incident_count: d.count,
            avg_severity_score: format!("{:.2}", d.avg_severity_score),
            total_cost_sek: format_sek(d.total_cost_sek),
            avg_affected_users: format!("{:.2}", d.avg_affected_users),
            in_last_weeks_warnings: if d.recent { "yes" } else { "no" }.to_string(),
        })
        .collect()
}

pub fn weekly_rows(weekly: &BTreeMap<i64, WeeklyCost>) -> Vec<WeeklyRow> {
    weekly
        .values()
        .map(|w| WeeklyRow {
            week_number: w.week,
            avg_impact_score: format_decimal_comma(w.avg_impact_score, 2),
            total_cost_sek: format_sek(w.total_cost_sek),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_swedish_float;

    #[test]
    fn sek_uses_space_groups_and_decimal_comma() {
        assert_eq!(format_sek(1234.5), "1 234,50");
        assert_eq!(format_sek(86048.0), "86 048,00");
        assert_eq!(format_sek(1234567.891), "1 234 567,89");
        assert_eq!(format_sek(999.999), "1 000,00");
        assert_eq!(format_sek(0.0), "0,00");
        assert_eq!(format_sek(-1234.5), "-1 234,50");
        assert_eq!(format_sek(-0.001), "0,00");
        assert_eq!(format_sek(f64::NAN), "0,00");
    }

    #[test]
    fn sek_round_trips_canonical_text() {
        for text in ["0,00", "50,00", "1 000,00", "12 345,67", "1 234 567,89"] {
            assert_eq!(format_sek(parse_swedish_float(Some(text))), text);
        }
    }

    #[test]
    fn decimal_comma_without_grouping() {
        assert_eq!(format_decimal_comma(3.25, 2), "3,25");
        assert_eq!(format_decimal_comma(1234.0, 1), "1234,0");
        assert_eq!(format_decimal_comma(7.0, 0), "7");
    }

    #[test]
    fn capitalize_labels() {
        assert_eq!(capitalize("critical"), "Critical");
        assert_eq!(capitalize("hIGH"), "High");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn columns_pad_and_align() {
        let line = format_columns(
            &["ab", "7", "mid"],
            &[Column::left(4), Column::right(3), Column::center(7)],
            "|",
        );
        assert_eq!(line, "ab  |  7|  mid  \n");
    }

    #[test]
    fn overlong_values_are_not_truncated() {
        let line = format_columns(&["overflowing"], &[Column::left(4)], " ");
        assert_eq!(line, "overflowing\n");
    }

    #[test]
    fn severities_in_display_order() {
        let stats = SeverityStats {
            count: 1,
            avg_resolution_minutes: 0,
            avg_cost_sek: 0.0,
        };
        let per_severity: BTreeMap<String, SeverityStats> =
            ["unknown", "low", "critical", "bogus", "high", "medium"]
                .into_iter()
                .map(|s| (s.to_string(), stats.clone()))
                .collect();
        let order: Vec<&str> = ordered_severities(&per_severity)
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        assert_eq!(
            order,
            vec!["critical", "high", "medium", "low", "bogus", "unknown"]
        );
    }

    #[test]
    fn weekly_rows_use_decimal_comma() {
        let mut weekly = BTreeMap::new();
        weekly.insert(
            3,
            WeeklyCost {
                week: 3,
                incident_count: 2,
                total_cost_sek: 4500.5,
                avg_impact_score: 6.75,
            },
        );
        let rows = weekly_rows(&weekly);
        assert_eq!(rows[0].avg_impact_score, "6,75");
        assert_eq!(rows[0].total_cost_sek, "4 500,50");
    }
}
