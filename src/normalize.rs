use tracing::debug;

use crate::error::AnalysisError;
use crate::models::{Normalized, RawRecord, TypedRecord};
use crate::parse;

pub const UNKNOWN: &str = "UNKNOWN";
pub const NO_TICKET: &str = "-";

const DATE_FIELDS: [&str; 2] = ["date", "incident_date"];

/// Builds one typed record. Never fails; see `parse` for the fallbacks.
pub fn normalize_record(raw: &RawRecord) -> TypedRecord {
    let mut defaulted = Vec::new();
    let field = |name: &str| raw.get(name).map(str::trim).filter(|v| !v.is_empty());

    let mut text = |name: &'static str, default: &str| match field(name) {
        Some(value) => value.to_string(),
        None => {
            defaulted.push(name);
            default.to_string()
        }
    };
    let ticket_id = text("ticket_id", NO_TICKET);
    let device_hostname = text("device_hostname", UNKNOWN);
    let site = text("site", UNKNOWN);
    let category = text("category", UNKNOWN);

    let severity = field("severity")
        .map(str::to_lowercase)
        .unwrap_or_default();
    if severity.is_empty() {
        defaulted.push("severity");
    }

    let mut take = |name: &'static str, normalized: Normalized<i64>| {
        if normalized.defaulted {
            defaulted.push(name);
        }
        normalized.value
    };
    let week_number = take("week_number", parse::int_or(field("week_number"), 0));
    let resolution_minutes = take(
        "resolution_minutes",
        parse::int_or(field("resolution_minutes"), 0),
    );
    let affected_users = take("affected_users", parse::int_or(field("affected_users"), 0));

    let cost = parse::swedish_float(field("cost_sek"));
    if cost.defaulted {
        defaulted.push("cost_sek");
    }
    let impact = parse::swedish_float(field("impact_score"));
    if impact.defaulted {
        defaulted.push("impact_score");
    }

    let date_raw = DATE_FIELDS.iter().find_map(|&name| field(name));
    let date_parsed = parse::parse_date_flex(date_raw);
    if date_parsed.is_none() {
        defaulted.push("date");
    }

    TypedRecord {
        ticket_id,
        device_hostname,
        site,
        category,
        severity,
        week_number,
        resolution_minutes,
        affected_users,
        cost_sek: cost.value,
        impact_score: impact.value,
        date_parsed,
        defaulted,
    }
}

/// Normalizes a full batch. An empty batch is the one fatal condition.
pub fn normalize_all(raw: &[RawRecord]) -> Result<Vec<TypedRecord>, AnalysisError> {
    if raw.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let records: Vec<TypedRecord> = raw.iter().map(normalize_record).collect();
    let degraded = records.iter().filter(|r| !r.defaulted.is_empty()).count();
    let missing_cost = records.iter().filter(|r| r.was_defaulted("cost_sek")).count();
    debug!(
        records = records.len(),
        degraded,
        missing_cost,
        "normalized incident records"
    );

    Ok(records)
}
