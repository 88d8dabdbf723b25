use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.fields.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized<T> {
    pub value: T,
    pub defaulted: bool,
}

impl<T> Normalized<T> {
    pub fn parsed(value: T) -> Self {
        Self {
            value,
            defaulted: false,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            defaulted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedRecord {
    pub ticket_id: String,
    pub device_hostname: String,
    pub site: String,
    pub category: String,
    pub severity: String,
    pub week_number: i64,
    pub resolution_minutes: i64,
    pub affected_users: i64,
    pub cost_sek: f64,
    pub impact_score: f64,
    pub date_parsed: Option<NaiveDate>,
    /// Names of the fields whose value was filled in by a default.
    pub defaulted: Vec<&'static str>,
}

impl TypedRecord {
    pub fn was_defaulted(&self, field: &str) -> bool {
        self.defaulted.iter().any(|name| *name == field)
    }
}

pub fn severity_score(severity: &str) -> u8 {
    match severity {
        "critical" => 4,
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Switch,
    AccessPoint,
    Router,
    Firewall,
    LoadBalancer,
    Other,
}

impl DeviceType {
    pub fn from_hostname(hostname: &str) -> Self {
        let prefix = hostname.split('-').next().unwrap_or_default();
        match prefix {
            "SW" => DeviceType::Switch,
            "AP" => DeviceType::AccessPoint,
            "RT" => DeviceType::Router,
            "FW" => DeviceType::Firewall,
            "LB" => DeviceType::LoadBalancer,
            _ => DeviceType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Switch => "switch",
            DeviceType::AccessPoint => "access_point",
            DeviceType::Router => "router",
            DeviceType::Firewall => "firewall",
            DeviceType::LoadBalancer => "load_balancer",
            DeviceType::Other => "other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_avg_severity(avg: f64) -> Self {
        if avg >= 3.5 {
            Priority::Critical
        } else if avg >= 2.5 {
            Priority::High
        } else if avg >= 1.5 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    Dates { start: NaiveDate, end: NaiveDate },
    Weeks { first: i64, last: i64 },
    Unknown,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Dates { start, end } => write!(f, "{start} to {end}"),
            Period::Weeks { first, last } if first == last => write!(f, "Week {first}"),
            Period::Weeks { first, last } => write!(f, "Weeks {first}-{last}"),
            Period::Unknown => f.write_str("Unknown period"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityStats {
    pub count: usize,
    pub avg_resolution_minutes: i64,
    pub avg_cost_sek: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSummary {
    pub site: String,
    pub count: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total_resolution_minutes: i64,
    pub avg_resolution_minutes: f64,
    pub total_cost_sek: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSummary {
    pub hostname: String,
    pub site: String,
    pub device_type: DeviceType,
    pub count: usize,
    pub severity_scores: Vec<u8>,
    pub avg_severity_score: f64,
    pub total_cost_sek: f64,
    pub total_affected_users: i64,
    pub avg_affected_users: f64,
    pub active_weeks: usize,
    pub recent: bool,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub count: usize,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyCost {
    pub week: i64,
    pub incident_count: usize,
    pub total_cost_sek: f64,
    pub avg_impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub total_incidents: usize,
    pub total_cost_sek: f64,
    pub sites: Vec<String>,
    pub period: Period,
    pub max_week: i64,
    pub per_severity: BTreeMap<String, SeverityStats>,
    pub big_incidents: Vec<TypedRecord>,
    pub top_by_cost: Vec<TypedRecord>,
    pub most_expensive: Option<TypedRecord>,
    pub device_counts: BTreeMap<String, usize>,
    pub recurring_devices: BTreeMap<String, usize>,
    pub site_summaries: Vec<SiteSummary>,
    pub device_summaries: Vec<DeviceSummary>,
    pub category_scores: BTreeMap<String, CategoryScore>,
    pub weekly_costs: BTreeMap<i64, WeeklyCost>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_follows_hostname_prefix() {
        assert_eq!(DeviceType::from_hostname("SW-DC-TOR-02"), DeviceType::Switch);
        assert_eq!(DeviceType::from_hostname("AP-FLOOR2-02"), DeviceType::AccessPoint);
        assert_eq!(DeviceType::from_hostname("ap-floor2-02"), DeviceType::Other);
        assert_eq!(DeviceType::from_hostname("LB-EDGE"), DeviceType::LoadBalancer);
        assert_eq!(DeviceType::from_hostname("UNKNOWN"), DeviceType::Other);
        assert_eq!(DeviceType::from_hostname(""), DeviceType::Other);
    }

    #[test]
    fn period_renders_each_tier() {
        let dates = Period::Dates {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 28).unwrap(),
        };
        assert_eq!(dates.to_string(), "2024-03-01 to 2024-03-28");
        assert_eq!(Period::Weeks { first: 7, last: 7 }.to_string(), "Week 7");
        assert_eq!(Period::Weeks { first: 3, last: 7 }.to_string(), "Weeks 3-7");
        assert_eq!(Period::Unknown.to_string(), "Unknown period");
    }

    #[test]
    fn priority_tiers_from_average_score() {
        assert_eq!(Priority::from_avg_severity(4.0), Priority::Critical);
        assert_eq!(Priority::from_avg_severity(3.5), Priority::Critical);
        assert_eq!(Priority::from_avg_severity(3.0), Priority::High);
        assert_eq!(Priority::from_avg_severity(2.0), Priority::Medium);
        assert_eq!(Priority::from_avg_severity(0.5), Priority::Low);
    }

    #[test]
    fn raw_record_lookup() {
        let raw = RawRecord::new().with("site", "Lager");
        assert_eq!(raw.get("site"), Some("Lager"));
        assert_eq!(raw.get("missing"), None);
    }
}
