use std::collections::{BTreeMap, BTreeSet, HashMap};

use clap::ValueEnum;
use tracing::debug;

use crate::models::{
    severity_score, Analysis, CategoryScore, DeviceSummary, DeviceType, Period, Priority,
    SeverityStats, SiteSummary, TypedRecord, WeeklyCost,
};

/// How the per-category score is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CategoryMode {
    /// Average of the stored `impact_score` column.
    #[default]
    ImpactScore,
    /// Average of `affected_users * resolution_minutes`.
    #[value(name = "users-x-resolution")]
    UsersTimesResolution,
}

impl CategoryMode {
    pub fn heading(&self) -> &'static str {
        match self {
            CategoryMode::ImpactScore => "average impact score",
            CategoryMode::UsersTimesResolution => "average affected users x resolution minutes",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            CategoryMode::ImpactScore => "Avg Impact Score",
            CategoryMode::UsersTimesResolution => "Avg Users x Min",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub top_n: usize,
    pub big_incident_threshold: i64,
    pub category_mode: CategoryMode,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: 5,
            big_incident_threshold: 100,
            category_mode: CategoryMode::ImpactScore,
        }
    }
}

pub fn analyze(records: &[TypedRecord], config: &AnalysisConfig) -> Analysis {
    let max_week = records
        .iter()
        .map(|r| r.week_number)
        .filter(|w| *w != 0)
        .max()
        .unwrap_or(0);

    let device_counts = device_counts(records);
    let recurring_devices = device_counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(device, count)| (device.clone(), *count))
        .collect();

    let sites: BTreeSet<&str> = records.iter().map(|r| r.site.as_str()).collect();

    let analysis = Analysis {
        total_incidents: records.len(),
        total_cost_sek: records.iter().map(|r| r.cost_sek).sum(),
        sites: sites.into_iter().map(str::to_string).collect(),
        period: compute_period(records),
        max_week,
        per_severity: per_severity(records),
        big_incidents: big_incidents(records, config.big_incident_threshold),
        top_by_cost: top_by_cost(records, config.top_n),
        most_expensive: most_expensive(records).cloned(),
        device_counts,
        recurring_devices,
        site_summaries: site_summaries(records),
        device_summaries: device_summaries(records, max_week),
        category_scores: category_scores(records, config.category_mode),
        weekly_costs: weekly_costs(records),
    };

    debug!(
        incidents = analysis.total_incidents,
        sites = analysis.site_summaries.len(),
        devices = analysis.device_summaries.len(),
        weeks = analysis.weekly_costs.len(),
        "computed aggregate views"
    );

    analysis
}

/// Date span when any date parsed, else the span of known weeks.
pub fn compute_period(records: &[TypedRecord]) -> Period {
    let dates = records.iter().filter_map(|r| r.date_parsed);
    if let (Some(start), Some(end)) = (dates.clone().min(), dates.max()) {
        return Period::Dates { start, end };
    }

    let weeks = records.iter().map(|r| r.week_number).filter(|w| *w != 0);
    match (weeks.clone().min(), weeks.max()) {
        (Some(first), Some(last)) => Period::Weeks { first, last },
        _ => Period::Unknown,
    }
}

pub fn severity_key(severity: &str) -> &str {
    if severity.is_empty() {
        "unknown"
    } else {
        severity
    }
}

pub fn per_severity(records: &[TypedRecord]) -> BTreeMap<String, SeverityStats> {
    let mut groups: BTreeMap<String, (usize, i64, f64)> = BTreeMap::new();

    for record in records {
        let entry = groups
            .entry(severity_key(&record.severity).to_string())
            .or_insert((0, 0, 0.0));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(record.resolution_minutes);
        entry.2 += record.cost_sek;
    }

    groups
        .into_iter()
        .map(|(severity, (count, total_res, total_cost))| {
            let stats = SeverityStats {
                count,
                avg_resolution_minutes: mean(total_res as f64, count).round_ties_even() as i64,
                avg_cost_sek: round_to(mean(total_cost, count), 2),
            };
            (severity, stats)
        })
        .collect()
}

pub fn big_incidents(records: &[TypedRecord], threshold: i64) -> Vec<TypedRecord> {
    records
        .iter()
        .filter(|r| r.affected_users > threshold)
        .cloned()
        .collect()
}

pub fn top_by_cost(records: &[TypedRecord], n: usize) -> Vec<TypedRecord> {
    let mut sorted: Vec<&TypedRecord> = records.iter().collect();
    // Stable: equal costs keep input order.
    sorted.sort_by(|a, b| b.cost_sek.total_cmp(&a.cost_sek));
    sorted.into_iter().take(n).cloned().collect()
}

pub fn most_expensive(records: &[TypedRecord]) -> Option<&TypedRecord> {
    records
        .iter()
        .reduce(|best, r| if r.cost_sek > best.cost_sek { r } else { best })
}

pub fn device_counts(records: &[TypedRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.device_hostname.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn site_summaries(records: &[TypedRecord]) -> Vec<SiteSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut summaries: Vec<SiteSummary> = Vec::new();

    for record in records {
        let slot = *index.entry(record.site.as_str()).or_insert_with(|| {
            summaries.push(SiteSummary {
                site: record.site.clone(),
                count: 0,
                critical: 0,
                high: 0,
                medium: 0,
                low: 0,
                total_resolution_minutes: 0,
                avg_resolution_minutes: 0.0,
                total_cost_sek: 0.0,
            });
            summaries.len() - 1
        });

        let summary = &mut summaries[slot];
        summary.count += 1;
        summary.total_resolution_minutes = summary
            .total_resolution_minutes
            .saturating_add(record.resolution_minutes);
        summary.total_cost_sek += record.cost_sek;
        match record.severity.as_str() {
            "critical" => summary.critical += 1,
            "high" => summary.high += 1,
            "medium" => summary.medium += 1,
            "low" => summary.low += 1,
            _ => {}
        }
    }

    for summary in summaries.iter_mut() {
        summary.avg_resolution_minutes =
            round_to(mean(summary.total_resolution_minutes as f64, summary.count), 1);
    }

    summaries
}

struct DeviceTally {
    hostname: String,
    site: String,
    scores: Vec<u8>,
    total_cost: f64,
    total_users: i64,
    weeks: BTreeSet<i64>,
    recent: bool,
}

/// Problem devices ranked by incident count, then total cost.
pub fn device_summaries(records: &[TypedRecord], max_week: i64) -> Vec<DeviceSummary> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<DeviceTally> = Vec::new();

    for record in records {
        let slot = *index
            .entry(record.device_hostname.as_str())
            .or_insert_with(|| {
                tallies.push(DeviceTally {
                    hostname: record.device_hostname.clone(),
                    site: record.site.clone(),
                    scores: Vec::new(),
                    total_cost: 0.0,
                    total_users: 0,
                    weeks: BTreeSet::new(),
                    recent: false,
                });
                tallies.len() - 1
            });

        let tally = &mut tallies[slot];
        tally.scores.push(severity_score(&record.severity));
        tally.total_cost += record.cost_sek;
        tally.total_users = tally.total_users.saturating_add(record.affected_users);
        if record.week_number != 0 {
            tally.weeks.insert(record.week_number);
            if max_week != 0 && record.week_number >= max_week.saturating_sub(1) {
                tally.recent = true;
            }
        }
    }

    let mut summaries: Vec<DeviceSummary> = tallies
        .into_iter()
        .map(|tally| {
            let count = tally.scores.len();
            let score_total: u32 = tally.scores.iter().map(|s| u32::from(*s)).sum();
            let avg_severity_score = mean(f64::from(score_total), count);
            DeviceSummary {
                device_type: DeviceType::from_hostname(&tally.hostname),
                hostname: tally.hostname,
                site: tally.site,
                count,
                severity_scores: tally.scores,
                avg_severity_score,
                total_cost_sek: tally.total_cost,
                total_affected_users: tally.total_users,
                avg_affected_users: mean(tally.total_users as f64, count),
                active_weeks: tally.weeks.len(),
                recent: tally.recent,
                priority: Priority::from_avg_severity(avg_severity_score),
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| b.total_cost_sek.total_cmp(&a.total_cost_sek))
    });
    summaries
}

pub fn category_scores(
    records: &[TypedRecord],
    mode: CategoryMode,
) -> BTreeMap<String, CategoryScore> {
    let mut groups: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for record in records {
        let sample = match mode {
            CategoryMode::ImpactScore => record.impact_score,
            CategoryMode::UsersTimesResolution => {
                record.affected_users.saturating_mul(record.resolution_minutes) as f64
            }
        };
        let entry = groups.entry(record.category.clone()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += sample;
    }

    groups
        .into_iter()
        .filter(|(_, (count, _))| *count > 0)
        .map(|(category, (count, total))| {
            let score = CategoryScore {
                category: category.clone(),
                count,
                avg_score: round_to(mean(total, count), 1),
            };
            (category, score)
        })
        .collect()
}

/// Weekly totals for weeks 1 through 52; other week numbers are skipped.
pub fn weekly_costs(records: &[TypedRecord]) -> BTreeMap<i64, WeeklyCost> {
    let mut groups: BTreeMap<i64, (usize, f64, f64)> = BTreeMap::new();

    for record in records.iter().filter(|r| (1..=52).contains(&r.week_number)) {
        let entry = groups.entry(record.week_number).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += record.cost_sek;
        entry.2 += record.impact_score;
    }

    groups
        .into_iter()
        .map(|(week, (count, total_cost, impact_total))| {
            let weekly = WeeklyCost {
                week,
                incident_count: count,
                total_cost_sek: total_cost,
                avg_impact_score: round_to(mean(impact_total, count), 2),
            };
            (week, weekly)
        })
        .collect()
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Halves go to the even neighbour, e.g. `0.125` to two places is `0.12`.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}
