use std::fmt::Write;

use crate::format::{
    capitalize, format_columns, format_decimal_comma, format_sek, ordered_severities, Column,
};
use crate::analysis::CategoryMode;
use crate::models::{Analysis, DeviceSummary, Priority, TypedRecord};

const WIDE: usize = 90;
const NARROW: usize = 75;
const CELL: Column = Column::left(18);

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub organization: String,
    pub big_incident_threshold: i64,
    pub category_mode: CategoryMode,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            organization: "TechCorp AB".to_string(),
            big_incident_threshold: 100,
            category_mode: CategoryMode::ImpactScore,
        }
    }
}

fn rule(width: usize) -> String {
    "=".repeat(width)
}

fn heading(output: &mut String, title: &str, width: usize) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", rule(width));
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", rule(width));
}

fn banner(output: &mut String, title: &str) {
    let _ = writeln!(output, "{}", rule(WIDE));
    output.push_str(&format_columns(
        &["|", title, "|"],
        &[Column::left(1), Column::center(WIDE - 2), Column::left(1)],
        "",
    ));
    let _ = writeln!(output, "{}", rule(WIDE));
}

pub fn build_report(analysis: &Analysis, options: &ReportOptions) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}", rule(WIDE));
    output.push_str(&format_columns(
        &[
            format!("INCIDENT ANALYSIS - {}", options.organization),
            format!("Report period: {}", analysis.period),
        ],
        &[Column::left(45), Column::right(40)],
        " ",
    ));
    let _ = writeln!(output, "{}", rule(WIDE));
    let _ = writeln!(output, "Sites covered: {}", analysis.sites.join(", "));
    let _ = writeln!(output);
    let _ = writeln!(output, "Total incidents: {}", analysis.total_incidents);
    let _ = writeln!(output, "Total cost (SEK): {}", format_sek(analysis.total_cost_sek));
    let _ = writeln!(output);

    write_highlights(&mut output, analysis);
    write_severity_table(&mut output, analysis);
    write_big_incidents(&mut output, analysis, options.big_incident_threshold);
    write_top_by_cost(&mut output, analysis);
    write_category_table(&mut output, analysis, options.category_mode);
    write_recommendations(&mut output, analysis);

    let _ = writeln!(output);
    banner(&mut output, "END OF REPORT");

    output
}

fn write_highlights(output: &mut String, analysis: &Analysis) {
    heading(output, "Executive Summary:", WIDE);

    match analysis.device_summaries.first() {
        Some(device) if device.count > 1 => {
            let _ = writeln!(
                output,
                "⚠ CRITICAL: {} stands out as the most frequent device with repeated failures",
                device.hostname
            );
            let _ = writeln!(
                output,
                "({} incidents across {} weeks)",
                device.count, device.active_weeks
            );
        }
        _ => {
            let _ = writeln!(output, "✓ No device had repeated failures in this period");
        }
    }
    let _ = writeln!(output);

    if let Some(record) = &analysis.most_expensive {
        let _ = writeln!(
            output,
            "⚠ Most expensive incident: {} SEK (Ticket {}, {}, {})",
            format_sek(record.cost_sek),
            record.ticket_id,
            record.device_hostname,
            record.site
        );
        let _ = writeln!(output);
    }

    let total = analysis.total_incidents;
    let critical = analysis
        .per_severity
        .get("critical")
        .map(|stats| stats.count)
        .unwrap_or(0);
    let non_critical = total - critical;
    if non_critical * 2 > total {
        let _ = writeln!(
            output,
            "✓ Majority of incidents were non-critical ({non_critical} of {total})"
        );
    } else {
        let _ = writeln!(
            output,
            "⚠ Critical incidents make up {critical} of {total} incidents"
        );
    }
    let _ = writeln!(output);
}

fn write_severity_table(output: &mut String, analysis: &Analysis) {
    let columns = [CELL; 4];
    heading(output, "Incidents by severity:", NARROW);
    output.push_str(&format_columns(
        &["Severity", "Count", "Avg Res (min)", "Avg Cost (SEK)"],
        &columns,
        " ",
    ));
    let _ = writeln!(output, "{}", "-".repeat(NARROW));

    for (severity, stats) in ordered_severities(&analysis.per_severity) {
        output.push_str(&format_columns(
            &[
                capitalize(severity),
                stats.count.to_string(),
                stats.avg_resolution_minutes.to_string(),
                format_sek(stats.avg_cost_sek),
            ],
            &columns,
            " ",
        ));
    }
}

fn write_record_table(
    output: &mut String,
    title: &str,
    fourth: (&str, fn(&TypedRecord) -> String),
    records: &[TypedRecord],
) {
    let (fourth_header, fourth_value) = fourth;
    let columns = [CELL; 5];
    let _ = writeln!(output);
    heading(output, title, WIDE);
    output.push_str(&format_columns(
        &["Ticket", "Device", "Site", fourth_header, "Cost (SEK)"],
        &columns,
        " ",
    ));
    let _ = writeln!(output, "{}", "-".repeat(WIDE));

    for record in records {
        output.push_str(&format_columns(
            &[
                record.ticket_id.clone(),
                record.device_hostname.clone(),
                record.site.clone(),
                fourth_value(record),
                format_sek(record.cost_sek),
            ],
            &columns,
            " ",
        ));
    }
}

fn write_big_incidents(output: &mut String, analysis: &Analysis, threshold: i64) {
    let title = format!(
        "Incidents affecting more than {} users ({})",
        threshold,
        analysis.big_incidents.len()
    );
    write_record_table(
        output,
        &title,
        ("Affected Users", |r| r.affected_users.to_string()),
        &analysis.big_incidents,
    );
}

fn write_top_by_cost(output: &mut String, analysis: &Analysis) {
    let title = format!("Top {} incidents by cost:", analysis.top_by_cost.len());
    write_record_table(
        output,
        &title,
        ("Category", |r| r.category.clone()),
        &analysis.top_by_cost,
    );
}

fn write_category_table(output: &mut String, analysis: &Analysis, mode: CategoryMode) {
    let columns = [CELL; 3];
    let _ = writeln!(output);
    let title = format!("Incidents per category with {}:", mode.heading());
    heading(output, &title, NARROW);
    output.push_str(&format_columns(
        &["Category", "Count", mode.column()],
        &columns,
        " ",
    ));
    let _ = writeln!(output, "{}", "-".repeat(NARROW));

    for (category, score) in &analysis.category_scores {
        output.push_str(&format_columns(
            &[
                category.clone(),
                score.count.to_string(),
                format_decimal_comma(score.avg_score, 1),
            ],
            &columns,
            " ",
        ));
    }
}

fn recommended_action(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "Replace or add redundancy, perform root cause analysis",
        Priority::High => "Review configuration and redundancy",
        Priority::Medium => "Increase monitoring, check capacity",
        Priority::Low => "Monitor, address during planned maintenance",
    }
}

fn write_recommendations(output: &mut String, analysis: &Analysis) {
    let _ = writeln!(output);
    let _ = writeln!(output);
    banner(output, "RECOMMENDATIONS");
    let _ = writeln!(output);

    // Recurring devices get an individual entry; everything else is summarized under LOW.
    let (recurring, rest): (Vec<&DeviceSummary>, Vec<&DeviceSummary>) = analysis
        .device_summaries
        .iter()
        .partition(|d| d.count > 1 && d.priority != Priority::Low);

    for priority in [Priority::Critical, Priority::High, Priority::Medium] {
        let devices: Vec<&&DeviceSummary> =
            recurring.iter().filter(|d| d.priority == priority).collect();
        if devices.is_empty() {
            continue;
        }

        let _ = writeln!(output, "{}", priority.label());
        for device in devices {
            let _ = writeln!(
                output,
                ". {} ({}, {}) - {} incidents, {} SEK, severity {:.1}, {} users affected",
                device.hostname,
                device.site,
                device.device_type,
                device.count,
                format_sek(device.total_cost_sek),
                device.avg_severity_score,
                device.total_affected_users
            );
            let _ = writeln!(output, "> {}", recommended_action(priority));
            let _ = writeln!(output);
        }
    }

    if !rest.is_empty() {
        let examples: Vec<&str> = rest.iter().take(3).map(|d| d.hostname.as_str()).collect();
        let _ = writeln!(output, "{}", Priority::Low.label());
        let _ = writeln!(
            output,
            ". {} devices with isolated or low-severity incidents (e.g. {})",
            rest.len(),
            examples.join(", ")
        );
        let _ = writeln!(output, "> {}", recommended_action(Priority::Low));
        let _ = writeln!(output);
    }
}

pub fn build_summary(analysis: &Analysis, limit: usize) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} incidents, {} SEK, {}",
        analysis.total_incidents,
        format_sek(analysis.total_cost_sek),
        analysis.period
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "By severity:");
    for (severity, stats) in ordered_severities(&analysis.per_severity) {
        let _ = writeln!(
            output,
            "- {}: {} incidents (avg {} min, avg {} SEK)",
            capitalize(severity),
            stats.count,
            stats.avg_resolution_minutes,
            format_sek(stats.avg_cost_sek)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Top problem devices:");
    for device in analysis.device_summaries.iter().take(limit) {
        let _ = writeln!(
            output,
            "- {} ({}, {}) score {:.2} across {} incidents{}",
            device.hostname,
            device.site,
            device.device_type,
            device.avg_severity_score,
            device.count,
            if device.recent { ", recent" } else { "" }
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisConfig};
    use crate::models::RawRecord;
    use crate::normalize::normalize_all;

    fn raw(
        ticket: &str,
        device: &str,
        site: &str,
        severity: &str,
        users: &str,
        cost: &str,
        week: &str,
    ) -> RawRecord {
        RawRecord::new()
            .with("ticket_id", ticket)
            .with("device_hostname", device)
            .with("site", site)
            .with("category", "hardware")
            .with("severity", severity)
            .with("affected_users", users)
            .with("cost_sek", cost)
            .with("week_number", week)
            .with("impact_score", "6,5")
    }

    fn sample_analysis() -> Analysis {
        let records = normalize_all(&[
            raw("INC-1", "SW-DC-TOR-02", "Datacenter", "critical", "150", "40 000,00", "1"),
            raw("INC-2", "SW-DC-TOR-02", "Datacenter", "critical", "20", "46 048,00", "2"),
            raw("INC-3", "AP-FLOOR2-02", "Huvudkontor", "low", "5", "500,00", "2"),
            raw("INC-4", "RT-LAGER-01", "Lager", "medium", "12", "1 200,00", "2"),
        ])
        .unwrap();
        analyze(&records, &AnalysisConfig::default())
    }

    #[test]
    fn report_sections_appear_in_order() {
        let report = build_report(&sample_analysis(), &ReportOptions::default());
        let sections = [
            "INCIDENT ANALYSIS - TechCorp AB",
            "Sites covered: Datacenter, Huvudkontor, Lager",
            "Total cost (SEK): 87 748,00",
            "Executive Summary:",
            "Incidents by severity:",
            "Incidents affecting more than 100 users (1)",
            "Top 4 incidents by cost:",
            "Incidents per category with average impact score:",
            "RECOMMENDATIONS",
            "END OF REPORT",
        ];
        let mut cursor = 0;
        for section in sections {
            let found = report[cursor..]
                .find(section)
                .unwrap_or_else(|| panic!("missing or out of order: {section}"));
            cursor += found + section.len();
        }
    }

    #[test]
    fn highlights_name_computed_devices() {
        let report = build_report(&sample_analysis(), &ReportOptions::default());
        assert!(report.contains("SW-DC-TOR-02 stands out as the most frequent device"));
        assert!(report.contains("(2 incidents across 2 weeks)"));
        assert!(report.contains("Most expensive incident: 46 048,00 SEK (Ticket INC-2, SW-DC-TOR-02, Datacenter)"));
        assert!(!report.contains("Majority of incidents were non-critical"));
        assert!(report.contains("Critical incidents make up 2 of 4 incidents"));
        assert!(report.contains("Report period: Weeks 1-2"));
    }

    #[test]
    fn severity_rows_are_capitalized_in_priority_order() {
        let report = build_report(&sample_analysis(), &ReportOptions::default());
        let table = &report[report.find("Incidents by severity:").unwrap()..];
        let critical = table.find("Critical ").unwrap();
        let medium = table.find("Medium ").unwrap();
        let low = table.find("Low ").unwrap();
        assert!(critical < medium && medium < low);
    }

    #[test]
    fn recommendations_follow_device_tiers() {
        let report = build_report(&sample_analysis(), &ReportOptions::default());
        assert!(report.contains("CRITICAL\n. SW-DC-TOR-02 (Datacenter, switch) - 2 incidents, 86 048,00 SEK"));
        assert!(report.contains("> Replace or add redundancy, perform root cause analysis"));
        assert!(report.contains("2 devices with isolated or low-severity incidents (e.g. RT-LAGER-01, AP-FLOOR2-02)"));
    }

    #[test]
    fn category_table_names_the_score_in_use() {
        let default_report = build_report(&sample_analysis(), &ReportOptions::default());
        assert!(default_report.contains("Incidents per category with average impact score:"));
        assert!(default_report.contains("Avg Impact Score"));

        let options = ReportOptions {
            category_mode: CategoryMode::UsersTimesResolution,
            ..ReportOptions::default()
        };
        let report = build_report(&sample_analysis(), &options);
        assert!(report.contains(
            "Incidents per category with average affected users x resolution minutes:"
        ));
        assert!(report.contains("Avg Users x Min"));
        assert!(!report.contains("Avg Impact Score"));
    }

    #[test]
    fn summary_lists_devices_up_to_limit() {
        let summary = build_summary(&sample_analysis(), 2);
        assert!(summary.starts_with("4 incidents, 87 748,00 SEK, Weeks 1-2"));
        assert!(summary.contains("- SW-DC-TOR-02 (Datacenter, switch) score 4.00 across 2 incidents, recent"));
        assert!(summary.contains("- RT-LAGER-01"));
        assert!(!summary.contains("AP-FLOOR2-02"));
    }
}
