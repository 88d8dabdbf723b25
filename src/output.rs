use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use crate::format::{device_rows, site_rows, weekly_rows};
use crate::models::Analysis;

pub const SITE_FILE: &str = "incidents_by_site.csv";
pub const DEVICE_FILE: &str = "problem_devices.csv";
pub const WEEKLY_FILE: &str = "cost_analysis.csv";
pub const JSON_FILE: &str = "incident_analysis.json";

#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub sites: PathBuf,
    pub devices: PathBuf,
    pub weekly: PathBuf,
    pub report: PathBuf,
    pub json: Option<PathBuf>,
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = rows.len(), "wrote table");
    Ok(())
}

/// Writes the tables, the text report and optionally the JSON dump.
pub fn write_all(
    out_dir: &Path,
    analysis: &Analysis,
    report: &str,
    report_name: &str,
    json: bool,
) -> anyhow::Result<WrittenFiles> {
    // Render everything first so a failure leaves no half-written set behind.
    let sites = site_rows(&analysis.site_summaries);
    let devices = device_rows(&analysis.device_summaries);
    let weekly = weekly_rows(&analysis.weekly_costs);
    let json_body = if json {
        Some(serde_json::to_string_pretty(analysis).context("failed to serialize analysis")?)
    } else {
        None
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let files = WrittenFiles {
        sites: out_dir.join(SITE_FILE),
        devices: out_dir.join(DEVICE_FILE),
        weekly: out_dir.join(WEEKLY_FILE),
        report: out_dir.join(report_name),
        json: json_body.as_ref().map(|_| out_dir.join(JSON_FILE)),
    };

    write_csv(&files.sites, &sites)?;
    write_csv(&files.devices, &devices)?;
    write_csv(&files.weekly, &weekly)?;

    fs::write(&files.report, report)
        .with_context(|| format!("failed to write {}", files.report.display()))?;
    info!(path = %files.report.display(), "wrote report");

    if let (Some(path), Some(body)) = (&files.json, &json_body) {
        fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote json summary");
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisConfig};
    use crate::models::RawRecord;
    use crate::normalize::normalize_all;

    fn analysis() -> Analysis {
        let records = normalize_all(&[
            RawRecord::new()
                .with("device_hostname", "SW-DC-TOR-02")
                .with("site", "Datacenter")
                .with("severity", "critical")
                .with("week_number", "5")
                .with("cost_sek", "1 000,00")
                .with("impact_score", "7,5"),
            RawRecord::new()
                .with("device_hostname", "SW-DC-TOR-02")
                .with("site", "Datacenter")
                .with("severity", "high")
                .with("week_number", "6")
                .with("cost_sek", "250,50")
                .with("impact_score", "6"),
        ])
        .unwrap();
        analyze(&records, &AnalysisConfig::default())
    }

    #[test]
    fn writes_tables_with_expected_headers() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_all(dir.path(), &analysis(), "report body\n", "report.txt", false).unwrap();

        let sites = fs::read_to_string(&files.sites).unwrap();
        let mut lines = sites.lines();
        assert_eq!(
            lines.next(),
            Some("Site,Total Incidents,Critical Incidents,High Incidents,Medium Incidents,Low Incidents,Avg Resolution (min),Total Cost (SEK)")
        );
        assert_eq!(lines.next(), Some("Datacenter,2,1,1,0,0,0.0,\"1 250,50\""));

        let devices = fs::read_to_string(&files.devices).unwrap();
        assert!(devices.starts_with(
            "device_hostname,site,device_type,incident_count,avg_severity_score,total_cost_sek,avg_affected_users,in_last_weeks_warnings\n"
        ));
        assert!(devices.contains("SW-DC-TOR-02,Datacenter,switch,2,3.50,\"1 250,50\",0.00,yes"));

        let weekly = fs::read_to_string(&files.weekly).unwrap();
        assert_eq!(
            weekly,
            "week_number,avg_impact_score,total_cost_sek\n5,\"7,50\",\"1 000,00\"\n6,\"6,00\",\"250,50\"\n"
        );

        assert_eq!(fs::read_to_string(&files.report).unwrap(), "report body\n");
        assert!(files.json.is_none());
        assert!(!dir.path().join(JSON_FILE).exists());
    }

    #[test]
    fn json_dump_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_all(dir.path(), &analysis(), "", "report.txt", true).unwrap();
        let body = fs::read_to_string(files.json.unwrap()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["total_incidents"], 2);
        assert_eq!(value["period"]["kind"], "weeks");
    }
}
