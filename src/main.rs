use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use incident_rollup::analysis::{self, AnalysisConfig, CategoryMode};
use incident_rollup::models::Analysis;
use incident_rollup::{normalize, output, report, source};

#[derive(Parser)]
#[command(name = "incident-rollup")]
#[command(about = "Network incident log analysis and cost rollups", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Incident log in CSV form
    #[arg(long, default_value = "network_incidents.csv")]
    input: PathBuf,
    /// Field delimiter; sniffed from the header line when omitted
    #[arg(long)]
    delimiter: Option<char>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the site, device and weekly tables plus the text report
    Analyze {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, default_value = "incident_analysis.txt")]
        report_name: String,
        #[arg(long, default_value_t = 5)]
        top_n: usize,
        #[arg(long, default_value_t = 100)]
        big_threshold: i64,
        #[arg(long, value_enum, default_value_t = CategoryMode::ImpactScore)]
        category_mode: CategoryMode,
        #[arg(long, default_value = "TechCorp AB")]
        organization: String,
        /// Also dump every aggregate view as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a severity and device digest without writing files
    Summary {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn load(input: &InputArgs, config: &AnalysisConfig) -> anyhow::Result<Analysis> {
    let delimiter = input
        .delimiter
        .map(|c| u8::try_from(c).context("delimiter must be a single-byte character"))
        .transpose()?;

    let raw = source::read_records(&input.input, delimiter)?;
    let records = normalize::normalize_all(&raw)
        .with_context(|| format!("nothing to analyze in {}", input.input.display()))?;
    Ok(analysis::analyze(&records, config))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            out_dir,
            report_name,
            top_n,
            big_threshold,
            category_mode,
            organization,
            json,
        } => {
            let config = AnalysisConfig {
                top_n,
                big_incident_threshold: big_threshold,
                category_mode,
            };
            let analysis = load(&input, &config)?;
            let report = report::build_report(
                &analysis,
                &report::ReportOptions {
                    organization,
                    big_incident_threshold: big_threshold,
                    category_mode,
                },
            );
            let files = output::write_all(&out_dir, &analysis, &report, &report_name, json)?;
            info!(incidents = analysis.total_incidents, "analysis complete");
            println!(
                "{} created ({} incidents)",
                files.report.display(),
                analysis.total_incidents
            );
        }
        Commands::Summary { input, limit } => {
            let analysis = load(&input, &AnalysisConfig::default())?;
            print!("{}", report::build_summary(&analysis, limit));
        }
    }

    Ok(())
}
