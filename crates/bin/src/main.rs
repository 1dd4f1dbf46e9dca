//! Hobart CLI binary.
//!
//! Runs the windowed analytics pipeline over metric observations and writes
//! the report, a per-category summary, or the risk cohort report.

mod settings;

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use hobart::{Report, run_report};
use hobart_analytics::{PipelineConfig, monthly_cohorts};
use hobart_data::{CsvSource, ObservationSource, SqliteStore, load_risk_records};
use hobart_output::{ExportFormat, Exporter, cohort_ascii_table};
use indicatif::{ProgressBar, ProgressStyle};
use settings::Settings;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: windowed analytics over metric observations", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Configuration file (default: hobart.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// CSV file with columns id,created_at,updated_at,metric,category
    #[arg(long, required_unless_present = "sqlite", conflicts_with = "sqlite")]
    input: Option<PathBuf>,

    /// SQLite database holding the observations
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Table to read from the SQLite database
    #[arg(long, default_value = "metrics")]
    table: String,

    /// Keep observations created on or after this timestamp
    #[arg(long)]
    cutoff: Option<String>,

    /// Timestamp "time since" columns are measured against (default: now, UTC)
    #[arg(long)]
    run_timestamp: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and write one report row per observation
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// csv, json or pretty-json (default: from the output extension)
        #[arg(long)]
        format: Option<ExportFormat>,
    },

    /// Run the pipeline and print a per-category summary
    Stats {
        #[command(flatten)]
        source: SourceArgs,

        /// Summary format
        #[arg(long, value_enum, default_value = "text")]
        format: SummaryFormat,
    },

    /// Aggregate customer risk records into monthly segment cohorts
    Cohort {
        /// CSV file of customer risk records
        #[arg(long)]
        input: PathBuf,

        /// Output file (default: table on stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// csv, json or pretty-json (default: from the output extension)
        #[arg(long)]
        format: Option<ExportFormat>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Text,
    Markdown,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "hobart=info".into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            source,
            output,
            format,
        } => {
            let report = execute(cli.config.as_deref(), &source)?;
            write_export(&report.rows, output.as_deref(), format)?;
        }
        Commands::Stats { source, format } => {
            let report = execute(cli.config.as_deref(), &source)?;
            let summary = report.summary();
            match format {
                SummaryFormat::Text => print!("{}", summary.to_ascii_table()),
                SummaryFormat::Markdown => print!("{}", summary.to_markdown()),
                SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            }
        }
        Commands::Cohort {
            input,
            output,
            format,
        } => {
            let records = load_risk_records(&input)?;
            let cohorts = monthly_cohorts(&records);
            tracing::info!(
                records = records.len(),
                cohorts = cohorts.len(),
                "risk cohorts computed"
            );
            if output.is_none() && format.is_none() {
                print!("{}", cohort_ascii_table(&cohorts));
            } else {
                write_export(&cohorts, output.as_deref(), format)?;
            }
        }
    }

    Ok(())
}

/// Build the validated configuration: file, then environment, then flags.
fn pipeline_config(
    config_path: Option<&Path>,
    source: &SourceArgs,
) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    let mut settings = Settings::load(config_path)?.pipeline;
    if let Some(cutoff) = &source.cutoff {
        settings.cutoff = Some(cutoff.clone());
    }
    if let Some(run_timestamp) = &source.run_timestamp {
        settings.run_timestamp = Some(run_timestamp.clone());
    }

    Ok(PipelineConfig::from_settings(
        &settings,
        Utc::now().naive_utc(),
    )?)
}

fn open_source(
    source: &SourceArgs,
    config: &PipelineConfig,
) -> Result<Box<dyn ObservationSource>, Box<dyn std::error::Error>> {
    match (&source.input, &source.sqlite) {
        (Some(path), _) => Ok(Box::new(CsvSource::new(path))),
        (None, Some(path)) => {
            let store = SqliteStore::open(path)?
                .with_table(&source.table)?
                .with_since(config.cutoff());
            Ok(Box::new(store))
        }
        (None, None) => Err("either --input or --sqlite is required".into()),
    }
}

fn execute(
    config_path: Option<&Path>,
    source: &SourceArgs,
) -> Result<Report, Box<dyn std::error::Error>> {
    let config = pipeline_config(config_path, source)?;
    let source = open_source(source, &config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Running pipeline ({} source)...", source.name()));

    match run_report(&config, source.as_ref()) {
        Ok(report) => {
            pb.finish_with_message(format!(
                "Processed {} observations in {} categories",
                report.rows.len(),
                report.output.category_stats.len()
            ));
            Ok(report)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

fn write_export<T: Exporter + ?Sized>(
    data: &T,
    output: Option<&Path>,
    format: Option<ExportFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            let format = format.unwrap_or_else(|| ExportFormat::from_path(path));
            data.export_to_file(path, format)?;
            tracing::info!(path = %path.display(), format = format.extension(), "report written");
        }
        None => print!("{}", data.export_to_string(format.unwrap_or(ExportFormat::Csv))?),
    }
    Ok(())
}
