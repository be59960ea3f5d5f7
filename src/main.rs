//! CLI entry point for the grade report tool.
//!
//! Scans a folder of per-team grading workbooks and produces the
//! consolidated report, a CSV dump of the normalized records, or the
//! statistics alone.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use grade_report::config::{
    CellAddress, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT, DOCUMENT_NAME, DOMAIN_CELL, ExtractConfig,
    GRADE_CELL, MARKER_SHEET, TOP_N,
};
use grade_report::document::XlsxReader;
use grade_report::output::{
    CsvDirWriter, ReportWriter, XlsxWriter, log_extraction, log_view, write_json,
    write_records_csv,
};
use grade_report::pipeline::{PipelineOutput, run_concurrent};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_report")]
#[command(about = "Consolidate per-team grade workbooks into one report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScanArgs {
    /// Folder containing one sub-folder per team
    #[arg(value_name = "ROOT", default_value = ".")]
    root: PathBuf,

    /// Grading workbook expected in every team folder
    #[arg(long, default_value = DOCUMENT_NAME)]
    document: String,

    /// Sheet name (case-insensitive) that ends the grade sheets
    #[arg(long, default_value = MARKER_SHEET)]
    marker: String,

    /// Cell holding the user's domain
    #[arg(long, default_value = DOMAIN_CELL)]
    domain_cell: CellAddress,

    /// Cell holding the user's total grade
    #[arg(long, default_value = GRADE_CELL)]
    grade_cell: CellAddress,

    /// Maximum number of team workbooks read at once
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,
}

impl ScanArgs {
    fn config(&self) -> ExtractConfig {
        ExtractConfig {
            document_name: self.document.clone(),
            marker_sheet: self.marker.clone(),
            domain_cell: self.domain_cell,
            grade_cell: self.grade_cell,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report workbook
    Report {
        #[command(flatten)]
        scan: ScanArgs,

        /// Workbook to write
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,

        /// Also write every view as CSV into this folder
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Also write a JSON run summary to this file
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write the normalized grade records as CSV
    Extract {
        #[command(flatten)]
        scan: ScanArgs,

        /// CSV file to write
        #[arg(short, long, default_value = "records.csv")]
        output: PathBuf,
    },
    /// Print overall and per-domain statistics
    Stats {
        #[command(flatten)]
        scan: ScanArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            scan,
            output,
            csv_dir,
            json,
        } => {
            let run = scan_teams(&scan).await?;

            if let Some(path) = json {
                write_json(&path, &run.summary(&scan.root))?;
            }

            if run.records.is_empty() {
                warn!("No rows to write");
                return Ok(());
            }

            XlsxWriter.write(&output, &run.report)?;
            if let Some(dir) = csv_dir {
                CsvDirWriter.write(&dir, &run.report)?;
            }

            if let Some(top) = run.report.view(&format!("Top {TOP_N} Grades")) {
                log_view(top);
            }
        }
        Commands::Extract { scan, output } => {
            let run = scan_teams(&scan).await?;
            write_records_csv(&output, &run.records)?;
        }
        Commands::Stats { scan } => {
            let run = scan_teams(&scan).await?;
            if let Some(stats) = run.report.view("Statistics") {
                log_view(stats);
            }
        }
    }

    Ok(())
}

/// Runs the pipeline over `scan.root` and logs what was skipped.
#[tracing::instrument(skip(scan), fields(root = %scan.root.display()))]
async fn scan_teams(scan: &ScanArgs) -> Result<PipelineOutput> {
    info!("Scanning teams");
    let run = run_concurrent(
        Arc::new(XlsxReader),
        &scan.root,
        &scan.config(),
        scan.concurrency,
    )
    .await?;
    log_extraction(&run.extraction);
    Ok(run)
}
