//! Report writers and run diagnostics.
//!
//! Supports an xlsx workbook (one worksheet per view), one CSV file per
//! view, a JSON run summary, and a CSV dump of normalized records.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};
use tracing::{debug, error, info, warn};

use crate::records::{Anomaly, Extraction, GradeRecord};
use crate::report::{Cell, Report, RunSummary, View};

/// Longest worksheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// Persists an ordered set of views, one table per view.
pub trait ReportWriter {
    fn write(&self, path: &Path, report: &Report) -> Result<()>;
}

/// Writes every view as a worksheet of a single `.xlsx` workbook.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxWriter;

impl ReportWriter for XlsxWriter {
    fn write(&self, path: &Path, report: &Report) -> Result<()> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let names = sheet_names(&report.views);

        for (view, name) in report.views.iter().zip(names) {
            let worksheet = workbook.add_worksheet();
            worksheet
                .set_name(&name)
                .with_context(|| format!("invalid worksheet name '{name}'"))?;

            for (col, title) in view.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, title, &header)?;
            }

            for (i, row) in view.rows.iter().enumerate() {
                let r = i as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    let c = col as u16;
                    match cell {
                        Cell::Text(s) => {
                            worksheet.write_string(r, c, s)?;
                        }
                        Cell::Number(n) => {
                            worksheet.write_number(r, c, *n)?;
                        }
                        Cell::Empty => {}
                    }
                }
            }
            debug!(sheet = %name, rows = view.rows.len(), "Worksheet written");
        }

        workbook
            .save(path)
            .with_context(|| format!("failed to save {}", path.display()))?;
        info!(path = %path.display(), views = report.views.len(), "Report workbook written");
        Ok(())
    }
}

/// Writes every view as `<dir>/<view name>.csv`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvDirWriter;

impl ReportWriter for CsvDirWriter {
    fn write(&self, dir: &Path, report: &Report) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        for (view, name) in report.views.iter().zip(sheet_names(&report.views)) {
            let path = dir.join(format!("{name}.csv"));
            let mut writer = WriterBuilder::new().from_path(&path)?;
            writer.write_record(&view.columns)?;
            for row in &view.rows {
                writer.write_record(row.iter().map(Cell::display))?;
            }
            writer.flush()?;
            debug!(path = %path.display(), rows = view.rows.len(), "View CSV written");
        }

        info!(dir = %dir.display(), views = report.views.len(), "Report CSVs written");
        Ok(())
    }
}

/// Excel-safe, unique worksheet names for `views`, in order.
///
/// `[]:*?/\` become `_`, names are cut to 31 characters and clashes
/// (compared case-insensitively, as Excel does) get a ` (n)` suffix.
pub fn sheet_names(views: &[View]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(views.len());

    for view in views {
        let cleaned: String = view
            .name
            .chars()
            .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
            .collect();
        let cleaned = cleaned.trim_matches('\'');
        let base = if cleaned.is_empty() { "Sheet" } else { cleaned };

        let mut candidate = truncate(base, MAX_SHEET_NAME);
        let mut n = 2;
        while !seen.insert(candidate.to_lowercase()) {
            let suffix = format!(" ({n})");
            candidate = format!(
                "{}{}",
                truncate(base, MAX_SHEET_NAME - suffix.len()),
                suffix
            );
            n += 1;
        }
        names.push(candidate);
    }

    names
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Writes the run summary as pretty-printed JSON.
pub fn write_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, summary)?;
    info!(path = %path.display(), "Run summary written");
    Ok(())
}

/// Writes normalized records as CSV, one row per grade sheet.
pub fn write_records_csv(path: &Path, records: &[GradeRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), records = records.len(), "Records written");
    Ok(())
}

/// Logs what the extractor skipped, so a short run is visibly short.
pub fn log_extraction(extraction: &Extraction) {
    let teams: HashSet<&str> = extraction
        .records
        .iter()
        .map(|r| r.team_name.as_str())
        .collect();
    info!(
        records = extraction.records.len(),
        teams = teams.len(),
        "User-grade rows found"
    );

    for anomaly in extraction.anomalies() {
        match &anomaly {
            Anomaly::MissingDocument { .. } => {
                warn!(team = anomaly.team(), "Team folder missing its grading document")
            }
            Anomaly::ReadError { message, .. } => {
                error!(team = anomaly.team(), error = %message, "Could not read team document")
            }
        }
    }

    info!(
        "{} teams missing / {} errors",
        extraction.missing.len(),
        extraction.errors.len()
    );
}

/// Logs a view row by row.
pub fn log_view(view: &View) {
    info!("{}:", view.name);
    info!("  {}", view.columns.join(" | "));
    for row in &view.rows {
        let cells: Vec<String> = row.iter().map(Cell::display).collect();
        info!("  {}", cells.join(" | "));
    }
}
