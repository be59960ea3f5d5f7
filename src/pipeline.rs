//! End-to-end run: extract, normalize, analyze, assemble.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::analyzers::analyzer::{Analysis, analyze};
use crate::config::ExtractConfig;
use crate::document::DocumentReader;
use crate::extract::{extract_teams, extract_teams_concurrent};
use crate::normalize::normalize_all;
use crate::records::{Extraction, GradeRecord};
use crate::report::{Report, RunSummary, assemble};

/// Every product of one run. `extraction` keeps the raw records alongside
/// their normalized form.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub extraction: Extraction,
    pub records: Vec<GradeRecord>,
    pub analysis: Analysis,
    pub report: Report,
}

impl PipelineOutput {
    fn from_extraction(extraction: Extraction) -> Self {
        let records = normalize_all(&extraction.records);
        let analysis = analyze(&records);
        let report = assemble(&records, &analysis);

        info!(
            records = records.len(),
            graded = analysis.statistics.overall.count,
            views = report.views.len(),
            "Pipeline complete"
        );

        Self {
            extraction,
            records,
            analysis,
            report,
        }
    }

    pub fn summary(&self, root: &Path) -> RunSummary {
        RunSummary::new(root, &self.extraction, &self.records, &self.analysis)
    }
}

/// Runs the whole pipeline, reading teams one at a time.
pub fn run<R: DocumentReader>(
    reader: &R,
    root: &Path,
    config: &ExtractConfig,
) -> Result<PipelineOutput> {
    let extraction = extract_teams(reader, root, config)?;
    Ok(PipelineOutput::from_extraction(extraction))
}

/// Runs the whole pipeline with teams read on up to `concurrency` threads.
pub async fn run_concurrent<R: DocumentReader + 'static>(
    reader: Arc<R>,
    root: &Path,
    config: &ExtractConfig,
    concurrency: usize,
) -> Result<PipelineOutput> {
    let extraction = extract_teams_concurrent(reader, root, config, concurrency).await?;
    Ok(PipelineOutput::from_extraction(extraction))
}
