//! Record extraction from a folder of team workbooks.
//!
//! The root holds one sub-folder per team. Each team folder should contain a
//! single grading workbook; every sheet before the marker sheet is one
//! user's grade sheet. A team whose workbook is absent or unreadable is
//! recorded as an anomaly and the scan moves on.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{Instrument, debug, error, info, warn};

use crate::config::ExtractConfig;
use crate::document::{Document, DocumentReader};
use crate::records::{Extraction, RawGradeRecord, TeamOutcome};

/// Conditions on the root folder that stop a run before any team is read.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("root folder {0} does not exist")]
    RootNotFound(PathBuf),
    #[error("root {0} is not a directory")]
    RootNotDirectory(PathBuf),
    #[error("cannot list root folder {path}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A team folder found under the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDir {
    pub name: String,
    pub path: PathBuf,
}

/// Lists the immediate sub-folders of `root`, sorted by name.
pub fn find_team_dirs(root: &Path) -> Result<Vec<TeamDir>, ExtractError> {
    if !root.exists() {
        return Err(ExtractError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ExtractError::RootNotDirectory(root.to_path_buf()));
    }

    let unreadable = |source: std::io::Error| ExtractError::RootUnreadable {
        path: root.to_path_buf(),
        source,
    };

    let mut teams = Vec::new();
    for entry in std::fs::read_dir(root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        teams.push(TeamDir {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }

    teams.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(teams)
}

/// Reads every grade sheet of an opened team document.
///
/// Sheets are scanned in document order until one matches the marker; that
/// sheet and everything after it are ignored.
pub fn read_grade_sheets<D: Document>(
    doc: &mut D,
    team: &str,
    config: &ExtractConfig,
) -> Result<Vec<RawGradeRecord>> {
    let mut records = Vec::new();

    for sheet in doc.sheet_names() {
        if config.is_marker(&sheet) {
            debug!(team, sheet = %sheet, "Marker sheet reached");
            break;
        }

        let user_domain = doc.cell(&sheet, config.domain_cell)?;
        let user_grade = doc.cell(&sheet, config.grade_cell)?;

        records.push(RawGradeRecord {
            team_name: team.to_string(),
            user_domain,
            user_name: sheet,
            user_grade,
        });
    }

    Ok(records)
}

/// Extracts one team. Never fails: problems become [`TeamOutcome::Missing`]
/// or [`TeamOutcome::Failed`].
pub fn extract_team<R: DocumentReader>(
    reader: &R,
    team: &TeamDir,
    config: &ExtractConfig,
) -> TeamOutcome {
    let candidate = team.path.join(&config.document_name);
    if !candidate.exists() {
        warn!(team = %team.name, document = %config.document_name, "Team document missing");
        return TeamOutcome::Missing;
    }

    let result = reader
        .open(&candidate)
        .and_then(|mut doc| read_grade_sheets(&mut doc, &team.name, config));

    match result {
        Ok(records) => {
            debug!(team = %team.name, records = records.len(), "Team extracted");
            TeamOutcome::Records(records)
        }
        Err(e) => {
            let message = format!("{e:#}");
            error!(team = %team.name, error = %message, "Team document unreadable");
            TeamOutcome::Failed(message)
        }
    }
}

/// Scans every team folder under `root` one after the other.
pub fn extract_teams<R: DocumentReader>(
    reader: &R,
    root: &Path,
    config: &ExtractConfig,
) -> Result<Extraction, ExtractError> {
    let teams = find_team_dirs(root)?;
    info!(root = %root.display(), teams = teams.len(), "Scanning teams");

    let mut extraction = Extraction::default();
    for team in &teams {
        let _span = tracing::info_span!("extract_team", team = %team.name).entered();
        let outcome = extract_team(reader, team, config);
        extraction.absorb(&team.name, outcome);
    }

    Ok(extraction)
}

/// Scans team folders in parallel blocking tasks, at most `concurrency` at
/// a time.
///
/// Outcomes are merged in team order, so the result equals
/// [`extract_teams`] for the same tree.
pub async fn extract_teams_concurrent<R>(
    reader: Arc<R>,
    root: &Path,
    config: &ExtractConfig,
    concurrency: usize,
) -> Result<Extraction, ExtractError>
where
    R: DocumentReader + 'static,
{
    let teams = find_team_dirs(root)?;
    info!(
        root = %root.display(),
        teams = teams.len(),
        concurrency,
        "Scanning teams"
    );

    let semaphore = Arc::new(tokio::sync::Semaphore::new(concurrency.max(1)));
    let config = Arc::new(config.clone());
    let mut tasks = vec![];

    for team in teams {
        let sem = semaphore.clone();
        let reader = reader.clone();
        let config = config.clone();
        let name = team.name.clone();

        let team_span = tracing::info_span!("extract_team", team = %team.name);

        let task = tokio::spawn(
            async move {
                let _permit = match sem.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return TeamOutcome::Failed(e.to_string()),
                };

                let span = tracing::Span::current();
                let blocking = tokio::task::spawn_blocking(move || {
                    let _entered = span.entered();
                    extract_team(reader.as_ref(), &team, &config)
                });

                match blocking.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(error = %e, "Extraction task aborted");
                        TeamOutcome::Failed(format!("extraction task aborted: {e}"))
                    }
                }
            }
            .instrument(team_span),
        );

        tasks.push((name, task));
    }

    let mut extraction = Extraction::default();
    for (name, task) in tasks {
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => TeamOutcome::Failed(format!("extraction task aborted: {e}")),
        };
        extraction.absorb(&name, outcome);
    }

    Ok(extraction)
}
