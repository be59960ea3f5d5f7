//! Shapes analysis results into named tabular views.
//!
//! This is the only place that decides view names, view order and column
//! order. No numbers are computed here.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::aggregate::DomainRanking;
use crate::analyzers::analyzer::Analysis;
use crate::analyzers::statistics::Statistics;
use crate::config::TOP_N;
use crate::records::{Anomaly, DomainTeamAverage, Extraction, GradeRecord, StatBlock, TeamAverage};

pub const GRADE_COLUMNS: [&str; 4] = ["Team Name", "User Domain", "User Name", "User Grade"];
pub const STAT_COLUMNS: [&str; 6] = ["Scope", "min", "max", "mean", "median", "count"];

/// One cell of a view. `Empty` is written as a blank cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(value: Option<&str>) -> Self {
        value.map_or(Cell::Empty, |s| Cell::Text(s.to_string()))
    }

    fn number(value: Option<f64>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }

    /// Plain-text form used by the CSV writer and console output.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// A named table: header row plus data rows of the same width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl View {
    fn new(name: impl Into<String>, columns: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }
}

/// Ordered collection of views handed to the writers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub views: Vec<View>,
}

impl Report {
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }
}

fn grade_row(record: &GradeRecord) -> Vec<Cell> {
    vec![
        Cell::Text(record.team_name.clone()),
        Cell::text(record.user_domain.as_deref()),
        Cell::Text(record.user_name.clone()),
        Cell::number(record.user_grade),
    ]
}

fn grade_view(name: &str, records: &[GradeRecord]) -> View {
    View::new(name, &GRADE_COLUMNS, records.iter().map(grade_row).collect())
}

fn team_average_view(name: &str, averages: &[TeamAverage]) -> View {
    let rows = averages
        .iter()
        .map(|a| vec![Cell::Text(a.team_name.clone()), Cell::number(a.average_grade)])
        .collect();
    View::new(name, &["Team Name", "Average Grade"], rows)
}

fn domain_view(name: &str, averages: &[DomainTeamAverage]) -> View {
    let rows = averages
        .iter()
        .map(|a| {
            vec![
                Cell::Text(a.user_domain.clone()),
                Cell::Text(a.team_name.clone()),
                Cell::Number(a.average_grade),
            ]
        })
        .collect();
    View::new(name, &["User Domain", "Team Name", "Average Grade"], rows)
}

fn stat_row(scope: &str, block: &StatBlock) -> Vec<Cell> {
    vec![
        Cell::Text(scope.to_string()),
        Cell::number(block.min),
        Cell::number(block.max),
        Cell::number(block.mean),
        Cell::number(block.median),
        Cell::Number(block.count as f64),
    ]
}

fn statistics_view(stats: &Statistics) -> View {
    let mut rows = vec![stat_row("Overall", &stats.overall)];
    rows.extend(
        stats
            .per_domain
            .iter()
            .map(|(domain, block)| stat_row(domain, block)),
    );
    View::new("Statistics", &STAT_COLUMNS, rows)
}

/// Records sorted by domain then user name; records without a domain go last.
pub fn sort_by_domain(records: &[GradeRecord]) -> Vec<GradeRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let domain = match (&a.user_domain, &b.user_domain) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        domain.then_with(|| a.user_name.cmp(&b.user_name))
    });
    sorted
}

/// Builds the report views in their output order.
pub fn assemble(records: &[GradeRecord], analysis: &Analysis) -> Report {
    let mut views = vec![
        grade_view("All Grades", records),
        grade_view("All Grades By Domain", &sort_by_domain(records)),
        grade_view(&format!("Top {TOP_N} Grades"), &analysis.top),
        grade_view(&format!("Bottom {TOP_N} Grades"), &analysis.bottom),
        team_average_view("Team Averages", &analysis.top_teams),
    ];

    for (domain, averages) in &analysis.domains {
        views.push(domain_view(&format!("Domain-{domain}"), averages));
    }

    views.push(statistics_view(&analysis.statistics));

    Report { views }
}

/// Machine-readable account of one run, written as JSON on request.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub teams_scanned: usize,
    pub teams_with_records: usize,
    pub record_count: usize,
    pub graded_count: usize,
    pub missing_teams: Vec<String>,
    pub anomalies: Vec<Anomaly>,
    pub statistics: Statistics,
    pub top: Vec<GradeRecord>,
    pub bottom: Vec<GradeRecord>,
    pub top_teams: Vec<TeamAverage>,
    pub domain_rankings: BTreeMap<String, DomainRanking>,
}

impl RunSummary {
    pub fn new(
        root: &Path,
        extraction: &Extraction,
        records: &[GradeRecord],
        analysis: &Analysis,
    ) -> Self {
        let teams: BTreeSet<&str> = records.iter().map(|r| r.team_name.as_str()).collect();

        Self {
            generated_at: Utc::now(),
            root: root.display().to_string(),
            teams_scanned: extraction.teams_scanned,
            teams_with_records: teams.len(),
            record_count: records.len(),
            graded_count: analysis.statistics.overall.count,
            missing_teams: extraction.missing.clone(),
            anomalies: extraction.anomalies(),
            statistics: analysis.statistics.clone(),
            top: analysis.top.clone(),
            bottom: analysis.bottom.clone(),
            top_teams: analysis.top_teams.clone(),
            domain_rankings: analysis.domain_rankings.clone(),
        }
    }
}
