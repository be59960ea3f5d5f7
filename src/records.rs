//! Data types shared by the extraction and aggregation pipeline.

use serde::Serialize;

/// A cell value as read from a team workbook, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Empty,
    /// Any other cell content (booleans, dates, error values), kept as its
    /// display form.
    Other(String),
}

/// One grade sheet exactly as found in a team's document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGradeRecord {
    pub team_name: String,
    pub user_domain: RawValue,
    pub user_name: String,
    pub user_grade: RawValue,
}

/// A grade sheet after normalization.
///
/// `user_grade` is finite or `None`; `user_domain` is uppercase or `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRecord {
    pub team_name: String,
    pub user_domain: Option<String>,
    pub user_name: String,
    pub user_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAverage {
    pub team_name: String,
    pub average_grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainTeamAverage {
    pub user_domain: String,
    pub team_name: String,
    pub average_grade: f64,
}

/// Descriptive statistics over a set of non-null grades.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatBlock {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub count: usize,
}

/// A team that could not contribute records, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    MissingDocument { team: String },
    ReadError { team: String, message: String },
}

impl Anomaly {
    pub fn team(&self) -> &str {
        match self {
            Anomaly::MissingDocument { team } | Anomaly::ReadError { team, .. } => team,
        }
    }
}

/// What the extractor got out of a single team folder.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamOutcome {
    Records(Vec<RawGradeRecord>),
    Missing,
    Failed(String),
}

/// Merged result of scanning every team folder under the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<RawGradeRecord>,
    pub missing: Vec<String>,
    pub errors: Vec<(String, String)>,
    pub teams_scanned: usize,
}

impl Extraction {
    /// Appends one team's outcome. Callers feed teams in a fixed order.
    pub fn absorb(&mut self, team: &str, outcome: TeamOutcome) {
        self.teams_scanned += 1;
        match outcome {
            TeamOutcome::Records(records) => self.records.extend(records),
            TeamOutcome::Missing => self.missing.push(team.to_string()),
            TeamOutcome::Failed(message) => self.errors.push((team.to_string(), message)),
        }
    }

    /// Missing documents first, then read errors, each in team order.
    pub fn anomalies(&self) -> Vec<Anomaly> {
        let missing = self.missing.iter().map(|team| Anomaly::MissingDocument {
            team: team.clone(),
        });
        let errors = self.errors.iter().map(|(team, message)| Anomaly::ReadError {
            team: team.clone(),
            message: message.clone(),
        });
        missing.chain(errors).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(team: &str, user: &str) -> RawGradeRecord {
        RawGradeRecord {
            team_name: team.to_string(),
            user_domain: RawValue::Empty,
            user_name: user.to_string(),
            user_grade: RawValue::Number(12.0),
        }
    }

    #[test]
    fn test_absorb_routes_outcomes() {
        let mut extraction = Extraction::default();
        extraction.absorb("alpha", TeamOutcome::Records(vec![raw("alpha", "ana")]));
        extraction.absorb("beta", TeamOutcome::Missing);
        extraction.absorb("gamma", TeamOutcome::Failed("bad zip".into()));
        extraction.absorb("delta", TeamOutcome::Records(vec![]));

        assert_eq!(extraction.teams_scanned, 4);
        assert_eq!(extraction.records.len(), 1);
        assert_eq!(extraction.missing, vec!["beta".to_string()]);
        assert_eq!(
            extraction.errors,
            vec![("gamma".to_string(), "bad zip".to_string())]
        );
    }

    #[test]
    fn test_anomalies_list_every_skipped_team() {
        let mut extraction = Extraction::default();
        extraction.absorb("beta", TeamOutcome::Failed("boom".into()));
        extraction.absorb("alpha", TeamOutcome::Missing);

        let anomalies = extraction.anomalies();
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].team(), "alpha");
        assert_eq!(anomalies[1].team(), "beta");
    }
}
