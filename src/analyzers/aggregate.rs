use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::analyzers::utility::mean;
use crate::records::{DomainTeamAverage, GradeRecord, TeamAverage};

/// Best and worst teams of a single domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRanking {
    pub top: Vec<DomainTeamAverage>,
    pub bottom: Vec<DomainTeamAverage>,
}

/// Grades are finite, so `partial_cmp` never fails; `-0.0` and `0.0` tie.
fn cmp_grade(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn graded(records: &[GradeRecord]) -> Vec<(&GradeRecord, f64)> {
    records
        .iter()
        .filter_map(|r| r.user_grade.map(|g| (r, g)))
        .collect()
}

/// The `n` highest grades, best first. Ungraded records are skipped and
/// equal grades keep their input order.
pub fn top_n(records: &[GradeRecord], n: usize) -> Vec<GradeRecord> {
    let mut rows = graded(records);
    rows.sort_by(|a, b| cmp_grade(b.1, a.1));
    rows.into_iter().take(n).map(|(r, _)| r.clone()).collect()
}

/// The `n` lowest grades, worst first. Same filtering and tie rule as [`top_n`].
pub fn bottom_n(records: &[GradeRecord], n: usize) -> Vec<GradeRecord> {
    let mut rows = graded(records);
    rows.sort_by(|a, b| cmp_grade(a.1, b.1));
    rows.into_iter().take(n).map(|(r, _)| r.clone()).collect()
}

/// Mean grade per team, in order of each team's first record.
///
/// A team whose grades are all missing gets `None`, never 0.
pub fn team_averages(records: &[GradeRecord]) -> Vec<TeamAverage> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();

    for record in records {
        let slot = *index.entry(record.team_name.as_str()).or_insert_with(|| {
            groups.push((record.team_name.as_str(), Vec::new()));
            groups.len() - 1
        });
        if let Some(grade) = record.user_grade {
            groups[slot].1.push(grade);
        }
    }

    groups
        .into_iter()
        .map(|(team, grades)| TeamAverage {
            team_name: team.to_string(),
            average_grade: mean(&grades),
        })
        .collect()
}

/// Teams sorted by average, highest first, teams without an average last.
pub fn top_teams(averages: &[TeamAverage], n: usize) -> Vec<TeamAverage> {
    let mut sorted = averages.to_vec();
    sorted.sort_by(|a, b| match (a.average_grade, b.average_grade) {
        (Some(x), Some(y)) => cmp_grade(y, x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    sorted.truncate(n);
    sorted
}

/// Mean grade for each (domain, team) pair, ordered by domain then team.
///
/// Records without a domain are left out, and a pair appears only if it has
/// at least one grade.
pub fn domain_team_averages(records: &[GradeRecord]) -> Vec<DomainTeamAverage> {
    let mut groups: BTreeMap<(&str, &str), Vec<f64>> = BTreeMap::new();

    for record in records {
        let (Some(domain), Some(grade)) = (record.user_domain.as_deref(), record.user_grade) else {
            continue;
        };
        groups
            .entry((domain, record.team_name.as_str()))
            .or_default()
            .push(grade);
    }

    groups
        .into_iter()
        .filter_map(|((domain, team), grades)| {
            mean(&grades).map(|average_grade| DomainTeamAverage {
                user_domain: domain.to_string(),
                team_name: team.to_string(),
                average_grade,
            })
        })
        .collect()
}

/// Splits domain team averages per domain, each list sorted highest first.
pub fn by_domain(averages: &[DomainTeamAverage]) -> BTreeMap<String, Vec<DomainTeamAverage>> {
    let mut domains: BTreeMap<String, Vec<DomainTeamAverage>> = BTreeMap::new();
    for avg in averages {
        domains
            .entry(avg.user_domain.clone())
            .or_default()
            .push(avg.clone());
    }
    for teams in domains.values_mut() {
        teams.sort_by(|a, b| cmp_grade(b.average_grade, a.average_grade));
    }
    domains
}

/// Top `k` and bottom `k` teams per domain.
///
/// The bottom list is the `k` lowest of the descending order, re-sorted
/// ascending. With fewer than `2k` teams the two lists overlap.
pub fn domain_rankings(averages: &[DomainTeamAverage], k: usize) -> BTreeMap<String, DomainRanking> {
    by_domain(averages)
        .into_iter()
        .map(|(domain, sorted)| {
            let top = sorted.iter().take(k).cloned().collect();

            let mut bottom = sorted[sorted.len().saturating_sub(k)..].to_vec();
            bottom.sort_by(|a, b| cmp_grade(a.average_grade, b.average_grade));

            (domain, DomainRanking { top, bottom })
        })
        .collect()
}
