use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::analyzers::aggregate::{
    DomainRanking, bottom_n, by_domain, domain_rankings, domain_team_averages, team_averages,
    top_n, top_teams,
};
use crate::analyzers::statistics::{Statistics, compute_statistics};
use crate::config::{DOMAIN_TOP_K, TOP_N, TOP_TEAMS};
use crate::records::{DomainTeamAverage, GradeRecord, TeamAverage};

/// Every derived view over one normalized record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub top: Vec<GradeRecord>,
    pub bottom: Vec<GradeRecord>,
    pub team_averages: Vec<TeamAverage>,
    pub top_teams: Vec<TeamAverage>,
    pub domain_team_averages: Vec<DomainTeamAverage>,
    pub domains: BTreeMap<String, Vec<DomainTeamAverage>>,
    pub domain_rankings: BTreeMap<String, DomainRanking>,
    pub statistics: Statistics,
}

/// Runs the aggregator and the statistics calculator over `records`.
pub fn analyze(records: &[GradeRecord]) -> Analysis {
    let averages = team_averages(records);
    let domain_averages = domain_team_averages(records);

    let analysis = Analysis {
        top: top_n(records, TOP_N),
        bottom: bottom_n(records, TOP_N),
        top_teams: top_teams(&averages, TOP_TEAMS),
        team_averages: averages,
        domains: by_domain(&domain_averages),
        domain_rankings: domain_rankings(&domain_averages, DOMAIN_TOP_K),
        domain_team_averages: domain_averages,
        statistics: compute_statistics(records),
    };

    debug!(
        teams = analysis.team_averages.len(),
        domains = analysis.domains.len(),
        graded = analysis.statistics.overall.count,
        "Analysis complete"
    );

    analysis
}
