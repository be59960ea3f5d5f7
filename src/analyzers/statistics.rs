use std::collections::BTreeMap;

use serde::Serialize;

use crate::analyzers::utility::{mean, median};
use crate::records::{GradeRecord, StatBlock};

/// Overall statistics plus one block per domain, domains in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub overall: StatBlock,
    pub per_domain: BTreeMap<String, StatBlock>,
}

/// Summarizes a set of grades. An empty set yields `count = 0` and no values.
pub fn stat_block(grades: &[f64]) -> StatBlock {
    StatBlock {
        min: grades.iter().copied().reduce(f64::min),
        max: grades.iter().copied().reduce(f64::max),
        mean: mean(grades),
        median: median(grades),
        count: grades.len(),
    }
}

/// Computes statistics over non-null grades only.
///
/// Every domain seen on a record gets a block, even when none of its records
/// is graded.
pub fn compute_statistics(records: &[GradeRecord]) -> Statistics {
    let overall: Vec<f64> = records.iter().filter_map(|r| r.user_grade).collect();

    let mut domains: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        let Some(domain) = record.user_domain.as_deref() else {
            continue;
        };
        let grades = domains.entry(domain).or_default();
        if let Some(grade) = record.user_grade {
            grades.push(grade);
        }
    }

    Statistics {
        overall: stat_block(&overall),
        per_domain: domains
            .into_iter()
            .map(|(domain, grades)| (domain.to_string(), stat_block(&grades)))
            .collect(),
    }
}
