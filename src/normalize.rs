//! Coerces raw cell values into typed grade records.
//!
//! Every function here is total: a value that cannot be coerced becomes
//! `None` instead of an error.

use tracing::debug;

use crate::records::{GradeRecord, RawGradeRecord, RawValue};

/// Numeric grade for a raw cell, or `None` when absent or not a finite number.
pub fn normalize_grade(value: &RawValue) -> Option<f64> {
    let n = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
        RawValue::Empty | RawValue::Other(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// Uppercases a domain label so case variants share one key.
///
/// Whitespace is kept as is.
pub fn canonicalize_domain(domain: Option<&str>) -> Option<String> {
    domain.map(str::to_uppercase)
}

/// Canonical domain for a raw cell; blank cells stay `None`.
pub fn normalize_domain(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Empty => None,
        RawValue::Number(n) => canonicalize_domain(Some(&number_label(*n))),
        RawValue::Text(s) | RawValue::Other(s) => canonicalize_domain(Some(s)),
    }
}

/// Renders whole numbers without a fractional part ("3" rather than "3.0").
fn number_label(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Builds the normalized record; `raw` is left untouched.
pub fn normalize(raw: &RawGradeRecord) -> GradeRecord {
    let user_grade = normalize_grade(&raw.user_grade);
    if user_grade.is_none() && raw.user_grade != RawValue::Empty {
        debug!(
            team = %raw.team_name,
            user = %raw.user_name,
            raw = ?raw.user_grade,
            "Grade is not numeric"
        );
    }

    GradeRecord {
        team_name: raw.team_name.clone(),
        user_domain: normalize_domain(&raw.user_domain),
        user_name: raw.user_name.clone(),
        user_grade,
    }
}

pub fn normalize_all(raw: &[RawGradeRecord]) -> Vec<GradeRecord> {
    raw.iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_coercion() {
        assert_eq!(normalize_grade(&RawValue::Number(15.5)), Some(15.5));
        assert_eq!(normalize_grade(&RawValue::Text("12".into())), Some(12.0));
        assert_eq!(normalize_grade(&RawValue::Text("-3.25".into())), Some(-3.25));
        assert_eq!(normalize_grade(&RawValue::Text(" 7.5 ".into())), Some(7.5));
    }

    #[test]
    fn test_grade_null_cases() {
        assert_eq!(normalize_grade(&RawValue::Empty), None);
        assert_eq!(normalize_grade(&RawValue::Text("N/A".into())), None);
        assert_eq!(normalize_grade(&RawValue::Text("-".into())), None);
        assert_eq!(normalize_grade(&RawValue::Text("NaN".into())), None);
        assert_eq!(normalize_grade(&RawValue::Text("inf".into())), None);
        assert_eq!(normalize_grade(&RawValue::Number(f64::NAN)), None);
        assert_eq!(normalize_grade(&RawValue::Other("true".into())), None);
    }

    #[test]
    fn test_domain_case_variants_merge() {
        let variants = ["cs", "Cs", "CS"];
        for v in variants {
            assert_eq!(
                normalize_domain(&RawValue::Text(v.into())),
                Some("CS".to_string())
            );
        }
    }

    #[test]
    fn test_domain_keeps_whitespace() {
        assert_eq!(canonicalize_domain(Some(" data ")), Some(" DATA ".to_string()));
        assert_eq!(canonicalize_domain(None), None);
    }

    #[test]
    fn test_domain_from_other_types() {
        assert_eq!(normalize_domain(&RawValue::Empty), None);
        assert_eq!(normalize_domain(&RawValue::Number(3.0)), Some("3".to_string()));
        assert_eq!(normalize_domain(&RawValue::Number(2.5)), Some("2.5".to_string()));
        assert_eq!(
            normalize_domain(&RawValue::Other("true".into())),
            Some("TRUE".to_string())
        );
    }

    #[test]
    fn test_normalize_keeps_identity_fields() {
        let raw = RawGradeRecord {
            team_name: "alpha".into(),
            user_domain: RawValue::Text("math".into()),
            user_name: "Ana".into(),
            user_grade: RawValue::Text("oops".into()),
        };

        let record = normalize(&raw);
        assert_eq!(record.team_name, "alpha");
        assert_eq!(record.user_name, "Ana");
        assert_eq!(record.user_domain.as_deref(), Some("MATH"));
        assert_eq!(record.user_grade, None);
        assert_eq!(normalize(&raw), record);
    }
}
