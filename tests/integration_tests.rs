use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use calamine::{Reader, open_workbook_auto};
use grade_report::config::{DOCUMENT_NAME, ExtractConfig};
use grade_report::document::XlsxReader;
use grade_report::output::{ReportWriter, XlsxWriter};
use grade_report::pipeline::{run, run_concurrent};
use grade_report::records::{StatBlock, TeamAverage};
use rust_xlsxwriter::Workbook;

enum Grade {
    Number(f64),
    Text(&'static str),
    Blank,
}

/// Writes a team workbook: one sheet per user with the domain in B12 and the
/// grade in C19, then an "Oral" sheet and a trailing sheet that must be ignored.
fn write_team(root: &Path, team: &str, users: &[(&str, Option<&str>, Grade)]) {
    let dir = root.join(team);
    fs::create_dir_all(&dir).unwrap();

    let mut workbook = Workbook::new();
    for (user, domain, grade) in users {
        let sheet = workbook.add_worksheet();
        sheet.set_name(*user).unwrap();
        sheet.write_string(0, 0, "Grading grid").unwrap();
        if let Some(domain) = domain {
            sheet.write_string(11, 1, *domain).unwrap();
        }
        match grade {
            Grade::Number(n) => {
                sheet.write_number(18, 2, *n).unwrap();
            }
            Grade::Text(t) => {
                sheet.write_string(18, 2, *t).unwrap();
            }
            Grade::Blank => {}
        }
    }

    let oral = workbook.add_worksheet();
    oral.set_name("Oral").unwrap();
    oral.write_number(18, 2, 1.0).unwrap();

    let after = workbook.add_worksheet();
    after.set_name("ghost").unwrap();
    after.write_string(11, 1, "CS").unwrap();
    after.write_number(18, 2, 100.0).unwrap();

    workbook.save(dir.join(DOCUMENT_NAME)).unwrap();
}

fn build_tree(name: &str) -> PathBuf {
    let root = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&root);
    fs::create_dir_all(&root).unwrap();

    write_team(
        &root,
        "team_a",
        &[
            ("alice", Some("cs"), Grade::Number(80.0)),
            ("arthur", Some("CS"), Grade::Number(90.0)),
            ("amelie", Some("Math"), Grade::Blank),
        ],
    );
    write_team(&root, "team_b", &[("bruno", Some("Cs"), Grade::Number(70.0))]);

    fs::create_dir_all(root.join("team_c")).unwrap();

    fs::create_dir_all(root.join("team_d")).unwrap();
    fs::write(root.join("team_d").join(DOCUMENT_NAME), b"definitely not a workbook").unwrap();

    write_team(
        &root,
        "team_e",
        &[
            ("eve", None, Grade::Text("N/A")),
            ("emile", Some("bio"), Grade::Text("12.5")),
        ],
    );

    root
}

#[test]
fn test_full_pipeline() {
    let root = build_tree("grade_report_it_full_pipeline");
    let output = run(&XlsxReader, &root, &ExtractConfig::default()).unwrap();

    assert_eq!(output.extraction.teams_scanned, 5);
    assert_eq!(output.extraction.missing, vec!["team_c".to_string()]);
    assert_eq!(output.extraction.errors.len(), 1);
    assert_eq!(output.extraction.errors[0].0, "team_d");

    let users: Vec<_> = output.records.iter().map(|r| r.user_name.as_str()).collect();
    assert_eq!(users, vec!["alice", "arthur", "amelie", "bruno", "eve", "emile"]);

    for record in &output.records {
        assert!(record.user_grade.is_none_or(f64::is_finite));
        if let Some(domain) = &record.user_domain {
            assert_eq!(domain, &domain.to_uppercase());
        }
    }

    let averages = &output.analysis.team_averages;
    assert_eq!(
        averages[..2],
        [
            TeamAverage {
                team_name: "team_a".into(),
                average_grade: Some(85.0)
            },
            TeamAverage {
                team_name: "team_b".into(),
                average_grade: Some(70.0)
            },
        ]
    );
    assert!(averages.iter().all(|a| a.team_name != "team_c"));

    let cs = &output.analysis.domains["CS"];
    assert_eq!(cs.len(), 2);
    assert_eq!((cs[0].team_name.as_str(), cs[0].average_grade), ("team_a", 85.0));
    assert_eq!((cs[1].team_name.as_str(), cs[1].average_grade), ("team_b", 70.0));
    assert!(!output.analysis.domains.contains_key("MATH"));

    let stats = &output.analysis.statistics;
    assert_eq!(
        stats.per_domain["CS"],
        StatBlock {
            min: Some(70.0),
            max: Some(90.0),
            mean: Some(80.0),
            median: Some(80.0),
            count: 3
        }
    );
    assert_eq!(stats.per_domain["MATH"].count, 0);
    assert_eq!(stats.overall.count, 4);

    let top = &output.analysis.top;
    assert_eq!(top.len(), 4);
    assert_eq!(top[0].user_grade, Some(90.0));
    assert_eq!(output.analysis.bottom[0].user_grade, Some(12.5));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_runs_are_idempotent() {
    let root = build_tree("grade_report_it_idempotent");
    let config = ExtractConfig::default();

    let first = run(&XlsxReader, &root, &config).unwrap();
    let second = run(&XlsxReader, &root, &config).unwrap();

    assert_eq!(first.records, second.records);
    assert_eq!(first.report, second.report);

    fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential() {
    let root = build_tree("grade_report_it_concurrent");
    let config = ExtractConfig::default();

    let sequential = run(&XlsxReader, &root, &config).unwrap();
    let concurrent = run_concurrent(Arc::new(XlsxReader), &root, &config, 2)
        .await
        .unwrap();

    assert_eq!(sequential.extraction, concurrent.extraction);
    assert_eq!(sequential.report, concurrent.report);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_missing_root_is_fatal() {
    let root = std::env::temp_dir().join("grade_report_it_no_such_root");
    let _ = fs::remove_dir_all(&root);
    assert!(run(&XlsxReader, &root, &ExtractConfig::default()).is_err());
}

#[test]
fn test_report_workbook_keeps_view_order() {
    let root = build_tree("grade_report_it_workbook");
    let output = run(&XlsxReader, &root, &ExtractConfig::default()).unwrap();

    let path = root.join("summary_report.xlsx");
    XlsxWriter.write(&path, &output.report).unwrap();

    let workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![
            "All Grades",
            "All Grades By Domain",
            "Top 10 Grades",
            "Bottom 10 Grades",
            "Team Averages",
            "Domain-BIO",
            "Domain-CS",
            "Statistics",
        ]
    );

    fs::remove_dir_all(&root).unwrap();
}
