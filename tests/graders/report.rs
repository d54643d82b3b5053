use traceforge::graders::{
    Evidence, EvaluationSummary, GraderErrorKind, GraderResult, MemoryCorruptionGrader, Severity,
};

use crate::helpers::{clean_trace, corrupted_trace};

fn result_with(evidence: Vec<Evidence>, passed: bool, score: f64) -> GraderResult {
    GraderResult::new("memory_corruption", passed, score, evidence, None)
        .expect("score is in range")
}

#[test]
fn given_out_of_range_score_when_constructing_result_then_rejected() {
    let err = GraderResult::new("memory_corruption", true, 1.2, Vec::new(), None)
        .expect_err("scores above 1.0 must be rejected");
    assert_eq!(err.kind, GraderErrorKind::InvalidScore);

    let err = GraderResult::new("memory_corruption", false, -0.1, Vec::new(), None)
        .expect_err("negative scores must be rejected");
    assert_eq!(err.kind, GraderErrorKind::InvalidScore);
}

#[test]
fn given_failed_result_when_formatted_then_sections_appear_in_order() {
    let report = MemoryCorruptionGrader::new()
        .grade_sync(&corrupted_trace())
        .expect("grading should succeed")
        .format_report();

    let header = report.find("GRADER REPORT: memory_corruption").unwrap();
    let status = report.find("Result: [FAIL] FAILED").unwrap();
    let score = report.find("Score:  0.50 / 1.00").unwrap();
    let errors = report.find("ERRORS (1):").unwrap();
    let entry = report.find("  [ERROR] data_corruption").unwrap();
    assert!(header < status && status < score && score < errors && errors < entry);
    assert!(!report.contains("WARNINGS"));
}

#[test]
fn given_passed_result_when_formatted_then_status_line_shows_ok() {
    let report = MemoryCorruptionGrader::new()
        .grade_sync(&clean_trace())
        .expect("grading should succeed")
        .format_report();

    assert!(report.contains("Result: [OK] PASSED"));
    assert!(report.contains("Score:  1.00 / 1.00"));
    assert!(!report.contains("ERRORS"));
}

#[test]
fn given_summary_and_saves_when_formatted_then_info_sections_render() {
    let evidence = vec![
        Evidence::new("judge_summary", "All facts saved correctly.", Severity::Info),
        Evidence::new("correct_save", "'solar is 12 kW' -> equipment.solar_capacity_kw", Severity::Info),
        Evidence::new("stale_read", "memory read may be stale", Severity::Warn),
    ];
    let report = result_with(evidence, true, 1.0).format_report();

    let warnings = report.find("WARNINGS (1):").unwrap();
    let warn_entry = report.find("  [WARN]  stale_read").unwrap();
    let summary = report.find("SUMMARY:\n  All facts saved correctly.").unwrap();
    let saves = report.find("CORRECTLY SAVED (1):").unwrap();
    let save_entry = report
        .find("  [OK] 'solar is 12 kW' -> equipment.solar_capacity_kw")
        .unwrap();
    assert!(warnings < warn_entry && warn_entry < summary && summary < saves && saves < save_entry);
}

#[test]
fn given_mixed_results_when_summarized_then_mean_score_and_all_pass_rule() {
    let passed = result_with(Vec::new(), true, 1.0);
    let failed = result_with(
        vec![Evidence::new("data_corruption", "Existing data was deleted", Severity::Error)],
        false,
        0.5,
    );

    let summary = EvaluationSummary::new(vec![passed.clone(), failed.clone()]);
    assert!(!summary.passed());
    assert_eq!(summary.score(), 0.75);
    assert_eq!(summary.errors().len(), 1);

    let all_passed = EvaluationSummary::new(vec![passed]);
    assert!(all_passed.passed());

    let empty = EvaluationSummary::new(Vec::new());
    assert!(empty.passed());
    assert_eq!(empty.score(), 1.0);
}

#[test]
fn given_summary_when_formatted_then_overall_line_precedes_per_grader_reports() {
    let summary = EvaluationSummary::new(vec![
        result_with(Vec::new(), true, 1.0),
        result_with(Vec::new(), false, 0.5),
    ]);
    let report = summary.format_report();

    let overall = report.find("Overall: FAILED (score: 0.75)").unwrap();
    let first = report.find("GRADER REPORT: memory_corruption").unwrap();
    assert!(report.contains("EVALUATION REPORT"));
    assert!(overall < first);
}
