use serde_json::{Value, json};
use traceforge::{
    graders::{DataLossPolicy, MemoryCorruptionGrader, Severity},
    trace::WriteOperation,
};

use crate::helpers::{change, clean_trace, corrupted_trace, memory_write, trace, user_input};

#[test]
fn given_nulled_existing_value_when_graded_then_fails_with_half_score() {
    let grader = MemoryCorruptionGrader::new();
    let result = grader
        .grade_sync(&corrupted_trace())
        .expect("grading should succeed");

    assert!(!result.passed);
    assert_eq!(result.score, 0.5);

    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].check_name, "data_corruption");
    assert!(errors[0].description.contains("$.equipment.ev_model"));
    assert_eq!(errors[0].step_ids, vec!["step-2".to_string()]);

    let details = errors[0].details.as_ref().expect("details must be attached");
    assert_eq!(
        details["corrupted_fields"],
        json!([{"path": "$.equipment.ev_model", "lost_value": "Tesla Model 3"}])
    );
}

#[test]
fn given_legitimate_update_when_graded_then_passes_with_full_score() {
    let grader = MemoryCorruptionGrader::new();
    let result = grader
        .grade_sync(&clean_trace())
        .expect("grading should succeed");

    assert!(result.passed);
    assert_eq!(result.score, 1.0);
    assert!(result.errors().is_empty());

    let metadata = result.metadata.as_ref().expect("metadata must be attached");
    assert_eq!(metadata["total_memory_writes"], json!(1));
    assert_eq!(metadata["corruption_errors"], json!(0));
}

#[test]
fn given_field_creation_when_graded_then_not_flagged() {
    let mut trace = trace();
    trace
        .append_step(memory_write(
            "step-1",
            WriteOperation::Add,
            vec![change("$.equipment.ev_model", None, Some(json!("Tesla Model 3")))],
        ))
        .unwrap();

    let result = MemoryCorruptionGrader::new()
        .grade_sync(&trace)
        .expect("grading should succeed");
    assert!(result.passed);
    assert_eq!(result.score, 1.0);
}

#[test]
fn given_three_corrupting_writes_when_graded_then_score_clamps_at_zero() {
    let mut trace = trace();
    for i in 1..=3 {
        trace
            .append_step(memory_write(
                &format!("step-{i}"),
                WriteOperation::Update,
                vec![change(
                    &format!("$.field_{i}"),
                    Some(json!("kept")),
                    Some(Value::Null),
                )],
            ))
            .unwrap();
    }

    let result = MemoryCorruptionGrader::new()
        .grade_sync(&trace)
        .expect("grading should succeed");
    assert!(!result.passed);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.errors().len(), 3);
}

#[test]
fn given_explicit_delete_under_permissive_policy_when_graded_then_reported_as_info() {
    let mut trace = trace();
    trace
        .append_step(memory_write(
            "step-1",
            WriteOperation::Delete,
            vec![change("$.equipment.ev_model", Some(json!("Tesla Model 3")), None)],
        ))
        .unwrap();

    let result = MemoryCorruptionGrader::with_policy(DataLossPolicy::AllowExplicitDelete)
        .grade_sync(&trace)
        .expect("grading should succeed");
    assert!(result.passed);
    assert_eq!(result.score, 1.0);
    assert_eq!(result.evidence.len(), 1);
    assert_eq!(result.evidence[0].severity, Severity::Info);

    // The conservative default still flags the same write.
    let strict = MemoryCorruptionGrader::new()
        .grade_sync(&trace)
        .expect("grading should succeed");
    assert!(!strict.passed);
}

#[test]
fn given_same_trace_when_graded_twice_then_verdicts_are_identical() {
    let trace = corrupted_trace();
    let grader = MemoryCorruptionGrader::new();

    let first = grader.grade_sync(&trace).expect("grading should succeed");
    let second = grader.grade_sync(&trace).expect("grading should succeed");

    assert_eq!(first.passed, second.passed);
    assert_eq!(first.score, second.score);
    assert_eq!(first.evidence, second.evidence);
}

#[test]
fn given_trace_without_memory_writes_when_graded_then_vacuously_passes() {
    let mut trace = trace();
    trace.append_step(user_input("step-1", "hello")).unwrap();

    let result = MemoryCorruptionGrader::new()
        .grade_sync(&trace)
        .expect("grading should succeed");
    assert!(result.passed);
    assert_eq!(result.score, 1.0);
    assert!(result.evidence.is_empty());
}
