use serde_json::{Value, json};
use time::OffsetDateTime;
use traceforge::trace::{
    FinalOutputStep, InterruptStep, MemoryReadStep, RetrievalResult, RetrievalStep,
    StateChangeStep, Step, TraceErrorKind, TraceRun,
};

use crate::helpers::{change, llm_call, memory_write, tool_call, trace, user_input};

fn all_variant_steps() -> Vec<Step> {
    let now = OffsetDateTime::now_utc();
    vec![
        user_input("step-1", "I have a Tesla Model 3"),
        llm_call("step-2", Some(10), Some(20), Some(30)),
        tool_call("step-3", "update_profile"),
        Step::Retrieval(RetrievalStep {
            step_id: "step-4".to_string(),
            timestamp: now,
            parent_step_id: Some("step-2".to_string()),
            metadata: None,
            query: "charging schedule".to_string(),
            results: vec![RetrievalResult {
                content: "doc".to_string(),
                score: Some(0.9),
                metadata: None,
            }],
            match_count: 1,
            latency_ms: Some(4),
        }),
        Step::MemoryRead(MemoryReadStep {
            step_id: "step-5".to_string(),
            timestamp: now,
            parent_step_id: None,
            metadata: None,
            query: json!({"namespace": ["user"]}),
            results: vec![json!({"ev_model": "Tesla Model 3"})],
            match_count: 1,
            relevance_scores: Some(vec![1.0]),
            total_available: Some(1),
        }),
        memory_write(
            "step-6",
            vec![change("$.equipment.ev_model", None, Some(json!("Tesla Model 3")))],
        ),
        Step::StateChange(StateChangeStep {
            step_id: "step-7".to_string(),
            timestamp: now,
            parent_step_id: None,
            metadata: None,
            state_key: "phase".to_string(),
            old_value: Some(json!("planning")),
            new_value: json!("acting"),
            reason: Some("plan approved".to_string()),
        }),
        Step::Interrupt(InterruptStep {
            step_id: "step-8".to_string(),
            timestamp: now,
            parent_step_id: None,
            metadata: None,
            prompt: "Proceed with update?".to_string(),
            response: json!(true),
            wait_duration_ms: 1500,
        }),
        Step::FinalOutput(FinalOutputStep {
            step_id: "step-9".to_string(),
            timestamp: now,
            parent_step_id: None,
            metadata: None,
            content: json!("Profile updated."),
            format: Some("text".to_string()),
        }),
    ]
}

#[test]
fn given_all_step_variants_when_serialized_then_step_type_tags_survive_roundtrip() {
    let mut original = trace();
    for step in all_variant_steps() {
        original.append_step(step).expect("append should succeed");
    }
    original
        .finalize(OffsetDateTime::now_utc())
        .expect("finalize should succeed");

    let text = original.to_json().expect("serialization should succeed");
    let restored = TraceRun::from_json(&text).expect("deserialization should succeed");

    assert_eq!(restored, original);
    let tags: Vec<&str> = restored
        .steps
        .iter()
        .map(|step| step.step_type().as_str())
        .collect();
    assert_eq!(
        tags,
        vec![
            "user_input",
            "llm_call",
            "tool_call",
            "retrieval",
            "memory_read",
            "memory_write",
            "state_change",
            "interrupt",
            "final_output",
        ]
    );
}

#[test]
fn given_absent_optional_fields_when_serialized_then_keys_are_omitted() {
    let step = user_input("step-1", "hello");
    let value = serde_json::to_value(&step).expect("step should serialize");
    let object = value.as_object().expect("step serializes to an object");

    assert_eq!(object["step_type"], json!("user_input"));
    assert!(!object.contains_key("parent_step_id"));
    assert!(!object.contains_key("metadata"));

    let mut trace = trace();
    trace.append_step(step).unwrap();
    let value: Value = serde_json::to_value(&trace).expect("trace should serialize");
    assert!(!value.as_object().unwrap().contains_key("ended_at"));
}

#[test]
fn given_trace_json_with_duplicate_step_ids_when_parsed_then_validation_fails() {
    let mut trace = trace();
    trace.append_step(user_input("step-1", "one")).unwrap();
    let mut value = serde_json::to_value(&trace).unwrap();
    let steps = value["steps"].as_array_mut().unwrap();
    let clone = steps[0].clone();
    steps.push(clone);

    let err = TraceRun::from_json(&value.to_string())
        .expect_err("duplicate ids must fail validation on load");
    assert_eq!(err.kind, TraceErrorKind::DuplicateStepId);
}

#[test]
fn given_field_change_with_null_leaf_when_constructed_then_normalized_to_absent() {
    let loss = change("$.equipment.ev_model", Some(json!("Tesla Model 3")), Some(Value::Null));
    assert_eq!(loss.new_value, None);
    assert!(loss.is_data_loss());

    let noop = change("$.missing", Some(Value::Null), None);
    assert_eq!(noop.old_value, None);
    assert!(!noop.is_data_loss());
}
