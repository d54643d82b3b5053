use serde_json::{Value, json};
use time::OffsetDateTime;
use traceforge::trace::{
    AgentInfo, FieldChange, LlmCallStep, MemoryWriteStep, Step, ToolCallStep, TraceRun,
    UserInputStep, WriteOperation,
};

pub fn trace() -> TraceRun {
    TraceRun::new("run-1", AgentInfo::named("test-agent"), None)
}

pub fn user_input(step_id: &str, content: &str) -> Step {
    Step::UserInput(UserInputStep {
        step_id: step_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
        parent_step_id: None,
        metadata: None,
        content: content.to_string(),
        input_type: Some("chat".to_string()),
    })
}

pub fn llm_call(step_id: &str, tokens_in: Option<u64>, tokens_out: Option<u64>, tokens_total: Option<u64>) -> Step {
    Step::LlmCall(LlmCallStep {
        step_id: step_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
        parent_step_id: None,
        metadata: None,
        model: "test-model".to_string(),
        input: json!("prompt"),
        output: json!("completion"),
        tokens_in,
        tokens_out,
        tokens_total,
        latency_ms: Some(12),
        cost_estimate: None,
        provider: None,
    })
}

pub fn tool_call(step_id: &str, tool_name: &str) -> Step {
    Step::ToolCall(ToolCallStep {
        step_id: step_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
        parent_step_id: None,
        metadata: None,
        tool_name: tool_name.to_string(),
        arguments: json!({"q": 1}),
        result: Some(json!({"ok": true})),
        latency_ms: Some(3),
        success: Some(true),
        error: None,
        resource_impact: None,
    })
}

pub fn memory_write(step_id: &str, changes: Vec<FieldChange>) -> Step {
    Step::MemoryWrite(MemoryWriteStep {
        step_id: step_id.to_string(),
        timestamp: OffsetDateTime::now_utc(),
        parent_step_id: None,
        metadata: None,
        namespace: Some(vec!["user".to_string(), "profile".to_string()]),
        key: Some("profile".to_string()),
        operation: WriteOperation::Update,
        data: json!({}),
        changes: Some(changes),
        triggered_by_step_id: None,
        latency_ms: Some(5),
    })
}

pub fn change(path: &str, old_value: Option<Value>, new_value: Option<Value>) -> FieldChange {
    FieldChange::new(path, old_value, new_value)
}
