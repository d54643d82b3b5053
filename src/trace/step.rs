use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::trace::types::{
    FieldChange, ResourceImpact, RetrievalResult, StepType, WriteOperation,
};

/// One finalized, immutable record of a single agent operation.
///
/// Serialized as an internally tagged union: the `step_type` field
/// selects the variant, the variant's fields sit at the same level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step_type", rename_all = "snake_case")]
pub enum Step {
    UserInput(UserInputStep),
    LlmCall(LlmCallStep),
    ToolCall(ToolCallStep),
    Retrieval(RetrievalStep),
    MemoryRead(MemoryReadStep),
    MemoryWrite(MemoryWriteStep),
    StateChange(StateChangeStep),
    Interrupt(InterruptStep),
    FinalOutput(FinalOutputStep),
}

macro_rules! base_field {
    ($self:ident, $field:ident) => {
        match $self {
            Step::UserInput(step) => &step.$field,
            Step::LlmCall(step) => &step.$field,
            Step::ToolCall(step) => &step.$field,
            Step::Retrieval(step) => &step.$field,
            Step::MemoryRead(step) => &step.$field,
            Step::MemoryWrite(step) => &step.$field,
            Step::StateChange(step) => &step.$field,
            Step::Interrupt(step) => &step.$field,
            Step::FinalOutput(step) => &step.$field,
        }
    };
}

impl Step {
    pub fn step_id(&self) -> &str {
        base_field!(self, step_id)
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        *base_field!(self, timestamp)
    }

    pub fn parent_step_id(&self) -> Option<&str> {
        base_field!(self, parent_step_id).as_deref()
    }

    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        base_field!(self, metadata).as_ref()
    }

    pub fn step_type(&self) -> StepType {
        match self {
            Step::UserInput(_) => StepType::UserInput,
            Step::LlmCall(_) => StepType::LlmCall,
            Step::ToolCall(_) => StepType::ToolCall,
            Step::Retrieval(_) => StepType::Retrieval,
            Step::MemoryRead(_) => StepType::MemoryRead,
            Step::MemoryWrite(_) => StepType::MemoryWrite,
            Step::StateChange(_) => StepType::StateChange,
            Step::Interrupt(_) => StepType::Interrupt,
            Step::FinalOutput(_) => StepType::FinalOutput,
        }
    }
}

/// Input provided by the user to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInputStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
}

/// A language model invocation with prompt, response, and usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCallStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub model: String,
    pub input: Value,
    pub output: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_estimate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// A tool/function invocation. Failed calls are still emitted with
/// `success = false`; tool failures are meaningful trace data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub tool_name: String,
    pub arguments: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_impact: Option<ResourceImpact>,
}

/// A query against a retrieval system and its results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub query: String,
    pub results: Vec<RetrievalResult>,
    pub match_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// A read from agent memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReadStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub query: Value,
    pub results: Vec<Value>,
    pub match_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_scores: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_available: Option<usize>,
}

/// A write to agent memory with field-level change tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryWriteStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub operation: WriteOperation,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<Vec<FieldChange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_by_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// A change of internal agent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChangeStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub state_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    pub new_value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A human-in-the-loop pause and the response it received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterruptStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub prompt: String,
    pub response: Value,
    pub wait_duration_ms: u64,
}

/// The agent's final response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalOutputStep {
    pub step_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
