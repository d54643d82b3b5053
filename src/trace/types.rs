use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Discriminator for the nine step variants. Serialized as the
/// `step_type` field on every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    UserInput,
    LlmCall,
    ToolCall,
    Retrieval,
    MemoryRead,
    MemoryWrite,
    StateChange,
    Interrupt,
    FinalOutput,
}

impl StepType {
    pub fn as_str(self) -> &'static str {
        match self {
            StepType::UserInput => "user_input",
            StepType::LlmCall => "llm_call",
            StepType::ToolCall => "tool_call",
            StepType::Retrieval => "retrieval",
            StepType::MemoryRead => "memory_read",
            StepType::MemoryWrite => "memory_write",
            StepType::StateChange => "state_change",
            StepType::Interrupt => "interrupt",
            StepType::FinalOutput => "final_output",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_version: Option<String>,
}

impl AgentInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            framework: None,
            framework_version: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TaskInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Map<String, Value>>,
}

/// Cost or credit impact of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceImpact {
    pub amount: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Map<String, Value>>,
}

/// A single retrieved document or item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOperation {
    Add,
    Update,
    Delete,
    Put,
}

/// A single field-level change inside a memory write, at a JSON path
/// such as `$.equipment.solar_capacity_kw`.
///
/// `None` means the field was absent on that side; an explicit JSON
/// `null` leaf is normalized to `None` at construction so that "field
/// did not exist" and "field was null" compare the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl FieldChange {
    pub fn new(path: impl Into<String>, old_value: Option<Value>, new_value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            old_value: normalize_leaf(old_value),
            new_value: normalize_leaf(new_value),
        }
    }

    /// A previously present value became absent. This is the atomic
    /// condition the corruption grader flags.
    pub fn is_data_loss(&self) -> bool {
        self.old_value.is_some() && self.new_value.is_none()
    }
}

fn normalize_leaf(value: Option<Value>) -> Option<Value> {
    match value {
        Some(Value::Null) | None => None,
        other => other,
    }
}
