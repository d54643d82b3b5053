use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    redaction::RedactionSettings,
    trace::types::{AgentInfo, ResourceImpact, RetrievalResult, TaskInfo, WriteOperation},
};

/// Explicit construction-time configuration for the correlator. No
/// global state: independent correlators can run in parallel in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelatorConfig {
    pub agent_info: AgentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_info: Option<TaskInfo>,
    /// Auto-generated (uuid v4) when not provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default)]
    pub redaction: RedactionSettings,
}

impl CorrelatorConfig {
    pub fn for_agent(agent_info: AgentInfo) -> Self {
        Self {
            agent_info,
            task_info: None,
            run_id: None,
            redaction: RedactionSettings::default(),
        }
    }
}

/// Kind-specific input snapshot captured at `on_start`.
#[derive(Debug, Clone, PartialEq)]
pub enum StartPayload {
    Llm {
        model: String,
        input: Value,
    },
    Tool {
        tool_name: String,
        arguments: Value,
    },
    Retrieval {
        query: String,
    },
    MemoryRead {
        query: Value,
    },
    MemoryWrite {
        namespace: Option<Vec<String>>,
        key: Option<String>,
        operation: WriteOperation,
        /// State read before the write happens. `None` means the record
        /// did not exist; the diff then treats every field as a creation.
        pre_image: Option<Map<String, Value>>,
    },
}

impl StartPayload {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            StartPayload::Llm { .. } => "llm_call",
            StartPayload::Tool { .. } => "tool_call",
            StartPayload::Retrieval { .. } => "retrieval",
            StartPayload::MemoryRead { .. } => "memory_read",
            StartPayload::MemoryWrite { .. } => "memory_write",
        }
    }
}

/// Kind-specific completion data delivered at `on_end`.
#[derive(Debug, Clone, PartialEq)]
pub enum EndPayload {
    Llm {
        output: Value,
        tokens_in: Option<u64>,
        tokens_out: Option<u64>,
        tokens_total: Option<u64>,
        cost_estimate: Option<f64>,
        provider: Option<String>,
    },
    Tool {
        result: Option<Value>,
        success: Option<bool>,
        resource_impact: Option<ResourceImpact>,
    },
    Retrieval {
        results: Vec<RetrievalResult>,
    },
    MemoryRead {
        results: Vec<Value>,
        relevance_scores: Option<Vec<f64>>,
        total_available: Option<usize>,
    },
    MemoryWrite {
        post_image: Map<String, Value>,
    },
}

impl EndPayload {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            EndPayload::Llm { .. } => "llm_call",
            EndPayload::Tool { .. } => "tool_call",
            EndPayload::Retrieval { .. } => "retrieval",
            EndPayload::MemoryRead { .. } => "memory_read",
            EndPayload::MemoryWrite { .. } => "memory_write",
        }
    }
}

/// Correlation state for one in-flight framework operation.
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    pub step_id: String,
    pub started: Instant,
    pub parent_run_id: Option<String>,
    pub payload: StartPayload,
}
