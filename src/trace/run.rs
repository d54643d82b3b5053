use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::trace::{
    error::{TraceError, duplicate_step_id, invalid_time_range, sealed_trace, serialization},
    step::{LlmCallStep, MemoryReadStep, MemoryWriteStep, Step, ToolCallStep, UserInputStep},
    types::{AgentInfo, StepType, TaskInfo},
};

/// The complete, ordered record of one agent run.
///
/// Steps are kept in append order (causal emission order); timestamps of
/// concurrent branches may interleave. Once `ended_at` is set the trace
/// is sealed and rejects further appends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRun {
    pub run_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<OffsetDateTime>,
    pub agent_info: AgentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_info: Option<TaskInfo>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl TraceRun {
    pub fn new(run_id: impl Into<String>, agent_info: AgentInfo, task_info: Option<TaskInfo>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: OffsetDateTime::now_utc(),
            ended_at: None,
            agent_info,
            task_info,
            steps: Vec::new(),
            metadata: None,
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Enforces the trace-wide invariants: step ids are unique and
    /// `ended_at`, when set, is not before `started_at`. These are
    /// reported at construction/validation time, never deferred to
    /// grading.
    pub fn validate(&self) -> Result<(), TraceError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !seen.insert(step.step_id()) {
                return Err(duplicate_step_id(format!(
                    "duplicate step_id '{}' in trace '{}'",
                    step.step_id(),
                    self.run_id
                )));
            }
        }

        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(invalid_time_range(format!(
                    "ended_at {} is before started_at {}",
                    ended_at, self.started_at
                )));
            }
        }

        Ok(())
    }

    /// Appends a finalized step. Fails on a sealed trace or a step id
    /// already present in the trace.
    pub fn append_step(&mut self, step: Step) -> Result<(), TraceError> {
        if self.is_sealed() {
            return Err(sealed_trace(format!(
                "trace '{}' is sealed, cannot append step '{}'",
                self.run_id,
                step.step_id()
            )));
        }
        if self.steps.iter().any(|s| s.step_id() == step.step_id()) {
            return Err(duplicate_step_id(format!(
                "duplicate step_id '{}' in trace '{}'",
                step.step_id(),
                self.run_id
            )));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Seals the trace. After this the trace is immutable.
    pub fn finalize(&mut self, ended_at: OffsetDateTime) -> Result<(), TraceError> {
        if ended_at < self.started_at {
            return Err(invalid_time_range(format!(
                "ended_at {} is before started_at {}",
                ended_at, self.started_at
            )));
        }
        self.ended_at = Some(ended_at);
        self.validate()
    }

    pub fn steps_of_type(&self, step_type: StepType) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|step| step.step_type() == step_type)
            .collect()
    }

    pub fn llm_calls(&self) -> Vec<&LlmCallStep> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::LlmCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn tool_calls(&self) -> Vec<&ToolCallStep> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::ToolCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn memory_reads(&self) -> Vec<&MemoryReadStep> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::MemoryRead(read) => Some(read),
                _ => None,
            })
            .collect()
    }

    pub fn memory_writes(&self) -> Vec<&MemoryWriteStep> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::MemoryWrite(write) => Some(write),
                _ => None,
            })
            .collect()
    }

    pub fn user_inputs(&self) -> Vec<&UserInputStep> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::UserInput(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    /// Total tokens across all LLM calls, preferring the reported total
    /// and falling back to in + out.
    pub fn total_tokens(&self) -> u64 {
        self.llm_calls()
            .iter()
            .filter_map(|call| match (call.tokens_total, call.tokens_in, call.tokens_out) {
                (Some(total), _, _) => Some(total),
                (None, Some(input), Some(output)) => Some(input + output),
                _ => None,
            })
            .sum()
    }

    pub fn total_tool_calls(&self) -> usize {
        self.tool_calls().len()
    }

    pub fn to_json(&self) -> Result<String, TraceError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| serialization(format!("failed to serialize trace: {}", err)))
    }

    pub fn from_json(text: &str) -> Result<Self, TraceError> {
        let trace: TraceRun = serde_json::from_str(text)
            .map_err(|err| serialization(format!("failed to deserialize trace: {}", err)))?;
        trace.validate()?;
        Ok(trace)
    }
}
