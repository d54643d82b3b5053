use std::{
    collections::HashMap,
    sync::Mutex,
    time::Instant,
};

use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    correlator::{
        error::{
            CorrelatorError, duplicate_start, inflight_remaining, invalid_config, kind_mismatch,
            sealed_trace, unknown_run,
        },
        types::{CorrelatorConfig, EndPayload, InFlight, StartPayload},
    },
    diff::diff_snapshots,
    redaction::RedactionFilter,
    trace::{
        run::TraceRun,
        step::{
            FinalOutputStep, InterruptStep, LlmCallStep, MemoryReadStep, MemoryWriteStep,
            RetrievalStep, StateChangeStep, Step, ToolCallStep, UserInputStep,
        },
        types::StepType,
    },
};

/// Reconstructs a causal, timed step tree from asynchronous start/end
/// callback pairs.
///
/// The in-flight table is the only shared mutable state that concurrent
/// callbacks touch; claiming an entry with `HashMap::remove` under the
/// mutex gives exactly-once finalization per run id. Step ids are
/// reserved at `on_start` in a table that outlives finalization, so a
/// child finalizing before its parent still resolves `parent_step_id`.
#[derive(Debug)]
pub struct EventCorrelator {
    trace: Mutex<TraceRun>,
    inflight: Mutex<HashMap<String, InFlight>>,
    step_ids: Mutex<HashMap<String, String>>,
    redaction: RedactionFilter,
}

impl EventCorrelator {
    pub fn new(config: CorrelatorConfig) -> Result<Self, CorrelatorError> {
        let redaction = RedactionFilter::compile(&config.redaction)
            .map_err(|err| invalid_config(format!("invalid redaction pattern: {}", err)))?;
        let run_id = config
            .run_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Ok(Self {
            trace: Mutex::new(TraceRun::new(run_id, config.agent_info, config.task_info)),
            inflight: Mutex::new(HashMap::new()),
            step_ids: Mutex::new(HashMap::new()),
            redaction,
        })
    }

    /// Registers the start of a framework operation and returns the step
    /// id reserved for it.
    pub fn on_start(
        &self,
        run_id: &str,
        parent_run_id: Option<&str>,
        payload: StartPayload,
    ) -> Result<String, CorrelatorError> {
        let step_id = self.reserve_step_id(run_id);
        let entry = InFlight {
            step_id: step_id.clone(),
            started: Instant::now(),
            parent_run_id: parent_run_id.map(str::to_string),
            payload,
        };

        let mut inflight = self.lock_inflight();
        if inflight.contains_key(run_id) {
            return Err(duplicate_start(format!(
                "run '{}' already has an in-flight operation",
                run_id
            )));
        }
        debug!(run_id, kind = entry.payload.kind_name(), "operation started");
        inflight.insert(run_id.to_string(), entry);
        Ok(step_id)
    }

    /// Finalizes the operation for `run_id`: claims the in-flight entry,
    /// computes latency, resolves the parent, diffs memory writes,
    /// redacts, and appends exactly one sealed step to the trace.
    pub fn on_end(&self, run_id: &str, payload: EndPayload) -> Result<String, CorrelatorError> {
        let entry = self.claim(run_id)?;
        let latency_ms = entry.started.elapsed().as_millis() as u64;
        let parent_step_id = self.resolve_parent(entry.parent_run_id.as_deref());

        let step = match (entry.payload, payload) {
            (
                StartPayload::Llm { model, input },
                EndPayload::Llm {
                    output,
                    tokens_in,
                    tokens_out,
                    tokens_total,
                    cost_estimate,
                    provider,
                },
            ) => Step::LlmCall(LlmCallStep {
                step_id: entry.step_id,
                timestamp: OffsetDateTime::now_utc(),
                parent_step_id,
                metadata: None,
                model,
                input: self.redacted(input),
                output: self.redacted(output),
                tokens_in,
                tokens_out,
                tokens_total,
                latency_ms: Some(latency_ms),
                cost_estimate,
                provider,
            }),
            (
                StartPayload::Tool { tool_name, arguments },
                EndPayload::Tool {
                    result,
                    success,
                    resource_impact,
                },
            ) => Step::ToolCall(ToolCallStep {
                step_id: entry.step_id,
                timestamp: OffsetDateTime::now_utc(),
                parent_step_id,
                metadata: None,
                tool_name,
                arguments: self.redacted(arguments),
                result: result.map(|value| self.redacted(value)),
                latency_ms: Some(latency_ms),
                success,
                error: None,
                resource_impact,
            }),
            (StartPayload::Retrieval { query }, EndPayload::Retrieval { results }) => {
                let match_count = results.len();
                Step::Retrieval(RetrievalStep {
                    step_id: entry.step_id,
                    timestamp: OffsetDateTime::now_utc(),
                    parent_step_id,
                    metadata: None,
                    query: self.redaction.redact(&query),
                    results,
                    match_count,
                    latency_ms: Some(latency_ms),
                })
            }
            (
                StartPayload::MemoryRead { query },
                EndPayload::MemoryRead {
                    results,
                    relevance_scores,
                    total_available,
                },
            ) => {
                let match_count = results.len();
                Step::MemoryRead(MemoryReadStep {
                    step_id: entry.step_id,
                    timestamp: OffsetDateTime::now_utc(),
                    parent_step_id,
                    metadata: None,
                    query: self.redacted(query),
                    results,
                    match_count,
                    relevance_scores,
                    total_available,
                })
            }
            (
                StartPayload::MemoryWrite {
                    namespace,
                    key,
                    operation,
                    pre_image,
                },
                EndPayload::MemoryWrite { post_image },
            ) => {
                let changes = diff_snapshots(pre_image.as_ref(), &post_image);
                let triggered_by_step_id = self.last_tool_call_id();
                Step::MemoryWrite(MemoryWriteStep {
                    step_id: entry.step_id,
                    timestamp: OffsetDateTime::now_utc(),
                    parent_step_id,
                    metadata: None,
                    namespace,
                    key,
                    operation,
                    data: self.redacted(Value::Object(post_image)),
                    changes: Some(changes),
                    triggered_by_step_id,
                    latency_ms: Some(latency_ms),
                })
            }
            (start, end) => {
                return Err(kind_mismatch(format!(
                    "run '{}' started as {} but ended as {}",
                    run_id,
                    start.kind_name(),
                    end.kind_name()
                )));
            }
        };

        debug!(run_id, step_id = step.step_id(), "operation finalized");
        self.append(step)
    }

    /// Discards in-flight state for a failed operation. Tool failures
    /// are the one fallible case that still emits a step: a `ToolCall`
    /// with `success = false` and the error message.
    pub fn on_error(&self, run_id: &str, message: &str) -> Result<Option<String>, CorrelatorError> {
        let Some(entry) = self.lock_inflight().remove(run_id) else {
            return Ok(None);
        };

        match entry.payload {
            StartPayload::Tool { tool_name, arguments } => {
                let latency_ms = entry.started.elapsed().as_millis() as u64;
                let parent_step_id = self.resolve_parent(entry.parent_run_id.as_deref());
                warn!(run_id, tool_name, "tool call failed");
                let step = Step::ToolCall(ToolCallStep {
                    step_id: entry.step_id,
                    timestamp: OffsetDateTime::now_utc(),
                    parent_step_id,
                    metadata: None,
                    tool_name,
                    arguments: self.redacted(arguments),
                    result: None,
                    latency_ms: Some(latency_ms),
                    success: Some(false),
                    error: Some(message.to_string()),
                    resource_impact: None,
                });
                self.append(step).map(Some)
            }
            _ => {
                debug!(run_id, "discarded in-flight state after callback error");
                Ok(None)
            }
        }
    }

    // Instantaneous steps have no start/end pair; they are redacted and
    // appended directly.

    pub fn record_user_input(
        &self,
        content: &str,
        input_type: Option<&str>,
        parent_step_id: Option<&str>,
    ) -> Result<String, CorrelatorError> {
        let step_id = Uuid::new_v4().to_string();
        let step = Step::UserInput(UserInputStep {
            step_id: step_id.clone(),
            timestamp: OffsetDateTime::now_utc(),
            parent_step_id: parent_step_id.map(str::to_string),
            metadata: None,
            content: self.redaction.redact(content),
            input_type: input_type.map(str::to_string),
        });
        self.append(step)?;
        Ok(step_id)
    }

    pub fn record_state_change(
        &self,
        state_key: &str,
        old_value: Option<Value>,
        new_value: Value,
        reason: Option<&str>,
    ) -> Result<String, CorrelatorError> {
        let step_id = Uuid::new_v4().to_string();
        let step = Step::StateChange(StateChangeStep {
            step_id: step_id.clone(),
            timestamp: OffsetDateTime::now_utc(),
            parent_step_id: None,
            metadata: None,
            state_key: state_key.to_string(),
            old_value: old_value.map(|value| self.redacted(value)),
            new_value: self.redacted(new_value),
            reason: reason.map(str::to_string),
        });
        self.append(step)?;
        Ok(step_id)
    }

    pub fn record_interrupt(
        &self,
        prompt: &str,
        response: Value,
        wait_duration_ms: u64,
    ) -> Result<String, CorrelatorError> {
        let step_id = Uuid::new_v4().to_string();
        let step = Step::Interrupt(InterruptStep {
            step_id: step_id.clone(),
            timestamp: OffsetDateTime::now_utc(),
            parent_step_id: None,
            metadata: None,
            prompt: self.redaction.redact(prompt),
            response: self.redacted(response),
            wait_duration_ms,
        });
        self.append(step)?;
        Ok(step_id)
    }

    pub fn record_final_output(
        &self,
        content: Value,
        format: Option<&str>,
    ) -> Result<String, CorrelatorError> {
        let step_id = Uuid::new_v4().to_string();
        let step = Step::FinalOutput(FinalOutputStep {
            step_id: step_id.clone(),
            timestamp: OffsetDateTime::now_utc(),
            parent_step_id: None,
            metadata: None,
            content: self.redacted(content),
            format: format.map(str::to_string),
        });
        self.append(step)?;
        Ok(step_id)
    }

    pub fn inflight_count(&self) -> usize {
        self.lock_inflight().len()
    }

    /// Seals the trace and returns it. Fails if operations are still in
    /// flight; use [`EventCorrelator::abort`] to discard them instead.
    pub fn finish(self) -> Result<TraceRun, CorrelatorError> {
        {
            let inflight = self.lock_inflight();
            if !inflight.is_empty() {
                let mut run_ids: Vec<&str> = inflight.keys().map(String::as_str).collect();
                run_ids.sort_unstable();
                return Err(inflight_remaining(format!(
                    "cannot finish with in-flight operations: {}",
                    run_ids.join(", ")
                )));
            }
        }
        self.seal()
    }

    /// Discards all in-flight state and seals the trace. No partial
    /// steps are appended; a step is either fully built or absent.
    pub fn abort(self) -> Result<TraceRun, CorrelatorError> {
        let discarded = {
            let mut inflight = self.lock_inflight();
            let count = inflight.len();
            inflight.clear();
            count
        };
        if discarded > 0 {
            warn!(discarded, "aborted run with in-flight operations");
        }
        self.seal()
    }

    fn seal(self) -> Result<TraceRun, CorrelatorError> {
        let mut trace = self
            .trace
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trace
            .finalize(OffsetDateTime::now_utc())
            .map_err(|err| sealed_trace(err.message))?;
        Ok(trace)
    }

    fn reserve_step_id(&self, run_id: &str) -> String {
        let mut step_ids = self
            .step_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        step_ids
            .entry(run_id.to_string())
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }

    fn resolve_parent(&self, parent_run_id: Option<&str>) -> Option<String> {
        let parent_run_id = parent_run_id?;
        self.step_ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(parent_run_id)
            .cloned()
    }

    fn claim(&self, run_id: &str) -> Result<InFlight, CorrelatorError> {
        self.lock_inflight().remove(run_id).ok_or_else(|| {
            unknown_run(format!(
                "run '{}' has no in-flight operation (unknown or already finalized)",
                run_id
            ))
        })
    }

    fn last_tool_call_id(&self) -> Option<String> {
        let trace = self
            .trace
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trace
            .steps
            .iter()
            .rev()
            .find(|step| step.step_type() == StepType::ToolCall)
            .map(|step| step.step_id().to_string())
    }

    fn append(&self, step: Step) -> Result<String, CorrelatorError> {
        let step_id = step.step_id().to_string();
        let mut trace = self
            .trace
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trace
            .append_step(step)
            .map_err(|err| sealed_trace(err.message))?;
        Ok(step_id)
    }

    fn lock_inflight(&self) -> std::sync::MutexGuard<'_, HashMap<String, InFlight>> {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn redacted(&self, mut value: Value) -> Value {
        self.redaction.redact_value(&mut value);
        value
    }
}
