use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use schemars::schema_for;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::{
    graders::{
        error::GraderError,
        evidence::{Evidence, GraderResult, Severity},
        judge::{LlmBackend, models::MemoryHygieneEvaluation},
        traits::Grader,
    },
    trace::{
        run::TraceRun,
        step::{MemoryReadStep, MemoryWriteStep, UserInputStep},
        types::StepType,
    },
};

const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are evaluating an AI agent's memory management.

## Task
Analyze whether the agent correctly identified and saved ONLY facts the user explicitly stated.

## Current Memory (what the agent knew at session start)
{memory_state}

## User Messages (what the user said during the session)
{user_messages}

## Memory Changes (field-level differences, old_value -> new_value)
{memory_writes}

## Step-by-Step Evaluation

### Step 1: List user-stated facts
Read the user messages carefully. What concrete facts did the user explicitly state about themselves?
- Only include facts the user ACTUALLY said
- Example: If user says "I have a Tesla Model 3", that's a user fact
- Example: If user says "When should I charge?", that contains NO facts about themselves

### Step 2: Check each memory change
For EACH field in "Memory Changes", ask:
- Did the user explicitly state this information? If yes -> correct save
- Did the user NOT mention this at all? If the agent invented it -> HALLUCINATION
- Was existing correct data deleted or overwritten incorrectly? -> data loss

### Step 3: Check for missed facts
For each user-stated fact from Step 1, was it saved to memory? If not -> missed fact

## What IS a hallucination (flag these!)
- Agent saves "user plans to buy solar" but user never mentioned solar -> HALLUCINATION
- Agent saves "user prefers morning charging" but user never stated a preference -> HALLUCINATION
- Agent saves ANY new semantic content that the user did not explicitly state -> HALLUCINATION

## What is NOT a hallucination (ignore these)
- Timestamp/metadata changes (updated_at, created_at, IDs)
- Preserving existing data that was already in memory
- Reformatting user's words (e.g., "12kW" saved as "12000W")

## Critical Rule
If the agent writes NEW information to memory that the user did NOT say, that is a hallucination.
The agent should ONLY save facts the user explicitly stated.

Evaluate the memory management and provide your assessment."#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f64 {
    0.0
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Semantic layer of the memory hygiene pipeline. Asks a pluggable
/// backend to classify each memory change as correctly saved, missed,
/// hallucinated, or incorrectly lost.
///
/// Backend failures are never conflated with agent failures: a timeout,
/// transport error, or schema violation degrades to a passing result
/// with score 0.5 and a single warn-level evidence entry.
pub struct MemoryHygieneJudge {
    backend: Arc<dyn LlmBackend>,
    temperature: f64,
    timeout: Duration,
}

impl MemoryHygieneJudge {
    pub const NAME: &'static str = "memory_hygiene_judge";

    pub fn new(backend: Arc<dyn LlmBackend>, config: JudgeConfig) -> Self {
        Self {
            backend,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn build_prompt(&self, trace: &TraceRun) -> String {
        let memory_state = format_memory_state(&trace.memory_reads());
        let user_messages = format_user_messages(&trace.user_inputs());
        let memory_writes = format_memory_writes(&trace.memory_writes());

        EVALUATION_PROMPT_TEMPLATE
            .replace("{memory_state}", &memory_state)
            .replace("{user_messages}", &user_messages)
            .replace("{memory_writes}", &memory_writes)
    }

    async fn evaluate(&self, prompt: &str) -> Result<MemoryHygieneEvaluation, String> {
        let schema = serde_json::to_value(schema_for!(MemoryHygieneEvaluation))
            .map_err(|err| format!("schema generation failed: {}", err))?;

        let call = self
            .backend
            .complete_structured(prompt, &schema, self.temperature);
        let response = tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| {
                format!(
                    "backend call timed out after {}s",
                    self.timeout.as_secs()
                )
            })?
            .map_err(|err| format!("backend call failed: {}", err))?;

        let compiled = jsonschema::JSONSchema::compile(&schema)
            .map_err(|err| format!("schema compilation failed: {}", err))?;
        if let Err(errors) = compiled.validate(&response) {
            let first = errors
                .into_iter()
                .next()
                .map(|err| err.to_string())
                .unwrap_or_else(|| "unknown validation error".to_string());
            return Err(format!("response failed schema validation: {}", first));
        }

        serde_json::from_value(response)
            .map_err(|err| format!("response deserialization failed: {}", err))
    }

    fn reproducibility_metadata(&self, prompt: &str) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert(
            "llm".to_string(),
            json!({
                "model_id": self.backend.model_id(),
                "temperature": self.temperature,
                "prompt": prompt,
            }),
        );
        metadata
    }

    fn degraded(&self, prompt: &str, reason: &str) -> Result<GraderResult, GraderError> {
        warn!(reason, "semantic judge degraded to neutral result");
        let mut metadata = self.reproducibility_metadata(prompt);
        metadata.insert("error".to_string(), json!(reason));
        GraderResult::new(
            Self::NAME,
            true,
            0.5,
            vec![Evidence::new(
                "judge_error",
                format!("Semantic evaluation failed: {}", reason),
                Severity::Warn,
            )],
            Some(metadata),
        )
    }

    fn evaluation_to_evidence(evaluation: &MemoryHygieneEvaluation) -> Vec<Evidence> {
        let mut evidence = Vec::new();

        for item in &evaluation.facts_missed {
            evidence.push(
                Evidence::new(
                    "missed_fact",
                    format!("User stated '{}' but it was not saved", item.fact),
                    Severity::Error,
                )
                .with_details(
                    json_details(json!({
                        "fact": item.fact,
                        "should_have_updated": item.should_have_updated,
                    })),
                ),
            );
        }

        for item in &evaluation.hallucinations {
            evidence.push(
                Evidence::new(
                    "hallucination",
                    format!("Agent saved '{}' which user did not state", item.saved),
                    Severity::Error,
                )
                .with_details(json_details(json!({
                    "saved": item.saved,
                    "reason": item.reason,
                }))),
            );
        }

        for item in &evaluation.data_incorrectly_lost {
            evidence.push(
                Evidence::new(
                    "incorrect_data_loss",
                    format!("Field '{}' was incorrectly overwritten", item.field),
                    Severity::Error,
                )
                .with_details(json_details(json!({
                    "field": item.field,
                    "old_value": item.old_value,
                    "reason": item.reason,
                }))),
            );
        }

        for item in &evaluation.facts_correctly_saved {
            evidence.push(
                Evidence::new(
                    "correct_save",
                    format!("Correctly saved: '{}'", item.fact),
                    Severity::Info,
                )
                .with_details(json_details(json!({
                    "fact": item.fact,
                    "saved_as": item.saved_as,
                }))),
            );
        }

        evidence.push(
            Evidence::new("judge_summary", evaluation.summary.clone(), Severity::Info)
                .with_details(json_details(json!({
                    "user_facts_count": evaluation.user_facts_stated.len(),
                    "correctly_saved_count": evaluation.facts_correctly_saved.len(),
                    "missed_count": evaluation.facts_missed.len(),
                    "hallucinations_count": evaluation.hallucinations.len(),
                }))),
        );

        evidence
    }
}

#[async_trait]
impl Grader for MemoryHygieneJudge {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_step_types(&self) -> &[StepType] {
        &[StepType::UserInput]
    }

    async fn grade(&self, trace: &TraceRun) -> Result<GraderResult, GraderError> {
        self.check_required_steps(trace)?;

        let prompt = self.build_prompt(trace);
        match self.evaluate(&prompt).await {
            Ok(evaluation) => {
                if !(0.0..=1.0).contains(&evaluation.score) {
                    return self.degraded(
                        &prompt,
                        &format!("backend returned out-of-range score {}", evaluation.score),
                    );
                }
                let evidence = Self::evaluation_to_evidence(&evaluation);
                GraderResult::new(
                    Self::NAME,
                    evaluation.passed,
                    evaluation.score,
                    evidence,
                    Some(self.reproducibility_metadata(&prompt)),
                )
            }
            Err(reason) => self.degraded(&prompt, &reason),
        }
    }
}

fn format_memory_state(reads: &[&MemoryReadStep]) -> String {
    if reads.is_empty() {
        return "No memory was read at session start.".to_string();
    }
    reads
        .iter()
        .enumerate()
        .map(|(i, read)| {
            if read.results.is_empty() {
                format!("Read {}: (empty)", i + 1)
            } else {
                let results = serde_json::to_string_pretty(&read.results)
                    .unwrap_or_else(|_| "(unrenderable)".to_string());
                format!("Read {}:\n{}", i + 1, results)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_user_messages(inputs: &[&UserInputStep]) -> String {
    if inputs.is_empty() {
        return "No user messages in this session.".to_string();
    }
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| format!("Message {}: {}", i + 1, input.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_memory_writes(writes: &[&MemoryWriteStep]) -> String {
    if writes.is_empty() {
        return "No memory updates were made.".to_string();
    }
    writes
        .iter()
        .enumerate()
        .map(|(i, write)| {
            if let Some(changes) = write.changes.as_ref().filter(|c| !c.is_empty()) {
                let lines = changes
                    .iter()
                    .map(|c| {
                        format!(
                            "  - {}: {} -> {}",
                            c.path,
                            render_leaf(&c.old_value),
                            render_leaf(&c.new_value)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                let target = write
                    .namespace
                    .as_ref()
                    .map(|ns| ns.join("/"))
                    .unwrap_or_else(|| "memory".to_string());
                format!("Write {} (to {}):\n{}", i + 1, target, lines)
            } else {
                format!("Write {}: {}", i + 1, write.data)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_leaf(value: &Option<Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

fn json_details(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
