use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    graders::{
        error::GraderError,
        evidence::{Evidence, GraderResult, Severity},
        traits::Grader,
    },
    trace::{
        run::TraceRun,
        step::MemoryWriteStep,
        types::WriteOperation,
    },
};

/// How to treat a previously present value becoming absent.
///
/// The conservative default flags every such change: the check cannot
/// distinguish an incorrect deletion from one the user explicitly asked
/// for, so callers that model user-requested deletion opt out per write
/// operation rather than the grader guessing intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DataLossPolicy {
    /// Every old-present, new-absent change is an error finding.
    #[default]
    FlagAlways,
    /// Losses inside `operation = delete` writes are reported as info.
    AllowExplicitDelete,
}

/// Deterministic invariant layer: silent loss of previously stored data
/// is always wrong, independent of agent reasoning. Stateless and fully
/// reproducible; never needs a semantic backend.
#[derive(Debug, Clone)]
pub struct MemoryCorruptionGrader {
    pub fail_on_data_loss: bool,
    pub policy: DataLossPolicy,
}

impl Default for MemoryCorruptionGrader {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCorruptionGrader {
    pub const NAME: &'static str = "memory_corruption";

    pub fn new() -> Self {
        Self {
            fail_on_data_loss: true,
            policy: DataLossPolicy::FlagAlways,
        }
    }

    pub fn with_policy(policy: DataLossPolicy) -> Self {
        Self {
            fail_on_data_loss: true,
            policy,
        }
    }

    fn check_data_corruption(&self, writes: &[&MemoryWriteStep]) -> Vec<Evidence> {
        let mut evidence = Vec::new();

        for write in writes {
            let Some(changes) = &write.changes else {
                continue;
            };
            let lost: Vec<_> = changes.iter().filter(|c| c.is_data_loss()).collect();
            if lost.is_empty() {
                continue;
            }

            let explicit_delete = write.operation == WriteOperation::Delete
                && self.policy == DataLossPolicy::AllowExplicitDelete;
            let severity = if explicit_delete {
                Severity::Info
            } else if self.fail_on_data_loss {
                Severity::Error
            } else {
                Severity::Warn
            };

            let paths: Vec<&str> = lost.iter().map(|c| c.path.as_str()).collect();
            let mut details = Map::new();
            details.insert(
                "corrupted_fields".to_string(),
                Value::Array(
                    lost.iter()
                        .map(|c| {
                            json!({
                                "path": c.path,
                                "lost_value": c.old_value.clone().unwrap_or(Value::Null),
                            })
                        })
                        .collect(),
                ),
            );

            evidence.push(
                Evidence::new(
                    "data_corruption",
                    format!("Existing data was deleted: [{}]", paths.join(", ")),
                    severity,
                )
                .with_step_ids(vec![write.step_id.clone()])
                .with_details(details),
            );
        }

        evidence
    }

    /// Synchronous entry point; [`Grader::grade`] delegates here so the
    /// deterministic layer stays callable without a runtime.
    pub fn grade_sync(&self, trace: &TraceRun) -> Result<GraderResult, GraderError> {
        let writes = trace.memory_writes();
        let evidence = self.check_data_corruption(&writes);
        let error_count = evidence
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count();

        let score = (1.0 - 0.5 * error_count as f64).max(0.0);
        let passed = error_count == 0;

        let mut metadata = Map::new();
        metadata.insert("total_memory_writes".to_string(), json!(writes.len()));
        metadata.insert("corruption_errors".to_string(), json!(error_count));

        GraderResult::new(Self::NAME, passed, score, evidence, Some(metadata))
    }
}

#[async_trait]
impl Grader for MemoryCorruptionGrader {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn grade(&self, trace: &TraceRun) -> Result<GraderResult, GraderError> {
        self.grade_sync(trace)
    }
}
