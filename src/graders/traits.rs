use async_trait::async_trait;

use crate::{
    graders::{
        error::{GraderError, missing_step_types},
        evidence::GraderResult,
    },
    trace::{run::TraceRun, types::StepType},
};

/// A trace evaluator. Deterministic graders implement this with no
/// suspension; judge-backed graders suspend only on their backend call.
#[async_trait]
pub trait Grader: Send + Sync {
    fn name(&self) -> &str;

    /// Step types this grader cannot function without. Grading a trace
    /// that lacks one fails fast instead of silently degrading.
    fn required_step_types(&self) -> &[StepType] {
        &[]
    }

    async fn grade(&self, trace: &TraceRun) -> Result<GraderResult, GraderError>;

    fn check_required_steps(&self, trace: &TraceRun) -> Result<(), GraderError> {
        let missing: Vec<&'static str> = self
            .required_step_types()
            .iter()
            .filter(|required| {
                !trace
                    .steps
                    .iter()
                    .any(|step| step.step_type() == **required)
            })
            .map(|step_type| step_type.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing_step_types(format!(
                "grader '{}' requires step types missing from trace: {}",
                self.name(),
                missing.join(", ")
            )))
        }
    }
}
