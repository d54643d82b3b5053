pub mod backends;
pub mod error;
pub mod hygiene;
pub mod models;

pub use backends::OllamaBackend;
pub use error::{BackendError, BackendErrorKind};
pub use hygiene::{JudgeConfig, MemoryHygieneJudge};
pub use models::MemoryHygieneEvaluation;

use async_trait::async_trait;
use serde_json::Value;

/// Pluggable completion backend for semantic judges: a local model
/// server, a hosted API, or a rule-based stub in tests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(&self, prompt: &str, temperature: f64) -> Result<String, BackendError>;

    /// Completion constrained to the given JSON schema. The returned
    /// value is re-validated by the caller before use; backends are not
    /// trusted to enforce the schema.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &Value,
        temperature: f64,
    ) -> Result<Value, BackendError>;
}
