pub mod error;
pub mod run;
pub mod step;
pub mod types;

pub use error::{TraceError, TraceErrorKind};
pub use run::TraceRun;
pub use step::{
    FinalOutputStep, InterruptStep, LlmCallStep, MemoryReadStep, MemoryWriteStep, RetrievalStep,
    StateChangeStep, Step, ToolCallStep, UserInputStep,
};
pub use types::{
    AgentInfo, FieldChange, ResourceImpact, RetrievalResult, StepType, TaskInfo, WriteOperation,
};
