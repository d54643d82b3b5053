pub mod corruption;
pub mod error;
pub mod evidence;
pub mod hybrid;
pub mod judge;
pub mod summary;
pub mod traits;

pub use corruption::{DataLossPolicy, MemoryCorruptionGrader};
pub use error::{GraderError, GraderErrorKind};
pub use evidence::{Evidence, GraderResult, Severity};
pub use hybrid::{HybridConfig, HybridMemoryHygieneGrader};
pub use summary::EvaluationSummary;
pub use traits::Grader;
