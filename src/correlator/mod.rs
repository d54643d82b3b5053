pub mod correlator;
pub mod error;
pub mod types;

pub use correlator::EventCorrelator;
pub use error::{CorrelatorError, CorrelatorErrorKind};
pub use types::{CorrelatorConfig, EndPayload, StartPayload};
