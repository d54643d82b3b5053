use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceErrorKind {
    DuplicateStepId,
    InvalidTimeRange,
    SealedTrace,
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceError {
    pub kind: TraceErrorKind,
    pub message: String,
}

impl TraceError {
    pub fn new(kind: TraceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TraceError {}

pub fn duplicate_step_id(message: impl Into<String>) -> TraceError {
    TraceError::new(TraceErrorKind::DuplicateStepId, message)
}

pub fn invalid_time_range(message: impl Into<String>) -> TraceError {
    TraceError::new(TraceErrorKind::InvalidTimeRange, message)
}

pub fn sealed_trace(message: impl Into<String>) -> TraceError {
    TraceError::new(TraceErrorKind::SealedTrace, message)
}

pub fn serialization(message: impl Into<String>) -> TraceError {
    TraceError::new(TraceErrorKind::Serialization, message)
}
