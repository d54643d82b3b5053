use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelatorErrorKind {
    UnknownRun,
    DuplicateStart,
    KindMismatch,
    SealedTrace,
    InflightRemaining,
    InvalidConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatorError {
    pub kind: CorrelatorErrorKind,
    pub message: String,
}

impl CorrelatorError {
    pub fn new(kind: CorrelatorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CorrelatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CorrelatorError {}

pub fn unknown_run(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::UnknownRun, message)
}

pub fn duplicate_start(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::DuplicateStart, message)
}

pub fn kind_mismatch(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::KindMismatch, message)
}

pub fn sealed_trace(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::SealedTrace, message)
}

pub fn inflight_remaining(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::InflightRemaining, message)
}

pub fn invalid_config(message: impl Into<String>) -> CorrelatorError {
    CorrelatorError::new(CorrelatorErrorKind::InvalidConfig, message)
}
