use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraderErrorKind {
    MissingStepTypes,
    InvalidScore,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraderError {
    pub kind: GraderErrorKind,
    pub message: String,
}

impl GraderError {
    pub fn new(kind: GraderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GraderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GraderError {}

pub fn missing_step_types(message: impl Into<String>) -> GraderError {
    GraderError::new(GraderErrorKind::MissingStepTypes, message)
}

pub fn invalid_score(message: impl Into<String>) -> GraderError {
    GraderError::new(GraderErrorKind::InvalidScore, message)
}

pub fn internal_error(message: impl Into<String>) -> GraderError {
    GraderError::new(GraderErrorKind::Internal, message)
}
