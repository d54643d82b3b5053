use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    Transport,
    Timeout,
    InvalidResponse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BackendError {}

pub fn transport_error(message: impl Into<String>) -> BackendError {
    BackendError::new(BackendErrorKind::Transport, message)
}

pub fn timeout_error(message: impl Into<String>) -> BackendError {
    BackendError::new(BackendErrorKind::Timeout, message)
}

pub fn invalid_response(message: impl Into<String>) -> BackendError {
    BackendError::new(BackendErrorKind::InvalidResponse, message)
}
