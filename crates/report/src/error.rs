//! Error types for recording and reporting

use thiserror::Error;

use crate::driver::RunPhase;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid run state transition: {from} -> {to}")]
    InvalidTransition { from: RunPhase, to: RunPhase },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Why a scenario step did not succeed.
///
/// Steps return this instead of unwinding; the driver records it as a
/// failed outcome and skips the rest of the happy path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepFailure {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("step panicked: {0}")]
    Panicked(String),
}

impl StepFailure {
    pub fn assertion(message: impl Into<String>) -> Self {
        StepFailure::Assertion(message.into())
    }
}

pub type StepResult = Result<(), StepFailure>;
