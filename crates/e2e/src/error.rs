//! Error types for E2E testing

use agrored_report::StepFailure;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

impl From<E2eError> for StepFailure {
    fn from(e: E2eError) -> Self {
        match e {
            E2eError::Status { status, body } => StepFailure::Http { status, body },
            E2eError::Http(e) if e.is_timeout() => {
                StepFailure::Timeout(e.url().map(|u| u.to_string()).unwrap_or_else(|| "response".into()))
            }
            E2eError::Http(e) => StepFailure::Transport(e.to_string()),
            E2eError::Timeout(what) => StepFailure::Timeout(what),
            e @ (E2eError::Playwright(_) | E2eError::PlaywrightNotFound) => {
                StepFailure::Browser(e.to_string())
            }
            other => StepFailure::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_http_failure() {
        let failure: StepFailure = E2eError::Status {
            status: 401,
            body: "{\"detail\":\"Not authenticated\"}".into(),
        }
        .into();
        assert_eq!(
            failure.to_string(),
            "HTTP 401: {\"detail\":\"Not authenticated\"}"
        );
    }

    #[test]
    fn test_browser_errors_map_to_browser_failure() {
        let failure: StepFailure = E2eError::PlaywrightNotFound.into();
        assert!(matches!(failure, StepFailure::Browser(msg) if msg.contains("npx playwright install")));

        let failure: StepFailure = E2eError::Timeout(".login-form".into()).into();
        assert_eq!(failure, StepFailure::Timeout(".login-form".into()));
    }
}
