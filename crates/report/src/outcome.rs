//! Outcome records and their pass/fail classification

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tokens that mark a message as a failure. Checked before the success markers.
pub const FAILURE_MARKERS: &[&str] = &["❌", "FAILED"];

/// Tokens that mark a message as a success.
pub const SUCCESS_MARKERS: &[&str] = &["✅", "PASSED"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Passed,
    Failed,
    Info,
}

impl Status {
    /// Derive a status from the markers embedded in a free-form message.
    ///
    /// A message carrying both kinds of marker is a failure.
    pub fn classify(message: &str) -> Self {
        if FAILURE_MARKERS.iter().any(|m| message.contains(m)) {
            Status::Failed
        } else if SUCCESS_MARKERS.iter().any(|m| message.contains(m)) {
            Status::Passed
        } else {
            Status::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::Info => "info",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged statement about a test step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
}

impl Outcome {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build an outcome whose status is inferred from the message markers.
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status: Status::classify(&message),
            message,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.status == Status::Failed
    }
}

/// Tally of outcomes by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub passed: usize,
    pub failed: usize,
    pub info: usize,
}

impl OutcomeCounts {
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match outcome.status {
                Status::Passed => counts.passed += 1,
                Status::Failed => counts.failed += 1,
                Status::Info => counts.info += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("✅ step A: PASSED", Status::Passed ; "emoji and keyword pass")]
    #[test_case("Assertion: User ID is not None: PASSED", Status::Passed ; "keyword only pass")]
    #[test_case("✅ Catalog loaded", Status::Passed ; "emoji only pass")]
    #[test_case("❌ step B: FAILED - timeout", Status::Failed ; "emoji and keyword fail")]
    #[test_case("❌ Could not open the frontend", Status::Failed ; "emoji only fail")]
    #[test_case("step C info", Status::Info ; "no markers")]
    #[test_case("--- TEST START: Login ---", Status::Info ; "section header")]
    #[test_case("✅ retry PASSED after earlier FAILED", Status::Failed ; "failure marker wins")]
    #[test_case("", Status::Info ; "empty message")]
    fn classify_messages(message: &str, expected: Status) {
        assert_eq!(Status::classify(message), expected);
    }

    #[test]
    fn test_lowercase_keywords_are_not_markers() {
        assert_eq!(Status::classify("the request failed quietly"), Status::Info);
        assert_eq!(Status::classify("all checks passed"), Status::Info);
    }

    #[test]
    fn test_counts() {
        let outcomes = vec![
            Outcome::classified("✅ a"),
            Outcome::classified("✅ b"),
            Outcome::classified("❌ c"),
            Outcome::classified("d"),
        ];
        let counts = OutcomeCounts::tally(&outcomes);
        assert_eq!(counts, OutcomeCounts { passed: 2, failed: 1, info: 1 });
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::new(Status::Failed, "x")).unwrap();
        assert_eq!(json, r#"{"status":"failed","message":"x"}"#);
    }
}
