//! Run-scoped outcome log

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::outcome::{Outcome, OutcomeCounts, Status};

/// A resource created by a scenario that finalization should clean up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: String,
    pub id: String,
}

/// State of one test run: the ordered outcome log plus the artifacts the
/// scenario created along the way.
///
/// The log is append-only. A new run starts from a fresh `TestRun`.
#[derive(Debug, Default)]
pub struct TestRun {
    log: Vec<Outcome>,
    artifacts: Vec<Artifact>,
}

impl TestRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, deriving its status from the pass/fail markers it contains.
    pub fn record(&mut self, message: impl Into<String>) {
        self.push(Outcome::classified(message));
    }

    /// Append a message with an explicit status.
    pub fn record_status(&mut self, status: Status, message: impl Into<String>) {
        self.push(Outcome::new(status, message));
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.record_status(Status::Passed, message);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.record_status(Status::Failed, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record_status(Status::Info, message);
    }

    fn push(&mut self, outcome: Outcome) {
        match outcome.status {
            Status::Failed => error!("{}", outcome.message),
            _ => info!("{}", outcome.message),
        }
        self.log.push(outcome);
    }

    /// Remember a created resource for cleanup.
    pub fn track_artifact(&mut self, kind: impl Into<String>, id: impl Into<String>) {
        self.artifacts.push(Artifact {
            kind: kind.into(),
            id: id.into(),
        });
    }

    /// Ids of tracked artifacts of one kind, in creation order.
    pub fn artifacts(&self, kind: &str) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|a| a.kind == kind)
            .map(|a| a.id.as_str())
            .collect()
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.log
    }

    pub fn counts(&self) -> OutcomeCounts {
        OutcomeCounts::tally(&self.log)
    }

    pub fn has_failures(&self) -> bool {
        self.log.iter().any(Outcome::is_failure)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_preserves_order_and_duplicates() {
        let mut run = TestRun::new();
        run.record("✅ login: PASSED");
        run.record("✅ login: PASSED");
        run.record("step info");

        let messages: Vec<_> = run.outcomes().iter().map(|o| o.message.as_str()).collect();
        assert_eq!(messages, ["✅ login: PASSED", "✅ login: PASSED", "step info"]);
    }

    #[test]
    fn test_record_classifies_markers() {
        let mut run = TestRun::new();
        run.record("❌ create product: FAILED - HTTP 500");
        run.record("✅ create product: PASSED");
        run.record("\n--- cleanup ---");

        let statuses: Vec<_> = run.outcomes().iter().map(|o| o.status).collect();
        assert_eq!(statuses, [Status::Failed, Status::Passed, Status::Info]);
        assert!(run.has_failures());
    }

    #[test]
    fn test_explicit_status_overrides_markers() {
        let mut run = TestRun::new();
        run.info("documenting a FAILED marker without failing");
        run.fail("plain text failure");

        assert_eq!(run.outcomes()[0].status, Status::Info);
        assert_eq!(run.outcomes()[1].status, Status::Failed);
    }

    #[test]
    fn test_accepts_any_message() {
        let mut run = TestRun::new();
        run.record("");
        run.record("line one\nline two\n\tindented");
        assert_eq!(run.len(), 2);
        assert_eq!(run.outcomes()[1].message, "line one\nline two\n\tindented");
    }

    #[test]
    fn test_artifacts_by_kind() {
        let mut run = TestRun::new();
        run.track_artifact("user", "u1");
        run.track_artifact("product", "p1");
        run.track_artifact("product", "p2");

        assert_eq!(run.artifacts("product"), ["p1", "p2"]);
        assert_eq!(run.artifacts("user"), ["u1"]);
        assert!(run.artifacts("order").is_empty());
        assert!(run.is_empty());
    }
}
