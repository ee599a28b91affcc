//! Run driver: sequential steps, guaranteed finalization, exactly one report

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{ReportError, ReportResult, StepFailure, StepResult};
use crate::outcome::{Outcome, OutcomeCounts, Status};
use crate::recorder::TestRun;
use crate::report::ReportRenderer;

/// A test flow the driver can execute.
///
/// `plan` lists the happy-path steps in order. `execute` runs one of them and
/// may record any number of outcomes. `finalize` always runs afterwards,
/// whether or not every step succeeded, and must release whatever the steps
/// acquired.
#[async_trait]
pub trait Scenario: Send {
    type Step: fmt::Display + Copy + Send + Sync;

    fn name(&self) -> &str;

    fn plan(&self) -> Vec<Self::Step>;

    async fn execute(&mut self, step: Self::Step, run: &mut TestRun) -> StepResult;

    async fn finalize(&mut self, run: &mut TestRun);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    Running,
    Failed,
    Completed,
    Finalizing,
    Reported,
}

impl RunPhase {
    pub fn can_advance_to(self, to: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, to),
            (NotStarted, Running)
                | (Running, Failed)
                | (Running, Completed)
                | (Failed, Finalizing)
                | (Completed, Finalizing)
                | (Finalizing, Reported)
        )
    }

    /// Move to `to`, rejecting transitions the run lifecycle does not allow.
    pub fn advance(&mut self, to: RunPhase) -> ReportResult<()> {
        if !self.can_advance_to(to) {
            return Err(ReportError::InvalidTransition { from: *self, to });
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::NotStarted => "NOT_STARTED",
            RunPhase::Running => "RUNNING",
            RunPhase::Failed => "FAILED",
            RunPhase::Completed => "COMPLETED",
            RunPhase::Finalizing => "FINALIZING",
            RunPhase::Reported => "REPORTED",
        };
        f.write_str(s)
    }
}

/// How the happy path ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RunVerdict {
    Completed,
    Failed { step: String, reason: String },
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub scenario: String,
    pub phase: RunPhase,
    pub verdict: RunVerdict,
    pub counts: OutcomeCounts,
    pub duration_ms: u64,
    pub report_path: Option<PathBuf>,
    pub outcomes: Vec<Outcome>,
}

impl RunSummary {
    /// The happy path completed and nothing recorded a failure.
    pub fn success(&self) -> bool {
        self.verdict == RunVerdict::Completed && self.counts.failed == 0
    }
}

/// Drives one run of a [`Scenario`] and renders its report.
///
/// `run` consumes the driver, so a driver reports at most once.
pub struct RunDriver {
    renderer: ReportRenderer,
    phase: RunPhase,
    section_headers: bool,
}

impl RunDriver {
    pub fn new(renderer: ReportRenderer) -> Self {
        Self {
            renderer,
            phase: RunPhase::NotStarted,
            section_headers: false,
        }
    }

    /// Record a `--- <step> ---` line before each step and before cleanup.
    pub fn with_section_headers(mut self, enabled: bool) -> Self {
        self.section_headers = enabled;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn enter(&mut self, to: RunPhase) {
        match self.phase.advance(to) {
            Ok(()) => debug!("Run phase: {}", to),
            Err(e) => warn!("{}", e),
        }
    }

    pub async fn run<S: Scenario>(mut self, scenario: &mut S) -> RunSummary {
        let start = Instant::now();
        let name = scenario.name().to_string();
        let mut run = TestRun::new();
        let mut verdict = RunVerdict::Completed;

        self.enter(RunPhase::Running);
        info!("Running scenario '{}'", name);

        for step in scenario.plan() {
            if self.section_headers {
                run.info(format!("\n--- TEST START: {} ---", step));
            }

            let result = AssertUnwindSafe(scenario.execute(step, &mut run))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StepFailure::Panicked(panic_message(panic.as_ref()))));

            if let Err(failure) = result {
                run.fail(format!("❌ {}: FAILED - {}", step, failure));
                verdict = RunVerdict::Failed {
                    step: step.to_string(),
                    reason: failure.to_string(),
                };
                break;
            }
        }

        self.enter(match verdict {
            RunVerdict::Completed => RunPhase::Completed,
            RunVerdict::Failed { .. } => RunPhase::Failed,
        });
        self.enter(RunPhase::Finalizing);

        if self.section_headers {
            run.info("\n--- TEST START: Cleanup ---");
        }
        if let Err(panic) = AssertUnwindSafe(scenario.finalize(&mut run)).catch_unwind().await {
            run.fail(format!("❌ Cleanup: FAILED - {}", panic_message(panic.as_ref())));
        }

        let mut outcomes = run.into_outcomes();
        let report_path = match self.renderer.try_render(&outcomes) {
            Ok(path) => {
                outcomes.push(Outcome::new(
                    Status::Info,
                    format!("📊 PDF report generated: {}", path.display()),
                ));
                Some(path)
            }
            Err(e) => {
                error!("❌ Error generating PDF report: {}", e);
                outcomes.push(Outcome::new(
                    Status::Failed,
                    format!("❌ Error generating PDF report: FAILED - {}", e),
                ));
                None
            }
        };
        self.enter(RunPhase::Reported);

        let summary = RunSummary {
            scenario: name,
            phase: self.phase,
            verdict,
            counts: OutcomeCounts::tally(&outcomes),
            duration_ms: start.elapsed().as_millis() as u64,
            report_path,
            outcomes,
        };

        if self.renderer.config().write_json_summary {
            if let Some(path) = &summary.report_path {
                if let Err(e) = self.renderer.write_sidecar(path, &summary) {
                    error!("Failed to write run summary: {}", e);
                }
            }
        }

        info!(
            "Scenario '{}': {} passed, {} failed ({} ms)",
            summary.scenario, summary.counts.passed, summary.counts.failed, summary.duration_ms
        );
        summary
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut phase = RunPhase::NotStarted;
        for next in [RunPhase::Running, RunPhase::Failed, RunPhase::Finalizing, RunPhase::Reported] {
            phase.advance(next).unwrap();
        }
        assert_eq!(phase, RunPhase::Reported);
    }

    #[test]
    fn test_reported_is_terminal() {
        let mut phase = RunPhase::Reported;
        for next in [RunPhase::Running, RunPhase::Finalizing, RunPhase::Reported] {
            assert!(phase.advance(next).is_err());
        }
        assert_eq!(phase, RunPhase::Reported);
    }

    #[test]
    fn test_cannot_skip_finalization() {
        let mut phase = RunPhase::Completed;
        let err = phase.advance(RunPhase::Reported).unwrap_err();
        assert_eq!(err.to_string(), "Invalid run state transition: COMPLETED -> REPORTED");
    }

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_summary_success_requires_no_failed_outcomes() {
        let mut summary = RunSummary {
            scenario: "s".into(),
            phase: RunPhase::Reported,
            verdict: RunVerdict::Completed,
            counts: OutcomeCounts { passed: 3, failed: 0, info: 1 },
            duration_ms: 0,
            report_path: None,
            outcomes: vec![],
        };
        assert!(summary.success());
        summary.counts.failed = 1;
        assert!(!summary.success());
    }
}
