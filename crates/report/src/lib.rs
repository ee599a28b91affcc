//! AgroRed test-run recorder and reporter
//!
//! Both end-to-end flows (HTTP API and browser UI) share this core:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  RunDriver::run(scenario)                                    │
//! │    NOT_STARTED → RUNNING → (FAILED | COMPLETED)              │
//! │                → FINALIZING → REPORTED                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Scenario::plan()      ordered happy-path steps              │
//! │  Scenario::execute()   one step, records into TestRun        │
//! │  Scenario::finalize()  cleanup, always runs                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │  TestRun               append-only Vec<Outcome>              │
//! │  ReportRenderer        reports/<prefix>_<n>.pdf              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod driver;
pub mod error;
pub mod outcome;
pub mod recorder;
pub mod report;

pub use driver::{RunDriver, RunPhase, RunSummary, RunVerdict, Scenario};
pub use error::{ReportError, ReportResult, StepFailure, StepResult};
pub use outcome::{Outcome, OutcomeCounts, Status};
pub use recorder::TestRun;
pub use report::{ReportConfig, ReportRenderer};
