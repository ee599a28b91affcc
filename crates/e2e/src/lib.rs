//! AgroRed E2E flows
//!
//! Two scenarios run through the [`agrored_report`] driver, each producing
//! exactly one numbered PDF report:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     agrored-e2e (binary)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  E2eConfig (TOML, optional)                                 │
//! │    ├── [report]   dir, write_json_summary                   │
//! │    ├── [backend]  base_url, timeouts, cleanup flags         │
//! │    └── [frontend] base_url, browser, headless, timeouts     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  BackendScenario   ── ApiClient (reqwest) ──► /api/v1/...   │
//! │  FrontendScenario  ── BrowserSession ──► node + playwright  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RunDriver: steps ─► finalize ─► ReportRenderer ─► PDF      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod backend;
pub mod browser;
pub mod config;
pub mod error;
pub mod frontend;
pub mod identity;

pub use backend::{BackendScenario, BackendStep};
pub use browser::{Browser, BrowserSession};
pub use config::{BackendConfig, E2eConfig, FrontendConfig};
pub use error::{E2eError, E2eResult};
pub use frontend::{FrontendScenario, FrontendStep};

use agrored_report::{ReportRenderer, RunDriver, RunSummary};

/// Run the API flow once and write its report.
pub async fn run_backend(config: &E2eConfig) -> RunSummary {
    let mut scenario = BackendScenario::new(config.backend.clone());
    let driver = RunDriver::new(ReportRenderer::new(config.backend_report())).with_section_headers(true);
    driver.run(&mut scenario).await
}

/// Run the browser flow once and write its report.
pub async fn run_frontend(config: &E2eConfig) -> RunSummary {
    let mut scenario = FrontendScenario::new(config.frontend.clone());
    let driver = RunDriver::new(ReportRenderer::new(config.frontend_report()));
    driver.run(&mut scenario).await
}
