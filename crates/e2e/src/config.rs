//! Runner configuration, loaded from an optional TOML file

use std::path::{Path, PathBuf};

use agrored_report::ReportConfig;
use serde::{Deserialize, Serialize};

use crate::browser::Browser;
use crate::error::E2eResult;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Report output shared by both flows
    pub report: ReportSettings,

    /// HTTP API flow
    pub backend: BackendConfig,

    /// Browser UI flow
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory receiving the PDF reports; relative paths resolve against
    /// the working directory
    pub dir: PathBuf,

    /// Write a JSON run summary next to each PDF
    pub write_json_summary: bool,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            write_json_summary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API root, without the `/api/v1` suffix
    pub base_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Password for the throwaway test user
    pub password: String,

    /// Full name for the throwaway test user
    pub full_name: String,

    /// Also verify the product listing and fetch the user by id
    pub extended_checks: bool,

    /// Delete the test user during cleanup
    pub delete_user_on_cleanup: bool,

    pub report_prefix: String,
    pub report_title: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 30,
            password: "testpassword123".to_string(),
            full_name: "Usuario de Prueba".to_string(),
            extended_checks: false,
            delete_user_on_cleanup: false,
            report_prefix: "AgroRedDev_Backend_Test_Report".to_string(),
            report_title: "AgroRedDev Backend Integration Test Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// Where the web UI is served
    pub base_url: String,

    pub browser: Browser,

    pub headless: bool,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// How long to wait for an element before failing the step
    pub element_timeout_ms: u64,

    /// Pause after navigation and form submission
    pub settle_ms: u64,

    /// Upper bound for a single driver command, including page loads
    pub command_timeout_secs: u64,

    /// Product that already exists in the catalog, used for rating
    pub existing_product: String,

    /// Node.js executable running the Playwright driver
    pub node_binary: PathBuf,

    /// `NODE_PATH` for resolving the `playwright` package, if not global
    pub node_path: Option<PathBuf>,

    pub password: String,
    pub full_name: String,

    pub report_prefix: String,
    pub report_title: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173".to_string(),
            browser: Browser::Chromium,
            headless: false,
            viewport_width: 1280,
            viewport_height: 720,
            element_timeout_ms: 10_000,
            settle_ms: 2_000,
            command_timeout_secs: 60,
            existing_product: "Papa".to_string(),
            node_binary: PathBuf::from("node"),
            node_path: None,
            password: "Testpassword123.".to_string(),
            full_name: "Usuario de Prueba".to_string(),
            report_prefix: "AgroRed_Frontend_Test_Report".to_string(),
            report_title: "AgroRed Frontend Integration Test Report".to_string(),
        }
    }
}

impl E2eConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn backend_report(&self) -> ReportConfig {
        ReportConfig {
            dir: self.report.dir.clone(),
            prefix: self.backend.report_prefix.clone(),
            title: self.backend.report_title.clone(),
            write_json_summary: self.report.write_json_summary,
        }
    }

    pub fn frontend_report(&self) -> ReportConfig {
        ReportConfig {
            dir: self.report.dir.clone(),
            prefix: self.frontend.report_prefix.clone(),
            title: self.frontend.report_title.clone(),
            write_json_summary: self.report.write_json_summary,
        }
    }
}
