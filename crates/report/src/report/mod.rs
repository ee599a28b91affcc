//! PDF report rendering
//!
//! A report is one file per run, `<dir>/<prefix>_<n>.pdf`, where `n` is the
//! smallest number not already taken in `dir`. Existing reports are never
//! overwritten.

mod layout;
mod path;
mod pdf;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ReportResult;
use crate::outcome::Outcome;

pub use layout::{pdf_safe, Block, BlockStyle, ReportDocument, BLOCK_SPACING, HEADER_SPACING};
pub use path::{claim_report_path, next_report_path};

/// Where and how reports are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving the reports (created on demand)
    pub dir: PathBuf,

    /// File name prefix, followed by `_<n>.pdf`
    pub prefix: String,

    /// Heading printed at the top of the document
    pub title: String,

    /// Also write the run summary as `<prefix>_<n>.json`
    pub write_json_summary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("reports"),
            prefix: "Report".to_string(),
            title: "Integration Test Report".to_string(),
            write_json_summary: false,
        }
    }
}

/// Turns an ordered outcome log into a PDF file.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    config: ReportConfig,
}

impl ReportRenderer {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Render the log, logging and swallowing any failure.
    pub fn render(&self, outcomes: &[Outcome]) -> Option<PathBuf> {
        match self.try_render(outcomes) {
            Ok(path) => Some(path),
            Err(e) => {
                error!("❌ Error generating PDF report: {}", e);
                None
            }
        }
    }

    /// Render a plain message log; each status is inferred from its markers.
    pub fn render_messages<S: AsRef<str>>(&self, messages: &[S]) -> Option<PathBuf> {
        let outcomes: Vec<Outcome> = messages
            .iter()
            .map(|m| Outcome::classified(m.as_ref()))
            .collect();
        self.render(&outcomes)
    }

    /// Render the log and return the path of the new report.
    pub fn try_render(&self, outcomes: &[Outcome]) -> ReportResult<PathBuf> {
        let document = ReportDocument::build(&self.config.title, Local::now(), outcomes);
        let (path, mut file) = claim_report_path(&self.config.dir, &self.config.prefix, "pdf")?;

        let written = pdf::encode(&document).and_then(|mut doc| {
            doc.save_to(&mut file)?;
            file.sync_all()?;
            Ok(())
        });

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        info!("📊 PDF report generated: {}", path.display());
        Ok(path)
    }

    /// Write `value` as pretty JSON next to a rendered report.
    pub fn write_sidecar<T: Serialize>(&self, report_path: &Path, value: &T) -> ReportResult<PathBuf> {
        let path = report_path.with_extension("json");
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        info!("Run summary written to: {}", path.display());
        Ok(path)
    }
}
