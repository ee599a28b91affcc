//! Browser flow against a scripted stand-in for the Node.js driver.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use agrored_e2e::{run_frontend, E2eConfig};
use agrored_report::{RunSummary, RunVerdict};
use tempfile::TempDir;

/// How the fake driver misbehaves on commands matching a pattern.
enum Fault<'a> {
    /// Reply with a Playwright timeout error.
    TimeoutReply(&'a str),
    /// Reply only after the given number of seconds.
    Stall(&'a str, u32),
}

/// Shell script speaking the driver's line protocol. Every command is
/// appended to `commands.log`.
fn fake_driver(dir: &Path, fault: Option<Fault>) -> PathBuf {
    let log = dir.join("commands.log");
    let failure = match fault {
        Some(Fault::TimeoutReply(pattern)) => format!(
            "    *'{}'*) echo '{{\"ok\":false,\"error\":\"Timeout 10000ms exceeded.\",\"timeout\":true}}' ;;\n",
            pattern
        ),
        Some(Fault::Stall(pattern, secs)) => format!(
            "    *'{}'*) sleep {}; echo '{{\"ok\":true,\"value\":null}}' ;;\n",
            pattern, secs
        ),
        None => String::new(),
    };
    let script = format!(
        r#"#!/bin/sh
while IFS= read -r line; do
  printf '%s\n' "$line" >> '{log}'
  case "$line" in
    *'"op":"close"'*) echo '{{"ok":true,"value":null}}'; exit 0 ;;
{failure}    *'"op":"count"'*) echo '{{"ok":true,"value":5}}' ;;
    *'"op":"text"'*) printf '%s\n' '{{"ok":true,"value":"Papa\n$ 1000"}}' ;;
    *) echo '{{"ok":true,"value":null}}' ;;
  esac
done
"#,
        log = log.display(),
        failure = failure,
    );

    let path = dir.join("fake-node");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config(tmp: &Path, node: PathBuf) -> E2eConfig {
    let mut config = E2eConfig::default();
    config.report.dir = tmp.join("reports");
    config.frontend.node_binary = node;
    config.frontend.headless = true;
    config.frontend.settle_ms = 0;
    config.frontend.command_timeout_secs = 10;
    config
}

fn commands(tmp: &Path) -> Vec<String> {
    fs::read_to_string(tmp.join("commands.log"))
        .unwrap_or_default()
        .lines()
        .map(String::from)
        .collect()
}

fn messages(summary: &RunSummary) -> Vec<&str> {
    summary.outcomes.iter().map(|o| o.message.as_str()).collect()
}

#[tokio::test]
async fn full_journey_records_each_step() {
    let tmp = TempDir::new().unwrap();
    let node = fake_driver(tmp.path(), None);

    let summary = run_frontend(&config(tmp.path(), node)).await;

    assert_eq!(summary.verdict, RunVerdict::Completed, "{:#?}", messages(&summary));
    assert!(summary.success());
    assert_eq!(
        summary.report_path.as_deref(),
        Some(tmp.path().join("reports/AgroRed_Frontend_Test_Report_1.pdf").as_path())
    );

    let log = messages(&summary);
    assert!(log[0].starts_with("✅ Frontend opened"));
    assert_eq!(log.iter().filter(|m| m.starts_with("✅ Catalog loaded")).count(), 5);
    assert!(log.contains(&"✅ Logged out."));
    assert!(!log.iter().any(|m| m.contains("TEST START")));

    let sent = commands(tmp.path());
    assert!(sent.first().unwrap().contains(r#""op":"launch""#));
    assert!(sent.first().unwrap().contains(r#""headless":true"#));
    assert!(sent.iter().any(|c| c.contains(r#"Enviar Calificación"#)));
    assert_eq!(sent.last().unwrap(), r#"{"op":"close"}"#);
}

#[tokio::test]
async fn timeout_fails_the_step_and_still_closes_browser() {
    let tmp = TempDir::new().unwrap();
    let node = fake_driver(tmp.path(), Some(Fault::TimeoutReply("login-form")));

    let summary = run_frontend(&config(tmp.path(), node)).await;

    match &summary.verdict {
        RunVerdict::Failed { step, reason } => {
            assert_eq!(step, "Log in");
            assert!(reason.starts_with("timed out waiting for"), "{}", reason);
        }
        other => panic!("expected a failed run, got {:?}", other),
    }

    let log = messages(&summary);
    assert!(log.iter().any(|m| m.starts_with("❌ Log in: FAILED - timed out")));
    assert!(!log.iter().any(|m| m.starts_with("✅ Logged in")));
    assert!(summary.report_path.is_some());

    assert_eq!(commands(tmp.path()).last().unwrap(), r#"{"op":"close"}"#);
}

#[tokio::test]
async fn missing_node_binary_is_reported() {
    let tmp = TempDir::new().unwrap();
    let node = tmp.path().join("no-such-node");

    let summary = run_frontend(&config(tmp.path(), node)).await;

    match &summary.verdict {
        RunVerdict::Failed { step, reason } => {
            assert_eq!(step, "Open frontend");
            assert!(reason.contains("Playwright not found"), "{}", reason);
        }
        other => panic!("expected a failed run, got {:?}", other),
    }
    assert_eq!(summary.counts.failed, 1);
    assert!(summary.report_path.unwrap().exists());
}

#[tokio::test]
async fn stalled_driver_is_killed_instead_of_closed() {
    let tmp = TempDir::new().unwrap();
    let node = fake_driver(tmp.path(), Some(Fault::Stall("login-form", 3)));
    let mut config = config(tmp.path(), node);
    config.frontend.command_timeout_secs = 1;

    let summary = run_frontend(&config).await;

    match &summary.verdict {
        RunVerdict::Failed { step, reason } => {
            assert_eq!(step, "Log in");
            assert!(reason.starts_with("timed out waiting for"), "{}", reason);
        }
        other => panic!("expected a failed run, got {:?}", other),
    }

    let log = messages(&summary);
    assert!(log.iter().any(|m| m.starts_with("⚠️ Browser did not close cleanly")));
    assert!(summary.report_path.unwrap().exists());

    // the late reply is never read and nothing follows the stalled command
    let sent = commands(tmp.path());
    assert!(sent.last().unwrap().contains("login-form"), "{:?}", sent);
    assert!(!sent.iter().any(|c| c == r#"{"op":"close"}"#));
}
