//! Playwright browser automation
//!
//! One Node.js process per run hosts a single Playwright page. Rust sends one
//! JSON command per line on its stdin and reads one JSON reply per line from
//! its stdout, so cookies and page state survive from step to step.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::FrontendConfig;
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    Visible,
    Attached,
}

/// A command understood by the driver script.
///
/// Selectors use Playwright syntax, e.g. `a:has-text("Catálogo")` or
/// `.login-form .login-input >> nth=1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BrowserCommand {
    Launch {
        browser: Browser,
        headless: bool,
        viewport_width: u32,
        viewport_height: u32,
        timeout_ms: u64,
    },
    Goto {
        url: String,
    },
    WaitFor {
        selector: String,
        state: WaitState,
        timeout_ms: u64,
    },
    Click {
        selector: String,
        timeout_ms: u64,
    },
    Fill {
        selector: String,
        value: String,
    },
    Clear {
        selector: String,
        timeout_ms: u64,
    },
    Count {
        selector: String,
    },
    Text {
        selector: String,
    },
    Close,
}

impl BrowserCommand {
    fn describe(&self) -> String {
        match self {
            BrowserCommand::Launch { browser, .. } => format!("launch:{}", browser.as_str()),
            BrowserCommand::Goto { url } => format!("goto:{}", url),
            BrowserCommand::WaitFor { selector, .. } => format!("wait:{}", selector),
            BrowserCommand::Click { selector, .. } => format!("click:{}", selector),
            BrowserCommand::Fill { selector, .. } => format!("fill:{}", selector),
            BrowserCommand::Clear { selector, .. } => format!("clear:{}", selector),
            BrowserCommand::Count { selector } => format!("count:{}", selector),
            BrowserCommand::Text { selector } => format!("text:{}", selector),
            BrowserCommand::Close => "close".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    timeout: bool,
}

/// Node.js side of the session. Reads commands line by line until `close` or EOF.
pub const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');

let playwright;
try {
  playwright = require('playwright');
} catch (e) {
  playwright = null;
}

const reply = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

(async () => {
  let browser = null;
  let page = null;
  const rl = readline.createInterface({ input: process.stdin });

  for await (const line of rl) {
    let cmd;
    try {
      cmd = JSON.parse(line);
    } catch (e) {
      reply({ ok: false, error: 'bad command: ' + e.message });
      continue;
    }

    try {
      let value = null;
      switch (cmd.op) {
        case 'launch': {
          if (!playwright) throw new Error('playwright module not found');
          browser = await playwright[cmd.browser].launch({ headless: cmd.headless });
          const context = await browser.newContext({
            viewport: { width: cmd.viewport_width, height: cmd.viewport_height },
          });
          page = await context.newPage();
          page.setDefaultTimeout(cmd.timeout_ms);
          break;
        }
        case 'goto':
          await page.goto(cmd.url);
          break;
        case 'wait_for':
          await page.locator(cmd.selector).first().waitFor({ state: cmd.state, timeout: cmd.timeout_ms });
          break;
        case 'click':
          await page.locator(cmd.selector).first().click({ timeout: cmd.timeout_ms });
          break;
        case 'fill':
          await page.locator(cmd.selector).first().fill(cmd.value);
          break;
        case 'clear':
          await page.locator(cmd.selector).first().clear({ timeout: cmd.timeout_ms });
          break;
        case 'count':
          value = await page.locator(cmd.selector).count();
          break;
        case 'text':
          value = await page.locator(cmd.selector).first().innerText();
          break;
        case 'close':
          if (browser) await browser.close();
          reply({ ok: true, value: null });
          process.exit(0);
        default:
          throw new Error('unknown op: ' + cmd.op);
      }
      reply({ ok: true, value });
    } catch (e) {
      reply({ ok: false, error: e.message, timeout: e.name === 'TimeoutError' });
    }
  }

  if (browser) await browser.close();
})();
"#;

/// A running browser with one page, scoped to a single test run.
///
/// Call [`BrowserSession::close`] to shut it down; dropping the session kills
/// the driver process.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    element_timeout_ms: u64,
    command_timeout: Duration,
    /// Set once a reply failed to arrive in time; any later line on stdout
    /// may belong to the abandoned command.
    unresponsive: bool,
    _script_dir: tempfile::TempDir,
}

impl BrowserSession {
    /// Start the driver process and launch the configured browser.
    pub async fn launch(config: &FrontendConfig) -> E2eResult<Self> {
        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("agrored-driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let mut child = spawn_driver(&config.node_binary, &script_path, config.node_path.as_deref())?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("driver stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("driver stdout unavailable".into()))?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            element_timeout_ms: config.element_timeout_ms,
            command_timeout: Duration::from_secs(config.command_timeout_secs),
            unresponsive: false,
            _script_dir: script_dir,
        };

        info!("Launching {} (headless: {})", config.browser.as_str(), config.headless);
        let launched = session
            .send(&BrowserCommand::Launch {
                browser: config.browser,
                headless: config.headless,
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
                timeout_ms: config.element_timeout_ms,
            })
            .await;

        match launched {
            Ok(_) => Ok(session),
            Err(E2eError::Playwright(msg)) if msg.contains("playwright module not found") => {
                session.terminate().await;
                Err(E2eError::PlaywrightNotFound)
            }
            Err(e) => {
                session.terminate().await;
                Err(e)
            }
        }
    }

    /// Send one command and wait for its reply.
    pub async fn send(&mut self, command: &BrowserCommand) -> E2eResult<Value> {
        let what = command.describe();
        if self.unresponsive {
            return Err(E2eError::Playwright(format!(
                "driver stopped responding; {} not sent",
                what
            )));
        }
        debug!("Browser command: {}", what);

        let mut line = serde_json::to_string(command)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        let next = match timeout(self.command_timeout, self.stdout.next_line()).await {
            Ok(next) => next?,
            Err(_) => {
                self.unresponsive = true;
                return Err(E2eError::Timeout(what));
            }
        };
        let response = next.ok_or_else(|| E2eError::Playwright(format!("driver exited during {}", what)))?;

        let reply: Reply = serde_json::from_str(&response)?;
        if reply.ok {
            return Ok(reply.value);
        }

        let error = reply.error.unwrap_or_else(|| "unknown error".to_string());
        if reply.timeout {
            Err(E2eError::Timeout(format!("{} ({})", what, error)))
        } else {
            Err(E2eError::Playwright(format!("{}: {}", what, error)))
        }
    }

    pub async fn goto(&mut self, url: &str) -> E2eResult<()> {
        self.send(&BrowserCommand::Goto { url: url.to_string() }).await?;
        Ok(())
    }

    /// Wait until the first match of `selector` reaches `state`.
    pub async fn wait_for(&mut self, selector: &str, state: WaitState) -> E2eResult<()> {
        let timeout_ms = self.element_timeout_ms;
        self.send(&BrowserCommand::WaitFor {
            selector: selector.to_string(),
            state,
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Click the first match once it is visible, enabled and stable.
    pub async fn click(&mut self, selector: &str) -> E2eResult<()> {
        let timeout_ms = self.element_timeout_ms;
        self.send(&BrowserCommand::Click {
            selector: selector.to_string(),
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Replace the value of the first matching input.
    pub async fn fill(&mut self, selector: &str, value: &str) -> E2eResult<()> {
        self.send(&BrowserCommand::Fill {
            selector: selector.to_string(),
            value: value.to_string(),
        })
        .await?;
        Ok(())
    }

    /// Empty the first matching input or textarea.
    pub async fn clear(&mut self, selector: &str) -> E2eResult<()> {
        let timeout_ms = self.element_timeout_ms;
        self.send(&BrowserCommand::Clear {
            selector: selector.to_string(),
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Rendered text of the first match.
    pub async fn text(&mut self, selector: &str) -> E2eResult<String> {
        let value = self
            .send(&BrowserCommand::Text {
                selector: selector.to_string(),
            })
            .await?;
        match value {
            Value::String(text) => Ok(text),
            other => Err(E2eError::Playwright(format!("text returned {}", other))),
        }
    }

    pub async fn count(&mut self, selector: &str) -> E2eResult<u64> {
        let value = self
            .send(&BrowserCommand::Count {
                selector: selector.to_string(),
            })
            .await?;
        value
            .as_u64()
            .ok_or_else(|| E2eError::Playwright(format!("count returned {}", value)))
    }

    /// Close the browser and wait for the driver to exit.
    ///
    /// A driver that already missed a reply is killed without a `close`.
    pub async fn close(mut self) -> E2eResult<()> {
        if self.unresponsive {
            self.terminate().await;
            return Err(E2eError::Playwright("driver stopped responding and was killed".into()));
        }
        let result = self.send(&BrowserCommand::Close).await.map(|_| ());
        self.terminate().await;
        result
    }

    async fn terminate(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(Duration::from_millis(500), self.child.wait()).await.is_ok()
                {
                    return;
                }
            }
        }

        if let Err(e) = self.child.kill().await {
            warn!("Failed to kill browser driver: {}", e);
        }
    }
}

fn spawn_driver(node: &Path, script: &Path, node_path: Option<&Path>) -> E2eResult<Child> {
    let mut cmd = Command::new(node);
    cmd.arg(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    if let Some(path) = node_path {
        cmd.env("NODE_PATH", path);
    }

    cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            E2eError::PlaywrightNotFound
        } else {
            E2eError::Io(e)
        }
    })
}

/// `selector` narrowed to elements containing `text`.
pub fn with_text(selector: &str, text: &str) -> String {
    format!(r#"{}:has-text("{}")"#, selector, text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// The `n`th (zero-based) match of `selector`.
pub fn nth(selector: &str, n: usize) -> String {
    format!("{} >> nth={}", selector, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_serialize_with_op_tag() {
        let json = serde_json::to_value(BrowserCommand::WaitFor {
            selector: ".login-form".into(),
            state: WaitState::Visible,
            timeout_ms: 10_000,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "op": "wait_for",
                "selector": ".login-form",
                "state": "visible",
                "timeout_ms": 10_000
            })
        );

        let json = serde_json::to_string(&BrowserCommand::Close).unwrap();
        assert_eq!(json, r#"{"op":"close"}"#);
    }

    #[test]
    fn test_launch_names_the_engine() {
        let json = serde_json::to_value(BrowserCommand::Launch {
            browser: Browser::Webkit,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            timeout_ms: 5000,
        })
        .unwrap();
        assert_eq!(json["browser"], "webkit");
        assert_eq!(json["op"], "launch");
    }

    #[test]
    fn test_clear_and_text_commands() {
        let clear = BrowserCommand::Clear {
            selector: "textarea".into(),
            timeout_ms: 2000,
        };
        assert_eq!(clear.describe(), "clear:textarea");
        assert_eq!(serde_json::to_value(&clear).unwrap()["op"], "clear");

        let text = serde_json::to_string(&BrowserCommand::Text {
            selector: ".product-card".into(),
        })
        .unwrap();
        assert_eq!(text, r#"{"op":"text","selector":".product-card"}"#);
    }

    #[test]
    fn test_driver_script_handles_every_op() {
        for op in ["launch", "goto", "wait_for", "click", "fill", "clear", "count", "text", "close"] {
            assert!(
                DRIVER_SCRIPT.contains(&format!("case '{}'", op)),
                "driver script is missing '{}'",
                op
            );
        }
    }

    #[test]
    fn test_selector_helpers() {
        assert_eq!(with_text("a", "Catálogo"), r#"a:has-text("Catálogo")"#);
        assert_eq!(with_text(".card", r#"say "hi""#), r#".card:has-text("say \"hi\"")"#);
        assert_eq!(nth(".login-input", 1), ".login-input >> nth=1");
    }

    #[test]
    fn test_reply_parsing() {
        let reply: Reply = serde_json::from_str(r#"{"ok":true,"value":3}"#).unwrap();
        assert!(reply.ok);
        assert_eq!(reply.value, 3);

        let reply: Reply =
            serde_json::from_str(r#"{"ok":false,"error":"Timeout 10000ms exceeded.","timeout":true}"#).unwrap();
        assert!(!reply.ok && reply.timeout);
    }
}
