//! AgroRed E2E runner - Main Entry Point

use std::path::PathBuf;

use agrored_e2e::{run_backend, run_frontend, Browser, E2eConfig};
use agrored_report::RunSummary;
use clap::{Args, Parser, Subcommand};
use tracing::info;

/// AgroRed integration tests with PDF reports
#[derive(Parser)]
#[command(name = "agrored-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(short, long, default_value = "agrored-e2e.toml", global = true)]
    config: PathBuf,

    /// Directory receiving the reports (default `reports`), resolved against
    /// the working directory rather than the binary location
    #[arg(long, global = true)]
    reports_dir: Option<PathBuf>,

    /// Write a JSON run summary next to each PDF
    #[arg(long, global = true)]
    json_summary: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API flow
    Backend(BackendArgs),

    /// Run the browser UI flow
    Frontend(FrontendArgs),

    /// Run the API flow, then the UI flow
    All {
        #[command(flatten)]
        backend: BackendArgs,

        #[command(flatten)]
        frontend: FrontendArgs,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args)]
struct BackendArgs {
    /// API root, e.g. http://127.0.0.1:8000
    #[arg(long = "api-url", env = "AGRORED_API_URL")]
    api_url: Option<String>,

    /// Also verify the product listing and fetch the user by id
    #[arg(long)]
    extended_checks: bool,

    /// Delete the test user during cleanup
    #[arg(long)]
    delete_user: bool,
}

#[derive(Args)]
struct FrontendArgs {
    /// Web UI root, e.g. http://localhost:5173
    #[arg(long = "web-url", env = "AGRORED_WEB_URL")]
    web_url: Option<String>,

    /// Browser engine
    #[arg(long, value_enum)]
    browser: Option<Browser>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Catalog product used for the rating steps
    #[arg(long)]
    existing_product: Option<String>,
}

impl BackendArgs {
    fn apply(self, config: &mut E2eConfig) {
        if let Some(url) = self.api_url {
            config.backend.base_url = url;
        }
        config.backend.extended_checks |= self.extended_checks;
        config.backend.delete_user_on_cleanup |= self.delete_user;
    }
}

impl FrontendArgs {
    fn apply(self, config: &mut E2eConfig) {
        if let Some(url) = self.web_url {
            config.frontend.base_url = url;
        }
        if let Some(browser) = self.browser {
            config.frontend.browser = browser;
        }
        config.frontend.headless |= self.headless;
        if let Some(product) = self.existing_product {
            config.frontend.existing_product = product;
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let c = &summary.counts;
    let status = if summary.success() { "✅" } else { "❌" };
    println!(
        "{} {}: {} passed, {} failed, {} info in {} ms",
        status, summary.scenario, c.passed, c.failed, c.info, summary.duration_ms
    );
    match &summary.report_path {
        Some(path) => println!("   Report: {}", path.display()),
        None => println!("   Report: not generated"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let mut config = E2eConfig::load(&cli.config)?;
    if let Some(dir) = cli.reports_dir {
        config.report.dir = dir;
    }
    config.report.write_json_summary |= cli.json_summary;

    let mut summaries = Vec::new();
    match cli.command {
        Commands::Backend(args) => {
            args.apply(&mut config);
            summaries.push(run_backend(&config).await);
        }
        Commands::Frontend(args) => {
            args.apply(&mut config);
            summaries.push(run_frontend(&config).await);
        }
        Commands::All { backend, frontend } => {
            backend.apply(&mut config);
            frontend.apply(&mut config);
            summaries.push(run_backend(&config).await);
            summaries.push(run_frontend(&config).await);
        }
        Commands::Config => {
            print!("{}", config.to_toml());
            return Ok(());
        }
    }

    for summary in &summaries {
        print_summary(summary);
    }

    if summaries.iter().all(RunSummary::success) {
        info!("All runs passed");
        Ok(())
    } else {
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_reports_dir_help_names_working_directory() {
        let cmd = Cli::command();
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id() == "reports_dir")
            .unwrap();
        let help = arg.get_help().unwrap().to_string();
        assert!(help.contains("working directory"), "{}", help);
    }

    #[test]
    fn test_all_accepts_both_flag_sets() {
        let cli = Cli::try_parse_from([
            "agrored-e2e",
            "--reports-dir",
            "out",
            "all",
            "--api-url",
            "http://127.0.0.1:8000",
            "--headless",
        ])
        .unwrap();
        assert_eq!(cli.reports_dir, Some(PathBuf::from("out")));
        match cli.command {
            Commands::All { backend, frontend } => {
                assert_eq!(backend.api_url.as_deref(), Some("http://127.0.0.1:8000"));
                assert!(frontend.headless);
            }
            _ => panic!("expected the all command"),
        }
    }
}
