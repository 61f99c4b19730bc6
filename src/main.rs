mod config;
mod driver;
mod error;
mod logging;
mod models;
mod report;
mod runner;
mod spec;

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use config::{Config, ErrorPolicy};
use driver::Driver;
use driver::process::DriverProcess;
use driver::webdriver::WebDriver;
use runner::{RunOptions, Runner};

/// Run browser-hosted spec pages and report their results.
#[derive(Debug, Parser)]
#[command(name = "pagespec", version)]
struct Cli {
    /// Spec files or directories to run, relative to the spec directory.
    specs: Vec<String>,

    /// Config file to use instead of ./pagespec.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server hosting the spec pages.
    #[arg(long)]
    base_url: Option<String>,

    /// WebDriver server URL.
    #[arg(long)]
    driver_url: Option<String>,

    /// Write JUnit XML reports into this directory.
    #[arg(long, env = "PAGESPEC_REPORTS")]
    reports: Option<PathBuf>,

    /// Seconds to wait for one spec page before giving up (0 waits forever).
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep running the remaining specs when one cannot be run.
    #[arg(long)]
    keep_going: bool,

    /// Print progress glyphs without color.
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ref url) = self.driver_url {
            config.driver.url = url.clone();
        }
        if let Some(ref dir) = self.reports {
            config.reports = Some(dir.clone());
        }
        if let Some(secs) = self.timeout {
            config.session.timeout_secs = secs;
        }
        if self.keep_going {
            config.on_error = ErrorPolicy::Continue;
        }
        if self.no_color {
            config.color = false;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let workspace = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config = Config::load(&workspace, cli.config.as_deref())?;
    cli.apply(&mut config);

    let specs = spec::select(spec::discover(&workspace.join(&config.spec_dir))?, &cli.specs)?;
    if specs.is_empty() {
        tracing::warn!(dir = %config.spec_dir.display(), "no specs found");
    }

    // Held until the run ends; dropping it kills the server.
    let _server = config
        .driver
        .command
        .as_deref()
        .map(DriverProcess::spawn)
        .transpose()?;
    WebDriver::wait_until_ready(
        &config.driver.url,
        Duration::from_secs(config.driver.startup_timeout_secs),
    )
    .await?;
    let driver: Arc<dyn Driver> = Arc::new(WebDriver::connect(&config.driver).await?);

    let color = config.color && io::stdout().is_terminal();
    let options = RunOptions {
        base_url: config.base_url.clone(),
        session: config.session.options(color),
        reports: config.reports.as_ref().map(|dir| workspace.join(dir)),
        on_error: config.on_error,
    };
    let mut runner = Runner::new(Arc::clone(&driver), options, Box::new(io::stdout()));
    let outcome = runner.run_all(&specs).await;

    if let Err(e) = driver.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }

    let outcome = outcome?;
    tracing::info!(
        examples = outcome.summary.examples,
        failures = outcome.summary.failures,
        pending = outcome.summary.pending,
        errors = outcome.errors.len(),
        "run finished"
    );
    Ok(outcome.passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "pagespec",
            "--base-url",
            "http://127.0.0.1:8080",
            "--timeout",
            "0",
            "--keep-going",
            "--no-color",
            "--reports",
            "out/junit",
            "models/",
            "array_spec.js",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(cli.specs, vec!["models/", "array_spec.js"]);
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.session.timeout_secs, 0);
        assert_eq!(config.on_error, ErrorPolicy::Continue);
        assert!(!config.color);
        assert_eq!(config.reports, Some(PathBuf::from("out/junit")));
        assert_eq!(config.driver.url, "http://localhost:9515");
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::try_parse_from(["pagespec"]).unwrap();
        let mut config = Config::default();
        config.on_error = ErrorPolicy::Continue;
        cli.apply(&mut config);
        assert_eq!(config.on_error, ErrorPolicy::Continue);
        assert!(config.color);
    }
}
