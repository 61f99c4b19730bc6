use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::runner::session::SessionOptions;

pub const FILE_NAME: &str = "pagespec.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory searched for spec files.
    pub spec_dir: PathBuf,
    /// Server that hosts the spec pages.
    pub base_url: String,
    /// Where JUnit reports go. Reports are only written when this is set.
    pub reports: Option<PathBuf>,
    pub color: bool,
    pub on_error: ErrorPolicy,
    pub session: SessionConfig,
    pub driver: DriverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec_dir: PathBuf::from("spec/javascripts"),
            base_url: "http://localhost:3500".into(),
            reports: None,
            color: true,
            on_error: ErrorPolicy::default(),
            session: SessionConfig::default(),
            driver: DriverConfig::default(),
        }
    }
}

/// What to do when one spec cannot be run to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole run.
    #[default]
    Abort,
    /// Record the error, count the spec as failed, and move on.
    Continue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub poll_interval_ms: u64,
    /// `0` disables the limit.
    pub timeout_secs: u64,
    /// Name of the global object the page instrumentation exposes.
    pub global: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            timeout_secs: 300,
            global: "PageSpec".into(),
        }
    }
}

impl SessionConfig {
    pub fn options(&self, color: bool) -> SessionOptions {
        SessionOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
            global: self.global.clone(),
            color,
        }
    }
}

/// Connection to a WebDriver server (chromedriver, geckodriver, ...).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub url: String,
    pub browser: String,
    /// Command line that starts the WebDriver server. When unset, one is expected
    /// to be listening on `url` already.
    /// Example: "chromedriver --port=9515"
    pub command: Option<String>,
    /// Extra capabilities merged into `alwaysMatch`.
    /// Example: { "goog:chromeOptions" = { args = ["--headless=new"] } }
    pub capabilities: serde_json::Map<String, serde_json::Value>,
    pub startup_timeout_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9515".into(),
            browser: "chrome".into(),
            command: None,
            capabilities: serde_json::Map::new(),
            startup_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load `pagespec.toml` from the workspace root, or `explicit` when given.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(workspace: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map_or_else(|| workspace.join(FILE_NAME), Path::to_path_buf);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if explicit.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        toml::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }
}
