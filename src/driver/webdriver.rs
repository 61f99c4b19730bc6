use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::Driver;
use crate::config::DriverConfig;

/// A W3C WebDriver session over HTTP.
pub struct WebDriver {
    client: Client,
    /// Server URL without a trailing slash.
    server: String,
    session_id: String,
}

impl WebDriver {
    /// Open a new browser session on the configured server.
    pub async fn connect(config: &DriverConfig) -> Result<Self> {
        let client = Client::new();
        let server = config.url.trim_end_matches('/').to_string();

        tracing::info!(server = %server, browser = %config.browser, "creating WebDriver session");
        let value = send(
            client
                .post(format!("{server}/session"))
                .json(&new_session_body(config)),
        )
        .await
        .context("failed to create WebDriver session")?;

        let session_id = value["sessionId"]
            .as_str()
            .context("WebDriver response missing 'sessionId'")?
            .to_string();
        tracing::debug!(session_id = %session_id, "session created");

        Ok(Self {
            client,
            server,
            session_id,
        })
    }

    /// Poll `GET /status` until the server reports ready or `timeout` passes.
    pub async fn wait_until_ready(url: &str, timeout: Duration) -> Result<()> {
        let client = Client::new();
        let status_url = format!("{}/status", url.trim_end_matches('/'));
        let deadline = Instant::now() + timeout;
        loop {
            match send(client.get(&status_url)).await {
                Ok(value) if value["ready"].as_bool().unwrap_or(false) => return Ok(()),
                Ok(_) => tracing::debug!("WebDriver server not ready yet"),
                Err(e) => tracing::debug!(error = %e, "WebDriver server not reachable yet"),
            }
            if Instant::now() >= deadline {
                bail!("WebDriver server at {} not ready after {:?}", url, timeout);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    fn session_url(&self, path: &str) -> String {
        format!("{}/session/{}{}", self.server, self.session_id, path)
    }
}

#[async_trait]
impl Driver for WebDriver {
    async fn visit(&self, url: &str) -> Result<()> {
        send(
            self.client
                .post(self.session_url("/url"))
                .json(&json!({ "url": url })),
        )
        .await
        .with_context(|| format!("failed to navigate to {url}"))?;
        Ok(())
    }

    async fn evaluate_script(&self, expression: &str) -> Result<Value> {
        send(
            self.client
                .post(self.session_url("/execute/sync"))
                .json(&script_body(expression)),
        )
        .await
        .with_context(|| format!("failed to evaluate `{expression}`"))
    }

    async fn close(&self) -> Result<()> {
        send(self.client.delete(self.session_url(""))).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "WebDriver"
    }
}

// --- wire format ---

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Default, Deserialize)]
struct WireError {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

fn new_session_body(config: &DriverConfig) -> Value {
    let mut always_match = config.capabilities.clone();
    always_match.insert("browserName".into(), Value::String(config.browser.clone()));
    json!({ "capabilities": { "alwaysMatch": always_match } })
}

fn script_body(expression: &str) -> Value {
    json!({ "script": format!("return {expression};"), "args": [] })
}

async fn send(request: RequestBuilder) -> Result<Value> {
    let response = request.send().await?;
    let status = response.status();
    let body: WireResponse = response
        .json()
        .await
        .with_context(|| format!("unreadable WebDriver response ({status})"))?;
    unwrap_response(status, body)
}

fn unwrap_response(status: StatusCode, body: WireResponse) -> Result<Value> {
    if status.is_success() {
        return Ok(body.value);
    }
    let err: WireError = serde_json::from_value(body.value).unwrap_or_default();
    if err.error.is_empty() {
        bail!("WebDriver request failed with {}", status);
    }
    bail!("{}: {}", err.error, err.message)
}
