pub mod process;
pub mod webdriver;

use anyhow::Result;
use async_trait::async_trait;

/// A browser session able to load pages and evaluate expressions in them.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate the session to `url`.
    async fn visit(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression in the current page and return its value.
    async fn evaluate_script(&self, expression: &str) -> Result<serde_json::Value>;

    /// End the browser session.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Display name for this driver (e.g., "WebDriver").
    fn name(&self) -> &str;
}
