use std::io::Write;
use std::time::Duration;

use serde_json::Value;

use super::progress::Progress;
use crate::driver::Driver;
use crate::error::Error;
use crate::models::Suite;

/// Knobs for the visit / poll / fetch protocol.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub poll_interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    /// Name of the in-page object exposing `done`, `dots` and `getResults()`.
    pub global: String,
    pub color: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Some(Duration::from_secs(300)),
            global: "PageSpec".into(),
            color: true,
        }
    }
}

/// One sample of the page's progress signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunProgress {
    pub done: bool,
    pub glyphs: String,
}

impl RunProgress {
    /// Read a `[done, dots]` pair. Values the page has not set yet come back as null.
    fn from_value(value: Value) -> Result<Self, Error> {
        let (done, glyphs): (Option<bool>, Option<String>) = serde_json::from_value(value.clone())
            .map_err(|e| Error::Communication(format!("unexpected progress value {value}: {e}")))?;
        Ok(Self {
            done: done.unwrap_or(false),
            glyphs: glyphs.unwrap_or_default(),
        })
    }
}

/// Drives a single spec page to completion.
pub struct SpecRunner<'a> {
    driver: &'a dyn Driver,
    options: &'a SessionOptions,
}

impl<'a> SpecRunner<'a> {
    pub fn new(driver: &'a dyn Driver, options: &'a SessionOptions) -> Self {
        Self { driver, options }
    }

    /// Load `url`, stream its progress glyphs to `out` until it reports done,
    /// then fetch and build the result tree.
    pub async fn run(&self, url: &str, out: &mut (dyn Write + Send)) -> Result<Suite, Error> {
        let protocol = self.drive(url, out);
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, protocol)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => protocol.await,
        }
    }

    async fn drive(&self, url: &str, out: &mut (dyn Write + Send)) -> Result<Suite, Error> {
        tracing::info!(url, driver = self.driver.name(), "visiting spec page");
        self.driver.visit(url).await.map_err(Error::communication)?;

        let global = &self.options.global;
        let poll_script = format!("[{global}.done, {global}.dots]");
        let mut progress = Progress::new(out, self.options.color);
        loop {
            tokio::time::sleep(self.options.poll_interval).await;
            let value = self
                .driver
                .evaluate_script(&poll_script)
                .await
                .map_err(Error::communication)?;
            let sample = RunProgress::from_value(value)?;
            tracing::debug!(done = sample.done, glyphs = sample.glyphs.len(), "polled");
            progress.update(&sample.glyphs)?;
            if sample.done {
                break;
            }
        }

        let value = self
            .driver
            .evaluate_script(&format!("{global}.getResults()"))
            .await
            .map_err(Error::communication)?;
        let Value::String(json) = value else {
            return Err(Error::MalformedResults(format!(
                "expected serialized results, got {value}"
            )));
        };
        tracing::debug!(bytes = json.len(), "fetched results");
        Suite::from_results(&json)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::driver::testing::{Chunks, Page, ScriptedDriver};

    const URL: &str = "http://localhost:3500/array_spec";
    const RESULTS: &str = r#"[{"title": "Array", "stats": {"tests": 3, "pending": 1, "duration": 4},
        "tests": [
          {"classname": "Array", "title": "a", "state": "passed", "duration": 1},
          {"classname": "Array", "title": "b", "state": "passed", "duration": 3},
          {"classname": "Array", "title": "c"}
        ]}]"#;

    fn options() -> SessionOptions {
        SessionOptions {
            poll_interval: Duration::from_millis(1),
            timeout: Some(Duration::from_secs(5)),
            color: false,
            ..SessionOptions::default()
        }
    }

    #[tokio::test]
    async fn streams_each_new_glyph_once() {
        let driver = ScriptedDriver::default().with_page(
            URL,
            Page::new(&[(false, "."), (false, ".."), (true, "..P")], RESULTS),
        );
        let mut out = Chunks::default();
        let options = options();

        let root = SpecRunner::new(&driver, &options)
            .run(URL, &mut out)
            .await
            .unwrap();

        assert_eq!(out.chunks(), vec![".", ".", "P"]);
        assert_eq!(
            driver.calls(),
            vec![
                format!("visit {URL}"),
                "poll".into(),
                "poll".into(),
                "poll".into(),
                "results".into(),
            ]
        );
        assert_eq!(root.suites[0].examples.len(), 3);
        assert!(!root.passed());
    }

    #[tokio::test]
    async fn repeated_glyphs_are_not_rewritten() {
        let driver = ScriptedDriver::default().with_page(
            URL,
            Page::new(&[(false, "."), (false, ".F"), (false, ".F"), (true, ".FP")], RESULTS),
        );
        let mut out = Chunks::default();
        let options = options();

        SpecRunner::new(&driver, &options)
            .run(URL, &mut out)
            .await
            .unwrap();

        assert_eq!(out.text(), ".FP");
    }

    #[tokio::test]
    async fn unset_progress_fields_read_as_not_done() {
        let mut page = Page::new(&[(true, "")], "[]");
        page.polls.push_front(Ok(json!([null, null])));
        let driver = ScriptedDriver::default().with_page(URL, page);
        let mut out = Chunks::default();
        let options = options();

        let root = SpecRunner::new(&driver, &options)
            .run(URL, &mut out)
            .await
            .unwrap();

        assert!(out.chunks().is_empty());
        assert_eq!(driver.calls().iter().filter(|c| *c == "poll").count(), 2);
        assert!(root.suites.is_empty());
    }

    #[tokio::test]
    async fn visit_fault_is_communication_error() {
        let mut page = Page::new(&[(true, ".")], RESULTS);
        page.visit_error = Some("browser crashed".into());
        let driver = ScriptedDriver::default().with_page(URL, page);
        let options = options();

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Communication(ref msg) if msg == "browser crashed"), "{err}");
    }

    #[tokio::test]
    async fn poll_fault_is_communication_error() {
        let mut page = Page::new(&[(false, ".")], RESULTS);
        page.polls.push_back(Err("javascript error: PageSpec is not defined".into()));
        let driver = ScriptedDriver::default().with_page(URL, page);
        let options = options();

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Communication(_)), "{err}");
        assert!(!driver.calls().contains(&"results".to_string()));
    }

    #[tokio::test]
    async fn fault_during_results_fetch_is_communication_error() {
        let mut page = Page::new(&[(true, "..")], RESULTS);
        page.results = Some(Err("disconnected".into()));
        let driver = ScriptedDriver::default().with_page(URL, page);
        let options = options();

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Communication(ref msg) if msg == "disconnected"), "{err}");
    }

    #[tokio::test]
    async fn non_string_results_are_malformed() {
        let mut page = Page::new(&[(true, "")], "[]");
        page.results = Some(Ok(json!([{"title": "A"}])));
        let driver = ScriptedDriver::default().with_page(URL, page);
        let options = options();

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResults(_)), "{err}");
    }

    #[tokio::test]
    async fn missing_title_in_results_is_malformed() {
        let page = Page::new(&[(true, "")], r#"[{"title": "A", "suites": [{"tests": []}]}]"#);
        let driver = ScriptedDriver::default().with_page(URL, page);
        let options = options();

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MalformedResults(_)), "{err}");
    }

    #[tokio::test]
    async fn page_that_never_finishes_times_out() {
        let polls: Vec<(bool, &str)> = vec![(false, "."); 1000];
        let driver = ScriptedDriver::default().with_page(URL, Page::new(&polls, RESULTS));
        let options = SessionOptions {
            poll_interval: Duration::from_millis(5),
            timeout: Some(Duration::from_millis(20)),
            color: false,
            ..SessionOptions::default()
        };

        let err = SpecRunner::new(&driver, &options)
            .run(URL, &mut Chunks::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout(limit) if limit == Duration::from_millis(20)), "{err}");
    }
}
