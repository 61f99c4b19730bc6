use serde::{Deserialize, Serialize};

use super::result::{Example, Failure, Outcome, Stats};
use super::status::ExampleState;
use crate::error::Error;

/// A node of the result tree. Built once from the results blob and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suite {
    pub title: String,
    /// Counters for this suite's own examples, as reported by the page.
    pub stats: Stats,
    pub suites: Vec<Suite>,
    pub examples: Vec<Example>,
    #[serde(skip)]
    passed: bool,
}

impl Suite {
    pub fn new(title: String, stats: Stats, suites: Vec<Suite>, examples: Vec<Example>) -> Self {
        let passed = suites.iter().all(Suite::passed) && examples.iter().all(Example::passed);
        Self {
            title,
            stats,
            suites,
            examples,
            passed,
        }
    }

    /// Synthetic untitled container whose children are the top-level suites.
    pub fn root(suites: Vec<Suite>) -> Self {
        Self::new(String::new(), Stats::default(), suites, Vec::new())
    }

    /// Parse the serialized results blob (a JSON array of top-level suites).
    pub fn from_results(json: &str) -> Result<Self, Error> {
        let raw: Vec<RawSuite> =
            serde_json::from_str(json).map_err(|e| Error::MalformedResults(e.to_string()))?;
        Ok(Self::root(raw.into_iter().map(Suite::from).collect()))
    }

    /// True when every example in this suite and all of its descendants passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Every example beneath this node, descendants first.
    pub fn all_examples(&self) -> Vec<&Example> {
        let mut out = Vec::new();
        self.collect_examples(&mut out);
        out
    }

    fn collect_examples<'a>(&'a self, out: &mut Vec<&'a Example>) {
        for suite in &self.suites {
            suite.collect_examples(out);
        }
        out.extend(self.examples.iter());
    }
}

// --- results blob deserialization types ---

#[derive(Debug, Deserialize)]
struct RawSuite {
    title: String,
    stats: Option<RawStats>,
    suites: Option<Vec<RawSuite>>,
    tests: Option<Vec<RawExample>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStats {
    tests: Option<u64>,
    failures: Option<u64>,
    pending: Option<u64>,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawExample {
    classname: Option<String>,
    title: String,
    state: Option<ExampleState>,
    duration: Option<f64>,
    message: Option<String>,
    stacktrace: Option<String>,
}

impl From<RawStats> for Stats {
    fn from(raw: RawStats) -> Self {
        Stats {
            tests: raw.tests.unwrap_or(0),
            failures: raw.failures.unwrap_or(0),
            pending: raw.pending.unwrap_or(0),
            duration_ms: raw.duration.unwrap_or(0.0),
        }
    }
}

impl From<RawExample> for Example {
    fn from(raw: RawExample) -> Self {
        let outcome = match raw.state.unwrap_or_default() {
            ExampleState::Passed => Outcome::Passed,
            ExampleState::Pending => Outcome::Pending,
            ExampleState::Failed => Outcome::Failed(Failure {
                message: raw.message.unwrap_or_default(),
                stacktrace: raw.stacktrace.unwrap_or_default(),
            }),
        };
        Example {
            classname: raw.classname.unwrap_or_default(),
            title: raw.title,
            duration_ms: raw.duration.unwrap_or(0.0),
            outcome,
        }
    }
}

impl From<RawSuite> for Suite {
    fn from(raw: RawSuite) -> Self {
        Suite::new(
            raw.title,
            raw.stats.map(Stats::from).unwrap_or_default(),
            raw.suites
                .unwrap_or_default()
                .into_iter()
                .map(Suite::from)
                .collect(),
            raw.tests
                .unwrap_or_default()
                .into_iter()
                .map(Example::from)
                .collect(),
        )
    }
}
