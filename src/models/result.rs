use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::status::ExampleState;

/// Counters reported by the browser framework for one suite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub tests: u64,
    pub failures: u64,
    pub pending: u64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub message: String,
    pub stacktrace: String,
}

impl Failure {
    /// First line of the message.
    pub fn short_message(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn full_message(&self) -> String {
        format!("{}\n\n{}", self.message, self.stacktrace)
    }
}

/// How an example ended. Failure details only exist on `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    Passed,
    Failed(Failure),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    /// Full title of the enclosing suite.
    pub classname: String,
    pub title: String,
    pub duration_ms: f64,
    pub outcome: Outcome,
}

impl Example {
    pub fn state(&self) -> ExampleState {
        match self.outcome {
            Outcome::Passed => ExampleState::Passed,
            Outcome::Failed(_) => ExampleState::Failed,
            Outcome::Pending => ExampleState::Pending,
        }
    }

    pub fn passed(&self) -> bool {
        self.state() == ExampleState::Passed
    }

    pub fn failed(&self) -> bool {
        self.state() == ExampleState::Failed
    }

    pub fn pending(&self) -> bool {
        self.state() == ExampleState::Pending
    }
}

/// Totals across every spec of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub examples: usize,
    pub failures: usize,
    pub pending: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn from_examples<'a>(
        examples: impl IntoIterator<Item = &'a Example>,
        elapsed: Duration,
    ) -> Self {
        let mut summary = RunSummary {
            elapsed,
            ..RunSummary::default()
        };
        for example in examples {
            summary.examples += 1;
            if example.failed() {
                summary.failures += 1;
            } else if example.pending() {
                summary.pending += 1;
            }
        }
        summary
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Finished in {:.2} seconds", self.elapsed.as_secs_f64())?;
        write!(
            f,
            "{} examples, {} failures, {} pending",
            self.examples, self.failures, self.pending
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> Failure {
        Failure {
            message: message.into(),
            stacktrace: "at spec.js:10".into(),
        }
    }

    #[test]
    fn short_message_is_first_line() {
        assert_eq!(
            failure("expected 1 to equal 2\nmore detail").short_message(),
            "expected 1 to equal 2"
        );
        assert_eq!(failure("").short_message(), "");
    }

    #[test]
    fn full_message_separates_with_blank_line() {
        assert_eq!(
            failure("boom").full_message(),
            "boom\n\nat spec.js:10"
        );
    }

    #[test]
    fn state_follows_outcome() {
        let example = Example {
            classname: "Array".into(),
            title: "sorts".into(),
            duration_ms: 3.0,
            outcome: Outcome::Failed(failure("boom")),
        };
        assert_eq!(example.state(), ExampleState::Failed);
        assert!(example.failed());
        assert!(!example.passed());
    }

    #[test]
    fn summary_counts_by_state() {
        let examples = [
            Outcome::Passed,
            Outcome::Pending,
            Outcome::Failed(failure("boom")),
            Outcome::Passed,
        ]
        .into_iter()
        .map(|outcome| Example {
            classname: "A".into(),
            title: "t".into(),
            duration_ms: 0.0,
            outcome,
        })
        .collect::<Vec<_>>();

        let summary = RunSummary::from_examples(&examples, Duration::from_millis(1234));
        assert_eq!(
            summary.to_string(),
            "Finished in 1.23 seconds\n4 examples, 1 failures, 1 pending"
        );
    }
}
