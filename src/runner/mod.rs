pub mod progress;
pub mod session;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::config::ErrorPolicy;
use crate::driver::Driver;
use crate::error::SpecError;
use crate::models::{RunSummary, Suite};
use crate::report;
use crate::spec::SpecDescriptor;

use session::{SessionOptions, SpecRunner};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Prefix for every spec page URL.
    pub base_url: String,
    pub session: SessionOptions,
    /// Report directory; `None` skips reporting.
    pub reports: Option<PathBuf>,
    pub on_error: ErrorPolicy,
}

/// The result tree produced by one spec.
#[derive(Debug)]
pub struct SpecResult {
    pub spec: SpecDescriptor,
    pub root: Suite,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub results: Vec<SpecResult>,
    /// Specs skipped under [`ErrorPolicy::Continue`].
    pub errors: Vec<SpecError>,
    pub summary: RunSummary,
}

impl RunOutcome {
    /// True only if every spec ran and every example in it passed.
    pub fn passed(&self) -> bool {
        self.errors.is_empty() && self.results.iter().all(|r| r.root.passed())
    }
}

/// Runs spec pages one after another on a shared browser session.
pub struct Runner {
    driver: Arc<dyn Driver>,
    options: RunOptions,
    out: Box<dyn Write + Send>,
}

impl Runner {
    pub fn new(driver: Arc<dyn Driver>, options: RunOptions, out: Box<dyn Write + Send>) -> Self {
        Self {
            driver,
            options,
            out,
        }
    }

    pub async fn run_all(&mut self, specs: &[SpecDescriptor]) -> Result<RunOutcome> {
        let before = Instant::now();
        let mut results = Vec::new();
        let mut errors = Vec::new();

        for spec in specs {
            let url = spec.page_url(&self.options.base_url);
            let session = SpecRunner::new(self.driver.as_ref(), &self.options.session);
            let result = session.run(&url, &mut *self.out).await;
            match result {
                Ok(root) => results.push(SpecResult {
                    spec: spec.clone(),
                    root,
                }),
                Err(error) => {
                    let err = SpecError {
                        spec: spec.path.clone(),
                        error,
                    };
                    if self.options.on_error == ErrorPolicy::Abort {
                        return Err(err.into());
                    }
                    tracing::error!(spec = %spec.path, error = %err.error, "skipping spec");
                    writeln!(self.out, "\nerror: {err}")?;
                    errors.push(err);
                }
            }
        }

        let summary = RunSummary::from_examples(
            results.iter().flat_map(|r| r.root.all_examples()),
            before.elapsed(),
        );
        writeln!(self.out)?;
        writeln!(self.out)?;
        writeln!(self.out, "{summary}")?;
        self.out.flush()?;

        if let Some(dir) = &self.options.reports {
            for result in &results {
                report::write_report(dir, &result.spec.path, &result.root).map_err(|error| {
                    SpecError {
                        spec: result.spec.path.clone(),
                        error,
                    }
                })?;
            }
        }

        Ok(RunOutcome {
            results,
            errors,
            summary,
        })
    }
}
