use std::path::PathBuf;
use std::time::Duration;

/// Faults that end the run of a single spec page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error communicating with browser process:\n{0}")]
    Communication(String),

    #[error("malformed results from browser: {0}")]
    MalformedResults(String),

    #[error("spec did not finish within {0:?}")]
    Timeout(Duration),

    #[error("failed to write progress: {0}")]
    Output(#[from] std::io::Error),

    #[error("failed to write report {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: ReportError,
    },
}

impl Error {
    /// Wrap a driver fault, keeping its whole context chain as the description.
    pub fn communication(err: anyhow::Error) -> Self {
        Error::Communication(format!("{err:#}"))
    }
}

/// Low-level failures while producing a report document.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
}

/// An [`Error`] attributed to the spec that produced it.
#[derive(Debug, thiserror::Error)]
#[error("{spec}: {error}")]
pub struct SpecError {
    pub spec: String,
    pub error: Error,
}
