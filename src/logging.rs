use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable naming a file that receives a full debug log.
pub const DEBUG_ENV: &str = "PAGESPEC_DEBUG";

/// Install the global subscriber.
///
/// Logs go to stderr (filtered by `RUST_LOG`, default `warn`) so they never mix
/// with progress output on stdout. With `PAGESPEC_DEBUG=<path>` everything at
/// debug level goes to that file instead.
pub fn init() {
    if let Some(path) = std::env::var_os(DEBUG_ENV) {
        match File::create(&path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(EnvFilter::new("debug"))
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
                return;
            }
            Err(e) => eprintln!(
                "warning: cannot open {} for {}: {}",
                path.to_string_lossy(),
                DEBUG_ENV,
                e
            ),
        }
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
