//! Tracing subscriber setup for the binary and tests.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, SoakError};

/// Installs the global tracing subscriber with the given filter directive.
///
/// Logs go to stderr; stdout is reserved for the run report.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| SoakError::InvalidArgument(format!("Invalid log level: {e}")))?,
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| SoakError::InvalidArgument("Logging already initialized".into()))
}
