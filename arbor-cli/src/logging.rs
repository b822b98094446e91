//! Logging setup for the `arbor` binary.

use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

/// Environment variable holding a log filter directive.
pub const LOG_ENV: &str = "ARBOR_LOG";

/// Filter used when nothing is configured.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Choose the filter directive: `ARBOR_LOG`, then the configured level, then `warn`.
pub fn log_directive(env_value: Option<String>, configured: Option<&str>) -> String {
    env_value
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(str::to_owned))
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Install the global subscriber, writing to stderr.
pub fn configure_logging(configured: Option<&str>) {
    let directive = log_directive(std::env::var(LOG_ENV).ok(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("Warning: invalid log filter '{directive}': {e}");
        EnvFilter::new(DEFAULT_LOG_LEVEL)
    });

    registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
