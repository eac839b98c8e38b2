use tracing_subscriber::EnvFilter;

use crate::error::ServeError;

/// Install the global subscriber. Logs go to stderr; stdout carries protocol
/// frames in stdio mode.
pub fn init(log_level: &str) -> Result<(), ServeError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level).map_err(|err| ServeError::LogFilter {
            value: log_level.to_string(),
            reason: err.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(|err| ServeError::Telemetry(err.to_string()))
}
