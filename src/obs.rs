//! Logging setup.

/// Environment variable holding a `tracing_subscriber::EnvFilter` directive.
pub const LOG_ENV: &str = "TRENDTRADER_LOG";

pub fn init_tracing(default_level: &str) -> Result<(), String> {
    let filter = std::env::var(LOG_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
