//! Logging setup for the binary.
//!
//! The library logs through the `log` facade. Those records are forwarded to
//! a `tracing-subscriber` formatter on stderr, filtered by `RUST_LOG`
//! (default `info`). Stdout is left for command output.
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    LogTracer::init()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()?;
    Ok(())
}
