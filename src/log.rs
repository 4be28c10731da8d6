use std::fs::File;

use anyhow::anyhow;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::AppError;

/// Sets up the tracing subscriber.
///
/// Debug builds log to the terminal, using `RUST_LOG` when it is set and this crate's info level
/// otherwise. Release builds only write errors to `debug.log`.
pub fn setup_tracing() -> Result<(), AppError> {
    if cfg!(debug_assertions) {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("esports_bracket=info"))?;

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::NONE)
            .pretty()
            .try_init()
            .map_err(|e| anyhow!("Error setting up tracing: {}", e))?;

        return Ok(());
    }

    let log_file = File::create("debug.log")?;

    // Set up tracing with a filter that only logs errors in production
    tracing_subscriber::fmt::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_max_level(LevelFilter::ERROR)
        .with_writer(log_file)
        .pretty()
        .try_init()
        .map_err(|e| anyhow!("Error setting up tracing: {}", e))?;

    Ok(())
}
