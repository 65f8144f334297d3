use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use logfacade::logging::JsonLogger;
use logfacade::{new_logger_or_abort, Extra, Level, Logger, LoggerConfig, LoggerExt};

/// Read from the working directory when no config path is given
const DEFAULT_CONFIG_FILE: &str = "logfacade.toml";

fn main() -> Result<()> {
    // Diagnostics about the logger itself go to stderr
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "logfacade=info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => LoggerConfig::load(&PathBuf::from(path))?,
        None => LoggerConfig::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };

    let logger = new_logger_or_abort(&config);
    tracing::info!("Logging to: {}", config.filename.display());

    run(&logger);
    logger.flush()?;
    Ok(())
}

fn run(logger: &JsonLogger) {
    logger.info(
        "logger ready",
        &[
            Extra::new("level", logger.level().as_str()),
            Extra::new("debug", logger.enabled(Level::Debug)),
        ],
    );
    logger.debug("heartbeat", &[]);
    logger.warn("disk low", &[Extra::new("pct", 92)]);

    logger.set_level(Level::Debug);
    let worker = logger.named("worker");
    worker.debug(
        "job done",
        &[
            Extra::new("id", 42u64),
            Extra::new("payload", b"ok".to_vec()),
            Extra::reflect("tags", &["nightly", "batch"]),
        ],
    );
}
