use std::fs;
use std::process::Command;
use std::sync::Arc;

use logfacade::logging::{JsonLogger, RecordBuffer};
use logfacade::{new_logger, ConfigError, Extra, Level, Logger, LoggerConfig, LoggerExt};
use tempfile::TempDir;

const FATAL_CHILD_ENV: &str = "LOGFACADE_FATAL_CHILD";

fn config_in(dir: &TempDir, level: &str) -> LoggerConfig {
    LoggerConfig {
        filename: dir.path().join("logs").join("app.log"),
        level: level.to_string(),
        ..LoggerConfig::default()
    }
}

fn read_records(config: &LoggerConfig) -> Vec<serde_json::Value> {
    fs::read_to_string(&config.filename)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_warn_threshold_example() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir, "warn");
    let logger = new_logger(&config).unwrap();

    logger.warn("disk low", &[Extra::new("pct", 92)]);
    logger.debug("heartbeat", &[]);

    let records = read_records(&config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "warn");
    assert_eq!(records[0]["msg"], "disk low");
    assert_eq!(records[0]["pct"], "92");
    assert!(records[0]["time"].is_string());
}

#[test]
fn test_set_level_reopens_lower_levels() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir, "error");
    let logger = new_logger(&config).unwrap();

    logger.info("hidden", &[]);
    logger.set_level(Level::Info);
    logger.info("visible", &[]);

    let records = read_records(&config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["msg"], "visible");
}

#[test]
fn test_debug_mode_records_call_site() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = config_in(&temp_dir, "debug");
    config.debug = true;
    let logger = new_logger(&config).unwrap();

    let line = line!() + 1;
    logger.debug("traced", &[]);

    let records = read_records(&config);
    assert_eq!(records[0]["file"], format!("tests/facade.rs:{}", line));
}

#[test]
fn test_error_records_carry_stacktrace() {
    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir, "info");
    let logger = new_logger(&config).unwrap();

    logger.info("fine", &[]);
    logger.error("broken", &[Extra::new("retry", false)]);

    let records = read_records(&config);
    assert!(records[0].get("stacktrace").is_none());
    assert!(records[1]["stacktrace"].is_string());
    assert_eq!(records[1]["retry"], false);
}

#[test]
fn test_bogus_names_are_configuration_errors() {
    let temp_dir = TempDir::new().unwrap();

    let config = config_in(&temp_dir, "bogus");
    assert_eq!(
        new_logger(&config).unwrap_err(),
        ConfigError::UnknownLevel("bogus".to_string())
    );

    let mut config = config_in(&temp_dir, "info");
    config.driver = "bogus".to_string();
    assert_eq!(
        new_logger(&config).unwrap_err(),
        ConfigError::UnknownDriver("bogus".to_string())
    );
}

#[test]
fn test_trait_object_handle_can_be_shared() {
    let buffer = Arc::new(RecordBuffer::new(10));
    let logger: Arc<dyn Logger> = Arc::new(JsonLogger::builder().sink(buffer.clone()).build());

    let worker = Arc::clone(&logger);
    std::thread::spawn(move || worker.info("from thread", &[Extra::new("n", 1u8)]))
        .join()
        .unwrap();

    let records = buffer.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["n"], "1");
}

#[test]
fn test_fatal_terminates_process_after_writing() {
    // Child half: runs in a separate process and must not return
    if let Some(path) = std::env::var_os(FATAL_CHILD_ENV) {
        let config = LoggerConfig {
            filename: path.into(),
            level: "fatal".to_string(),
            ..LoggerConfig::default()
        };
        let logger = new_logger(&config).unwrap();
        logger.fatal("shutting down", &[Extra::new("reason", "test")]);
    }

    let temp_dir = TempDir::new().unwrap();
    let config = config_in(&temp_dir, "fatal");

    let status = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", "test_fatal_terminates_process_after_writing", "--nocapture"])
        .env(FATAL_CHILD_ENV, &config.filename)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(logfacade::logging::FATAL_EXIT_CODE));
    let records = read_records(&config);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "fatal");
    assert_eq!(records[0]["msg"], "shutting down");
    assert_eq!(records[0]["reason"], "test");
}
