//! Logging configuration and initialization
//!
//! - Daily rotating file logging or console logging
//! - Configurable log directories and file prefixes
//! - Environment variable configuration

use anyhow::Result;
use std::env;
use tracing::{info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_DIR: &str = "./logs";
const DEFAULT_LOG_FILE_PREFIX: &str = "devnet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    Console,
    File,
}

impl LogDestination {
    /// Anything other than "console" (any case) means file
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("console") {
            LogDestination::Console
        } else {
            LogDestination::File
        }
    }

    pub fn from_env() -> Self {
        env::var("LOG_DESTINATION")
            .map(|v| Self::parse(&v))
            .unwrap_or(LogDestination::File)
    }
}

/// Initialize tracing with configurable output destination
///
/// ## Environment Variables
///
/// - `LOG_DESTINATION`: "console" or "file" (default: "file")
/// - `LOG_DIR`: Directory for log files (default: "./logs"), file destination only
/// - `LOG_FILE_PREFIX`: Prefix for log file names (default: "devnet"), file destination only
/// - `RUST_LOG`: filter directives (default: "info")
pub async fn init_logging() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());

    match LogDestination::from_env() {
        LogDestination::Console => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stdout)
                        .with_ansi(true)
                        .with_target(false),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to initialize console tracing subscriber: {}", e)
                })?;

            info!("📺 Logging to console (stdout)");
        }
        LogDestination::File => {
            let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
            let log_file_prefix = env::var("LOG_FILE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_LOG_FILE_PREFIX.to_string());

            if let Err(e) = std::fs::create_dir_all(&log_dir) {
                return Err(anyhow::anyhow!("Failed to create log directory '{}': {}", log_dir, e));
            }

            let file_appender = rolling::daily(&log_dir, &log_file_prefix);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(false),
                )
                .try_init()
                .map_err(|e| {
                    anyhow::anyhow!("Failed to initialize file tracing subscriber: {}", e)
                })?;

            info!("📝 Logging to daily rotating files in: {}/", log_dir);
            info!("📂 Log file pattern: {}/{}.<YYYY-MM-DD>", log_dir, log_file_prefix);

            // Keeps the writer thread alive for the life of the process
            std::mem::forget(guard);
        }
    }

    if env::var("RUST_LOG").is_err() {
        warn!("RUST_LOG not set, defaulting to 'info' level");
    }

    Ok(())
}
