//! # Logging Module
//!
//! Environment-aware console logging using the tracing ecosystem.
//! Designed for containerized applications where logs go to stdout/stderr;
//! the host application may install its own subscriber instead, in which
//! case initialization here is a no-op.

use std::io::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize console tracing with environment-based log levels.
///
/// Idempotent, and yields gracefully if the host already installed a
/// global subscriber.
pub fn init_tracing() {
    TRACING_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        // ANSI colors only when stdout is a TTY
        let use_ansi = IsTerminal::is_terminal(&std::io::stdout());

        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(use_ansi)
            .with_filter(EnvFilter::new(&log_level));

        let subscriber = tracing_subscriber::registry().with(console_layer);

        if subscriber.try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                environment = %environment,
                ansi_colors = use_ansi,
                "Console logging initialized"
            );
        }

        crate::metrics::init();
    });
}

/// Resolve the deployment environment name
fn get_environment() -> String {
    std::env::var("CACHEGATE_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment variables or environment defaults
fn get_log_level(environment: &str) -> String {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        return level.to_lowercase();
    }

    if let Ok(level) = std::env::var("RUST_LOG") {
        return level.to_lowercase();
    }

    match environment {
        "test" | "development" => "debug".to_string(),
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_by_environment() {
        // Only meaningful when the variables are unset in the test env
        if std::env::var("LOG_LEVEL").is_err() && std::env::var("RUST_LOG").is_err() {
            assert_eq!(get_log_level("production"), "info");
            assert_eq!(get_log_level("development"), "debug");
            assert_eq!(get_log_level("anything-else"), "debug");
        }
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
