use cloudsync_core::log_level::LogLevel;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Critical => LevelFilter::ERROR,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
    }
}

/// JSON lines on stdout. Timestamps are left to CloudWatch ingestion.
pub fn init_with_level(level: LogLevel) {
    tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_max_level(level_filter(level))
        .with_target(false)
        .without_time()
        .init();
}

/// Same output, filtered by `RUST_LOG` with `info` as the default.
pub fn init_from_env() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_current_span(false)
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
