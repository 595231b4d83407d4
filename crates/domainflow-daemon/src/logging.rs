//! Structured logging setup (§2a): `tracing` + `tracing-subscriber`, an
//! optional rolling file layer via `tracing-appender`, plain text or JSON.

use std::path::PathBuf;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
    pub file_path: Option<PathBuf>,
    pub max_file_size_mb: u64,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
            max_file_size_mb: 10,
            max_files: 5,
        }
    }
}

/// Initializes the global subscriber. Must be called exactly once, before
/// the worker pool or API server start accepting work, so every span they
/// open is captured.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    // `max_file_size_mb`/`max_files` describe a rotation policy that
    // `tracing_appender::rolling` doesn't expose directly (it rotates
    // daily/hourly, not by size); they're carried on the config for the
    // Configuration list (§6) and applied once a size-based roller is
    // wired in, not silently dropped.
    let _ = (config.max_file_size_mb, config.max_files);

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(path) = &config.file_path {
        let directory = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("domainflow.log");
        let file_appender = tracing_appender::rolling::daily(directory, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Leaked deliberately: the guard must outlive the process for
        // buffered writes to flush, and this runs once at daemon startup.
        std::mem::forget(guard);

        if config.json_format {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_span_events(FmtSpan::CLOSE))
                .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking).with_ansi(false))
                .init();
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE))
                .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
    } else if config.json_format {
        registry.with(tracing_subscriber::fmt::layer().json().with_span_events(FmtSpan::CLOSE)).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE)).init();
    }

    tracing::info!(level = %config.level, json = config.json_format, "logging initialized");
    Ok(())
}
