use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Installs the fmt subscriber. `RUST_LOG` wins over `default_level`; a
/// second call is a no-op.
pub fn init_logging(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn log_event(level: LogLevel, message: &str, context: Option<serde_json::Value>) {
    match (level, context) {
        (LogLevel::Debug, Some(ctx)) => tracing::debug!("[Parser] {} {}", message, ctx),
        (LogLevel::Info, Some(ctx)) => tracing::info!("[Parser] {} {}", message, ctx),
        (LogLevel::Warn, Some(ctx)) => tracing::warn!("[Parser] {} {}", message, ctx),
        (LogLevel::Error, Some(ctx)) => tracing::error!("[Parser] {} {}", message, ctx),
        (LogLevel::Debug, None) => tracing::debug!("[Parser] {}", message),
        (LogLevel::Info, None) => tracing::info!("[Parser] {}", message),
        (LogLevel::Warn, None) => tracing::warn!("[Parser] {}", message),
        (LogLevel::Error, None) => tracing::error!("[Parser] {}", message),
    }
}
