//! CLI logging initialization
//!
//! Per-stage log control built on `tracing-subscriber` target filters.

use std::io;
use tracing::Level;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Colored multi-line output for development.
    Pretty,
    /// Single-line output.
    Compact,
    /// JSON output for tool integration.
    Json,
}

/// Per-stage log levels, each falling back to the global level.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub address: Option<Level>,
    pub rewrite: Option<Level>,
    pub system_api: Option<Level>,
    pub hotreload: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            address: None,
            rewrite: None,
            system_api: None,
            hotreload: None,
        }
    }
}

impl LogConfig {
    fn level_for(&self, stage: Option<Level>) -> Level {
        stage.unwrap_or(self.global)
    }

    fn targets(&self) -> Targets {
        Targets::new()
            .with_default(self.global)
            .with_target("ohmbuild_core::address", self.level_for(self.address))
            .with_target("ohmbuild_core::rewrite", self.level_for(self.rewrite))
            .with_target("ohmbuild_core::system_api", self.level_for(self.system_api))
            .with_target("ohmbuild_core::hotreload", self.level_for(self.hotreload))
    }
}

/// Initialize the subscriber with the given format, optionally teeing
/// every record to a log file.
pub fn init_with_file<P: AsRef<std::path::Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) {
    let targets = log_config.targets();

    if let Some(path) = file {
        let file_handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("Failed to open log file");

        let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(move || file_handle.try_clone().expect("Failed to clone file handle"))
            .with_filter(targets);

        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets);
        tracing_subscriber::registry().with(stderr_layer).init();
    }
}

fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> impl Layer<tracing_subscriber::Registry>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

/// Parse a log level string, accepting "silent" as errors-only.
pub fn parse_log_level(s: &str) -> Option<Level> {
    match s.to_lowercase().as_str() {
        "silent" => Some(Level::ERROR),
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
