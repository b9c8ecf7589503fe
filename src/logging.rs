use crate::config::{LogLevel, PreviewConfig};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Stream the human-readable log layer writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleOutput {
    Stdout,
    /// Keeps stdout free for the document URL printed in headless mode
    #[default]
    Stderr,
}

impl ConsoleOutput {
    fn make_writer(self) -> BoxMakeWriter {
        match self {
            ConsoleOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            ConsoleOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        }
    }
}

/// Configuration for the logging system
pub struct LogConfig {
    /// Directory where log files will be stored
    pub log_dir: PathBuf,
    /// Prefix for log file names
    pub file_prefix: String,
    /// Maximum number of log files to keep (rotation)
    pub max_files: usize,
    /// Level used when RUST_LOG is not set
    pub level: LogLevel,
    /// Whether the JSON file layer is installed at all
    pub log_to_file: bool,
    /// Where console logs go
    pub console: ConsoleOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: crate::paths::log_dir(),
            file_prefix: "photogeo-preview".to_string(),
            max_files: 5,
            level: LogLevel::Info,
            log_to_file: true,
            console: ConsoleOutput::default(),
        }
    }
}

impl LogConfig {
    /// Build a logging configuration from the handler settings
    pub fn from_config(config: &PreviewConfig) -> Self {
        Self {
            max_files: config.log_max_files,
            level: config.log_level,
            log_to_file: config.log_to_file,
            ..Self::default()
        }
    }
}

/// Initialize the logging system with file and console output
///
/// # Log Targets
/// - `main` - Process lifecycle and argument handling
/// - `config` - Settings file loading
/// - `preview` - Preview orchestration
/// - `preview::document` - HTML generation
/// - `preview::policy` - Blocked resource requests
/// - `metadata` - GPS extraction
/// - `theme` - Theme resolution
/// - `telemetry` - Emitted events
/// - `host::webview` - WebView2 hosting (Windows only)
///
/// RUST_LOG overrides the configured level, e.g. `RUST_LOG=preview=trace`.
pub fn init_logging(config: LogConfig) -> Result<LogGuard> {
    let level = config.level;
    let env_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let (file_layer, worker_guard) = if config.log_to_file {
        std::fs::create_dir_all(&config.log_dir).context("Failed to create log directory")?;

        let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix(&config.file_prefix)
            .filename_suffix("log")
            .max_log_files(config.max_files)
            .build(&config.log_dir)
            .context("Failed to create file appender")?;

        // The guard MUST be kept alive for the entire process lifetime
        let (non_blocking_file, worker_guard) = tracing_appender::non_blocking(file_appender);

        let layer = fmt::layer()
            .json()
            .with_writer(non_blocking_file)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_filter(env_filter());

        (Some(layer), Some(worker_guard))
    } else {
        (None, None)
    };

    let console_layer = fmt::layer()
        .compact()
        .with_writer(config.console.make_writer())
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(env_filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        target: "main",
        log_dir = %config.log_dir.display(),
        max_files = config.max_files,
        log_to_file = config.log_to_file,
        "Logging system initialized"
    );

    Ok(LogGuard {
        _worker_guard: worker_guard,
    })
}

/// Guard that ensures logs are flushed before exit
pub struct LogGuard {
    _worker_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        tracing::info!(target: "main", "Flushing logs before shutdown");
    }
}
