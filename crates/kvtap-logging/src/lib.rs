//! Structured logging setup for kvtap
//!
//! Every kvtap crate logs through `tracing`. This crate wires up the
//! subscriber: pretty or JSON lines on stderr, optional JSONL files, and
//! `RUST_LOG` based filtering.
//!
//! # Quick Start
//!
//! ```ignore
//! use kvtap_logging::{FileConfig, KvtapSubscriberBuilder, LogConfig};
//!
//! // Warnings on stderr
//! KvtapSubscriberBuilder::new().init();
//!
//! // Debug output on stderr plus a JSONL file; keep the guard alive
//! let _guard = KvtapSubscriberBuilder::new()
//!     .with_level("debug")
//!     .with_file_output(FileConfig::new("./logs"))
//!     .init();
//! ```

pub mod config;

pub use config::{ConsoleConfig, ConsoleFormat, FileConfig, LogConfig, RotationStrategy};

use std::fs::{self, File};
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory or file could not be created
    #[error("Failed to create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rolling appender could not be set up
    #[error("Failed to initialize log appender: {0}")]
    Appender(#[from] InitError),

    /// A global subscriber is already installed
    #[error("Subscriber already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Builder for configuring and initializing the kvtap logging subscriber
pub struct KvtapSubscriberBuilder {
    config: LogConfig,
}

impl KvtapSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default filter directive
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.level = level.into();
        self
    }

    /// Replace the console settings, `None` disables console output
    pub fn with_console(mut self, console: Option<ConsoleConfig>) -> Self {
        self.config.console = console;
        self
    }

    /// Also write JSONL log lines to files
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Try to initialize the subscriber globally
    ///
    /// Returns the file writer guard, which must be kept alive for the
    /// duration of the program when file output is enabled.
    pub fn try_init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.config.level));

        let console = self.config.console;

        let pretty_layer = console
            .filter(|c| c.format == ConsoleFormat::Pretty)
            .map(|c| {
                fmt::layer()
                    .with_ansi(c.ansi)
                    .with_target(true)
                    .with_writer(std::io::stderr)
            });

        let json_layer = console
            .filter(|c| c.format == ConsoleFormat::Json)
            .map(|_| {
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr)
            });

        let (file_layer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = create_file_writer(file_config)?;
                let layer = fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(pretty_layer)
            .with(json_layer)
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }

    /// Initialize the subscriber globally
    ///
    /// Failures are reported on stderr and leave logging as it was.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("Warning: Failed to initialize logging: {}", e);
                None
            }
        }
    }
}

impl Default for KvtapSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// Truncates for Never rotation, appends for others
fn create_file_writer(file_config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    fs::create_dir_all(&file_config.directory).map_err(|source| LoggingError::LogFile {
        path: file_config.directory.clone(),
        source,
    })?;

    let rotation = match file_config.rotation {
        RotationStrategy::Never => {
            let path = file_config.single_file_path();
            let file = File::create(&path).map_err(|source| LoggingError::LogFile { path, source })?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&file_config.prefix)
        .filename_suffix("log")
        .build(&file_config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() {
    KvtapSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init();
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = KvtapSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}
