//! Configuration types for the logging system

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Main logging configuration
///
/// Console output always goes to stderr; stdout belongs to whatever the
/// program itself prints (display messages in `kvtap replay`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive (overridden by RUST_LOG)
    pub level: String,

    /// Console output, `None` to disable
    pub console: Option<ConsoleConfig>,

    /// File output, `None` to disable
    pub file: Option<FileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_cli("warn")
    }
}

impl LogConfig {
    /// Human readable stderr output at `level`, no files
    pub fn for_cli(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            console: Some(ConsoleConfig::default()),
            file: None,
        }
    }

    /// Verbose colored console output
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            console: Some(ConsoleConfig {
                format: ConsoleFormat::Pretty,
                ansi: true,
            }),
            file: None,
        }
    }

    /// JSONL files only, for sessions inspected after the fact
    pub fn recording(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: "debug".to_string(),
            console: None,
            file: Some(FileConfig::new(log_dir)),
        }
    }

    /// Warnings only, uncolored
    pub fn testing() -> Self {
        Self::for_cli("warn")
    }
}

/// Console output configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
    /// Include ANSI colors
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            format: ConsoleFormat::Pretty,
            ansi: false,
        }
    }
}

/// Console line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Pretty,
    Json,
}

/// File output configuration
///
/// Files are always JSONL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    /// Directory for log files, created if missing
    pub directory: PathBuf,
    /// File name prefix
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl FileConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            prefix: "kvtap".to_string(),
            rotation: RotationStrategy::default(),
        }
    }

    pub fn with_rotation(mut self, rotation: RotationStrategy) -> Self {
        self.rotation = rotation;
        self
    }

    /// Path of the single file written with [`RotationStrategy::Never`]
    pub fn single_file_path(&self) -> PathBuf {
        self.directory.join(format!("{}.log", self.prefix))
    }
}

/// File rotation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    /// One `<prefix>.log` file, truncated on start
    #[default]
    Never,
    /// One file per day, appended to
    Daily,
    /// One file per hour, appended to
    Hourly,
}

impl RotationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStrategy::Never => "never",
            RotationStrategy::Daily => "daily",
            RotationStrategy::Hourly => "hourly",
        }
    }
}

impl fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "never" => Ok(RotationStrategy::Never),
            "daily" => Ok(RotationStrategy::Daily),
            "hourly" => Ok(RotationStrategy::Hourly),
            other => Err(format!("unknown rotation `{other}` (expected never, daily or hourly)")),
        }
    }
}
