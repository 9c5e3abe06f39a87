use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use kvtap_logging::RotationStrategy;

#[derive(Parser)]
#[command(name = "kvtap", about = "Watch key-value storage mutations in a developer console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a mutation script against an in-memory store with the inspector attached
    Replay {
        /// Script file (one `set`, `del`, `connect` or `disconnect` per line)
        script: PathBuf,
        /// Inspector config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Additional keys to ignore
        #[arg(long = "ignore", value_name = "KEY")]
        ignore: Vec<String>,
        /// How display messages are rendered
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
        /// Write JSONL messages to this file instead of stdout (jsonl format only)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Start disconnected; the script must `connect` itself
        #[arg(long)]
        manual_connect: bool,
        /// Log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "warn")]
        log_level: String,
        /// Also write JSONL logs into this directory
        #[arg(long, value_name = "DIR")]
        log_dir: Option<PathBuf>,
        /// Log file rotation (never, daily, hourly)
        #[arg(long, default_value_t = RotationStrategy::Never, requires = "log_dir")]
        log_rotation: RotationStrategy,
    },
    /// Parse an inspector config and print the effective settings
    CheckConfig {
        /// Config file path
        path: PathBuf,
    },
}

impl Cli {
    /// Reject flag combinations clap cannot express on its own
    pub fn validate(&self) -> Result<(), clap::Error> {
        if let Command::Replay {
            format: OutputFormat::Log,
            output: Some(path),
            ..
        } = &self.command
        {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--output {} only applies to --format jsonl; --format log prints through the logger",
                    path.display()
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `display` command lines
    Jsonl,
    /// Log each message through the tracing subscriber
    Log,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay_args() {
        let cli = Cli::try_parse_from([
            "kvtap", "replay", "session.kv", "--ignore", "secret", "--ignore", "token", "--format", "log",
        ])
        .unwrap();
        match cli.command {
            Command::Replay {
                script,
                ignore,
                format,
                manual_connect,
                ..
            } => {
                assert_eq!(script, PathBuf::from("session.kv"));
                assert_eq!(ignore, vec!["secret", "token"]);
                assert_eq!(format, OutputFormat::Log);
                assert!(!manual_connect);
            }
            Command::CheckConfig { .. } => panic!("expected replay"),
        }
    }

    #[test]
    fn test_log_file_flags() {
        let cli = Cli::try_parse_from([
            "kvtap", "replay", "session.kv", "--log-dir", "logs", "--log-rotation", "hourly",
        ])
        .unwrap();
        match cli.command {
            Command::Replay {
                log_dir, log_rotation, ..
            } => {
                assert_eq!(log_dir, Some(PathBuf::from("logs")));
                assert_eq!(log_rotation, RotationStrategy::Hourly);
            }
            Command::CheckConfig { .. } => panic!("expected replay"),
        }
    }

    #[test]
    fn test_log_rotation_requires_log_dir() {
        let result = Cli::try_parse_from(["kvtap", "replay", "session.kv", "--log-rotation", "daily"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_conflicts_with_log_format() {
        let cli = Cli::try_parse_from([
            "kvtap", "replay", "session.kv", "--format", "log", "--output", "out.jsonl",
        ])
        .unwrap();
        let err = cli.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);

        let cli = Cli::try_parse_from(["kvtap", "replay", "session.kv", "--output", "out.jsonl"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
