use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kvtap_cli::config::{Cli, Command, OutputFormat};
use kvtap_cli::{Replayer, parse_script};
use kvtap_inspector::{DisplaySink, InspectorConfig, JsonlSink, MutationLogger, TracingSink};
use kvtap_logging::{ConsoleConfig, FileConfig, KvtapSubscriberBuilder};
use kvtap_storage::InMemoryStore;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.validate() {
        e.exit();
    }

    match cli.command {
        Command::Replay {
            script,
            config,
            ignore,
            format,
            output,
            manual_connect,
            log_level,
            log_dir,
            log_rotation,
        } => {
            let filter = match format {
                OutputFormat::Log => format!("{log_level},kvtap::display=info"),
                OutputFormat::Jsonl => log_level,
            };
            let mut logging = KvtapSubscriberBuilder::new()
                .with_level(filter)
                .with_console(Some(ConsoleConfig {
                    ansi: io::stderr().is_terminal(),
                    ..ConsoleConfig::default()
                }));
            if let Some(dir) = log_dir {
                logging = logging.with_file_output(FileConfig::new(dir).with_rotation(log_rotation));
            }
            let _guard = logging.try_init().context("Failed to initialize logging")?;

            let inspector_config = load_config(config.as_deref())?.with_ignore(ignore);

            let source = std::fs::read_to_string(&script)
                .with_context(|| format!("Failed to read script {}", script.display()))?;
            let commands = parse_script(&source)
                .with_context(|| format!("Invalid script {}", script.display()))?;

            let sink: Arc<dyn DisplaySink> = match (format, output) {
                (OutputFormat::Log, _) => Arc::new(TracingSink),
                (OutputFormat::Jsonl, Some(path)) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    Arc::new(JsonlSink::new(file))
                }
                (OutputFormat::Jsonl, None) => Arc::new(JsonlSink::new(io::stdout())),
            };

            let store = Arc::new(InMemoryStore::new());
            let handle = MutationLogger::new(store.clone(), inspector_config).attach(sink);

            let mut replayer = Replayer::new(store, handle);
            if !manual_connect {
                replayer.connect().context("Failed to connect inspector")?;
            }
            let summary = replayer
                .run(&commands)
                .with_context(|| format!("Replay of {} failed", script.display()))?;

            info!(?summary, "Replay finished");
            eprintln!(
                "Replayed {} writes and {} deletes over {} connects ({} keys left)",
                summary.writes,
                summary.deletes,
                summary.connects,
                replayer.store().len()
            );
        }

        Command::CheckConfig { path } => {
            let config = InspectorConfig::from_file(&path)
                .with_context(|| format!("Invalid config {}", path.display()))?;
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<InspectorConfig> {
    match path {
        Some(path) => InspectorConfig::from_file(path)
            .with_context(|| format!("Invalid config {}", path.display())),
        None => Ok(InspectorConfig::default()),
    }
}
