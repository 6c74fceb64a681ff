//! matricd: operator CLI for the admission core.
//!
//! Every invocation opens the LMDB store, runs one command against the
//! admission core and prints its result as JSON on stdout. Logs go to
//! stderr.

mod commands;
mod config;
mod documents;
mod outbox;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use matric_utils::LogFormat;

use crate::commands::{Command, Runtime};
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "matricd", version, about = "Admission core operator CLI")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "MATRIC_CONFIG")]
    config: Option<PathBuf>,

    /// LMDB data directory.
    #[arg(long, env = "MATRIC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Notification outbox file (JSON lines).
    #[arg(long, env = "MATRIC_OUTBOX")]
    outbox: Option<PathBuf>,

    /// Root directory for photo and document references.
    #[arg(long, env = "MATRIC_DOCUMENTS_DIR")]
    documents_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "MATRIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "MATRIC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// LMDB map size in MiB.
    #[arg(long, env = "MATRIC_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Use a throwaway in-memory store instead of LMDB.
    ///
    /// Nothing survives the process, so this only suits smoke-testing a
    /// single command (e.g. `provision`); a `submit` can never be followed
    /// by an `approve` in a later invocation.
    #[arg(long, env = "MATRIC_IN_MEMORY")]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(path) = &self.outbox {
            config.outbox_path = path.clone();
        }
        if let Some(dir) = &self.documents_dir {
            config.documents_dir = dir.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(mb) = self.map_size_mb {
            config.map_size_mb = mb;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    matric_utils::init_logging(config.log_format, &config.log_level);
    if let Some(path) = &cli.config {
        tracing::debug!("loaded config from {}", path.display());
    }

    if matches!(cli.command, Command::Config) {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let runtime = Runtime::open(&config, cli.in_memory)?;
    let command = cli.command;
    // Store and hashing work is blocking; keep it off the async workers.
    let task = tokio::task::spawn_blocking(move || runtime.execute(command));

    let output = tokio::select! {
        joined = task => joined.context("command task failed")??,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, the command may or may not have committed");
            anyhow::bail!("interrupted");
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
