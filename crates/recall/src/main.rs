// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall - message-history store for conversational sessions.
//!
//! This is the binary entry point for the `recall` command-line tool.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use recall_config::model::RecallConfig;
use recall_core::{RecallError, StorageAdapter};
use recall_storage::SqliteStorage;
use uuid::Uuid;

/// Recall - message-history store for conversational sessions.
#[derive(Parser, Debug)]
#[command(name = "recall", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Upsert a JSON array of messages into a session.
    Put {
        #[arg(long)]
        session: String,
        /// Read messages from a file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Print one page of a session's history.
    List {
        #[arg(long)]
        session: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Defaults to `memory.page_size`.
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Print the recent-message window of a session.
    Window {
        #[arg(long)]
        session: String,
        /// Defaults to `memory.message_window`.
        #[arg(long)]
        window: Option<usize>,
        /// Return the last N messages instead of the post-summary window.
        #[arg(long, default_value_t = 0)]
        last_n: usize,
        /// Uuid of the last message already folded into a summary.
        #[arg(long)]
        summary_point: Option<Uuid>,
    },
    /// Print the session's messages with the given uuids.
    Lookup {
        #[arg(long)]
        session: String,
        #[arg(required = true)]
        uuids: Vec<Uuid>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => recall_config::load_and_validate_path(path),
        None => recall_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.log.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("recall: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &RecallConfig) -> Result<(), RecallError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;

    let result = dispatch(command, config, &storage).await;
    // Close even when the command failed; report the command's error first.
    let closed = storage.close().await;
    result.and(closed)
}

async fn dispatch(
    command: Commands,
    config: &RecallConfig,
    storage: &SqliteStorage,
) -> Result<(), RecallError> {
    let mut stdout = std::io::stdout().lock();
    match command {
        Commands::Put { session, file } => match file {
            Some(path) => {
                let input = std::fs::File::open(&path).map_err(|e| {
                    RecallError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let input = std::io::BufReader::new(input);
                commands::run_put(storage, &session, input, &mut stdout).await
            }
            None => {
                commands::run_put(storage, &session, std::io::stdin().lock(), &mut stdout).await
            }
        },
        Commands::List {
            session,
            page,
            page_size,
        } => {
            commands::run_list(
                storage,
                &config.memory,
                &session,
                page,
                page_size,
                &mut stdout,
            )
            .await
        }
        Commands::Window {
            session,
            window,
            last_n,
            summary_point,
        } => {
            commands::run_window(
                storage,
                &config.memory,
                &session,
                window,
                last_n,
                summary_point,
                &mut stdout,
            )
            .await
        }
        Commands::Lookup { session, uuids } => {
            commands::run_lookup(storage, &session, &uuids, &mut stdout).await
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so stdout carries only command output.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "recall={log_level},recall_storage={log_level},recall_core={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
