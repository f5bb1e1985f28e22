// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pitwall - resilient state access for rate limiting and conversational memory.
//!
//! This is the binary entry point. It owns the process-wide cache and
//! database clients and exposes operational commands over them.

mod app;
mod commands;
mod status;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use pitwall_core::PitwallError;

use crate::app::App;

/// Pitwall - resilient state access for rate limiting and conversational memory.
#[derive(Parser, Debug)]
#[command(name = "pitwall", version, about, long_about = None)]
struct Cli {
    /// Print machine-readable JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check cache and database health.
    Status,
    /// Load the default knowledge corpus.
    SeedKnowledge,
    /// Search the knowledge corpus by keyword.
    SearchKnowledge {
        query: String,
        #[arg(long, default_value_t = 3)]
        limit: usize,
    },
    /// Ask whether one more action fits in the rate window.
    LimitCheck {
        subject: String,
        action: String,
        #[arg(long)]
        limit: Option<u64>,
        /// Window length in seconds.
        #[arg(long)]
        window: Option<u64>,
    },
    /// Record one admitted action.
    LimitRecord {
        subject: String,
        action: String,
        /// Window length in seconds.
        #[arg(long)]
        window: Option<u64>,
    },
    /// Show the last messages of a conversation.
    History {
        subject: String,
        conversation: String,
        #[arg(long, default_value_t = 10)]
        n: usize,
    },
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pitwall={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

async fn dispatch(app: &App, command: Commands, json: bool) -> Result<i32, PitwallError> {
    match command {
        Commands::Status => status::run_status(app, json).await?,
        Commands::SeedKnowledge => commands::run_seed(app).await?,
        Commands::SearchKnowledge { query, limit } => {
            commands::run_search(app, &query, limit, json).await?
        }
        Commands::LimitCheck {
            subject,
            action,
            limit,
            window,
        } => {
            let allowed =
                commands::run_limit_check(app, &subject, &action, limit, window, json).await?;
            if !allowed {
                return Ok(2);
            }
        }
        Commands::LimitRecord {
            subject,
            action,
            window,
        } => commands::run_limit_record(app, &subject, &action, window).await?,
        Commands::History {
            subject,
            conversation,
            n,
        } => commands::run_history(app, &subject, &conversation, n, json).await?,
    }
    Ok(0)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match pitwall_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            pitwall_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let Some(command) = cli.command else {
        println!("pitwall: use --help for available commands");
        return;
    };

    let app = match App::open(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("pitwall: {e}");
            std::process::exit(1);
        }
    };

    let code = match dispatch(&app, command, cli.json).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("pitwall: {e}");
            1
        }
    };
    app.shutdown().await;
    std::process::exit(code);
}
