//! Portsnap CLI - List listening TCP ports and stop their processes
//!
//! A command-line front end to `portsnap-core`: one-shot listings,
//! graceful kills and a periodically refreshed watch view.

mod commands;

use clap::{Parser, Subcommand};
use portsnap_core::Category;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "PORTSNAP_LOG";

#[derive(Parser)]
#[command(name = "portsnap")]
#[command(author, version, about = "List listening TCP ports and stop their processes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all listening ports
    #[command(alias = "ls")]
    List {
        /// Only show one category (webdev, backend, database, system, other)
        #[arg(short, long)]
        category: Option<Category>,

        /// Match process name, port or PID
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Stop the process listening on a port, or a process by PID
    Kill {
        /// Port whose listening processes should be stopped
        #[arg(required_unless_present = "pid", conflicts_with = "pid")]
        port: Option<u16>,

        /// Stop this process directly
        #[arg(long)]
        pid: Option<i32>,
    },

    /// Keep a refreshed listing on screen until Ctrl-C
    Watch {
        /// Only show one category
        #[arg(short, long)]
        category: Option<Category>,

        /// Match process name, port or PID
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout is reserved for listings and JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::List { category, search }) => {
            commands::list::run(category, search, cli.json).await?;
        }
        Some(Commands::Kill { port, pid }) => {
            commands::kill::run(port, pid, cli.json).await?;
        }
        Some(Commands::Watch { category, search }) => {
            commands::watch::run(category, search, cli.json).await?;
        }
        Some(Commands::Config) => {
            commands::config::show(cli.json)?;
        }
        None => {
            commands::list::run(None, None, cli.json).await?;
        }
    }

    Ok(())
}
