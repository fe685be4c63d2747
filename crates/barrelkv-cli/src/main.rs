//! `barrelkv` command-line shell.
//!
//! A thin wrapper over [`barrelkv::Engine`] for poking at a data directory
//! from a terminal — no engineering depth lives here.
//!
//! # Quick Start
//!
//! ```bash
//! barrelkv put ./data name bitcask
//! barrelkv get ./data name
//! barrelkv list-keys ./data
//! barrelkv delete ./data name
//! barrelkv merge ./data
//! barrelkv info ./data
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// barrelkv - an embedded, single-writer, persistent key-value store.
#[derive(Parser)]
#[command(name = "barrelkv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Write a key-value pair.
    Put {
        /// Path to the data directory.
        dir: PathBuf,
        /// Key to write.
        key: String,
        /// Value to write.
        value: String,
    },

    /// Read the value for a key.
    Get {
        /// Path to the data directory.
        dir: PathBuf,
        /// Key to read.
        key: String,
    },

    /// Delete a key.
    Delete {
        /// Path to the data directory.
        dir: PathBuf,
        /// Key to delete.
        key: String,
    },

    /// List every live key, in ascending order.
    ListKeys {
        /// Path to the data directory.
        dir: PathBuf,
    },

    /// Compact segments, reclaiming space held by stale and deleted keys.
    Merge {
        /// Path to the data directory.
        dir: PathBuf,
    },

    /// Show a summary of an open database.
    Info {
        /// Path to the data directory.
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Put { dir, key, value } => commands::put::run(&dir, &key, &value),
        Commands::Get { dir, key } => commands::get::run(&dir, &key),
        Commands::Delete { dir, key } => commands::delete::run(&dir, &key),
        Commands::ListKeys { dir } => commands::list_keys::run(&dir),
        Commands::Merge { dir } => commands::merge::run(&dir),
        Commands::Info { dir } => commands::info::run(&dir),
    }
}
