//! Filemap CLI - fmap command

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod config;
mod util;

/// Filemap - logical to physical path mapping store
#[derive(Parser)]
#[command(name = "fmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Store directory (default: walk up to the nearest .filemap/)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a mapping store in the current directory
    Init {
        /// Physical root directory the mappings resolve under
        #[arg(long)]
        root: String,

        /// Fail non-recursive removes that match nothing
        #[arg(long)]
        strict_remove: bool,
    },
    /// Resolve a logical path to its physical path
    Resolve {
        /// Logical path
        path: String,

        /// Persist the resolved name (and any new ancestors)
        #[arg(long)]
        create: bool,
    },
    /// Resolve a physical path back to its logical path
    Reverse {
        /// Physical path
        path: String,
    },
    /// List mapping rows
    Ls {
        /// Only rows whose logical path sits under this prefix
        prefix: Option<String>,
    },
    /// Remove mapping rows
    Rm {
        path: String,

        /// Match the physical column instead of the logical one
        #[arg(long)]
        physical: bool,

        /// Remove the whole subtree
        #[arg(short, long)]
        recursive: bool,
    },
    /// Duplicate a subtree's mappings (source retained)
    Cp { src: String, dst: String },
    /// Rename a subtree's mappings (source gone)
    Mv { src: String, dst: String },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { root, strict_remove } => cmd::init::run(cli.store, &root, strict_remove),
        Commands::Resolve { path, create } => cmd::resolve::run(cli.store, &path, create),
        Commands::Reverse { path } => cmd::reverse::run(cli.store, &path),
        Commands::Ls { prefix } => cmd::ls::run(cli.store, prefix.as_deref()),
        Commands::Rm {
            path,
            physical,
            recursive,
        } => cmd::rm::run(cli.store, &path, physical, recursive),
        Commands::Cp { src, dst } => cmd::copy::run(cli.store, &src, &dst, false),
        Commands::Mv { src, dst } => cmd::copy::run(cli.store, &src, &dst, true),
    }
}
