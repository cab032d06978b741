use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(
    name = "tps",
    author,
    version,
    about = "Equivalent-circuit builder for multi-track traction power supply networks",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level (overrides the config file)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Builder configuration (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the circuit of a case and export it
    Build {
        /// Case file (YAML or JSON)
        case: PathBuf,
        /// Write the export here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Export format: json or dot (defaults to the config file's choice)
        #[arg(long)]
        format: Option<String>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },
    /// Node, edge and degree statistics of a built case
    Stats {
        case: PathBuf,
    },
    /// Galvanically separate pieces of a built case (ground excluded)
    Islands {
        case: PathBuf,
        /// Print the island of every node
        #[arg(long)]
        emit: bool,
    },
    /// Partition layout of every branch
    Partitions {
        case: PathBuf,
        /// Restrict to one branch
        #[arg(long)]
        branch: Option<u32>,
    },
    /// Check a case and the circuit built from it
    Validate {
        case: PathBuf,
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
        /// Write the script into this directory instead of stdout
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
