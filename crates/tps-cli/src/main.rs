use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use tps_cli::cli::{Cli, Commands};
use tps_io::{load_config_or_default, TpsConfig};

mod commands;

fn main() {
    let cli = Cli::parse();

    let config = match load_config_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(2);
        }
    };

    let level = cli
        .log_level
        .or_else(|| config.logging.level.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    // stdout carries exports, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {err}");
    }

    if let Err(err) = run(&cli.command, &config) {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run(command: &Commands, config: &TpsConfig) -> Result<()> {
    match command {
        Commands::Build {
            case,
            out,
            format,
            compact,
        } => commands::build::handle(case, out.as_deref(), format.as_deref(), *compact, config),
        Commands::Stats { case } => commands::graph::handle_stats(case, config),
        Commands::Islands { case, emit } => commands::graph::handle_islands(case, *emit, config),
        Commands::Partitions { case, branch } => {
            commands::partitions::handle(case, *branch, config)
        }
        Commands::Validate { case, strict } => commands::validate::handle(case, *strict, config),
        Commands::Completions { shell, out_dir } => {
            commands::completions::handle(*shell, out_dir.as_deref())
        }
    }
}
