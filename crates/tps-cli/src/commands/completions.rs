use std::path::Path;

use anyhow::{Context, Result};
use clap_complete::{generate, generate_to, Shell};

use tps_cli::cli::build_cli_command;

const BIN_NAME: &str = "tps";

/// Print the completion script, or write it into `out_dir` under the shell's
/// conventional file name.
pub fn handle(shell: Shell, out_dir: Option<&Path>) -> Result<()> {
    let mut cmd = build_cli_command();
    match out_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating '{}'", dir.display()))?;
            let path = generate_to(shell, &mut cmd, BIN_NAME, dir)
                .with_context(|| format!("writing {shell} completion to '{}'", dir.display()))?;
            println!("{}", path.display());
        }
        None => generate(shell, &mut cmd, BIN_NAME, &mut std::io::stdout()),
    }
    Ok(())
}
