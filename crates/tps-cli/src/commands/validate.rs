use std::path::Path;

use anyhow::{bail, Result};
use tps_io::TpsConfig;

use super::build_from_file;

pub fn handle(case: &Path, strict: bool, config: &TpsConfig) -> Result<()> {
    let router = build_from_file(case, config)?;
    let diag = router.validate();
    print!("{diag}");

    if diag.has_errors() || (strict && diag.has_issues()) {
        bail!("validation failed: {}", diag.summary());
    }
    println!("{} is valid", case.display());
    Ok(())
}
