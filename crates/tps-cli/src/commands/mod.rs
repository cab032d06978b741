pub mod build;
pub mod completions;
pub mod graph;
pub mod partitions;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use tps_algo::Router;
use tps_io::{build_case, load_case, TpsConfig};

/// Load a case file and build its circuit with the configured defaults.
pub(crate) fn build_from_file(case: &Path, config: &TpsConfig) -> Result<Router> {
    let case_file = load_case(case)?;
    build_case(&case_file, &config.lattice)
        .with_context(|| format!("building case '{}'", case.display()))
}
