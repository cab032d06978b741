use std::path::Path;

use anyhow::Result;
use tracing::info;

use tps_io::{render_graph, write_graph, ExportFormat, TpsConfig};

use super::build_from_file;

pub fn handle(
    case: &Path,
    out: Option<&Path>,
    format: Option<&str>,
    compact: bool,
    config: &TpsConfig,
) -> Result<()> {
    let format = match format {
        Some(name) => name.parse::<ExportFormat>()?,
        None => config.export.format,
    };
    let pretty = config.export.pretty && !compact;

    let router = build_from_file(case, config)?;
    let graph = router.graph();
    let diag = router.diagnostics();
    if diag.has_issues() {
        info!(issues = %diag.summary(), "case built with diagnostics");
    }

    match out {
        Some(path) => {
            write_graph(graph, format, pretty, path)?;
            println!(
                "Built {} nodes and {} edges; wrote {format} to {}",
                graph.node_count(),
                graph.edge_count(),
                path.display()
            );
        }
        None => println!("{}", render_graph(graph, format, pretty)?),
    }
    Ok(())
}
