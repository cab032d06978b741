use std::path::Path;

use anyhow::Result;
use tps_core::graph_utils::{find_islands, graph_stats};
use tps_io::TpsConfig;

use super::build_from_file;

pub fn handle_stats(case: &Path, config: &TpsConfig) -> Result<()> {
    let router = build_from_file(case, config)?;
    let stats = graph_stats(router.graph())?;
    println!("Circuit statistics for {}:", case.display());
    println!("  Branches       : {}", router.branches().count());
    println!("  Nodes          : {}", stats.node_count);
    println!("  Edges          : {}", stats.edge_count);
    println!("  Ground edges   : {}", stats.ground_edge_count);
    println!("  Islands        : {}", stats.connected_components);
    println!(
        "  Degree [min/avg/max]: {}/{:.2}/{}",
        stats.min_degree, stats.avg_degree, stats.max_degree
    );
    Ok(())
}

pub fn handle_islands(case: &Path, emit: bool, config: &TpsConfig) -> Result<()> {
    let router = build_from_file(case, config)?;
    let analysis = find_islands(router.graph())?;
    println!("Found {} island(s)", analysis.islands.len());
    for island in &analysis.islands {
        println!("  Island {}: {} node(s)", island.island_id, island.node_count);
    }
    if emit {
        println!("node_index\tlabel\tisland_id");
        for assignment in &analysis.assignments {
            println!(
                "{}\t{}\t{}",
                assignment.node_index, assignment.label, assignment.island_id
            );
        }
    }
    Ok(())
}
