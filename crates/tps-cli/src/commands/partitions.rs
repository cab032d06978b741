use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Result};
use tabwriter::TabWriter;
use tps_io::TpsConfig;

use super::build_from_file;

pub fn handle(case: &Path, branch: Option<u32>, config: &TpsConfig) -> Result<()> {
    let router = build_from_file(case, config)?;
    if let Some(id) = branch {
        if router.branch(id).is_none() {
            return Err(anyhow!("branch {id} is not part of the case"));
        }
    }

    let mut tw = TabWriter::new(std::io::stdout());
    writeln!(tw, "BRANCH\tPARTITION\tX_LEFT\tX_RIGHT\tTRACKS\tCELLS\tLOADS")?;
    for layout in router
        .branches()
        .filter(|layout| branch.map_or(true, |id| layout.branch() == id))
    {
        for (position, partition) in layout.partitions().iter().enumerate() {
            let tracks: Vec<String> = partition
                .active_tracks()
                .iter()
                .map(|track| track.to_string())
                .collect();
            writeln!(
                tw,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                layout.branch(),
                position,
                partition.x_left(),
                partition.x_right(),
                tracks.join(","),
                partition.cell_count(),
                partition.loads().len()
            )?;
        }
    }
    tw.flush()?;
    Ok(())
}
