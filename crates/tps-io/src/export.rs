//! Read-only export of a built circuit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use tps_core::graph_utils::export_graph;
use tps_core::CircuitGraph;

use crate::config::ExportFormat;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub id: usize,
    pub label: String,
    /// `branch * 10_000 + track`
    pub line: u64,
    pub branch: u32,
    pub track: u32,
    pub x_mm: i64,
    pub x_m: f64,
    pub is_break: bool,
    pub is_break_copy: bool,
    pub is_ground: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeRecord {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    pub re: f64,
    pub im: f64,
}

/// Node and edge tables of a circuit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphExport {
    pub ground: usize,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphExport {
    pub fn from_graph(graph: &CircuitGraph) -> Result<Self> {
        let nodes = graph
            .nodes()
            .map(|(index, node)| NodeRecord {
                id: index.index(),
                label: node.label(),
                line: node.line.encoded(),
                branch: node.branch(),
                track: node.track(),
                x_mm: node.x.value(),
                x_m: node.axis_coordinate().0,
                is_break: node.is_break,
                is_break_copy: node.is_break_copy,
                is_ground: node.is_ground(),
            })
            .collect();
        let edges = graph
            .edges()
            .map(|(index, edge)| {
                Ok(EdgeRecord {
                    id: index.index(),
                    source: edge.source()?.index(),
                    target: edge.target()?.index(),
                    re: edge.conductance.re,
                    im: edge.conductance.im,
                })
            })
            .collect::<Result<Vec<_>>>()
            .context("exporting edges")?;
        Ok(Self {
            ground: graph.ground().index(),
            nodes,
            edges,
        })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Render a circuit in the requested format.
pub fn render_graph(graph: &CircuitGraph, format: ExportFormat, pretty: bool) -> Result<String> {
    match format {
        ExportFormat::Json => GraphExport::from_graph(graph)?.to_json(pretty),
        ExportFormat::Dot => export_graph(graph, "dot"),
    }
}

/// Render a circuit and write it to `path`.
pub fn write_graph(
    graph: &CircuitGraph,
    format: ExportFormat,
    pretty: bool,
    path: &Path,
) -> Result<()> {
    let rendered = render_graph(graph, format, pretty)?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating output directory '{}'", dir.display()))?;
        }
    }
    std::fs::write(path, rendered).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(())
}
