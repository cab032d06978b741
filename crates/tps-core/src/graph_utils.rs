use crate::CircuitGraph;
use anyhow::{anyhow, Result};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::{HashSet, VecDeque};

/// Summary statistics produced by `tps stats`.
#[derive(Debug)]
pub struct GraphStats {
    /// Regular nodes plus the ground node
    pub node_count: usize,
    pub edge_count: usize,
    /// Edges terminating at ground (self-admittances and loads)
    pub ground_edge_count: usize,
    /// Components of the circuit with the ground node removed
    pub connected_components: usize,
    pub min_degree: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
}

/// Island summary (ground excluded, so every island is a galvanically separate piece).
#[derive(Debug)]
pub struct IslandSummary {
    pub island_id: usize,
    pub node_count: usize,
}

/// Node assignment info for `--emit` output.
#[derive(Debug)]
pub struct NodeAssignment {
    pub node_index: usize,
    pub label: String,
    pub island_id: usize,
}

/// Aggregated island analysis result.
#[derive(Debug)]
pub struct IslandAnalysis {
    pub islands: Vec<IslandSummary>,
    pub assignments: Vec<NodeAssignment>,
}

/// Degree and component statistics over the regular nodes.
pub fn graph_stats(graph: &CircuitGraph) -> Result<GraphStats> {
    let ground = graph.ground();
    let degrees: Vec<usize> = graph
        .nodes()
        .filter(|(index, _)| *index != ground)
        .map(|(index, _)| graph.degree(index))
        .collect();
    let min_degree = degrees.iter().copied().min().unwrap_or(0);
    let max_degree = degrees.iter().copied().max().unwrap_or(0);
    let avg_degree = if degrees.is_empty() {
        0.0
    } else {
        degrees.iter().sum::<usize>() as f64 / degrees.len() as f64
    };
    let analysis = find_islands(graph)?;
    Ok(GraphStats {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        ground_edge_count: graph.degree(ground),
        connected_components: analysis.islands.len(),
        min_degree,
        avg_degree,
        max_degree,
    })
}

/// Labels connected components of the circuit without ground (breadth-first search).
pub fn find_islands(graph: &CircuitGraph) -> Result<IslandAnalysis> {
    let ground = graph.ground();
    let inner = graph.inner();
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    let mut assignments = Vec::new();
    let mut island_id = 0;
    for start in inner.node_indices() {
        if start == ground || visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(node);
            for neighbor in inner.neighbors(node) {
                if neighbor != ground && !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        islands.push(IslandSummary {
            island_id,
            node_count: members.len(),
        });
        for node in members {
            assignments.push(NodeAssignment {
                node_index: node.index(),
                label: inner[node].label(),
                island_id,
            });
        }
        island_id += 1;
    }
    assignments.sort_by_key(|assignment| assignment.node_index);
    Ok(IslandAnalysis {
        islands,
        assignments,
    })
}

/// Export the circuit to a DOT string (Graphviz).
pub fn export_graph(graph: &CircuitGraph, format: &str) -> Result<String> {
    match format.to_ascii_lowercase().as_str() {
        "graphviz" | "dot" => Ok(render_dot(graph)),
        other => Err(anyhow!("unsupported graph export format '{other}'")),
    }
}

fn render_dot(graph: &CircuitGraph) -> String {
    let inner = graph.inner();
    let mut buffer = String::new();
    buffer.push_str("graph tps_circuit {\n");
    for node in inner.node_indices() {
        let label = sanitize_label(&inner[node].label());
        buffer.push_str(&format!("  n{} [label=\"{}\"];\n", node.index(), label));
    }
    for edge in inner.edge_references() {
        let source = edge.source().index();
        let target = edge.target().index();
        let y = edge.weight().conductance;
        buffer.push_str(&format!(
            "  n{source} -- n{target} [label=\"{:.4e}{:+.4e}j\"];\n",
            y.re, y.im
        ));
    }
    buffer.push('}');
    buffer
}

fn sanitize_label(label: &str) -> String {
    label.replace('"', "\\\"")
}
