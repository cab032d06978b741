//! The circuit graph: the central node/edge table.
//!
//! Nodes and edges live in a petgraph `StableGraph`, so indices stay valid
//! when a partition removes the cells it is rebuilding. Everything else in the
//! workspace refers to nodes by [`NodeIndex`] and to edges by [`EdgeIndex`];
//! moving a node (a pull) rewrites its table entry and every edge touching it
//! sees the new coordinate.

use num_complex::Complex64;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Undirected;

use crate::diagnostics::Diagnostics;
use crate::units::Millimeters;
use crate::{CircuitEdge, CircuitNode, EdgeIndex, NodeIndex};

/// Global node/edge container of the equivalent circuit.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    graph: StableGraph<CircuitNode, CircuitEdge, Undirected>,
    ground: NodeIndex,
}

impl CircuitGraph {
    /// An empty circuit containing only the ground node.
    pub fn new() -> Self {
        let mut graph = StableGraph::default();
        let ground = graph.add_node(CircuitNode::ground());
        Self { graph, ground }
    }

    /// The shared ground node.
    #[inline]
    pub fn ground(&self) -> NodeIndex {
        self.ground
    }

    /// Insert a node and return its identity. Ground nodes are not inserted:
    /// every ground reference resolves to [`Self::ground`].
    pub fn add_node(&mut self, node: CircuitNode) -> NodeIndex {
        if node.is_ground() {
            return self.ground;
        }
        self.graph.add_node(node)
    }

    pub fn node(&self, index: NodeIndex) -> Option<&CircuitNode> {
        self.graph.node_weight(index)
    }

    pub fn contains_node(&self, index: NodeIndex) -> bool {
        self.graph.contains_node(index)
    }

    /// Move a regular node along its track. The ground node never moves.
    pub fn move_node(&mut self, index: NodeIndex, x: Millimeters) {
        if index == self.ground {
            return;
        }
        if let Some(node) = self.graph.node_weight_mut(index) {
            node.x = x;
        }
    }

    /// Remove a regular node together with its incident edges.
    pub fn remove_node(&mut self, index: NodeIndex) -> Option<CircuitNode> {
        if index == self.ground {
            return None;
        }
        self.graph.remove_node(index)
    }

    /// Insert an edge, fixing its endpoints.
    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
        mut edge: CircuitEdge,
    ) -> EdgeIndex {
        edge.connect(source, target);
        self.graph.add_edge(source, target, edge)
    }

    pub fn edge(&self, index: EdgeIndex) -> Option<&CircuitEdge> {
        self.graph.edge_weight(index)
    }

    pub fn set_conductance(&mut self, index: EdgeIndex, conductance: Complex64) {
        if let Some(edge) = self.graph.edge_weight_mut(index) {
            edge.conductance = conductance;
        }
    }

    pub fn remove_edge(&mut self, index: EdgeIndex) -> Option<CircuitEdge> {
        self.graph.remove_edge(index)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of edges incident to a node.
    pub fn degree(&self, index: NodeIndex) -> usize {
        self.graph.edges(index).count()
    }

    /// Read-only iteration over all nodes, ground included.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &CircuitNode)> + '_ {
        self.graph
            .node_indices()
            .filter_map(move |index| self.graph.node_weight(index).map(|node| (index, node)))
    }

    /// Read-only iteration over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &CircuitEdge)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.id(), edge.weight()))
    }

    /// Edges incident to a node, with the opposite endpoint.
    pub fn edges_of(
        &self,
        index: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, &CircuitEdge)> + '_ {
        self.graph.edges(index).map(move |edge| {
            let other = if edge.source() == index {
                edge.target()
            } else {
                edge.source()
            };
            (edge.id(), other, edge.weight())
        })
    }

    /// Whether an edge joins the two nodes directly.
    pub fn are_adjacent(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.find_edge(a, b).is_some()
    }

    /// Underlying petgraph structure for graph algorithms.
    pub fn inner(&self) -> &StableGraph<CircuitNode, CircuitEdge, Undirected> {
        &self.graph
    }
}

impl Default for CircuitGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural checks on a finished circuit.
///
/// - warning: a regular node with no edge (an input point that was never wired)
/// - error: an edge with a non-finite conductance
/// - error: an edge with an endpoint missing from the graph
pub fn validate_graph(graph: &CircuitGraph, diag: &mut Diagnostics) {
    for (index, node) in graph.nodes() {
        if index == graph.ground() {
            continue;
        }
        if graph.degree(index) == 0 {
            diag.add(
                crate::DiagnosticIssue::new(
                    crate::Severity::Warning,
                    "wiring",
                    "node is not connected to the circuit",
                )
                .with_entity(node.label())
                .with_coordinate(node.x),
            );
        }
    }

    for (index, edge) in graph.edges() {
        let entity = format!("edge {}", index.index());
        if !edge.conductance.is_finite() {
            diag.add_error_with_entity("conductance", "conductance is not finite", &entity);
        }
        match (edge.source(), edge.target()) {
            (Ok(source), Ok(target)) => {
                if !graph.contains_node(source) || !graph.contains_node(target) {
                    diag.add_error_with_entity("wiring", "edge endpoint is missing", &entity);
                }
            }
            _ => diag.add_error_with_entity("wiring", "edge has no endpoints", &entity),
        }
    }
}
