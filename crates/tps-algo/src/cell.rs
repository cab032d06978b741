//! Cells: the lumped-circuit element between two cross-sections.
//!
//! A cell is fully meshed. Every pair of its nodes (left and right sections
//! together) is joined by one edge whose conductance comes from the segment's
//! [`ConductanceModel`]; a node paired with itself is wired to ground.

use tps_core::{
    CircuitEdge, CircuitGraph, ConductanceModel, EdgeIndex, Millimeters, NodeIndex, Side,
};

use crate::section::Section;

/// Position of a cell in its partition's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub usize);

/// One mesh edge with the terminals it was computed for.
#[derive(Debug, Clone, Copy)]
pub struct MeshEdge {
    pub edge: EdgeIndex,
    pub first: (u32, Side),
    pub second: (u32, Side),
}

#[derive(Debug, Clone)]
pub struct Cell {
    x_left: Millimeters,
    x_right: Millimeters,
    left: Section,
    right: Section,
    edges: Vec<MeshEdge>,
    pub(crate) prev: Option<CellId>,
    pub(crate) next: Option<CellId>,
}

impl Cell {
    /// Create the cell and its mesh.
    ///
    /// With `m` nodes across both sections this inserts `m * (m + 1) / 2`
    /// edges: one per unordered pair plus one ground edge per node.
    pub fn mesh(
        graph: &mut CircuitGraph,
        x_left: Millimeters,
        x_right: Millimeters,
        left: Section,
        right: Section,
        lattice: &dyn ConductanceModel,
    ) -> Self {
        let length = x_right - x_left;
        let terminals: Vec<(u32, Side, NodeIndex)> = left
            .entries()
            .iter()
            .map(|&(track, node)| (track, Side::Left, node))
            .chain(
                right
                    .entries()
                    .iter()
                    .map(|&(track, node)| (track, Side::Right, node)),
            )
            .collect();

        let ground = graph.ground();
        let mut edges = Vec::with_capacity(terminals.len() * (terminals.len() + 1) / 2);
        for (i, &(t1, s1, n1)) in terminals.iter().enumerate() {
            for &(t2, s2, n2) in &terminals[i..] {
                let target = if n1 == n2 { ground } else { n2 };
                let y = lattice.conductance(t1, s1, t2, s2, length);
                let edge = graph.add_edge(n1, target, CircuitEdge::new(y));
                edges.push(MeshEdge {
                    edge,
                    first: (t1, s1),
                    second: (t2, s2),
                });
            }
        }

        Self {
            x_left,
            x_right,
            left,
            right,
            edges,
            prev: None,
            next: None,
        }
    }

    pub fn x_left(&self) -> Millimeters {
        self.x_left
    }

    pub fn x_right(&self) -> Millimeters {
        self.x_right
    }

    pub fn length(&self) -> Millimeters {
        self.x_right - self.x_left
    }

    pub fn left(&self) -> &Section {
        &self.left
    }

    pub fn right(&self) -> &Section {
        &self.right
    }

    pub fn prev(&self) -> Option<CellId> {
        self.prev
    }

    pub fn next(&self) -> Option<CellId> {
        self.next
    }

    pub fn mesh_edges(&self) -> &[MeshEdge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Recompute every mesh conductance for the current length.
    pub fn refresh(&self, graph: &mut CircuitGraph, lattice: &dyn ConductanceModel) {
        let length = self.length();
        for mesh in &self.edges {
            let (t1, s1) = mesh.first;
            let (t2, s2) = mesh.second;
            graph.set_conductance(mesh.edge, lattice.conductance(t1, s1, t2, s2, length));
        }
    }

    /// Node at exactly `x` on `track`, searching the left section then the right.
    pub fn find_node(&self, x: Millimeters, track: u32) -> Option<NodeIndex> {
        if x == self.x_left {
            if let Some(node) = self.left.node_on_track(track) {
                return Some(node);
            }
        }
        if x == self.x_right {
            return self.right.node_on_track(track);
        }
        None
    }

    pub(crate) fn set_left(&mut self, graph: &mut CircuitGraph, x: Millimeters) {
        self.x_left = x;
        self.left.move_to(graph, x);
    }

    pub(crate) fn set_right(&mut self, graph: &mut CircuitGraph, x: Millimeters) {
        self.x_right = x;
        self.right.move_to(graph, x);
    }

    /// Remove the mesh edges from the graph.
    pub(crate) fn unmesh(&mut self, graph: &mut CircuitGraph) {
        for mesh in self.edges.drain(..) {
            graph.remove_edge(mesh.edge);
        }
    }
}
