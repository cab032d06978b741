//! Cross-sections: one node per active track at a single coordinate.

use tps_core::{CircuitGraph, Millimeters, NodeIndex};

/// An ordered group of node references, one per track, sorted by track.
///
/// A section does not own its nodes. Adjacent cells share the section between
/// them, so moving it moves both cells' shared boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    entries: Vec<(u32, NodeIndex)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(track, node)` pairs; entries are re-ordered by track.
    pub fn from_entries(mut entries: Vec<(u32, NodeIndex)>) -> Self {
        entries.sort_by_key(|&(track, _)| track);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(track, node)` pairs in track order
    pub fn entries(&self) -> &[(u32, NodeIndex)] {
        &self.entries
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.entries.iter().map(|&(_, node)| node)
    }

    pub fn tracks(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|&(track, _)| track)
    }

    pub fn node_on_track(&self, track: u32) -> Option<NodeIndex> {
        self.entries
            .binary_search_by_key(&track, |&(t, _)| t)
            .ok()
            .map(|pos| self.entries[pos].1)
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.entries.iter().any(|&(_, n)| n == node)
    }

    /// A section of fresh plain nodes with the same tracks and coordinates.
    pub fn deep_copy(&self, graph: &mut CircuitGraph) -> Section {
        let entries = self
            .entries
            .iter()
            .filter_map(|&(track, node)| {
                let original = graph.node(node)?;
                let copy = original.at(original.x);
                Some((track, graph.add_node(copy)))
            })
            .collect();
        Section { entries }
    }

    /// Replace every insulation-break node by a fresh break copy, so the far
    /// side of the break gets its own identity.
    pub fn split_breaks(&self, graph: &mut CircuitGraph) -> Section {
        let entries = self
            .entries
            .iter()
            .map(|&(track, node)| {
                let copy = graph
                    .node(node)
                    .filter(|n| n.is_break)
                    .map(|n| n.break_copy());
                match copy {
                    Some(copy) => (track, graph.add_node(copy)),
                    None => (track, node),
                }
            })
            .collect();
        Section { entries }
    }

    /// Move every node of the section to `x`.
    pub fn move_to(&self, graph: &mut CircuitGraph, x: Millimeters) {
        for &(_, node) in &self.entries {
            graph.move_node(node, x);
        }
    }
}
