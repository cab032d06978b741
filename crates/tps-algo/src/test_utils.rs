//! Builders for small circuits used by tests and doc examples.

use std::collections::BTreeSet;
use std::sync::Arc;

use num_complex::Complex64;
use tps_core::{
    CircuitGraph, CircuitNode, ConductanceModel, ConstantLattice, LineId, Millimeters, NodeIndex,
    TrackLattice,
};

use crate::segment::{SegmentLink, SegmentSpec};

/// Overhead-line model with coupling between every pair of tracks.
pub fn reference_lattice(tracks: u32) -> TrackLattice {
    let mut lattice = TrackLattice::uniform(Complex64::new(0.15, 0.65))
        .with_shunt_admittance(Complex64::new(0.0, 3.0e-6));
    for a in 1..=tracks {
        for b in (a + 1)..=tracks {
            lattice = lattice.with_mutual_impedance(a, b, Complex64::new(0.05, 0.3));
        }
    }
    lattice
}

/// A link open on both sides with tracks `1..=tracks` and [`reference_lattice`].
pub fn track_lattice_link(tracks: u32) -> SegmentLink {
    SegmentLink {
        x_left: Millimeters::MIN,
        x_right: Millimeters::MAX,
        active_tracks: (1..=tracks).collect::<BTreeSet<u32>>(),
        lattice: Arc::new(reference_lattice(tracks)),
    }
}

/// A link open on both sides with unit conductances.
pub fn constant_link(tracks: u32) -> SegmentLink {
    SegmentLink {
        x_left: Millimeters::MIN,
        x_right: Millimeters::MAX,
        active_tracks: (1..=tracks).collect::<BTreeSet<u32>>(),
        lattice: Arc::new(ConstantLattice::new(1.0, 0.0)),
    }
}

/// Segment list from `(right boundary, track count)` pairs sharing one model.
pub fn segments(bounds: &[(i64, u32)], lattice: Arc<dyn ConductanceModel>) -> Vec<SegmentSpec> {
    bounds
        .iter()
        .map(|&(x, tracks)| SegmentSpec::new(Millimeters(x), tracks, Arc::clone(&lattice)))
        .collect()
}

/// Insert plain nodes on one track of a branch.
pub fn add_points(
    graph: &mut CircuitGraph,
    branch: u32,
    track: u32,
    xs: &[i64],
) -> Vec<NodeIndex> {
    xs.iter()
        .map(|&x| graph.add_node(CircuitNode::new(LineId::new(branch, track), Millimeters(x))))
        .collect()
}

/// Insert an insulation-break node.
pub fn add_break(graph: &mut CircuitGraph, branch: u32, track: u32, x: i64) -> NodeIndex {
    graph.add_node(CircuitNode::breaking(LineId::new(branch, track), Millimeters(x)))
}
