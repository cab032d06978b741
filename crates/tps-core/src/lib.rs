//! # tps-core: Traction Power-Supply Circuit Model
//!
//! Data structures for the lumped equivalent circuit of an AC traction
//! contact network.
//!
//! ## Design Philosophy
//!
//! The circuit is an **undirected graph** where:
//! - **Nodes**: physical connection points on a track (component terminals,
//!   insulation breaks, cell boundaries, load points) plus one shared ground node
//! - **Edges**: complex conductances integrated over a length of track
//!
//! Regular nodes are identified by the index the graph assigns when they are
//! inserted, never by their coordinate: two distinct points that share a
//! coordinate stay distinct. The ground node is a single value and every
//! ground reference resolves to it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tps_core::*;
//! use num_complex::Complex64;
//!
//! let mut graph = CircuitGraph::new();
//! let a = graph.add_node(CircuitNode::new(LineId::new(0, 1), Millimeters(0)));
//! let b = graph.add_node(CircuitNode::new(LineId::new(0, 1), Millimeters(1_000)));
//!
//! let edge = graph.add_edge(a, b, CircuitEdge::new(Complex64::new(2.0, -0.5)));
//! assert_eq!(graph.edge(edge).unwrap().source().unwrap(), a);
//!
//! // Ground references collapse onto the shared ground node
//! let ground = graph.add_node(CircuitNode::ground());
//! assert_eq!(ground, graph.ground());
//! ```
//!
//! ## Modules
//!
//! - [`graph`] - The circuit graph container and structural validation
//! - [`graph_utils`] - Statistics, island analysis, DOT export
//! - [`lattice`] - The conductance provider seam and reference models
//! - [`units`] - Millimetre coordinates and length units
//! - [`diagnostics`] - Warning/error collection

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod graph_utils;
pub mod lattice;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{TpsError, TpsResult};
pub use graph::{validate_graph, CircuitGraph};
pub use lattice::{ConductanceModel, ConstantLattice, Side, TrackLattice};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
pub use units::{Kilometers, Meters, Millimeters};

/// Composite line identifier: a track within a branch.
///
/// Track `0` is reserved for ground. Externally the pair is encoded as
/// `branch * 10_000 + track`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId {
    pub branch: u32,
    pub track: u32,
}

impl LineId {
    /// Multiplier of the branch index in the encoded form.
    pub const STRIDE: u64 = 10_000;

    #[inline]
    pub fn new(branch: u32, track: u32) -> Self {
        Self { branch, track }
    }

    /// The ground line of a branch
    #[inline]
    pub fn ground(branch: u32) -> Self {
        Self { branch, track: 0 }
    }

    #[inline]
    pub fn is_ground(&self) -> bool {
        self.track == 0
    }

    /// `branch * 10_000 + track`
    pub fn encoded(&self) -> u64 {
        u64::from(self.branch) * Self::STRIDE + u64::from(self.track)
    }

    pub fn from_encoded(value: u64) -> Self {
        Self {
            branch: (value / Self::STRIDE) as u32,
            track: (value % Self::STRIDE) as u32,
        }
    }

    /// Same branch, another track
    pub fn with_track(&self, track: u32) -> Self {
        Self {
            branch: self.branch,
            track,
        }
    }
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b{}t{}", self.branch, self.track)
    }
}

/// One electrical connection point.
///
/// Deliberately not `PartialEq`: identity is the [`NodeIndex`] the graph
/// assigned, and only the graph decides when two references are the same node.
#[derive(Debug, Clone)]
pub struct CircuitNode {
    pub line: LineId,
    /// Axis coordinate. The only field a pull ever changes.
    pub x: Millimeters,
    /// The point models an insulation break on its track
    pub is_break: bool,
    /// Generated duplicate giving the far side of an insulation break its own identity
    pub is_break_copy: bool,
}

impl CircuitNode {
    pub fn new(line: LineId, x: Millimeters) -> Self {
        Self {
            line,
            x,
            is_break: false,
            is_break_copy: false,
        }
    }

    /// A node marking an insulation break
    pub fn breaking(line: LineId, x: Millimeters) -> Self {
        Self {
            is_break: true,
            ..Self::new(line, x)
        }
    }

    pub fn ground() -> Self {
        Self::new(LineId::ground(0), Millimeters::ZERO)
    }

    /// Fresh plain node on another track of the same branch at the same coordinate
    pub fn on_track(&self, track: u32) -> Self {
        Self::new(self.line.with_track(track), self.x)
    }

    /// Plain node on the same line at another coordinate
    pub fn at(&self, x: Millimeters) -> Self {
        Self::new(self.line, x)
    }

    /// The far-side twin of an insulation break
    pub fn break_copy(&self) -> Self {
        Self {
            is_break_copy: true,
            ..Self::new(self.line, self.x)
        }
    }

    #[inline]
    pub fn is_ground(&self) -> bool {
        self.line.is_ground()
    }

    #[inline]
    pub fn track(&self) -> u32 {
        self.line.track
    }

    #[inline]
    pub fn branch(&self) -> u32 {
        self.line.branch
    }

    /// Coordinate in metres
    pub fn axis_coordinate(&self) -> Meters {
        self.x.to_meters()
    }

    /// Short label: `GND`, or line and coordinate with `!` for breaks and `~` for break copies
    pub fn label(&self) -> String {
        if self.is_ground() {
            return "GND".to_string();
        }
        let mark = if self.is_break {
            "!"
        } else if self.is_break_copy {
            "~"
        } else {
            ""
        };
        format!("{}@{}{}", self.line, mark, self.x.value())
    }
}

/// A conductance between two nodes.
///
/// Endpoints are fixed exactly once, when the edge is moved into a
/// [`CircuitGraph`]; reading them before that is an error.
#[derive(Debug, Clone)]
pub struct CircuitEdge {
    pub conductance: Complex64,
    endpoints: Option<(NodeIndex, NodeIndex)>,
}

impl CircuitEdge {
    pub fn new(conductance: Complex64) -> Self {
        Self {
            conductance,
            endpoints: None,
        }
    }

    /// Edge from an impedance, `y = 1 / z`
    pub fn from_impedance(impedance: Complex64) -> Self {
        Self::new(impedance.inv())
    }

    pub fn source(&self) -> TpsResult<NodeIndex> {
        self.endpoints
            .map(|(source, _)| source)
            .ok_or(TpsError::UnconnectedEdge)
    }

    pub fn target(&self) -> TpsResult<NodeIndex> {
        self.endpoints
            .map(|(_, target)| target)
            .ok_or(TpsError::UnconnectedEdge)
    }

    pub fn is_connected(&self) -> bool {
        self.endpoints.is_some()
    }

    pub(crate) fn connect(&mut self, source: NodeIndex, target: NodeIndex) {
        self.endpoints = Some((source, target));
    }
}

impl Default for CircuitEdge {
    /// Unit conductance
    fn default() -> Self {
        Self::new(Complex64::new(1.0, 0.0))
    }
}
