//! # tps-algo: Circuit Construction
//!
//! Turns raw track points and a supply description into the lumped
//! equivalent circuit of a traction power-supply network.
//!
//! ## Pipeline
//!
//! 1. [`Router`] scans each branch's points into [`Partition`]s, one flat
//!    cross-section at every point and [`SegmentIndex`] boundary
//! 2. each partition builds a chain of [`Cell`]s sized for its loads
//! 3. each cell meshes its two [`Section`]s into conductance edges
//! 4. loads are placed by pulling cell boundaries onto their coordinates and
//!    wiring a ground edge with the load's admittance
//!
//! All mutation goes through one [`tps_core::CircuitGraph`]; branches are
//! independent of each other.

pub mod cell;
pub mod load;
pub mod partition;
pub mod router;
pub mod section;
pub mod segment;
pub mod test_utils;

pub use cell::{Cell, CellId, MeshEdge};
pub use load::LoadPoint;
pub use partition::Partition;
pub use router::{BranchLayout, Router};
pub use section::Section;
pub use segment::{SegmentIndex, SegmentLink, SegmentSpec};
