//! Error type of the circuit builder
//!
//! Every failure of a build is fatal to that build: the graph must be fully
//! consistent before any downstream analysis runs, so there is no partial
//! success path. File and parse failures belong to the loaders, which report
//! them through `anyhow`.
//!
//! # Example
//!
//! ```
//! use tps_core::{Millimeters, TpsError, TpsResult};
//!
//! fn check(x: Millimeters, limit: Millimeters) -> TpsResult<()> {
//!     if x > limit {
//!         return Err(TpsError::OutOfRange { x, limit });
//!     }
//!     Ok(())
//! }
//!
//! assert!(check(Millimeters(500), Millimeters(1_000)).is_ok());
//! assert!(matches!(
//!     check(Millimeters(1_500), Millimeters(1_000)),
//!     Err(TpsError::OutOfRange { .. })
//! ));
//! ```

use thiserror::Error;

use crate::units::Millimeters;

/// Errors raised while wiring a circuit.
#[derive(Error, Debug)]
pub enum TpsError {
    /// Input data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Supply network description errors
    #[error("Network error: {0}")]
    Network(String),

    /// A coordinate lies beyond the last supply segment or outside its branch
    #[error("coordinate {x} is out of range (limit {limit})")]
    OutOfRange { x: Millimeters, limit: Millimeters },

    /// An edge endpoint was read before the edge was inserted into a graph
    #[error("edge has not been added to a graph")]
    UnconnectedEdge,

    /// A partition's cell chain was used before it was built
    #[error("cell chain of partition [{x_left}, {x_right}] is not initialized")]
    UninitializedChain {
        x_left: Millimeters,
        x_right: Millimeters,
    },

    /// No node exists at a load's exact coordinate and track after placement
    #[error("no node to connect load at {x} on track {track}")]
    AmbiguousConnectionPoint { x: Millimeters, track: u32 },
}

/// Convenience type alias for Results using TpsError.
pub type TpsResult<T> = Result<T, TpsError>;
