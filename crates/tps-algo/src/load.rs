use num_complex::Complex64;
use tps_core::Millimeters;

/// A consumer (a train, a fixed load) attached to one track at one coordinate.
///
/// The load's admittance is fixed; it becomes an edge from the connection
/// node to ground when the load is placed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPoint {
    pub x: Millimeters,
    pub track: u32,
    pub admittance: Complex64,
}

impl LoadPoint {
    pub fn new(x: Millimeters, track: u32, admittance: Complex64) -> Self {
        Self {
            x,
            track,
            admittance,
        }
    }

    /// Load at a metre coordinate, rounded to the millimetre grid.
    pub fn at_meters(meters: f64, track: u32, admittance: Complex64) -> Self {
        Self::new(Millimeters::from_meters(meters), track, admittance)
    }
}
