//! Compile-time unit safety for track coordinates and lengths.
//!
//! Coordinates along a branch are kept as an integer number of millimetres so
//! that nodes created by different code paths at "the same" point compare
//! exactly equal. Real-valued coordinates (metres) only appear at the input and
//! export boundaries.
//!
//! # Usage
//!
//! ```
//! use tps_core::units::{Meters, Millimeters};
//!
//! let x = Millimeters::from_meters(12.3456);
//! assert_eq!(x, Millimeters(12_346));
//! assert_eq!(x.to_meters(), Meters(12.346));
//!
//! let length = Millimeters(1_500) - Millimeters(500);
//! assert_eq!(length.to_kilometers().value(), 0.001);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Macro to implement common arithmetic operations for real-valued unit types
macro_rules! impl_unit_ops {
    ($type:ty, $unit_name:literal) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Neg for $type {
            type Output = Self;
            fn neg(self) -> Self::Output {
                Self(-self.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.3} {}", self.0, $unit_name)
            }
        }

        impl $type {
            /// Create a new value
            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            /// Get the raw numeric value
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            /// Check if value is finite
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }
    };
}

// =============================================================================
// Coordinates
// =============================================================================

/// Axis coordinate or length in whole millimetres.
///
/// This is the canonical coordinate type of the circuit graph. Ordering and
/// equality are exact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Millimeters(pub i64);

impl Millimeters {
    /// Lowest representable coordinate, used as the open left end of a branch.
    pub const MIN: Self = Self(i64::MIN);

    /// Highest representable coordinate.
    pub const MAX: Self = Self(i64::MAX);

    /// Zero length.
    pub const ZERO: Self = Self(0);

    /// Create a new value
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw number of millimetres
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Round a metre coordinate to three decimals, then scale to millimetres.
    ///
    /// The two-step rounding matches how coordinates are entered upstream
    /// (metres with millimetre precision) and keeps `12.3455` and `12.3455000001`
    /// on the same millimetre.
    #[inline]
    pub fn from_meters(meters: f64) -> Self {
        let rounded = (meters * 1_000.0).round() / 1_000.0;
        Self((rounded * 1_000.0).round() as i64)
    }

    /// Axis coordinate in metres, rounded to three decimals.
    #[inline]
    pub fn to_meters(self) -> Meters {
        Meters(self.0 as f64 / 1_000.0)
    }

    /// Length in kilometres, the unit per-length impedance tables are given in.
    #[inline]
    pub fn to_kilometers(self) -> Kilometers {
        Kilometers(self.0 as f64 / 1_000_000.0)
    }

    /// Absolute value
    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Minimum of two values
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Maximum of two values
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }
}

impl Add for Millimeters {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Millimeters {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl std::fmt::Display for Millimeters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::MIN => write!(f, "-inf"),
            Self::MAX => write!(f, "+inf"),
            Self(value) => write!(f, "{value} mm"),
        }
    }
}

impl From<Meters> for Millimeters {
    fn from(meters: Meters) -> Self {
        Millimeters::from_meters(meters.0)
    }
}

/// Coordinate or length in metres, used at the input/export boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Meters(pub f64);

impl_unit_ops!(Meters, "m");

/// Length in kilometres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Kilometers(pub f64);

impl_unit_ops!(Kilometers, "km");

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_meters_rounds_to_millimetres() {
        assert_eq!(Millimeters::from_meters(0.0), Millimeters(0));
        assert_eq!(Millimeters::from_meters(1.0), Millimeters(1_000));
        assert_eq!(Millimeters::from_meters(12.3456), Millimeters(12_346));
        assert_eq!(Millimeters::from_meters(12.3454), Millimeters(12_345));
        assert_eq!(Millimeters::from_meters(-2.5), Millimeters(-2_500));
    }

    #[test]
    fn test_to_meters() {
        assert_eq!(Millimeters(1_500).to_meters(), Meters(1.5));
        assert_eq!(Millimeters(-250).to_meters(), Meters(-0.25));
    }

    #[test]
    fn test_meters_round_trip() {
        for raw in [0.001, 0.5, 13.0, 104.217, 9_999.999] {
            let mm = Millimeters::from_meters(raw);
            assert_eq!(Millimeters::from(mm.to_meters()), mm);
        }
    }

    #[test]
    fn test_coordinate_arithmetic() {
        let a = Millimeters(1_000);
        let b = Millimeters(400);
        assert_eq!(a - b, Millimeters(600));
        assert_eq!(a + b, Millimeters(1_400));
        assert_eq!(-b, Millimeters(-400));
        assert_eq!(a.min(b), b);
        assert_eq!(a.max(b), a);
        assert!(Millimeters::MIN < b);
    }

    #[test]
    fn test_kilometres() {
        assert_eq!(Millimeters(2_000_000).to_kilometers(), Kilometers(2.0));
        assert_eq!((Kilometers(1.5) * 2.0).value(), 3.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Millimeters(400)), "400 mm");
        assert_eq!(format!("{}", Millimeters::MIN), "-inf");
        assert_eq!(format!("{}", Meters(1.5)), "1.500 m");
    }
}
