use std::collections::BTreeMap;

use num_complex::Complex64;

use crate::units::Millimeters;

/// Which cross-section of a cell a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Per-segment physical model of the contact network.
///
/// This is the only physics the builder depends on. It is called once per
/// edge created or recomputed, and its answer is authoritative. When
/// `track1 == track2` and `side1 == side2` the pair is a node's self-term,
/// which the builder wires to the ground node.
pub trait ConductanceModel: Send + Sync + std::fmt::Debug {
    fn conductance(
        &self,
        track1: u32,
        side1: Side,
        track2: u32,
        side2: Side,
        length: Millimeters,
    ) -> Complex64;
}

/// Returns the same conductance for every pair regardless of length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantLattice(pub Complex64);

impl ConstantLattice {
    pub fn new(re: f64, im: f64) -> Self {
        Self(Complex64::new(re, im))
    }
}

impl ConductanceModel for ConstantLattice {
    fn conductance(&self, _: u32, _: Side, _: u32, _: Side, _: Millimeters) -> Complex64 {
        self.0
    }
}

/// Simplified lumped model built from per-kilometre impedance tables.
///
/// - self-term: half of the track's shunt admittance over the cell length
/// - same track across the cell: series admittance `1 / (z_self * l)`
/// - different tracks across the cell: coupling admittance `1 / (z_mutual * l)`
///   when a mutual impedance is listed for the pair, zero otherwise
/// - different tracks on the same cross-section: zero
///
/// Lengths below `min_length` are clamped so zero-length cells stay finite.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackLattice {
    self_impedance: BTreeMap<u32, Complex64>,
    default_impedance: Complex64,
    mutual_impedance: BTreeMap<(u32, u32), Complex64>,
    shunt_admittance: Complex64,
    min_length: Millimeters,
}

impl TrackLattice {
    /// Lattice where every track has the same series impedance (Ω/km).
    pub fn uniform(series_impedance: Complex64) -> Self {
        Self {
            self_impedance: BTreeMap::new(),
            default_impedance: series_impedance,
            mutual_impedance: BTreeMap::new(),
            shunt_admittance: Complex64::new(0.0, 0.0),
            min_length: Millimeters(1),
        }
    }

    /// Override one track's series impedance (Ω/km).
    pub fn with_self_impedance(mut self, track: u32, impedance: Complex64) -> Self {
        self.self_impedance.insert(track, impedance);
        self
    }

    /// Mutual impedance between two tracks (Ω/km). Order of the pair is irrelevant.
    pub fn with_mutual_impedance(mut self, track1: u32, track2: u32, impedance: Complex64) -> Self {
        self.mutual_impedance
            .insert(Self::pair(track1, track2), impedance);
        self
    }

    /// Shunt admittance to ground per track (S/km).
    pub fn with_shunt_admittance(mut self, admittance: Complex64) -> Self {
        self.shunt_admittance = admittance;
        self
    }

    pub fn with_min_length(mut self, min_length: Millimeters) -> Self {
        self.min_length = min_length.max(Millimeters(1));
        self
    }

    pub fn self_impedance(&self, track: u32) -> Complex64 {
        self.self_impedance
            .get(&track)
            .copied()
            .unwrap_or(self.default_impedance)
    }

    pub fn mutual_impedance(&self, track1: u32, track2: u32) -> Option<Complex64> {
        self.mutual_impedance
            .get(&Self::pair(track1, track2))
            .copied()
    }

    fn pair(track1: u32, track2: u32) -> (u32, u32) {
        (track1.min(track2), track1.max(track2))
    }

    fn series(impedance_per_km: Complex64, km: f64) -> Complex64 {
        let z = impedance_per_km * km;
        if z.norm() < 1e-15 {
            Complex64::new(0.0, 0.0)
        } else {
            z.inv()
        }
    }
}

impl ConductanceModel for TrackLattice {
    fn conductance(
        &self,
        track1: u32,
        side1: Side,
        track2: u32,
        side2: Side,
        length: Millimeters,
    ) -> Complex64 {
        let km = length.max(self.min_length).to_kilometers().value();
        match (track1 == track2, side1 == side2) {
            (true, true) => self.shunt_admittance * (km / 2.0),
            (true, false) => Self::series(self.self_impedance(track1), km),
            (false, false) => self
                .mutual_impedance(track1, track2)
                .map(|z| Self::series(z, km))
                .unwrap_or_default(),
            (false, true) => Complex64::new(0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-9
    }

    #[test]
    fn test_constant_lattice_ignores_arguments() {
        let lattice = ConstantLattice::new(2.0, -1.0);
        let a = lattice.conductance(1, Side::Left, 2, Side::Right, Millimeters(0));
        let b = lattice.conductance(3, Side::Right, 3, Side::Right, Millimeters(10_000));
        assert_eq!(a, b);
        assert_eq!(a, Complex64::new(2.0, -1.0));
    }

    #[test]
    fn test_series_admittance_scales_inversely_with_length() {
        let lattice = TrackLattice::uniform(Complex64::new(0.1, 0.4));
        let one_km = lattice.conductance(1, Side::Left, 1, Side::Right, Millimeters(1_000_000));
        let two_km = lattice.conductance(1, Side::Right, 1, Side::Left, Millimeters(2_000_000));
        assert!(close(one_km, Complex64::new(0.1, 0.4).inv()));
        assert!(close(two_km * 2.0, one_km));
    }

    #[test]
    fn test_self_term_uses_shunt_admittance() {
        let lattice = TrackLattice::uniform(Complex64::new(0.1, 0.4))
            .with_shunt_admittance(Complex64::new(0.0, 2e-6));
        let y = lattice.conductance(2, Side::Left, 2, Side::Left, Millimeters(1_000_000));
        assert!(close(y, Complex64::new(0.0, 1e-6)));
    }

    #[test]
    fn test_mutual_pair_is_symmetric() {
        let lattice = TrackLattice::uniform(Complex64::new(0.1, 0.4))
            .with_mutual_impedance(2, 1, Complex64::new(0.05, 0.2));
        let a = lattice.conductance(1, Side::Left, 2, Side::Right, Millimeters(500_000));
        let b = lattice.conductance(2, Side::Left, 1, Side::Right, Millimeters(500_000));
        assert_eq!(a, b);
        let none = lattice.conductance(1, Side::Left, 3, Side::Right, Millimeters(500_000));
        assert_eq!(none, Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_zero_length_is_clamped() {
        let lattice = TrackLattice::uniform(Complex64::new(0.1, 0.4));
        let y = lattice.conductance(1, Side::Left, 1, Side::Right, Millimeters(0));
        assert!(y.is_finite());
        assert_eq!(
            y,
            lattice.conductance(1, Side::Left, 1, Side::Right, Millimeters(1))
        );
    }

    #[test]
    fn test_per_track_override() {
        let lattice = TrackLattice::uniform(Complex64::new(0.1, 0.4))
            .with_self_impedance(3, Complex64::new(0.2, 0.8));
        assert_eq!(lattice.self_impedance(1), Complex64::new(0.1, 0.4));
        assert_eq!(lattice.self_impedance(3), Complex64::new(0.2, 0.8));
    }
}
