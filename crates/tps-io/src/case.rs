//! Case files: the input points, supply description and loads of a study.
//!
//! A case lists branches. Each branch gives its track points (metres, with
//! optional insulation-break flags), its supply segments (right boundary in
//! metres and the number of active tracks) and its loads.
//!
//! ```yaml
//! name: two-track section
//! branches:
//!   - id: 0
//!     tracks:
//!       - track: 1
//!         points: [{ x: 0.0 }, { x: 0.5, break: true }, { x: 1.0 }]
//!     segments:
//!       - { x_right: 1.0, tracks: 2 }
//!     loads:
//!       - { x: 0.4, track: 1, admittance: { re: 0.04, im: -0.012 } }
//! ```

use anyhow::{anyhow, bail, Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use tps_algo::{LoadPoint, Router, SegmentSpec};
use tps_core::{
    CircuitGraph, CircuitNode, ConductanceModel, ConstantLattice, LineId, Millimeters,
    TrackLattice,
};

use crate::config::LatticeConfig;

/// A complex number as written in case and config files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ComplexValue {
    pub re: f64,
    #[serde(default)]
    pub im: f64,
}

impl From<Complex64> for ComplexValue {
    fn from(value: Complex64) -> Self {
        Self {
            re: value.re,
            im: value.im,
        }
    }
}

impl From<ComplexValue> for Complex64 {
    fn from(value: ComplexValue) -> Self {
        Complex64::new(value.re, value.im)
    }
}

/// Line model of a segment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum LatticeSpec {
    /// The same conductance on every mesh edge
    Constant { conductance: ComplexValue },
    /// Per-kilometre track parameters
    Track {
        series_impedance: ComplexValue,
        #[serde(default)]
        shunt_admittance: ComplexValue,
        /// Coupling between every pair of tracks
        #[serde(default)]
        mutual_impedance: Option<ComplexValue>,
        /// Series impedance overrides per track
        #[serde(default)]
        track_impedance: BTreeMap<u32, ComplexValue>,
    },
}

impl LatticeSpec {
    /// Materialize the model for a segment with tracks `1..=tracks`.
    pub fn build(&self, tracks: u32) -> Arc<dyn ConductanceModel> {
        match self {
            Self::Constant { conductance } => {
                Arc::new(ConstantLattice(Complex64::from(*conductance)))
            }
            Self::Track {
                series_impedance,
                shunt_admittance,
                mutual_impedance,
                track_impedance,
            } => {
                let mut lattice = TrackLattice::uniform((*series_impedance).into())
                    .with_shunt_admittance((*shunt_admittance).into());
                for (&track, &z) in track_impedance {
                    lattice = lattice.with_self_impedance(track, z.into());
                }
                if let Some(z) = mutual_impedance {
                    for a in 1..=tracks {
                        for b in (a + 1)..=tracks {
                            lattice = lattice.with_mutual_impedance(a, b, (*z).into());
                        }
                    }
                }
                Arc::new(lattice)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    pub name: Option<String>,
    /// Line model for segments without one; the configured default otherwise
    #[serde(default)]
    pub lattice: Option<LatticeSpec>,
    #[serde(default)]
    pub branches: Vec<BranchSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSpec {
    pub id: u32,
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,
    pub segments: Vec<SegmentEntry>,
    #[serde(default)]
    pub loads: Vec<LoadSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSpec {
    pub track: u32,
    #[serde(default)]
    pub points: Vec<PointSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSpec {
    /// Axis coordinate, metres
    pub x: f64,
    #[serde(default, rename = "break")]
    pub is_break: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEntry {
    /// Right boundary, metres
    pub x_right: f64,
    /// Number of active tracks, numbered from 1
    pub tracks: u32,
    #[serde(default)]
    pub lattice: Option<LatticeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadSpec {
    /// Axis coordinate, metres
    pub x: f64,
    pub track: u32,
    pub admittance: ComplexValue,
}

impl From<&LoadSpec> for LoadPoint {
    fn from(load: &LoadSpec) -> Self {
        LoadPoint::at_meters(load.x, load.track, load.admittance.into())
    }
}

/// Read a case from YAML or JSON, chosen by extension.
pub fn load_case(path: &Path) -> Result<CaseFile> {
    let data =
        fs::read_to_string(path).with_context(|| format!("reading case '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing case yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing case json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing case"),
    }
}

/// Structural checks that do not need the graph.
pub fn validate_case(case: &CaseFile) -> Result<()> {
    if case.branches.is_empty() {
        bail!("case contains no branches");
    }
    let mut seen = BTreeSet::new();
    for branch in &case.branches {
        if !seen.insert(branch.id) {
            bail!("branch {} is defined twice", branch.id);
        }
        if branch.segments.is_empty() {
            bail!("branch {} has no segments", branch.id);
        }
        let mut tracks = BTreeSet::new();
        for track in &branch.tracks {
            if track.track == 0 {
                bail!("branch {}: track 0 is reserved for ground", branch.id);
            }
            if !tracks.insert(track.track) {
                bail!("branch {}: track {} is defined twice", branch.id, track.track);
            }
            if let Some(point) = track.points.iter().find(|p| !p.x.is_finite()) {
                bail!(
                    "branch {}: track {} has a non-finite coordinate {}",
                    branch.id,
                    track.track,
                    point.x
                );
            }
        }
        for load in &branch.loads {
            if load.track == 0 {
                bail!("branch {}: load at {} m is on the ground track", branch.id, load.x);
            }
        }
    }
    Ok(())
}

/// Insert every track point of the case into a fresh graph.
pub fn case_graph(case: &CaseFile) -> CircuitGraph {
    let mut graph = CircuitGraph::new();
    for branch in &case.branches {
        for track in &branch.tracks {
            let line = LineId::new(branch.id, track.track);
            for point in &track.points {
                let x = Millimeters::from_meters(point.x);
                let node = if point.is_break {
                    CircuitNode::breaking(line, x)
                } else {
                    CircuitNode::new(line, x)
                };
                graph.add_node(node);
            }
        }
    }
    graph
}

/// Segment list of a branch with each segment's line model resolved.
pub fn branch_segments(
    branch: &BranchSpec,
    case_lattice: Option<&LatticeSpec>,
    defaults: &LatticeConfig,
) -> Vec<SegmentSpec> {
    let fallback = defaults.to_spec();
    branch
        .segments
        .iter()
        .map(|segment| {
            let spec = segment
                .lattice
                .as_ref()
                .or(case_lattice)
                .unwrap_or(&fallback);
            SegmentSpec::new(
                Millimeters::from_meters(segment.x_right),
                segment.tracks,
                spec.build(segment.tracks),
            )
        })
        .collect()
}

/// A router holding the case's points and networks, not yet wired.
pub fn case_router(case: &CaseFile, defaults: &LatticeConfig) -> Result<Router> {
    validate_case(case)?;
    let mut router = Router::new(case_graph(case));
    for branch in &case.branches {
        router.add_network(
            branch.id,
            branch_segments(branch, case.lattice.as_ref(), defaults),
        );
    }
    Ok(router)
}

/// Build the full circuit of a case: wire every branch and place its loads.
pub fn build_case(case: &CaseFile, defaults: &LatticeConfig) -> Result<Router> {
    let mut router = case_router(case, defaults)?;
    router.wire().context("wiring case")?;
    for branch in &case.branches {
        if branch.loads.is_empty() {
            continue;
        }
        if router.branch(branch.id).is_none() {
            return Err(anyhow!(
                "branch {} has loads but no track points",
                branch.id
            ));
        }
        let loads: Vec<LoadPoint> = branch.loads.iter().map(LoadPoint::from).collect();
        router
            .add_loads(branch.id, loads)
            .with_context(|| format!("placing loads on branch {}", branch.id))?;
    }
    debug!(
        case = case.name.as_deref().unwrap_or("unnamed"),
        nodes = router.graph().node_count(),
        edges = router.graph().edge_count(),
        "built case"
    );
    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CASE_YAML: &str = r#"
name: unit
branches:
  - id: 0
    tracks:
      - track: 1
        points: [{ x: 0.0 }, { x: 0.5, break: true }, { x: 1.0 }]
      - track: 2
        points: [{ x: 0.0 }, { x: 1.0 }]
    segments:
      - { x_right: 1.0, tracks: 2 }
    loads:
      - { x: 0.25, track: 2, admittance: { re: 0.04, im: -0.012 } }
"#;

    fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_case() {
        let file = write_temp(CASE_YAML, ".yaml");
        let case = load_case(file.path()).unwrap();
        assert_eq!(case.name.as_deref(), Some("unit"));
        let branch = &case.branches[0];
        assert!(branch.tracks[0].points[1].is_break);
        assert_eq!(branch.loads[0].admittance.im, -0.012);
    }

    #[test]
    fn test_load_json_case() {
        let case: CaseFile = serde_yaml::from_str(CASE_YAML).unwrap();
        let json = serde_json::to_string(&case).unwrap();
        let file = write_temp(&json, ".json");
        let loaded = load_case(file.path()).unwrap();
        assert_eq!(loaded.branches[0].tracks.len(), 2);
    }

    #[test]
    fn test_lattice_spec_tagging() {
        let spec: LatticeSpec = serde_yaml::from_str(
            "model: track\nseries_impedance: { re: 0.2, im: 0.7 }\ntrack_impedance:\n  2: { re: 0.3, im: 0.8 }\n",
        )
        .unwrap();
        match spec {
            LatticeSpec::Track {
                track_impedance, ..
            } => assert_eq!(track_impedance[&2], ComplexValue { re: 0.3, im: 0.8 }),
            other => panic!("unexpected {other:?}"),
        }
        let constant: LatticeSpec =
            serde_yaml::from_str("model: constant\nconductance: { re: 1.0 }\n").unwrap();
        assert_eq!(
            constant,
            LatticeSpec::Constant {
                conductance: ComplexValue { re: 1.0, im: 0.0 }
            }
        );
    }

    #[test]
    fn test_validate_case_rejects_bad_input() {
        let mut case: CaseFile = serde_yaml::from_str(CASE_YAML).unwrap();
        case.branches.push(case.branches[0].clone());
        assert!(validate_case(&case).is_err());

        let mut case: CaseFile = serde_yaml::from_str(CASE_YAML).unwrap();
        case.branches[0].tracks[0].track = 0;
        assert!(validate_case(&case).is_err());

        let empty = CaseFile {
            name: None,
            lattice: None,
            branches: Vec::new(),
        };
        assert!(validate_case(&empty).is_err());
    }

    #[test]
    fn test_case_graph_rounds_to_millimetres() {
        let mut case: CaseFile = serde_yaml::from_str(CASE_YAML).unwrap();
        case.branches[0].tracks[1].points[1].x = 1.000_4;
        let graph = case_graph(&case);
        assert_eq!(graph.node_count(), 6);
        assert!(graph
            .nodes()
            .any(|(_, n)| n.track() == 2 && n.x == Millimeters(1_000)));
        assert_eq!(graph.nodes().filter(|(_, n)| n.is_break).count(), 1);
    }

    #[test]
    fn test_build_case_places_loads() {
        let case: CaseFile = serde_yaml::from_str(CASE_YAML).unwrap();
        let router = build_case(&case, &LatticeConfig::default()).unwrap();
        let layout = router.branch(0).unwrap();
        assert_eq!(layout.partitions().len(), 2);
        assert_eq!(layout.partitions()[0].load_edges().len(), 1);
        assert!(!router.validate().has_errors());
    }

    #[test]
    fn test_segment_lattice_precedence() {
        let case: CaseFile = serde_yaml::from_str(
            r#"
lattice: { model: constant, conductance: { re: 2.0 } }
branches:
  - id: 0
    segments:
      - { x_right: 1.0, tracks: 1 }
      - { x_right: 2.0, tracks: 1, lattice: { model: constant, conductance: { re: 5.0 } } }
"#,
        )
        .unwrap();
        let specs = branch_segments(
            &case.branches[0],
            case.lattice.as_ref(),
            &LatticeConfig::default(),
        );
        let y = |i: usize| {
            specs[i].lattice.conductance(
                1,
                tps_core::Side::Left,
                1,
                tps_core::Side::Right,
                Millimeters(10),
            )
        };
        assert_eq!(y(0), Complex64::new(2.0, 0.0));
        assert_eq!(y(1), Complex64::new(5.0, 0.0));
    }
}
