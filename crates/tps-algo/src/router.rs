//! Per-branch orchestration: raw points to partitions to cells to loads.
//!
//! The router takes a [`CircuitGraph`] holding the raw input points of every
//! branch (component terminals, insulation breaks) and the supply description
//! of each branch. For every branch it scans the points left to right,
//! cutting the branch into [`Partition`]s at every point and segment boundary
//! so that each cross-section is flat: all active tracks share one coordinate.
//! Tracks without a point at a cut get a synthesized node there.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tps_core::{
    validate_graph, CircuitGraph, CircuitNode, DiagnosticIssue, Diagnostics, LineId, Millimeters,
    NodeIndex, Severity, TpsError, TpsResult,
};
use tracing::{debug, info, warn};

use crate::load::LoadPoint;
use crate::partition::Partition;
use crate::section::Section;
use crate::segment::{SegmentIndex, SegmentSpec};

/// Partitions of one branch with the segment index they were cut from.
#[derive(Debug, Clone)]
pub struct BranchLayout {
    branch: u32,
    index: SegmentIndex,
    partitions: Vec<Partition>,
    x_left: Millimeters,
    x_right: Millimeters,
}

impl BranchLayout {
    pub fn branch(&self) -> u32 {
        self.branch
    }

    pub fn segments(&self) -> &SegmentIndex {
        &self.index
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Leftmost input point of the branch
    pub fn x_left(&self) -> Millimeters {
        self.x_left
    }

    /// Rightmost input point of the branch
    pub fn x_right(&self) -> Millimeters {
        self.x_right
    }

    /// First partition covering `x` with `track` active.
    pub fn partition_for(&self, x: Millimeters, track: u32) -> Option<usize> {
        let start = self.partitions.partition_point(|p| p.x_right() < x);
        self.partitions[start..]
            .iter()
            .take_while(|p| p.x_left() <= x)
            .position(|p| p.is_active(track))
            .map(|offset| start + offset)
    }
}

/// Builds the equivalent circuit of every branch into one graph.
///
/// ```
/// use std::sync::Arc;
/// use num_complex::Complex64;
/// use tps_algo::test_utils::{add_points, segments};
/// use tps_algo::{LoadPoint, Router};
/// use tps_core::{CircuitGraph, ConstantLattice, Millimeters};
///
/// let mut graph = CircuitGraph::new();
/// add_points(&mut graph, 0, 1, &[0, 1_000]);
///
/// let mut router = Router::new(graph);
/// router.add_network(0, segments(&[(1_000, 1)], Arc::new(ConstantLattice::new(1.0, 0.0))));
/// router.wire().unwrap();
/// router
///     .add_loads(0, vec![LoadPoint::new(Millimeters(400), 1, Complex64::new(0.1, 0.0))])
///     .unwrap();
///
/// assert_eq!(router.branch(0).unwrap().partitions().len(), 1);
/// ```
#[derive(Debug)]
pub struct Router {
    graph: CircuitGraph,
    networks: BTreeMap<u32, Vec<SegmentSpec>>,
    inputs: BTreeMap<u32, BTreeMap<u32, Vec<NodeIndex>>>,
    branches: BTreeMap<u32, BranchLayout>,
    diagnostics: Diagnostics,
}

impl Router {
    /// Take ownership of a graph of raw input points.
    ///
    /// The input points are recorded now; nodes added later by the build
    /// itself are never scanned.
    pub fn new(graph: CircuitGraph) -> Self {
        let mut inputs: BTreeMap<u32, BTreeMap<u32, Vec<NodeIndex>>> = BTreeMap::new();
        for (index, node) in graph.nodes() {
            if node.is_ground() {
                continue;
            }
            inputs
                .entry(node.branch())
                .or_default()
                .entry(node.track())
                .or_default()
                .push(index);
        }
        Self {
            graph,
            networks: BTreeMap::new(),
            inputs,
            branches: BTreeMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Supply description of a branch, ordered by right boundary.
    pub fn add_network(&mut self, branch: u32, segments: Vec<SegmentSpec>) {
        self.networks.insert(branch, segments);
    }

    pub fn with_network(mut self, branch: u32, segments: Vec<SegmentSpec>) -> Self {
        self.add_network(branch, segments);
        self
    }

    /// Branches that have input points
    pub fn input_branches(&self) -> impl Iterator<Item = u32> + '_ {
        self.inputs.keys().copied()
    }

    pub fn branch(&self, branch: u32) -> Option<&BranchLayout> {
        self.branches.get(&branch)
    }

    pub fn branches(&self) -> impl Iterator<Item = &BranchLayout> {
        self.branches.values()
    }

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    pub fn into_graph(self) -> CircuitGraph {
        self.graph
    }

    /// Issues found while scanning input points
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Build partitions and cell chains for every branch not built yet.
    pub fn wire(&mut self) -> TpsResult<()> {
        let pending: Vec<u32> = self
            .inputs
            .keys()
            .copied()
            .filter(|branch| !self.branches.contains_key(branch))
            .collect();
        for branch in pending {
            self.build_partitions(branch)?;
            self.init_cells(branch)?;
        }
        for branch in self.networks.keys() {
            if !self.inputs.contains_key(branch) {
                warn!(branch, "supply network has no input points");
                self.diagnostics.add_warning_with_entity(
                    "scan",
                    "supply network has no input points",
                    &format!("branch {branch}"),
                );
            }
        }
        info!(
            branches = self.branches.len(),
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "wired circuit"
        );
        Ok(())
    }

    /// Scan a branch's input points into partitions. Cells are not built.
    pub fn build_partitions(&mut self, branch: u32) -> TpsResult<usize> {
        if self.branches.contains_key(&branch) {
            return Err(TpsError::Validation(format!(
                "branch {branch} is already partitioned"
            )));
        }
        let specs = self.networks.get(&branch).cloned().ok_or_else(|| {
            TpsError::Network(format!("branch {branch} has no supply description"))
        })?;
        let mut index = SegmentIndex::from_specs(specs)?;
        let tracks = self.inputs.get(&branch).cloned().unwrap_or_default();

        let scan = BranchScan::new(&self.graph, branch, &tracks);
        let (x_left, x_right) = scan.bounds().unwrap_or((Millimeters::ZERO, Millimeters::ZERO));
        let partitions = scan.run(&mut self.graph, &mut index, &mut self.diagnostics)?;
        let count = partitions.len();
        debug!(branch, partitions = count, segments = %index, "partitioned branch");

        self.branches.insert(
            branch,
            BranchLayout {
                branch,
                index,
                partitions,
                x_left,
                x_right,
            },
        );
        Ok(count)
    }

    /// Build the cell chain of every partition of a branch.
    pub fn init_cells(&mut self, branch: u32) -> TpsResult<()> {
        let layout = self
            .branches
            .get_mut(&branch)
            .ok_or_else(|| TpsError::Network(format!("branch {branch} is not partitioned")))?;
        for partition in &mut layout.partitions {
            partition.init_cells(&mut self.graph);
        }
        Ok(())
    }

    /// Route loads to their partitions and place them.
    ///
    /// Each load goes to the first partition that covers its coordinate with
    /// its track active. Only the partitions that received loads are
    /// re-arranged, and only those whose capacity grew rebuild their cells.
    /// Returns the number of loads placed.
    pub fn add_loads(&mut self, branch: u32, loads: Vec<LoadPoint>) -> TpsResult<usize> {
        let layout = self
            .branches
            .get_mut(&branch)
            .ok_or_else(|| TpsError::Network(format!("branch {branch} is not wired")))?;

        // Resolve the whole batch before queueing any of it
        let mut placements = Vec::with_capacity(loads.len());
        for load in &loads {
            if load.x < layout.x_left {
                return Err(TpsError::OutOfRange {
                    x: load.x,
                    limit: layout.x_left,
                });
            }
            if load.x > layout.x_right {
                return Err(TpsError::OutOfRange {
                    x: load.x,
                    limit: layout.x_right,
                });
            }
            let position = layout.partition_for(load.x, load.track).ok_or(
                TpsError::AmbiguousConnectionPoint {
                    x: load.x,
                    track: load.track,
                },
            )?;
            if !layout.partitions[position].is_initialized() {
                return Err(layout.partitions[position].uninitialized());
            }
            placements.push((position, *load));
        }

        let mut touched = BTreeSet::new();
        for (position, load) in placements {
            layout.partitions[position].add_load(load)?;
            touched.insert(position);
        }

        for position in &touched {
            layout.partitions[*position].arrange_loads(&mut self.graph)?;
        }
        debug!(
            branch,
            loads = loads.len(),
            partitions = touched.len(),
            "placed loads"
        );
        Ok(loads.len())
    }

    /// Re-place every queued load of a branch.
    pub fn arrange_loads(&mut self, branch: u32) -> TpsResult<()> {
        let layout = self
            .branches
            .get_mut(&branch)
            .ok_or_else(|| TpsError::Network(format!("branch {branch} is not wired")))?;
        for partition in &mut layout.partitions {
            partition.arrange_loads(&mut self.graph)?;
        }
        Ok(())
    }

    /// Scan warnings plus structural checks of the graph and every cell chain.
    pub fn validate(&self) -> Diagnostics {
        let mut diag = self.diagnostics.clone();
        validate_graph(&self.graph, &mut diag);
        for layout in self.branches.values() {
            for partition in &layout.partitions {
                partition.validate_into(&self.graph, &mut diag);
            }
        }
        diag
    }
}

/// Left-to-right scan of one branch.
struct BranchScan {
    branch: u32,
    queues: BTreeMap<u32, VecDeque<NodeIndex>>,
    bounds: Option<(Millimeters, Millimeters)>,
}

impl BranchScan {
    fn new(graph: &CircuitGraph, branch: u32, tracks: &BTreeMap<u32, Vec<NodeIndex>>) -> Self {
        let x_of = |node: NodeIndex| graph.node(node).map_or(Millimeters::ZERO, |n| n.x);
        let mut queues = BTreeMap::new();
        let mut bounds: Option<(Millimeters, Millimeters)> = None;
        for (&track, nodes) in tracks {
            let mut sorted = nodes.clone();
            sorted.sort_by_key(|&node| (x_of(node), node.index()));
            for &node in &sorted {
                let x = x_of(node);
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(x), hi.max(x)),
                    None => (x, x),
                });
            }
            queues.insert(track, VecDeque::from(sorted));
        }
        Self {
            branch,
            queues,
            bounds,
        }
    }

    fn bounds(&self) -> Option<(Millimeters, Millimeters)> {
        self.bounds
    }

    fn front_x(&self, graph: &CircuitGraph, track: u32) -> Option<Millimeters> {
        self.queues
            .get(&track)
            .and_then(|queue| queue.front())
            .and_then(|&node| graph.node(node))
            .map(|node| node.x)
    }

    /// Pop the queue front of `track` if it sits exactly at `x`.
    fn pop_at(&mut self, graph: &CircuitGraph, track: u32, x: Millimeters) -> Option<NodeIndex> {
        if self.front_x(graph, track) == Some(x) {
            self.queues.get_mut(&track).and_then(VecDeque::pop_front)
        } else {
            None
        }
    }

    fn synthesize(&self, graph: &mut CircuitGraph, track: u32, x: Millimeters) -> NodeIndex {
        graph.add_node(CircuitNode::new(LineId::new(self.branch, track), x))
    }

    fn report_unwired(&self, graph: &CircuitGraph, node: NodeIndex, reason: &str, diag: &mut Diagnostics) {
        let Some(n) = graph.node(node) else {
            return;
        };
        warn!(branch = self.branch, node = %n.label(), reason, "input point is not wired");
        diag.add(
            DiagnosticIssue::new(Severity::Warning, "scan", format!("input point {reason}"))
                .with_entity(n.label())
                .with_coordinate(n.x),
        );
    }

    fn run(
        mut self,
        graph: &mut CircuitGraph,
        index: &mut SegmentIndex,
        diag: &mut Diagnostics,
    ) -> TpsResult<Vec<Partition>> {
        let Some((left_bound, right_bound)) = self.bounds else {
            return Ok(Vec::new());
        };
        let limit = index.last().x_right;
        if right_bound > limit {
            return Err(TpsError::OutOfRange {
                x: right_bound,
                limit,
            });
        }

        // track -> (node, carried over from the previous partition's right section)
        let mut left: BTreeMap<u32, (NodeIndex, bool)> = BTreeMap::new();
        let mut x = left_bound;
        let mut partitions = Vec::new();

        loop {
            let link = index.find_segment(x)?.clone();
            let active = &link.active_tracks;
            left.retain(|track, _| active.contains(track));

            for &track in active {
                while let Some(front) = self.front_x(graph, track) {
                    if front >= x {
                        break;
                    }
                    if let Some(stale) = self.queues.get_mut(&track).and_then(VecDeque::pop_front) {
                        self.report_unwired(graph, stale, "lies behind the scan position", diag);
                    }
                }
                if !left.contains_key(&track) {
                    if let Some(node) = self.pop_at(graph, track, x) {
                        left.insert(track, (node, false));
                    }
                }
            }

            let pending = active
                .iter()
                .any(|&track| self.front_x(graph, track) == Some(x));
            if x >= right_bound && !pending {
                let stranded: Vec<NodeIndex> = left
                    .values()
                    .filter(|(_, carried)| !carried)
                    .map(|&(node, _)| node)
                    .collect();
                for node in stranded {
                    self.report_unwired(
                        graph,
                        node,
                        "ends the branch with no partition to join",
                        diag,
                    );
                }
                break;
            }

            for &track in active {
                if !left.contains_key(&track) {
                    let node = self.synthesize(graph, track, x);
                    left.insert(track, (node, false));
                }
            }

            let cap = link.x_right.min(right_bound);
            let left_most = active
                .iter()
                .map(|&track| self.front_x(graph, track).map_or(cap, |front| front.min(cap)))
                .min()
                .unwrap_or(cap);

            let mut right_entries = Vec::with_capacity(active.len());
            for &track in active {
                let node = match self.pop_at(graph, track, left_most) {
                    Some(node) => node,
                    None => self.synthesize(graph, track, left_most),
                };
                right_entries.push((track, node));
            }

            let (carried, fresh): (Vec<_>, Vec<_>) =
                left.iter().partition(|(_, entry)| entry.1);
            let carried = Section::from_entries(
                carried
                    .into_iter()
                    .map(|(&track, &(node, _))| (track, node))
                    .collect(),
            )
            .split_breaks(graph);
            let mut left_entries: Vec<(u32, NodeIndex)> = carried.entries().to_vec();
            left_entries.extend(fresh.into_iter().map(|(&track, &(node, _))| (track, node)));

            let left_section = Section::from_entries(left_entries);
            let right_section = Section::from_entries(right_entries);
            debug!(
                branch = self.branch,
                x_left = %x,
                x_right = %left_most,
                tracks = active.len(),
                "emitting partition"
            );
            partitions.push(Partition::new(
                x,
                left_most,
                left_section,
                right_section.clone(),
                &link,
            ));

            left = right_section
                .entries()
                .iter()
                .map(|&(track, node)| (track, (node, true)))
                .collect();
            x = left_most;
        }

        let leftovers: Vec<NodeIndex> = self.queues.values().flatten().copied().collect();
        for node in leftovers {
            self.report_unwired(graph, node, "is on a track that is never active there", diag);
        }
        Ok(partitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{add_break, add_points, reference_lattice, segments};
    use num_complex::Complex64;
    use std::sync::Arc;
    use tps_core::{ConductanceModel, ConstantLattice};

    fn unit() -> Arc<dyn ConductanceModel> {
        Arc::new(ConstantLattice::new(1.0, 0.0))
    }

    fn bounds(router: &Router, branch: u32) -> Vec<(i64, i64)> {
        router
            .branch(branch)
            .unwrap()
            .partitions()
            .iter()
            .map(|p| (p.x_left().0, p.x_right().0))
            .collect()
    }

    #[test]
    fn test_partitions_cut_at_points_and_segment_bounds() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 300, 2_000]);
        add_points(&mut graph, 0, 2, &[0, 700, 2_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 2), (2_000, 2)], unit()));
        router.wire().unwrap();

        assert_eq!(
            bounds(&router, 0),
            vec![(0, 300), (300, 700), (700, 1_000), (1_000, 2_000)]
        );
        for p in router.branch(0).unwrap().partitions() {
            assert_eq!(p.left().len(), 2);
            assert_eq!(p.right().len(), 2);
        }
        assert!(!router.validate().has_issues(), "{}", router.validate());
    }

    #[test]
    fn test_cross_sections_are_flat() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 450, 1_000]);
        add_points(&mut graph, 0, 2, &[100, 1_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 2)], unit()));
        router.wire().unwrap();

        let graph = router.graph();
        for p in router.branch(0).unwrap().partitions() {
            assert!(p.left().nodes().all(|n| graph.node(n).unwrap().x == p.x_left()));
            assert!(p.right().nodes().all(|n| graph.node(n).unwrap().x == p.x_right()));
        }
        assert_eq!(bounds(&router, 0), vec![(0, 100), (100, 450), (450, 1_000)]);
    }

    #[test]
    fn test_track_count_change_between_segments() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 3_000]);
        add_points(&mut graph, 0, 2, &[0]);
        add_points(&mut graph, 0, 3, &[2_000, 3_000]);
        let mut router = Router::new(graph)
            .with_network(0, segments(&[(1_000, 2), (2_000, 1), (3_000, 3)], unit()));
        router.wire().unwrap();

        let layout = router.branch(0).unwrap();
        let sizes: Vec<usize> = layout.partitions().iter().map(|p| p.left().len()).collect();
        assert_eq!(sizes, vec![2, 1, 3]);
        // the queued track-3 point at 2000 is used rather than synthesized
        let last = &layout.partitions()[2];
        assert!(!router.diagnostics().has_issues(), "{}", router.diagnostics());
        assert_eq!(last.left().len(), 3);
    }

    #[test]
    fn test_inactive_track_points_are_reported() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 1_000]);
        add_points(&mut graph, 0, 2, &[500]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        router.wire().unwrap();

        assert_eq!(router.diagnostics().warning_count(), 1);
        assert_eq!(bounds(&router, 0), vec![(0, 1_000)]);
    }

    #[test]
    fn test_points_beyond_last_segment_are_out_of_range() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 5_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        assert!(matches!(
            router.wire(),
            Err(TpsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_network_is_an_error() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 3, 1, &[0, 100]);
        let mut router = Router::new(graph);
        assert!(matches!(router.wire(), Err(TpsError::Network(_))));
    }

    #[test]
    fn test_break_copies_only_on_the_far_side() {
        let mut graph = CircuitGraph::new();
        let brk = add_break(&mut graph, 0, 1, 0);
        add_points(&mut graph, 0, 1, &[1_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        router.wire().unwrap();
        // a break at the branch start has nothing on its left to separate
        let first = &router.branch(0).unwrap().partitions()[0];
        assert_eq!(first.left().node_on_track(1), Some(brk));
    }

    #[test]
    fn test_add_loads_routes_to_active_partition() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 2_000]);
        add_points(&mut graph, 0, 2, &[0, 1_000]);
        let mut router = Router::new(graph)
            .with_network(0, segments(&[(1_000, 2), (2_000, 1)], Arc::new(reference_lattice(2))));
        router.wire().unwrap();

        let y = Complex64::new(0.02, -0.01);
        router
            .add_loads(
                0,
                vec![
                    LoadPoint::new(Millimeters(1_500), 1, y),
                    LoadPoint::new(Millimeters(1_000), 2, y),
                ],
            )
            .unwrap();
        let layout = router.branch(0).unwrap();
        assert_eq!(layout.partitions()[1].loads().len(), 1);
        assert_eq!(layout.partitions()[0].loads().len(), 1);
        assert_eq!(layout.partitions()[1].capacity(), 2);
        assert_eq!(layout.partitions()[0].capacity(), 1);

        let err = router
            .add_loads(0, vec![LoadPoint::new(Millimeters(1_500), 2, y)])
            .unwrap_err();
        assert!(matches!(err, TpsError::AmbiguousConnectionPoint { track: 2, .. }));
        let err = router
            .add_loads(0, vec![LoadPoint::new(Millimeters(2_500), 1, y)])
            .unwrap_err();
        assert!(matches!(err, TpsError::OutOfRange { .. }));
    }

    #[test]
    fn test_rejected_batch_queues_nothing() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 1_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        router.wire().unwrap();
        let y = Complex64::new(0.1, 0.0);

        let err = router
            .add_loads(
                0,
                vec![
                    LoadPoint::new(Millimeters(400), 1, y),
                    LoadPoint::new(Millimeters(600), 9, y),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, TpsError::AmbiguousConnectionPoint { track: 9, .. }));
        let partition = &router.branch(0).unwrap().partitions()[0];
        assert!(partition.loads().is_empty());
        assert!(partition.load_edges().is_empty());
        assert!(!router.validate().has_issues(), "{}", router.validate());

        router
            .add_loads(0, vec![LoadPoint::new(Millimeters(800), 1, y)])
            .unwrap();
        let partition = &router.branch(0).unwrap().partitions()[0];
        assert_eq!(partition.loads().len(), 1);
        assert_eq!(partition.load_edges().len(), 1);
        assert_eq!(partition.loads()[0].x, Millimeters(800));
    }

    #[test]
    fn test_single_coordinate_branch_reports_its_points() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[500]);
        add_points(&mut graph, 0, 2, &[500]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 2)], unit()));
        router.wire().unwrap();

        assert!(router.branch(0).unwrap().partitions().is_empty());
        let diag = router.diagnostics();
        assert_eq!(diag.warning_count(), 2);
        assert!(diag.issues.iter().all(|issue| issue.category == "scan"
            && issue.at == Some(Millimeters(500))));
    }

    #[test]
    fn test_incremental_loads_only_rebuild_touched_partitions() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 1_000, 2_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(2_000, 1)], unit()));
        router.wire().unwrap();
        let y = Complex64::new(0.1, 0.0);

        router
            .add_loads(0, vec![LoadPoint::new(Millimeters(500), 1, y)])
            .unwrap();
        let untouched: Vec<_> = router.branch(0).unwrap().partitions()[1]
            .cells()
            .flat_map(|c| c.mesh_edges().iter().map(|m| m.edge))
            .collect();

        router
            .add_loads(0, vec![LoadPoint::new(Millimeters(250), 1, y)])
            .unwrap();
        let layout = router.branch(0).unwrap();
        assert_eq!(layout.partitions()[0].capacity(), 3);
        assert_eq!(layout.partitions()[0].load_edges().len(), 2);
        let after: Vec<_> = layout.partitions()[1]
            .cells()
            .flat_map(|c| c.mesh_edges().iter().map(|m| m.edge))
            .collect();
        assert_eq!(untouched, after);
        assert!(!router.validate().has_errors(), "{}", router.validate());
    }

    #[test]
    fn test_partition_for_prefers_first_covering_partition() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 500, 1_000]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        router.build_partitions(0).unwrap();
        let layout = router.branch(0).unwrap();
        assert_eq!(layout.partition_for(Millimeters(500), 1), Some(0));
        assert_eq!(layout.partition_for(Millimeters(501), 1), Some(1));
        assert_eq!(layout.partition_for(Millimeters(501), 2), None);
    }

    #[test]
    fn test_build_partitions_twice_is_rejected() {
        let mut graph = CircuitGraph::new();
        add_points(&mut graph, 0, 1, &[0, 500]);
        let mut router = Router::new(graph).with_network(0, segments(&[(1_000, 1)], unit()));
        router.build_partitions(0).unwrap();
        assert!(router.build_partitions(0).is_err());
    }
}
