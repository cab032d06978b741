//! Partitions: the stretch between two consecutive cross-sections of a branch.
//!
//! A partition owns an arena of [`Cell`]s linked into a chain from its left
//! section to its right section. Loads are placed by pulling cell boundaries
//! onto load coordinates, which only moves nodes and recomputes conductances;
//! the mesh topology is built once per capacity.
//!
//! # Pull propagation
//!
//! Pulling a cell's right boundary to `x` moves its right section and asks the
//! next cell to follow with its left boundary. When `x` passes the cell's other
//! boundary the cell collapses to zero length and the pull continues in the
//! opposite direction too. Pulls are processed from a work queue instead of by
//! recursion, so long chains cannot exhaust the stack.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tps_core::{
    CircuitEdge, CircuitGraph, ConductanceModel, Diagnostics, EdgeIndex, Millimeters, NodeIndex,
    TpsError, TpsResult,
};
use tracing::{debug, trace};

use crate::cell::{Cell, CellId};
use crate::load::LoadPoint;
use crate::section::Section;
use crate::segment::SegmentLink;

#[derive(Debug, Clone, Copy)]
enum Pull {
    Right(CellId, Millimeters),
    Left(CellId, Millimeters),
}

#[derive(Debug, Clone)]
pub struct Partition {
    x_left: Millimeters,
    x_right: Millimeters,
    left: Section,
    right: Section,
    active_tracks: BTreeSet<u32>,
    lattice: Arc<dyn ConductanceModel>,
    capacity: usize,
    cells: Vec<Cell>,
    loads: Vec<LoadPoint>,
    load_edges: Vec<EdgeIndex>,
}

impl Partition {
    /// A partition with capacity one and no cells yet.
    pub fn new(
        x_left: Millimeters,
        x_right: Millimeters,
        left: Section,
        right: Section,
        segment: &SegmentLink,
    ) -> Self {
        Self {
            x_left,
            x_right,
            left,
            right,
            active_tracks: segment.active_tracks.clone(),
            lattice: Arc::clone(&segment.lattice),
            capacity: 1,
            cells: Vec::new(),
            loads: Vec::new(),
            load_edges: Vec::new(),
        }
    }

    pub fn x_left(&self) -> Millimeters {
        self.x_left
    }

    pub fn x_right(&self) -> Millimeters {
        self.x_right
    }

    pub fn left(&self) -> &Section {
        &self.left
    }

    pub fn right(&self) -> &Section {
        &self.right
    }

    pub fn active_tracks(&self) -> &BTreeSet<u32> {
        &self.active_tracks
    }

    pub fn is_active(&self, track: u32) -> bool {
        self.active_tracks.contains(&track)
    }

    /// Whether `x` lies in the closed interval `[x_left, x_right]`
    pub fn covers(&self, x: Millimeters) -> bool {
        self.x_left <= x && x <= self.x_right
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_initialized(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    pub fn first_cell(&self) -> Option<CellId> {
        (!self.cells.is_empty()).then_some(CellId(0))
    }

    pub fn last_cell(&self) -> Option<CellId> {
        self.cells.len().checked_sub(1).map(CellId)
    }

    /// Cells in chain order, left to right.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        std::iter::successors(self.first_cell().map(|id| &self.cells[id.0]), move |cell| {
            cell.next().map(|id| &self.cells[id.0])
        })
    }

    pub fn loads(&self) -> &[LoadPoint] {
        &self.loads
    }

    /// Edges from load connection nodes to ground, in placement order
    pub fn load_edges(&self) -> &[EdgeIndex] {
        &self.load_edges
    }

    /// Mesh edges plus load edges
    pub fn edge_count(&self) -> usize {
        self.cells.iter().map(Cell::edge_count).sum::<usize>() + self.load_edges.len()
    }

    /// Grow capacity to one more than the number of distinct coordinates that
    /// fall strictly inside the partition. Capacity never shrinks.
    ///
    /// Returns `true` if the capacity grew.
    pub fn ensure_capacity<I>(&mut self, coordinates: I) -> bool
    where
        I: IntoIterator<Item = Millimeters>,
    {
        let interior: BTreeSet<Millimeters> = coordinates
            .into_iter()
            .filter(|&x| self.x_left < x && x < self.x_right)
            .collect();
        let needed = interior.len() + 1;
        if needed > self.capacity {
            debug!(
                x_left = %self.x_left,
                x_right = %self.x_right,
                from = self.capacity,
                to = needed,
                "growing partition capacity"
            );
            self.capacity = needed;
            true
        } else {
            false
        }
    }

    /// Build `capacity` cells.
    ///
    /// The first cell spans the whole partition; every further cell sits
    /// collapsed at the right boundary, ready to be pulled open by a load.
    /// Each cell but the last gets a fresh copy of the right section, so no
    /// two cells share an interior node unless they are neighbours.
    ///
    /// Calling this again tears down the existing chain first: interior nodes,
    /// mesh edges and load edges are removed. Pending loads are kept.
    pub fn init_cells(&mut self, graph: &mut CircuitGraph) {
        if self.is_initialized() {
            self.teardown(graph);
        }

        let lattice = Arc::clone(&self.lattice);
        let count = self.capacity.max(1);
        let mut left = self.left.clone();
        let mut x_left = self.x_left;
        for i in 0..count {
            let right = if i + 1 == count {
                self.right.clone()
            } else {
                self.right.deep_copy(graph)
            };
            let mut cell = Cell::mesh(
                graph,
                x_left,
                self.x_right,
                left,
                right.clone(),
                lattice.as_ref(),
            );
            cell.prev = i.checked_sub(1).map(CellId);
            cell.next = (i + 1 < count).then_some(CellId(i + 1));
            self.cells.push(cell);
            left = right;
            x_left = self.x_right;
        }

        debug!(
            x_left = %self.x_left,
            x_right = %self.x_right,
            cells = count,
            edges = self.edge_count(),
            "initialized cell chain"
        );
    }

    /// Remove every cell, the interior nodes between them and the load edges.
    fn teardown(&mut self, graph: &mut CircuitGraph) {
        self.remove_load_edges(graph);

        let boundary: BTreeSet<NodeIndex> = self.left.nodes().chain(self.right.nodes()).collect();
        let mut interior = BTreeSet::new();
        for cell in &mut self.cells {
            cell.unmesh(graph);
            interior.extend(
                cell.left()
                    .nodes()
                    .chain(cell.right().nodes())
                    .filter(|node| !boundary.contains(node)),
            );
        }
        for node in interior {
            graph.remove_node(node);
        }
        trace!(
            x_left = %self.x_left,
            x_right = %self.x_right,
            cells = self.cells.len(),
            "tore down cell chain"
        );
        self.cells.clear();
    }

    fn remove_load_edges(&mut self, graph: &mut CircuitGraph) {
        for edge in self.load_edges.drain(..) {
            graph.remove_edge(edge);
        }
    }

    pub(crate) fn uninitialized(&self) -> TpsError {
        TpsError::UninitializedChain {
            x_left: self.x_left,
            x_right: self.x_right,
        }
    }

    fn check_pull(&self, cell: CellId, x: Millimeters) -> TpsResult<()> {
        if !self.is_initialized() {
            return Err(self.uninitialized());
        }
        if cell.0 >= self.cells.len() {
            return Err(TpsError::Validation(format!(
                "partition [{}, {}] has no cell {}",
                self.x_left, self.x_right, cell.0
            )));
        }
        if x < self.x_left {
            return Err(TpsError::OutOfRange {
                x,
                limit: self.x_left,
            });
        }
        if x > self.x_right {
            return Err(TpsError::OutOfRange {
                x,
                limit: self.x_right,
            });
        }
        Ok(())
    }

    /// Move `cell`'s right boundary to `x` and let the chain follow.
    ///
    /// The right boundary of the last cell is the partition's right section
    /// and cannot be moved.
    pub fn pull_right(
        &mut self,
        graph: &mut CircuitGraph,
        cell: CellId,
        x: Millimeters,
    ) -> TpsResult<()> {
        self.check_pull(cell, x)?;
        if Some(cell) == self.last_cell() && x != self.x_right {
            return Err(TpsError::Validation(
                "the last cell's right boundary is fixed".to_string(),
            ));
        }
        self.propagate(graph, Pull::Right(cell, x));
        Ok(())
    }

    /// Move `cell`'s left boundary to `x` and let the chain follow.
    ///
    /// The left boundary of the first cell is the partition's left section
    /// and cannot be moved.
    pub fn pull_left(
        &mut self,
        graph: &mut CircuitGraph,
        cell: CellId,
        x: Millimeters,
    ) -> TpsResult<()> {
        self.check_pull(cell, x)?;
        if Some(cell) == self.first_cell() && x != self.x_left {
            return Err(TpsError::Validation(
                "the first cell's left boundary is fixed".to_string(),
            ));
        }
        self.propagate(graph, Pull::Left(cell, x));
        Ok(())
    }

    fn propagate(&mut self, graph: &mut CircuitGraph, start: Pull) {
        let lattice = Arc::clone(&self.lattice);
        let mut pending = VecDeque::from([start]);
        while let Some(pull) = pending.pop_front() {
            match pull {
                Pull::Right(id, x) => {
                    let cell = &mut self.cells[id.0];
                    if cell.x_right() == x {
                        continue;
                    }
                    trace!(cell = id.0, from = %cell.x_right(), to = %x, "pull right");
                    cell.set_right(graph, x);
                    if x < cell.x_left() {
                        cell.set_left(graph, x);
                        if let Some(prev) = cell.prev() {
                            pending.push_back(Pull::Right(prev, x));
                        }
                    }
                    cell.refresh(graph, lattice.as_ref());
                    if let Some(next) = cell.next() {
                        pending.push_back(Pull::Left(next, x));
                    }
                }
                Pull::Left(id, x) => {
                    let cell = &mut self.cells[id.0];
                    if cell.x_left() == x {
                        continue;
                    }
                    trace!(cell = id.0, from = %cell.x_left(), to = %x, "pull left");
                    cell.set_left(graph, x);
                    if x > cell.x_right() {
                        cell.set_right(graph, x);
                        if let Some(next) = cell.next() {
                            pending.push_back(Pull::Left(next, x));
                        }
                    }
                    cell.refresh(graph, lattice.as_ref());
                    if let Some(prev) = cell.prev() {
                        pending.push_back(Pull::Right(prev, x));
                    }
                }
            }
        }
    }

    /// Queue a load for placement. Returns `false` when `x` lies outside the
    /// partition.
    pub fn add_load(&mut self, load: LoadPoint) -> TpsResult<bool> {
        if !self.is_initialized() {
            return Err(self.uninitialized());
        }
        if !self.covers(load.x) {
            return Ok(false);
        }
        self.loads.push(load);
        Ok(true)
    }

    /// Queue several loads; returns how many were accepted.
    pub fn add_loads<I>(&mut self, loads: I) -> TpsResult<usize>
    where
        I: IntoIterator<Item = LoadPoint>,
    {
        let mut accepted = 0;
        for load in loads {
            if self.add_load(load)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Drop all loads and their edges. Cell positions are left as they are.
    pub fn clear_loads(&mut self, graph: &mut CircuitGraph) {
        self.remove_load_edges(graph);
        self.loads.clear();
    }

    /// Place every queued load on the cell chain.
    ///
    /// Edges of an earlier arrangement are removed first and the chain is
    /// reset so every cell but the first sits at the right boundary. Loads are
    /// then visited in coordinate order: each one strictly inside a cell
    /// splits it by pulling the cell's right boundary onto the load. A load
    /// gets a dedicated edge to ground from the node at its exact coordinate
    /// and track. Loads sharing a coordinate and track share that node.
    ///
    /// If the queued loads need more cells than the chain has, the chain is
    /// rebuilt at the larger capacity first.
    pub fn arrange_loads(&mut self, graph: &mut CircuitGraph) -> TpsResult<()> {
        if !self.is_initialized() {
            return Err(self.uninitialized());
        }
        let coordinates: Vec<Millimeters> = self.loads.iter().map(|load| load.x).collect();
        if self.ensure_capacity(coordinates) && self.capacity > self.cells.len() {
            self.init_cells(graph);
        } else {
            self.remove_load_edges(graph);
        }

        self.loads.sort_by_key(|load| load.x);
        self.propagate(graph, Pull::Right(CellId(0), self.x_right));

        let ground = graph.ground();
        let loads = self.loads.clone();
        let mut cursor = CellId(0);
        for load in &loads {
            let node = self.connection_node(graph, &mut cursor, load)?;
            let edge = graph.add_edge(node, ground, CircuitEdge::new(load.admittance));
            trace!(x = %load.x, track = load.track, node = node.index(), "placed load");
            self.load_edges.push(edge);
        }

        debug!(
            x_left = %self.x_left,
            x_right = %self.x_right,
            loads = loads.len(),
            "arranged loads"
        );
        Ok(())
    }

    /// Walk the chain from `cursor` to the node a load connects to, splitting
    /// the containing cell if the load is strictly inside it.
    fn connection_node(
        &mut self,
        graph: &mut CircuitGraph,
        cursor: &mut CellId,
        load: &LoadPoint,
    ) -> TpsResult<NodeIndex> {
        let missing = || TpsError::AmbiguousConnectionPoint {
            x: load.x,
            track: load.track,
        };
        loop {
            let cell = &self.cells[cursor.0];
            let (x_left, x_right, next) = (cell.x_left(), cell.x_right(), cell.next());

            if load.x == x_left || load.x == x_right {
                return cell.find_node(load.x, load.track).ok_or_else(missing);
            }
            if x_left < load.x && load.x < x_right {
                if next.is_none() {
                    return Err(TpsError::OutOfRange {
                        x: load.x,
                        limit: x_left,
                    });
                }
                self.propagate(graph, Pull::Right(*cursor, load.x));
                return self.cells[cursor.0]
                    .find_node(load.x, load.track)
                    .ok_or_else(missing);
            }
            if load.x < x_left {
                return Err(TpsError::OutOfRange {
                    x: load.x,
                    limit: self.x_left,
                });
            }
            match next {
                Some(id) => *cursor = id,
                None => {
                    return Err(TpsError::OutOfRange {
                        x: load.x,
                        limit: self.x_right,
                    })
                }
            }
        }
    }

    /// Check chain contiguity and node placement.
    pub fn validate_into(&self, graph: &CircuitGraph, diag: &mut Diagnostics) {
        let entity = format!("partition [{}, {}]", self.x_left, self.x_right);
        if !self.is_initialized() {
            diag.add_warning_with_entity("chain", "cell chain is not initialized", &entity);
            return;
        }
        if self.loads.len() != self.load_edges.len() {
            diag.add_warning_with_entity(
                "loads",
                &format!(
                    "{} pending loads not placed ({} connected)",
                    self.loads.len(),
                    self.load_edges.len()
                ),
                &entity,
            );
        }
        if self.cells.len() != self.capacity {
            diag.add_error_with_entity(
                "chain",
                &format!(
                    "chain has {} cells but capacity is {}",
                    self.cells.len(),
                    self.capacity
                ),
                &entity,
            );
        }

        let mut cells = self.cells();
        let Some(first) = cells.next() else {
            return;
        };
        if first.x_left() != self.x_left || first.left() != &self.left {
            diag.add_error_with_entity(
                "chain",
                "first cell does not start at the partition's left section",
                &entity,
            );
        }

        let mut visited = 1;
        let mut prev = first;
        self.check_cell(graph, prev, &entity, diag);
        for cell in cells {
            visited += 1;
            if prev.x_right() != cell.x_left() || prev.right() != cell.left() {
                diag.add_error_at(
                    "chain",
                    &format!("{entity}: adjacent cells do not share a boundary"),
                    cell.x_left(),
                );
            }
            self.check_cell(graph, cell, &entity, diag);
            prev = cell;
        }

        if prev.x_right() != self.x_right || prev.right() != &self.right {
            diag.add_error_with_entity(
                "chain",
                "last cell does not end at the partition's right section",
                &entity,
            );
        }
        if visited != self.cells.len() {
            diag.add_error_with_entity(
                "chain",
                &format!("chain reaches {visited} of {} cells", self.cells.len()),
                &entity,
            );
        }
    }

    fn check_cell(&self, graph: &CircuitGraph, cell: &Cell, entity: &str, diag: &mut Diagnostics) {
        if cell.x_left() > cell.x_right() {
            diag.add_error_at(
                "chain",
                &format!("{entity}: cell has negative length"),
                cell.x_left(),
            );
        }
        let misplaced = cell
            .left()
            .nodes()
            .map(|node| (node, cell.x_left()))
            .chain(cell.right().nodes().map(|node| (node, cell.x_right())))
            .filter(|&(node, x)| graph.node(node).map(|n| n.x) != Some(x))
            .count();
        if misplaced > 0 {
            diag.add_error_at(
                "chain",
                &format!("{entity}: {misplaced} section nodes are off their cell boundary"),
                cell.x_left(),
            );
        }
    }
}
