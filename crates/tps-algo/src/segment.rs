//! Supply-network segments and the cursor index over them.
//!
//! A branch's contact network is described as an ordered list of right
//! boundaries. Each boundary closes a segment over which the set of energised
//! tracks and the impedance model are constant. The first segment is open to
//! the left.

use std::collections::BTreeSet;
use std::sync::Arc;

use tps_core::{ConductanceModel, Millimeters, TpsError, TpsResult};

/// One entry of a branch's supply description.
#[derive(Debug, Clone)]
pub struct SegmentSpec {
    /// Right boundary of the segment
    pub x_right: Millimeters,
    /// Tracks `1..=track_count` are active in the segment
    pub track_count: u32,
    pub lattice: Arc<dyn ConductanceModel>,
}

impl SegmentSpec {
    pub fn new(x_right: Millimeters, track_count: u32, lattice: Arc<dyn ConductanceModel>) -> Self {
        Self {
            x_right,
            track_count,
            lattice,
        }
    }
}

/// `[x_left, x_right)` with its active tracks and impedance model.
#[derive(Debug, Clone)]
pub struct SegmentLink {
    pub x_left: Millimeters,
    pub x_right: Millimeters,
    pub active_tracks: BTreeSet<u32>,
    pub lattice: Arc<dyn ConductanceModel>,
}

impl SegmentLink {
    pub fn is_active(&self, track: u32) -> bool {
        self.active_tracks.contains(&track)
    }

    pub fn contains(&self, x: Millimeters) -> bool {
        self.x_left <= x && x < self.x_right
    }
}

/// Sorted, contiguous segment links plus a cursor for sequential scans.
///
/// Lookups are cheapest when made in non-decreasing coordinate order: the
/// cursor then only ever moves right. Out-of-order lookups still resolve
/// correctly by walking the cursor back.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    links: Vec<SegmentLink>,
    cursor: usize,
    moves: usize,
}

impl SegmentIndex {
    /// Build the index from right boundaries in strictly increasing order.
    pub fn from_specs(specs: Vec<SegmentSpec>) -> TpsResult<Self> {
        if specs.is_empty() {
            return Err(TpsError::Network(
                "supply description has no segments".to_string(),
            ));
        }
        let mut links = Vec::with_capacity(specs.len());
        let mut x_left = Millimeters::MIN;
        for spec in specs {
            if spec.x_right <= x_left {
                return Err(TpsError::Network(format!(
                    "segment boundaries must be strictly increasing: {} follows {}",
                    spec.x_right, x_left
                )));
            }
            links.push(SegmentLink {
                x_left,
                x_right: spec.x_right,
                active_tracks: (1..=spec.track_count).collect(),
                lattice: spec.lattice,
            });
            x_left = spec.x_right;
        }
        Ok(Self {
            links,
            cursor: 0,
            moves: 0,
        })
    }

    /// The link covering `x`.
    ///
    /// A coordinate equal to the cursor link's right bound belongs to the next
    /// link, except past the last link, which is closed on the right.
    pub fn find_segment(&mut self, x: Millimeters) -> TpsResult<&SegmentLink> {
        let last = self.links.len() - 1;
        let limit = self.links[last].x_right;
        if x > limit {
            return Err(TpsError::OutOfRange { x, limit });
        }
        loop {
            let link = &self.links[self.cursor];
            if x == link.x_right {
                if self.cursor < last {
                    self.cursor += 1;
                    self.moves += 1;
                }
                return Ok(&self.links[self.cursor]);
            }
            if x < link.x_left {
                self.cursor -= 1;
                self.moves += 1;
            } else if x > link.x_right {
                self.cursor += 1;
                self.moves += 1;
            } else {
                return Ok(&self.links[self.cursor]);
            }
        }
    }

    /// Link currently under the cursor
    pub fn current(&self) -> &SegmentLink {
        &self.links[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// How many single steps the cursor has taken since construction or reset
    pub fn cursor_moves(&self) -> usize {
        self.moves
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
        self.moves = 0;
    }

    pub fn links(&self) -> &[SegmentLink] {
        &self.links
    }

    pub fn first(&self) -> &SegmentLink {
        &self.links[0]
    }

    pub fn last(&self) -> &SegmentLink {
        &self.links[self.links.len() - 1]
    }

    /// Every track active in at least one segment
    pub fn all_tracks(&self) -> BTreeSet<u32> {
        self.links
            .iter()
            .flat_map(|link| link.active_tracks.iter().copied())
            .collect()
    }
}

impl std::fmt::Display for SegmentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bounds: Vec<String> = self
            .links
            .iter()
            .map(|link| link.x_right.value().to_string())
            .collect();
        write!(f, "{}", bounds.join("_"))
    }
}
