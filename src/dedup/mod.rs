//! Duplicate tile detection.
//!
//! Groups tiles into equivalence classes of visually identical tiles using a
//! single greedy pass:
//!
//! 1. Tiles are visited in row-major grid order.
//! 2. Each tile is compared against the representatives found so far, in the
//!    order they were found. The first representative it matches wins, even
//!    if a later one would be a closer match.
//! 3. A tile that matches nothing becomes a new representative.
//!
//! Matching is per channel within a tolerance, which is not transitive:
//! A~B and B~C does not imply A~C. The visiting order therefore decides which
//! class a borderline tile joins, and the pass is kept strictly sequential so
//! that the outcome is reproducible.
//!
//! Cost is O(tiles x representatives x pixels). That is fine for map images
//! whose distinct tile count stays small; maps with thousands of distinct
//! tiles will get slow, and any indexing shortcut must keep the
//! first-registered-wins rule or the grouping changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{GridCoord, PixelBuffer, Tile};

/// Default per-channel tolerance (out of 255).
pub const DEFAULT_TOLERANCE: u8 = 5;

/// Returns true if both buffers have the same size and every channel of every
/// pixel differs by at most `tolerance`.
pub fn tiles_match(a: &PixelBuffer, b: &PixelBuffer, tolerance: u8) -> bool {
    if a.width() != b.width() || a.height() != b.height() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .all(|(x, y)| x.abs_diff(*y) <= tolerance)
}

/// A representative tile and every coordinate assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceClass<'a> {
    pub representative: &'a Tile,
    /// Member coordinates in row-major order, representative included.
    pub members: Vec<GridCoord>,
}

/// Result of a duplicate search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueTiles {
    tolerance: u8,
    representatives: Vec<Tile>,
    assignment: BTreeMap<GridCoord, GridCoord>,
}

impl UniqueTiles {
    /// Representatives in the order they were discovered.
    pub fn representatives(&self) -> &[Tile] {
        &self.representatives
    }

    /// Original coordinate to representative coordinate.
    pub fn assignment(&self) -> &BTreeMap<GridCoord, GridCoord> {
        &self.assignment
    }

    pub fn tolerance(&self) -> u8 {
        self.tolerance
    }

    /// Number of unique tiles.
    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// Number of original tiles covered.
    pub fn tile_count(&self) -> usize {
        self.assignment.len()
    }

    /// The representative a coordinate was assigned to.
    pub fn representative_of(&self, coord: GridCoord) -> Option<&Tile> {
        let rep = self.assignment.get(&coord)?;
        self.representatives.iter().find(|t| t.coord() == *rep)
    }

    /// Equivalence classes in representative discovery order.
    pub fn classes(&self) -> Vec<EquivalenceClass<'_>> {
        let mut members: BTreeMap<GridCoord, Vec<GridCoord>> = BTreeMap::new();
        for (original, rep) in &self.assignment {
            members.entry(*rep).or_default().push(*original);
        }

        self.representatives
            .iter()
            .map(|rep| EquivalenceClass {
                representative: rep,
                members: members.remove(&rep.coord()).unwrap_or_default(),
            })
            .collect()
    }
}

/// Partition tiles into equivalence classes.
///
/// Input is re-ordered by grid coordinate first, so callers that gathered
/// tiles out of order still get the row-major grouping. Coordinates are
/// expected to be distinct; a repeated coordinate keeps only the tile that
/// came first in `tiles`.
pub fn find_unique(mut tiles: Vec<Tile>, tolerance: u8) -> UniqueTiles {
    tiles.sort_by_key(Tile::coord);

    let mut representatives: Vec<Tile> = Vec::new();
    let mut assignment = BTreeMap::new();

    for tile in tiles {
        let coord = tile.coord();
        if assignment.contains_key(&coord) {
            warn!(%coord, "ignoring repeated tile coordinate");
            continue;
        }
        let matched = representatives
            .iter()
            .find(|rep| tiles_match(rep.pixels(), tile.pixels(), tolerance))
            .map(Tile::coord);

        match matched {
            Some(rep) => {
                assignment.insert(coord, rep);
            }
            None => {
                assignment.insert(coord, coord);
                representatives.push(tile);
            }
        }
    }

    debug!(
        tiles = assignment.len(),
        unique = representatives.len(),
        tolerance,
        "found unique tiles"
    );

    UniqueTiles {
        tolerance,
        representatives,
        assignment,
    }
}
