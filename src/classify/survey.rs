//! Centre-colour survey.
//!
//! Finds every distinct centre-pixel colour in a tile set. Useful as a first
//! pass over a new map to see which colours need rules.

use std::collections::HashMap;

use serde::Serialize;

use crate::slicer::TileSet;
use crate::types::{GridCoord, Rgb};

/// One distinct centre colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColourSurvey {
    /// Discovery index, starting at 0.
    pub id: usize,
    /// Display name, `"Type {id + 1}"`.
    pub name: String,
    pub colour: Rgb,
    /// First tile (row-major) with this centre colour.
    pub first_seen: GridCoord,
    /// Number of tiles with this centre colour.
    pub count: usize,
}

/// Survey the centre colours of every tile, in row-major discovery order.
pub fn survey_center_colours(tiles: &TileSet) -> Vec<ColourSurvey> {
    let mut found: Vec<ColourSurvey> = Vec::new();
    let mut index: HashMap<Rgb, usize> = HashMap::new();

    for tile in tiles.iter() {
        let Some(center) = tile.pixels().center() else {
            continue;
        };
        let colour = Rgb::from_rgba(center);

        match index.get(&colour) {
            Some(&i) => found[i].count += 1,
            None => {
                let id = found.len();
                index.insert(colour, id);
                found.push(ColourSurvey {
                    id,
                    name: format!("Type {}", id + 1),
                    colour,
                    first_seen: tile.coord(),
                    count: 1,
                });
            }
        }
    }

    found
}
