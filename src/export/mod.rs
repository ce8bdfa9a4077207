//! Unique-tile export.
//!
//! Writes one PNG per representative, numbered in discovery order, and a
//! `tiles.json` index that maps every grid coordinate back to its file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dedup::UniqueTiles;
use crate::error::{Result, TileError};
use crate::types::{GridCoord, PixelBuffer};

/// Index filename written next to the tile images.
pub const INDEX_FILENAME: &str = "tiles.json";

/// One exported representative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedTile {
    /// Position in discovery order; also the file stem.
    pub id: usize,
    /// Grid key of the representative.
    pub key: GridCoord,
    pub file: String,
    /// SHA-256 of the representative's pixels.
    pub hash: String,
    /// Every coordinate assigned to this tile, row-major.
    pub members: Vec<GridCoord>,
}

/// Contents of `tiles.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportIndex {
    pub tile_width: u32,
    pub tile_height: u32,
    pub unique: Vec<ExportedTile>,
    /// Grid key to the id of its unique tile.
    pub assignment: BTreeMap<GridCoord, usize>,
}

/// Write a pixel buffer as a PNG file.
pub fn write_png(pixels: &PixelBuffer, path: &Path) -> Result<()> {
    pixels.to_image().save(path).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write PNG: {}", e),
    })
}

/// Export every unique tile to `dir` as `<id>.png` plus `tiles.json`.
///
/// `tile_size` is the nominal tile size recorded in the index; edge tiles
/// keep their clipped size in the PNGs.
pub fn export_unique_tiles(
    unique: &UniqueTiles,
    tile_size: (u32, u32),
    dir: &Path,
) -> Result<ExportIndex> {
    fs::create_dir_all(dir).map_err(|e| TileError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create output directory: {}", e),
    })?;

    let mut ids: BTreeMap<GridCoord, usize> = BTreeMap::new();
    let mut exported = Vec::with_capacity(unique.len());

    for (id, class) in unique.classes().into_iter().enumerate() {
        let rep = class.representative;
        let file = format!("{}.png", id);
        write_png(rep.pixels(), &dir.join(&file))?;

        ids.insert(rep.coord(), id);
        exported.push(ExportedTile {
            id,
            key: rep.coord(),
            file,
            hash: rep.content_hash(),
            members: class.members,
        });
    }

    let assignment = unique
        .assignment()
        .iter()
        .filter_map(|(coord, rep)| ids.get(rep).map(|&id| (*coord, id)))
        .collect();

    let index = ExportIndex {
        tile_width: tile_size.0,
        tile_height: tile_size.1,
        unique: exported,
        assignment,
    };
    write_index(&index, &dir.join(INDEX_FILENAME))?;

    debug!(dir = %dir.display(), tiles = index.unique.len(), "exported unique tiles");
    Ok(index)
}

fn write_index(index: &ExportIndex, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(index).map_err(|e| TileError::Parse {
        message: format!("Failed to serialize tile index: {}", e),
        help: None,
    })?;
    fs::write(path, json).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to write tile index: {}", e),
    })
}

/// Read a `tiles.json` index back.
pub fn read_index(path: &Path) -> Result<ExportIndex> {
    let content = fs::read_to_string(path).map_err(|e| TileError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to read tile index: {}", e),
    })?;
    serde_json::from_str(&content).map_err(|e| TileError::Parse {
        message: format!("Invalid tile index: {}", e),
        help: Some(format!("Re-run the export to regenerate {}", INDEX_FILENAME)),
    })
}
