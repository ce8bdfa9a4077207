//! Sliced tiles and classified grid records.

use serde::{Deserialize, Serialize};

use super::{GridCoord, PixelBuffer, TileType};
use crate::hash::content_hash;

/// A rectangular region of the source image with its own pixel buffer.
///
/// Tiles are produced once by the slicer and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    coord: GridCoord,
    origin: (u32, u32),
    pixels: PixelBuffer,
}

impl Tile {
    pub fn new(coord: GridCoord, origin: (u32, u32), pixels: PixelBuffer) -> Self {
        Self {
            coord,
            origin,
            pixels,
        }
    }

    /// Position in the logical grid.
    pub fn coord(&self) -> GridCoord {
        self.coord
    }

    /// Top-left pixel position in the source image.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelBuffer {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// SHA-256 of the tile's raw bytes, as lowercase hex.
    pub fn content_hash(&self) -> String {
        content_hash(&self.pixels)
    }
}

/// A classified tile record stored in a `TileGrid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    pub tile_type: TileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl MapTile {
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            metadata: None,
        }
    }

    /// Attach free-form metadata, replacing any existing value.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl Default for MapTile {
    fn default() -> Self {
        Self::new(TileType::unknown())
    }
}
