//! Core domain types for tilex.
//!
//! This module contains the values passed between pipeline stages:
//! - `PixelBuffer` - owned RGBA8 pixels
//! - `GridCoord` - a grid cell and its `"col,row"` key
//! - `Tile` - a sliced region of the source image
//! - `TileType` / `MapTile` - semantic classification records
//! - `Rgb` - exact colour keys for centre-pixel rules

mod colour;
mod coord;
mod pixels;
mod tile;
mod tile_type;

pub use colour::Rgb;
pub use coord::GridCoord;
pub use pixels::{PixelBuffer, BYTES_PER_PIXEL};
pub use tile::{MapTile, Tile};
pub use tile_type::{TileCategory, TileType};
