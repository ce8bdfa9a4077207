//! Worker message contracts.
//!
//! Field names follow the camelCase JSON used on the wire.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dedup::find_unique;
use crate::error::{PipelineStage, Result, TileError};
use crate::slicer::{slice, validate_dimensions, TileSet};
use crate::types::{GridCoord, PixelBuffer, Tile};

/// Raw pixels of one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl From<&PixelBuffer> for WireBuffer {
    fn from(buf: &PixelBuffer) -> Self {
        Self {
            width: buf.width(),
            height: buf.height(),
            data: buf.as_bytes().to_vec(),
        }
    }
}

impl TryFrom<WireBuffer> for PixelBuffer {
    type Error = TileError;

    fn try_from(wire: WireBuffer) -> Result<Self> {
        PixelBuffer::new(wire.width, wire.height, wire.data)
    }
}

/// Request to slice a full image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceRequest {
    pub image_data: Vec<u8>,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

/// One sliced tile: grid position, actual extent and pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTile {
    pub key: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SliceResponse {
    Tiles { tiles: Vec<WireTile> },
    Error { error: String },
}

impl SliceResponse {
    /// Rebuild the tile set for a `canvas` sliced into `tile_size` tiles.
    ///
    /// An `{ error }` reply becomes a slice-stage worker error. The tiles
    /// must cover the whole grid exactly once.
    pub fn into_tile_set(self, canvas: (u32, u32), tile_size: (u32, u32)) -> Result<TileSet> {
        let wire_tiles = match self {
            SliceResponse::Tiles { tiles } => tiles,
            SliceResponse::Error { error } => {
                return Err(TileError::Worker {
                    stage: PipelineStage::Slice,
                    message: error,
                })
            }
        };

        let (tile_width, tile_height) = tile_size;
        validate_dimensions(canvas.0, canvas.1, tile_width, tile_height)?;

        let tiles = wire_tiles
            .into_iter()
            .map(|wire| {
                let coord = GridCoord::new(wire.x, wire.y);
                let origin = (
                    wire.x.saturating_mul(tile_width),
                    wire.y.saturating_mul(tile_height),
                );
                let pixels = PixelBuffer::new(wire.width, wire.height, wire.data)?;
                Ok(Tile::new(coord, origin, pixels))
            })
            .collect::<Result<Vec<_>>>()?;

        TileSet::from_tiles(
            canvas.0.div_ceil(tile_width),
            canvas.1.div_ceil(tile_height),
            tile_size,
            tiles,
        )
    }
}

/// Request to find unique tiles. `keys[i]` names `tiles_data[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupRequest {
    pub tiles_data: Vec<WireBuffer>,
    pub keys: Vec<String>,
    pub tile_width: u32,
    pub tile_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DedupResponse {
    #[serde(rename_all = "camelCase")]
    Unique {
        unique_tiles: BTreeMap<String, WireBuffer>,
        original_to_unique_map: BTreeMap<String, String>,
    },
    Error {
        error: String,
    },
}

/// Answer a slicing request.
pub fn handle_slice_request(request: SliceRequest) -> SliceResponse {
    let run = || -> Result<Vec<WireTile>> {
        let image = PixelBuffer::new(request.canvas_width, request.canvas_height, request.image_data)?;
        let set = slice(image, request.tile_width, request.tile_height)?;
        Ok(set
            .into_tiles()
            .into_iter()
            .map(|tile| {
                let coord = tile.coord();
                let pixels = tile.into_pixels();
                WireTile {
                    key: coord.key(),
                    x: coord.col,
                    y: coord.row,
                    width: pixels.width(),
                    height: pixels.height(),
                    data: pixels.into_bytes(),
                }
            })
            .collect())
    };

    match run() {
        Ok(tiles) => SliceResponse::Tiles { tiles },
        Err(e) => SliceResponse::Error {
            error: e.to_string(),
        },
    }
}

/// Answer a dedup request with the given per-channel tolerance.
///
/// Keys are parsed back into grid coordinates so the greedy pass runs in
/// row-major order however the request was assembled.
pub fn handle_dedup_request(request: DedupRequest, tolerance: u8) -> DedupResponse {
    let run = || -> Result<DedupResponse> {
        if request.keys.len() != request.tiles_data.len() {
            return Err(TileError::Config {
                message: format!(
                    "{} keys for {} tiles",
                    request.keys.len(),
                    request.tiles_data.len()
                ),
                help: Some("Send one key per tile".to_string()),
            });
        }

        let mut seen = BTreeSet::new();
        let mut tiles = Vec::with_capacity(request.keys.len());
        for (key, wire) in request.keys.iter().zip(request.tiles_data) {
            let coord: GridCoord = key.parse()?;
            if !seen.insert(coord) {
                return Err(TileError::config(
                    format!("duplicate tile key {}", coord),
                    "Each grid cell may appear only once in a request",
                ));
            }
            let origin = (
                coord.col.saturating_mul(request.tile_width),
                coord.row.saturating_mul(request.tile_height),
            );
            tiles.push(Tile::new(coord, origin, PixelBuffer::try_from(wire)?));
        }

        let unique = find_unique(tiles, tolerance);
        let original_to_unique_map = unique
            .assignment()
            .iter()
            .map(|(original, rep)| (original.key(), rep.key()))
            .collect();
        let unique_tiles = unique
            .representatives()
            .iter()
            .map(|t| (t.coord().key(), WireBuffer::from(t.pixels())))
            .collect();

        Ok(DedupResponse::Unique {
            unique_tiles,
            original_to_unique_map,
        })
    };

    run().unwrap_or_else(|e| DedupResponse::Error {
        error: e.to_string(),
    })
}
