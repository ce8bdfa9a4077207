//! Tile slicer.
//!
//! Splits a full map image into a uniform grid of tiles. Edge tiles keep
//! whatever remains of the image and are never padded.

use tracing::debug;

use crate::error::{Result, TileError};
use crate::types::{GridCoord, PixelBuffer, Tile};

/// The tiles cut from one image, in row-major slicing order.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    columns: u32,
    rows: u32,
    tile_width: u32,
    tile_height: u32,
    tiles: Vec<Tile>,
}

impl TileSet {
    /// Rebuild a tile set from tiles received over a worker boundary.
    ///
    /// Tiles are put back in row-major order; the set must cover every cell
    /// of a `columns x rows` grid exactly once.
    pub fn from_tiles(
        columns: u32,
        rows: u32,
        tile_size: (u32, u32),
        mut tiles: Vec<Tile>,
    ) -> Result<Self> {
        tiles.sort_by_key(Tile::coord);
        let complete = tiles.len() == columns as usize * rows as usize
            && tiles.iter().enumerate().all(|(i, t)| {
                let c = t.coord();
                c.row as usize * columns as usize + c.col as usize == i
            });
        if !complete {
            return Err(TileError::config(
                format!(
                    "{} tiles do not form a complete {}x{} grid",
                    tiles.len(),
                    columns,
                    rows
                ),
                "Each grid cell needs exactly one tile",
            ));
        }

        Ok(Self {
            columns,
            rows,
            tile_width: tile_size.0,
            tile_height: tile_size.1,
            tiles,
        })
    }

    /// Number of grid columns (`ceil(image_width / tile_width)`).
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of grid rows (`ceil(image_height / tile_height)`).
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Nominal tile size as `(width, height)`.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Look up a tile by grid coordinate.
    pub fn get(&self, coord: GridCoord) -> Option<&Tile> {
        if coord.col >= self.columns || coord.row >= self.rows {
            return None;
        }
        self.tiles
            .get(coord.row as usize * self.columns as usize + coord.col as usize)
    }

    /// Tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Tile keys in row-major order.
    pub fn keys(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.tiles.iter().map(Tile::coord)
    }

    /// Number of tiles whose pixels are all fully transparent.
    pub fn transparent_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.pixels().is_fully_transparent())
            .count()
    }

    /// Give up ownership of the tiles, keeping row-major order.
    pub fn into_tiles(self) -> Vec<Tile> {
        self.tiles
    }
}

/// Check tile and image dimensions before any pixel is touched.
pub fn validate_dimensions(
    image_width: u32,
    image_height: u32,
    tile_width: u32,
    tile_height: u32,
) -> Result<()> {
    if tile_width == 0 || tile_height == 0 {
        return Err(TileError::config(
            format!("Tile dimensions must be non-zero, got {}x{}", tile_width, tile_height),
            "Both tile width and height must be at least 1",
        ));
    }
    if image_width == 0 || image_height == 0 {
        return Err(TileError::config(
            format!("Image has zero dimensions ({}x{})", image_width, image_height),
            "Input image must have non-zero width and height",
        ));
    }
    Ok(())
}

/// Split an image into uniform grid tiles.
///
/// Takes the image by value: once slicing starts the caller no longer has
/// the buffer. Every tile owns a fresh copy of its region.
pub fn slice(image: PixelBuffer, tile_width: u32, tile_height: u32) -> Result<TileSet> {
    let (width, height) = (image.width(), image.height());
    validate_dimensions(width, height, tile_width, tile_height)?;

    let columns = width.div_ceil(tile_width);
    let rows = height.div_ceil(tile_height);

    let mut tiles = Vec::with_capacity(columns as usize * rows as usize);
    for row in 0..rows {
        for col in 0..columns {
            let x = col * tile_width;
            let y = row * tile_height;

            // Clamp dimensions for partial edge tiles
            let w = tile_width.min(width - x);
            let h = tile_height.min(height - y);

            let pixels = image.crop(x, y, w, h);
            tiles.push(Tile::new(GridCoord::new(col, row), (x, y), pixels));
        }
    }

    debug!(
        columns,
        rows,
        tile_width,
        tile_height,
        tiles = tiles.len(),
        "sliced image"
    );

    Ok(TileSet {
        columns,
        rows,
        tile_width,
        tile_height,
        tiles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Image where every pixel encodes its own position.
    fn positional(width: u32, height: u32) -> PixelBuffer {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[x as u8, y as u8, 7, 255]);
            }
        }
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn test_slice_uniform() {
        // 4x4 image with 2x2 tiles → 2x2 grid = 4 tiles
        let set = slice(positional(4, 4), 2, 2).unwrap();

        assert_eq!(set.len(), 4);
        let coords: Vec<_> = set.keys().collect();
        assert_eq!(
            coords,
            vec![
                GridCoord::new(0, 0),
                GridCoord::new(1, 0),
                GridCoord::new(0, 1),
                GridCoord::new(1, 1),
            ]
        );
        for tile in set.iter() {
            assert_eq!((tile.width(), tile.height()), (2, 2));
        }
    }

    #[test]
    fn test_tile_count_is_ceil_product() {
        for (w, h, tw, th) in [(28, 28, 14, 14), (29, 15, 14, 14), (5, 3, 2, 2), (1, 1, 8, 8), (100, 7, 9, 3)] {
            let set = slice(positional(w, h), tw, th).unwrap();
            let expected = w.div_ceil(tw) * h.div_ceil(th);
            assert_eq!(set.len(), expected as usize, "{}x{} / {}x{}", w, h, tw, th);
            for tile in set.iter() {
                assert!(tile.width() > 0 && tile.width() <= tw);
                assert!(tile.height() > 0 && tile.height() <= th);
            }
        }
    }

    #[test]
    fn test_slice_partial_edge() {
        // 5x3 image with 2x2 tiles → 3x2 grid (partial column and row)
        let set = slice(positional(5, 3), 2, 2).unwrap();
        assert_eq!((set.columns(), set.rows()), (3, 2));

        let last_col = set.get(GridCoord::new(2, 0)).unwrap();
        assert_eq!(last_col.width(), 1); // 5 - 4 = 1
        assert_eq!(last_col.height(), 2);

        let last_row = set.get(GridCoord::new(0, 1)).unwrap();
        assert_eq!(last_row.width(), 2);
        assert_eq!(last_row.height(), 1); // 3 - 2 = 1

        let corner = set.get(GridCoord::new(2, 1)).unwrap();
        assert_eq!((corner.width(), corner.height()), (1, 1));
        assert_eq!(corner.pixels().as_bytes().len(), 4);
    }

    #[test]
    fn test_tile_pixels_and_origin() {
        let set = slice(positional(6, 4), 3, 2).unwrap();
        let tile = set.get(GridCoord::new(1, 1)).unwrap();
        assert_eq!(tile.origin(), (3, 2));
        assert_eq!(tile.pixels().pixel(0, 0), Some([3, 2, 7, 255]));
        assert_eq!(tile.pixels().pixel(2, 1), Some([5, 3, 7, 255]));
    }

    #[test]
    fn test_slice_is_idempotent() {
        let a = slice(positional(13, 9), 4, 4).unwrap();
        let b = slice(positional(13, 9), 4, 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_tile_larger_than_image() {
        let set = slice(positional(3, 2), 14, 14).unwrap();
        assert_eq!(set.len(), 1);
        let tile = set.get(GridCoord::new(0, 0)).unwrap();
        assert_eq!((tile.width(), tile.height()), (3, 2));
    }

    #[test]
    fn test_zero_tile_dimensions_rejected() {
        assert!(matches!(
            slice(positional(4, 4), 0, 2),
            Err(TileError::Config { .. })
        ));
        assert!(matches!(
            slice(positional(4, 4), 2, 0),
            Err(TileError::Config { .. })
        ));
    }

    #[test]
    fn test_zero_area_image_rejected() {
        let empty = PixelBuffer::new(0, 5, vec![]).unwrap();
        assert!(matches!(slice(empty, 2, 2), Err(TileError::Config { .. })));
    }

    #[test]
    fn test_get_out_of_range() {
        let set = slice(positional(4, 4), 2, 2).unwrap();
        assert!(set.get(GridCoord::new(2, 0)).is_none());
        assert!(set.get(GridCoord::new(0, 2)).is_none());
    }

    #[test]
    fn test_transparent_count() {
        let mut data = Vec::new();
        for _y in 0..2 {
            for x in 0..4 {
                let alpha = if x < 2 { 255 } else { 0 };
                data.extend_from_slice(&[1, 1, 1, alpha]);
            }
        }
        let set = slice(PixelBuffer::new(4, 2, data).unwrap(), 2, 2).unwrap();
        assert_eq!(set.transparent_count(), 1);
    }
}
