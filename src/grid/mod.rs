//! Coordinate-indexed store of classified tiles.
//!
//! A sparse map from grid cell to `MapTile` with strict bounds checking.
//! Cells that were never set read back as the grid's default tile.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TileError};
use crate::types::{GridCoord, MapTile};

/// One of the four orthogonal neighbours of a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub coord: GridCoord,
    pub tile: MapTile,
}

/// Sparse, bounds-checked tile grid.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: HashMap<GridCoord, MapTile>,
    default_tile: MapTile,
}

/// Left, right, up, down.
const DIRECTIONS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

impl TileGrid {
    /// Create a grid whose unset cells read as the unknown tile type.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_default(width, height, MapTile::default())
    }

    pub fn with_default(width: u32, height: u32, default_tile: MapTile) -> Self {
        Self {
            width,
            height,
            tiles: HashMap::new(),
            default_tile,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn default_tile(&self) -> &MapTile {
        &self.default_tile
    }

    /// Number of explicitly set cells. Never exceeds `width * height`.
    pub fn size(&self) -> usize {
        self.tiles.len()
    }

    /// Bounds check only.
    pub fn is_valid_coordinate(&self, col: i64, row: i64) -> bool {
        col >= 0 && col < self.width as i64 && row >= 0 && row < self.height as i64
    }

    fn checked(&self, col: i64, row: i64) -> Result<GridCoord> {
        if !self.is_valid_coordinate(col, row) {
            return Err(TileError::OutOfBounds { col, row });
        }
        Ok(GridCoord::new(col as u32, row as u32))
    }

    /// The tile at a cell, or a copy of the default if the cell is unset.
    pub fn get_tile(&self, col: i64, row: i64) -> Result<MapTile> {
        let coord = self.checked(col, row)?;
        Ok(self
            .tiles
            .get(&coord)
            .cloned()
            .unwrap_or_else(|| self.default_tile.clone()))
    }

    /// Store a tile, replacing anything already at that cell.
    pub fn set_tile(&mut self, col: i64, row: i64, tile: MapTile) -> Result<()> {
        let coord = self.checked(col, row)?;
        self.tiles.insert(coord, tile);
        Ok(())
    }

    /// Orthogonal neighbours that lie inside the grid. No wrap-around.
    pub fn neighbors(&self, col: i64, row: i64) -> Result<Vec<Neighbor>> {
        self.checked(col, row)?;

        DIRECTIONS
            .iter()
            .map(|(dx, dy)| (col + dx, row + dy))
            .filter(|&(c, r)| self.is_valid_coordinate(c, r))
            .map(|(c, r)| {
                Ok(Neighbor {
                    coord: GridCoord::new(c as u32, r as u32),
                    tile: self.get_tile(c, r)?,
                })
            })
            .collect()
    }

    /// Every explicitly set cell.
    ///
    /// Order follows the backing hash map and is only fit for display.
    pub fn non_default_tiles(&self) -> Vec<(GridCoord, &MapTile)> {
        self.tiles.iter().map(|(coord, tile)| (*coord, tile)).collect()
    }

    /// Count of set cells per tile type name.
    pub fn count_by_type(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for tile in self.tiles.values() {
            *counts.entry(tile.tile_type.name.clone()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TileCategory, TileType};
    use pretty_assertions::assert_eq;

    fn water() -> MapTile {
        MapTile::new(TileType::water())
    }

    #[test]
    fn test_unset_cell_returns_default() {
        let grid = TileGrid::new(3, 2);
        assert_eq!(grid.get_tile(2, 1).unwrap(), MapTile::default());
        assert!(grid.get_tile(2, 1).unwrap().tile_type.is_unknown());
        assert_eq!(grid.size(), 0);
    }

    #[test]
    fn test_custom_default() {
        let default = MapTile::new(TileType::unexplored());
        let grid = TileGrid::with_default(2, 2, default.clone());
        assert_eq!(grid.get_tile(0, 0).unwrap(), default);
    }

    #[test]
    fn test_set_get_round_trip() {
        let mut grid = TileGrid::new(4, 4);
        let tile = water().with_metadata(serde_json::json!({"depth": 3}));
        grid.set_tile(1, 2, tile.clone()).unwrap();
        assert_eq!(grid.get_tile(1, 2).unwrap(), tile);
        assert_eq!(grid.size(), 1);
    }

    #[test]
    fn test_set_overwrites() {
        let mut grid = TileGrid::new(2, 2);
        grid.set_tile(0, 0, water()).unwrap();
        grid.set_tile(0, 0, MapTile::new(TileType::unexplored())).unwrap();
        assert_eq!(grid.size(), 1);
        assert!(grid.get_tile(0, 0).unwrap().tile_type.is_unexplored());
    }

    #[test]
    fn test_out_of_bounds_get_and_set() {
        let mut grid = TileGrid::new(2, 3);
        for (col, row) in [(-1, 0), (0, -1), (2, 0), (0, 3), (99, 99)] {
            assert!(!grid.is_valid_coordinate(col, row));
            assert!(matches!(
                grid.get_tile(col, row),
                Err(TileError::OutOfBounds { .. })
            ));
            assert!(matches!(
                grid.set_tile(col, row, water()),
                Err(TileError::OutOfBounds { .. })
            ));
        }
        assert_eq!(grid.size(), 0);
    }

    #[test]
    fn test_neighbors_interior() {
        let mut grid = TileGrid::new(3, 3);
        grid.set_tile(0, 1, water()).unwrap();

        let neighbors = grid.neighbors(1, 1).unwrap();
        let coords: Vec<_> = neighbors.iter().map(|n| n.coord).collect();
        assert_eq!(
            coords,
            vec![
                GridCoord::new(0, 1),
                GridCoord::new(2, 1),
                GridCoord::new(1, 0),
                GridCoord::new(1, 2),
            ]
        );
        assert_eq!(neighbors[0].tile, water());
        assert!(neighbors[1].tile.tile_type.is_unknown());
    }

    #[test]
    fn test_neighbors_corner_does_not_wrap() {
        let grid = TileGrid::new(3, 3);
        let coords: Vec<_> = grid
            .neighbors(0, 0)
            .unwrap()
            .into_iter()
            .map(|n| n.coord)
            .collect();
        assert_eq!(coords, vec![GridCoord::new(1, 0), GridCoord::new(0, 1)]);
    }

    #[test]
    fn test_neighbors_single_cell_grid() {
        let grid = TileGrid::new(1, 1);
        assert!(grid.neighbors(0, 0).unwrap().is_empty());
        assert!(grid.neighbors(1, 0).is_err());
    }

    #[test]
    fn test_non_default_tiles() {
        let mut grid = TileGrid::new(5, 5);
        grid.set_tile(4, 0, water()).unwrap();
        grid.set_tile(0, 4, MapTile::new(TileType::unexplored())).unwrap();

        let mut entries = grid.non_default_tiles();
        entries.sort_by_key(|(coord, _)| *coord);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, GridCoord::new(4, 0));
        assert_eq!(entries[1].0, GridCoord::new(0, 4));
    }

    #[test]
    fn test_size_bounded_by_area() {
        let mut grid = TileGrid::new(2, 2);
        for row in 0..2 {
            for col in 0..2 {
                grid.set_tile(col, row, water()).unwrap();
                grid.set_tile(col, row, water()).unwrap();
            }
        }
        assert_eq!(grid.size(), 4);
    }

    #[test]
    fn test_count_by_type() {
        let mut grid = TileGrid::new(3, 1);
        grid.set_tile(0, 0, water()).unwrap();
        grid.set_tile(1, 0, water()).unwrap();
        grid.set_tile(
            2,
            0,
            MapTile::new(TileType::new("7", "road", TileCategory::Land)),
        )
        .unwrap();

        let counts = grid.count_by_type();
        assert_eq!(counts.get("water"), Some(&2));
        assert_eq!(counts.get("road"), Some(&1));
    }
}
