//! Grid coordinates and their `"col,row"` key form.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TileError};

/// A cell position in the tile grid, in grid-cell units.
///
/// Ordering is row-major (row first, then column) so that ordered maps keyed
/// by `GridCoord` iterate in slicing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridCoord {
    pub col: u32,
    pub row: u32,
}

impl GridCoord {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// The canonical `"{col},{row}"` key.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl Ord for GridCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row.cmp(&other.row).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for GridCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.col, self.row)
    }
}

impl FromStr for GridCoord {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        let (col, row) = s.split_once(',').ok_or_else(|| TileError::Parse {
            message: format!("Invalid tile key '{}': expected col,row", s),
            help: Some("Tile keys look like 3,7".to_string()),
        })?;

        let parse = |part: &str| {
            part.trim().parse::<u32>().map_err(|_| TileError::Parse {
                message: format!("Invalid tile key '{}': '{}' is not a grid index", s, part),
                help: Some("Grid indices are non-negative integers".to_string()),
            })
        };

        Ok(GridCoord::new(parse(col)?, parse(row)?))
    }
}

impl From<(u32, u32)> for GridCoord {
    fn from((col, row): (u32, u32)) -> Self {
        GridCoord::new(col, row)
    }
}

impl Serialize for GridCoord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GridCoord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(GridCoord::new(3, 7).key(), "3,7");
    }

    #[test]
    fn test_parse_key() {
        assert_eq!("12,0".parse::<GridCoord>().unwrap(), GridCoord::new(12, 0));
        assert_eq!(" 1, 2".parse::<GridCoord>().unwrap(), GridCoord::new(1, 2));
    }

    #[test]
    fn test_parse_invalid_key() {
        assert!("12".parse::<GridCoord>().is_err());
        assert!("a,b".parse::<GridCoord>().is_err());
        assert!("-1,0".parse::<GridCoord>().is_err());
    }

    #[test]
    fn test_row_major_ordering() {
        let mut coords = vec![
            GridCoord::new(1, 1),
            GridCoord::new(0, 1),
            GridCoord::new(1, 0),
            GridCoord::new(0, 0),
        ];
        coords.sort();
        assert_eq!(
            coords,
            vec![
                GridCoord::new(0, 0),
                GridCoord::new(1, 0),
                GridCoord::new(0, 1),
                GridCoord::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_serializes_as_key_string() {
        let json = serde_json::to_string(&GridCoord::new(4, 2)).unwrap();
        assert_eq!(json, "\"4,2\"");
        let back: GridCoord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, GridCoord::new(4, 2));
    }
}
