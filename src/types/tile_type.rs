//! Semantic tile types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};

/// Broad grouping of tile types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileCategory {
    Special,
    Aquatic,
    Land,
    Building,
}

impl fmt::Display for TileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileCategory::Special => "special",
            TileCategory::Aquatic => "aquatic",
            TileCategory::Land => "land",
            TileCategory::Building => "building",
        };
        f.write_str(name)
    }
}

impl FromStr for TileCategory {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "special" => Ok(TileCategory::Special),
            "aquatic" => Ok(TileCategory::Aquatic),
            "land" => Ok(TileCategory::Land),
            "building" => Ok(TileCategory::Building),
            other => Err(TileError::Parse {
                message: format!("Unknown tile category '{}'", other),
                help: Some("Use one of: special, aquatic, land, building".to_string()),
            }),
        }
    }
}

/// An immutable tile type descriptor.
///
/// Tiles hold their type by value. Reclassifying a tile replaces its record
/// rather than editing a shared descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileType {
    pub id: String,
    pub name: String,
    pub category: TileCategory,
}

impl TileType {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: TileCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
        }
    }

    /// Placeholder for cells no rule matched.
    pub fn unknown() -> Self {
        Self::new("-1", "unknown", TileCategory::Special)
    }

    /// Fog-of-war cells that have not been explored yet.
    pub fn unexplored() -> Self {
        Self::new("0", "unexplored", TileCategory::Special)
    }

    pub fn unrestored() -> Self {
        Self::new("1", "unrestored", TileCategory::Special)
    }

    pub fn water() -> Self {
        Self::new("water", "water", TileCategory::Aquatic)
    }

    pub fn deep_water() -> Self {
        Self::new("deepWater", "deepWater", TileCategory::Aquatic)
    }

    pub fn is_unknown(&self) -> bool {
        self.name == "unknown"
    }

    pub fn is_unexplored(&self) -> bool {
        self.name == "unexplored"
    }
}

impl fmt::Display for TileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_types() {
        assert!(TileType::unknown().is_unknown());
        assert!(TileType::unexplored().is_unexplored());
        assert!(!TileType::unrestored().is_unknown());
        assert_eq!(TileType::unknown().category, TileCategory::Special);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Aquatic".parse::<TileCategory>().unwrap(), TileCategory::Aquatic);
        assert!("lava".parse::<TileCategory>().is_err());
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&TileType::water()).unwrap();
        assert_eq!(json, r#"{"id":"water","name":"water","category":"aquatic"}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(TileType::deep_water().to_string(), "deepWater (aquatic)");
    }
}
