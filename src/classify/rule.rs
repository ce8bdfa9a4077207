//! Classification rules.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::{Rgb, Tile, TileCategory, TileType};

/// A custom predicate. `Err` is treated as "no match" by the registry.
pub type PredicateFn = dyn Fn(&Tile) -> Result<bool, String> + Send + Sync;

/// How a rule decides whether a tile belongs to its type.
#[derive(Clone)]
pub enum Matcher {
    /// The tile's centre pixel `(width / 2, height / 2)` has exactly this RGB
    /// value. Alpha is ignored. Intended for paletted sources, so no tolerance.
    CenterColour(Rgb),
    /// Arbitrary test over the whole tile.
    Predicate(Arc<PredicateFn>),
}

impl Matcher {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Tile) -> Result<bool, String> + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    pub(crate) fn test(&self, tile: &Tile) -> Result<bool, String> {
        match self {
            Matcher::CenterColour(expected) => Ok(tile
                .pixels()
                .center()
                .is_some_and(|px| Rgb::from_rgba(px) == *expected)),
            Matcher::Predicate(f) => f(tile),
        }
    }

    /// Two matchers that accept exactly the same tiles, as far as can be told
    /// without running them.
    pub(crate) fn same_as(&self, other: &Matcher) -> bool {
        match (self, other) {
            (Matcher::CenterColour(a), Matcher::CenterColour(b)) => a == b,
            (Matcher::Predicate(a), Matcher::Predicate(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::CenterColour(c) => f.debug_tuple("CenterColour").field(c).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A `(matcher, type)` pair. Registration order is precedence.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub matcher: Matcher,
    pub tile_type: TileType,
}

impl Rule {
    pub fn new(id: impl Into<String>, matcher: Matcher, tile_type: TileType) -> Self {
        Self {
            id: id.into(),
            matcher,
            tile_type,
        }
    }

    /// Rule matching an exact centre colour.
    pub fn center_colour(id: impl Into<String>, colour: Rgb, tile_type: TileType) -> Self {
        Self::new(id, Matcher::CenterColour(colour), tile_type)
    }
}

/// A centre-colour rule as written in `tilex.yaml`.
///
/// ```yaml
/// rules:
///   - id: "0"
///     name: unexplored
///     category: special
///     center: "#000000"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: TileCategory,
    pub center: Rgb,
}

fn default_category() -> TileCategory {
    TileCategory::Land
}

impl From<&RuleSpec> for Rule {
    fn from(spec: &RuleSpec) -> Self {
        Rule::center_colour(
            spec.id.clone(),
            spec.center,
            TileType::new(spec.id.clone(), spec.name.clone(), spec.category),
        )
    }
}
