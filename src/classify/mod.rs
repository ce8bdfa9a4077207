//! Rule-based tile type classification.
//!
//! A `TypeRegistry` holds an ordered list of rules. Each tile is tested
//! against the rules in registration order and takes the type of the first
//! rule that matches. A rule whose predicate fails (returns `Err` or panics)
//! counts as a non-match for that tile only; the pass carries on.
//!
//! # Example
//!
//! ```
//! use tilex::classify::{Rule, TypeRegistry};
//! use tilex::types::{PixelBuffer, Rgb, TileType};
//! use tilex::{slice, TileGrid};
//!
//! let tiles = slice(PixelBuffer::filled(28, 28, [0, 0, 0, 255]), 14, 14)?;
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(Rule::center_colour("0", Rgb::new(0, 0, 0), TileType::unexplored()));
//!
//! let mut grid = TileGrid::new(tiles.columns(), tiles.rows());
//! let report = registry.classify_tiles(&tiles, &mut grid)?;
//! assert_eq!(report.classified, 4);
//! # Ok::<(), tilex::TileError>(())
//! ```

mod rule;
pub mod survey;

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Result, TileError};
use crate::grid::TileGrid;
use crate::slicer::TileSet;
use crate::types::{GridCoord, MapTile, PixelBuffer, Tile, TileType};

pub use rule::{Matcher, PredicateFn, Rule, RuleSpec};
pub use survey::{survey_center_colours, ColourSurvey};

/// Outcome of `TypeRegistry::register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// The rule was appended at this precedence index.
    Added(usize),
    /// An equivalent rule was already registered; nothing was added.
    Duplicate { existing: String },
}

/// A predicate that failed while testing one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFailure {
    pub coord: GridCoord,
    pub rule_id: String,
    pub message: String,
}

/// Summary of a classification pass over a grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifyReport {
    /// Cells examined.
    pub total: usize,
    /// Cells a rule matched (and that were written to the grid).
    pub classified: usize,
    /// Matched cells per tile type name.
    pub by_type: BTreeMap<String, usize>,
    pub failures: Vec<RuleFailure>,
}

impl ClassifyReport {
    pub fn unclassified(&self) -> usize {
        self.total - self.classified
    }
}

impl fmt::Display for ClassifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} tiles classified", self.classified, self.total)?;
        if !self.failures.is_empty() {
            write!(f, " ({} rule failures)", self.failures.len())?;
        }
        Ok(())
    }
}

/// Ordered rule list. Earlier rules take precedence.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    rules: Vec<Rule>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from manifest rule specs, skipping duplicates.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a RuleSpec>) -> Self {
        let mut registry = Self::new();
        for spec in specs {
            registry.register(Rule::from(spec));
        }
        registry
    }

    /// Append a rule.
    ///
    /// A rule with an id already in use, or whose matcher is identical to an
    /// earlier one, could never win and is rejected.
    pub fn register(&mut self, rule: Rule) -> Registration {
        if let Some(existing) = self
            .rules
            .iter()
            .find(|r| r.id == rule.id || r.matcher.same_as(&rule.matcher))
        {
            warn!(
                rule = %rule.id,
                existing = %existing.id,
                "ignoring duplicate classification rule"
            );
            return Registration::Duplicate {
                existing: existing.id.clone(),
            };
        }

        self.rules.push(rule);
        Registration::Added(self.rules.len() - 1)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The first matching rule's type, or `None` if nothing matched.
    ///
    /// Callers that need a value substitute `TileType::unknown()`.
    pub fn classify(&self, tile: &Tile) -> Option<TileType> {
        self.evaluate(tile, &mut Vec::new())
    }

    fn evaluate(&self, tile: &Tile, failures: &mut Vec<RuleFailure>) -> Option<TileType> {
        for rule in &self.rules {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| rule.matcher.test(tile)))
                .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));

            match outcome {
                Ok(true) => return Some(rule.tile_type.clone()),
                Ok(false) => {}
                Err(message) => {
                    warn!(
                        rule = %rule.id,
                        tile = %tile.coord(),
                        %message,
                        "classification rule failed, treating as no match"
                    );
                    failures.push(RuleFailure {
                        coord: tile.coord(),
                        rule_id: rule.id.clone(),
                        message,
                    });
                }
            }
        }
        None
    }

    /// Classify already-sliced tiles into a grid.
    ///
    /// The grid must have the same shape as the tile set. Every cell is
    /// evaluated before anything is written, and only matched cells are
    /// written; the rest keep the grid default.
    pub fn classify_tiles(&self, tiles: &TileSet, grid: &mut TileGrid) -> Result<ClassifyReport> {
        if (grid.width(), grid.height()) != (tiles.columns(), tiles.rows()) {
            return Err(TileError::config(
                format!(
                    "Grid is {}x{} but the tile set is {}x{}",
                    grid.width(),
                    grid.height(),
                    tiles.columns(),
                    tiles.rows()
                ),
                "Create the grid from the tile set's columns and rows",
            ));
        }

        self.apply(tiles.iter().map(Cow::Borrowed), grid)
    }

    /// Classify every grid cell straight from the full map image.
    ///
    /// Each cell's region is cut from `canvas` at `tile_size` spacing. Cells
    /// must start inside the image; edge cells may be smaller than nominal.
    pub fn classify_grid(
        &self,
        canvas: &PixelBuffer,
        tile_size: (u32, u32),
        grid: &mut TileGrid,
    ) -> Result<ClassifyReport> {
        let (tw, th) = tile_size;
        crate::slicer::validate_dimensions(canvas.width(), canvas.height(), tw, th)?;

        let (cols, rows) = (grid.width(), grid.height());
        let starts_inside = |cells: u32, step: u32, extent: u32| {
            cells == 0 || (cells as u64 - 1) * step as u64 <= extent as u64 - 1
        };
        if !starts_inside(cols, tw, canvas.width()) || !starts_inside(rows, th, canvas.height()) {
            return Err(TileError::config(
                format!(
                    "A {}x{} grid of {}x{} tiles does not fit a {}x{} image",
                    cols,
                    rows,
                    tw,
                    th,
                    canvas.width(),
                    canvas.height()
                ),
                "Grid dimensions must not exceed ceil(image size / tile size)",
            ));
        }

        let mut cells = Vec::with_capacity(cols as usize * rows as usize);
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = (col * tw, row * th);
                cells.push(Cow::Owned(Tile::new(
                    GridCoord::new(col, row),
                    (x, y),
                    canvas.crop(x, y, tw, th),
                )));
            }
        }

        self.apply(cells.into_iter(), grid)
    }

    fn apply<'a>(
        &self,
        cells: impl Iterator<Item = Cow<'a, Tile>>,
        grid: &mut TileGrid,
    ) -> Result<ClassifyReport> {
        let mut report = ClassifyReport::default();
        let mut matched: Vec<(GridCoord, TileType)> = Vec::new();

        for tile in cells {
            report.total += 1;
            if let Some(tile_type) = self.evaluate(&tile, &mut report.failures) {
                matched.push((tile.coord(), tile_type));
            }
        }

        for (coord, tile_type) in matched {
            *report.by_type.entry(tile_type.name.clone()).or_insert(0) += 1;
            grid.set_tile(coord.col as i64, coord.row as i64, MapTile::new(tile_type))?;
            report.classified += 1;
        }

        debug!(
            total = report.total,
            classified = report.classified,
            failures = report.failures.len(),
            "classified grid"
        );

        Ok(report)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("predicate panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("predicate panicked: {}", s)
    } else {
        "predicate panicked".to_string()
    }
}
