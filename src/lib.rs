//! tilex - Map tile extraction, deduplication and classification
//!
//! Slices a raster map image into a grid of fixed-size tiles, groups tiles
//! that are visual duplicates within a per-channel tolerance, and assigns
//! tiles semantic types by rule.

pub mod classify;
pub mod cli;
pub mod compare;
pub mod dedup;
pub mod error;
pub mod export;
pub mod grid;
pub mod hash;
pub mod logging;
pub mod manifest;
pub mod output;
pub mod server;
pub mod session;
pub mod slicer;
pub mod types;
pub mod worker;

pub use classify::{ClassifyReport, Matcher, Registration, Rule, RuleSpec, TypeRegistry};
pub use compare::{compare, CompareMode, CompareOptions, Comparison};
pub use dedup::{find_unique, tiles_match, EquivalenceClass, UniqueTiles, DEFAULT_TOLERANCE};
pub use error::{PipelineStage, Result, TileError};
pub use export::{export_unique_tiles, ExportIndex};
pub use grid::{Neighbor, TileGrid};
pub use hash::content_hash;
pub use manifest::{Manifest, MANIFEST_FILENAME};
pub use session::{AnalysisReport, MapSession, SessionConfig};
pub use slicer::{slice, TileSet};
pub use types::{GridCoord, MapTile, PixelBuffer, Rgb, Tile, TileCategory, TileType};
