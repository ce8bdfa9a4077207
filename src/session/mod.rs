//! Map analysis session.
//!
//! `MapSession` owns one loaded map image and everything derived from it:
//! the sliced tiles, the unique-tile groups and the classified grid. Loading
//! a new image or changing the tile size throws the derived state away.

use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{ClassifyReport, TypeRegistry};
use crate::dedup::{UniqueTiles, DEFAULT_TOLERANCE};
use crate::error::{Result, TileError};
use crate::grid::TileGrid;
use crate::manifest::Manifest;
use crate::slicer::TileSet;
use crate::types::{GridCoord, PixelBuffer, Tile};
use crate::worker::{find_unique_in_background, slice_in_background, DEFAULT_WORKER_TIMEOUT};

/// Pipeline settings for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    pub tolerance: u8,
    pub worker_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tile_width: 14,
            tile_height: 14,
            tolerance: DEFAULT_TOLERANCE,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }
}

impl From<&Manifest> for SessionConfig {
    fn from(manifest: &Manifest) -> Self {
        Self {
            tile_width: manifest.tile_width,
            tile_height: manifest.tile_height,
            tolerance: manifest.tolerance,
            worker_timeout: manifest.worker_timeout(),
        }
    }
}

/// Summary of one `MapSession::analyze` run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub columns: u32,
    pub rows: u32,
    pub tile_count: usize,
    pub transparent_tiles: usize,
    pub unique_count: usize,
    /// Size of each equivalence class, largest first.
    pub class_sizes: Vec<usize>,
    pub classification: ClassifyReport,
}

#[derive(Debug)]
struct Derived {
    tiles: TileSet,
    unique: UniqueTiles,
    grid: TileGrid,
}

/// One map image and its analysis results.
#[derive(Debug)]
pub struct MapSession {
    config: SessionConfig,
    registry: TypeRegistry,
    image: Option<PixelBuffer>,
    derived: Option<Derived>,
}

impl MapSession {
    pub fn new(config: SessionConfig, registry: TypeRegistry) -> Self {
        Self {
            config,
            registry,
            image: None,
            derived: None,
        }
    }

    /// Session configured from a manifest, with its rules registered.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self::new(
            SessionConfig::from(manifest),
            TypeRegistry::from_specs(&manifest.rules),
        )
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn image(&self) -> Option<&PixelBuffer> {
        self.image.as_ref()
    }

    /// Replace the loaded image. Previous results are discarded.
    pub fn load_image(&mut self, image: PixelBuffer) {
        debug!(width = image.width(), height = image.height(), "loaded image");
        self.image = Some(image);
        self.derived = None;
    }

    /// Decode a PNG (or any format `image` reads) and load it.
    pub fn load_path(&mut self, path: &Path) -> Result<()> {
        let decoded = image::open(path).map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to decode image: {}", e),
        })?;
        self.load_image(PixelBuffer::from(decoded.to_rgba8()));
        Ok(())
    }

    /// Change the tile size. Previous results are discarded.
    pub fn set_tile_size(&mut self, tile_width: u32, tile_height: u32) {
        if (tile_width, tile_height) != (self.config.tile_width, self.config.tile_height) {
            self.derived = None;
        }
        self.config.tile_width = tile_width;
        self.config.tile_height = tile_height;
    }

    pub fn set_tolerance(&mut self, tolerance: u8) {
        if tolerance != self.config.tolerance {
            self.derived = None;
        }
        self.config.tolerance = tolerance;
    }

    /// Run the whole pipeline on the loaded image.
    ///
    /// Slicing and dedup run on background workers; classification runs
    /// here once both have returned. Results replace the previous ones only
    /// if every stage succeeds.
    pub async fn analyze(&mut self) -> Result<AnalysisReport> {
        let image = self.image.clone().ok_or_else(|| {
            TileError::config(
                "No image loaded",
                "Load a map image before running the analysis",
            )
        })?;
        let SessionConfig {
            tile_width,
            tile_height,
            tolerance,
            worker_timeout,
        } = self.config;

        let tiles = slice_in_background(image, tile_width, tile_height, worker_timeout).await?;
        let unique =
            find_unique_in_background(tiles.iter().cloned().collect(), tolerance, worker_timeout)
                .await?;

        let mut grid = TileGrid::new(tiles.columns(), tiles.rows());
        let classification = self.registry.classify_tiles(&tiles, &mut grid)?;

        let mut class_sizes: Vec<usize> = unique.classes().iter().map(|c| c.members.len()).collect();
        class_sizes.sort_unstable_by(|a, b| b.cmp(a));

        let report = AnalysisReport {
            columns: tiles.columns(),
            rows: tiles.rows(),
            tile_count: tiles.len(),
            transparent_tiles: tiles.transparent_count(),
            unique_count: unique.len(),
            class_sizes,
            classification,
        };
        info!(
            tiles = report.tile_count,
            unique = report.unique_count,
            classified = report.classification.classified,
            "analysis complete"
        );

        self.derived = Some(Derived {
            tiles,
            unique,
            grid,
        });
        Ok(report)
    }

    pub fn tiles(&self) -> Option<&TileSet> {
        self.derived.as_ref().map(|d| &d.tiles)
    }

    pub fn unique_tiles(&self) -> Option<&UniqueTiles> {
        self.derived.as_ref().map(|d| &d.unique)
    }

    pub fn grid(&self) -> Option<&TileGrid> {
        self.derived.as_ref().map(|d| &d.grid)
    }

    /// Mutable access to the classified grid for manual edits.
    pub fn grid_mut(&mut self) -> Option<&mut TileGrid> {
        self.derived.as_mut().map(|d| &mut d.grid)
    }

    /// Grid cell under an image pixel, or `None` outside the image.
    pub fn tile_at_pixel(&self, x: u32, y: u32) -> Option<GridCoord> {
        let image = self.image.as_ref()?;
        if x >= image.width() || y >= image.height() {
            return None;
        }
        if self.config.tile_width == 0 || self.config.tile_height == 0 {
            return None;
        }
        Some(GridCoord::new(
            x / self.config.tile_width,
            y / self.config.tile_height,
        ))
    }

    /// The unique tile standing in for `coord`, after analysis.
    pub fn representative_of(&self, coord: GridCoord) -> Option<&Tile> {
        self.unique_tiles()?.representative_of(coord)
    }
}
