//! Project manifest (tilex.yaml) parsing.
//!
//! The manifest holds tile size, duplicate tolerance, worker timeout, server
//! settings and the classification rules for a map project. Every field has a
//! default, so an empty file (or no file) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::RuleSpec;
use crate::dedup::DEFAULT_TOLERANCE;
use crate::error::{Result, TileError};

/// Manifest filename looked up in a project directory.
pub const MANIFEST_FILENAME: &str = "tilex.yaml";

/// Project manifest loaded from tilex.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Nominal tile width in pixels.
    pub tile_width: u32,

    /// Nominal tile height in pixels.
    pub tile_height: u32,

    /// Per-channel tolerance for duplicate detection (0-255).
    pub tolerance: u8,

    /// Seconds a background worker may run before the stage fails.
    pub worker_timeout_secs: u64,

    /// Output directory for exported tiles.
    pub output: PathBuf,

    /// Directory the upload server stores images in.
    pub upload_dir: PathBuf,

    /// Upload server port.
    pub port: u16,

    /// Classification rules, in precedence order.
    pub rules: Vec<RuleSpec>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            tile_width: 14,
            tile_height: 14,
            tolerance: DEFAULT_TOLERANCE,
            worker_timeout_secs: 30,
            output: PathBuf::from("dist"),
            upload_dir: PathBuf::from("./data/images"),
            port: 3000,
            rules: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from a tilex.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let manifest: Manifest = serde_yaml::from_str(content).map_err(|e| TileError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check tilex.yaml syntax".to_string()),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Load `tilex.yaml` from a directory, or the defaults if there is none.
    pub fn find(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(TileError::config(
                format!(
                    "tile_width and tile_height must be non-zero, got {}x{}",
                    self.tile_width, self.tile_height
                ),
                "Set both tile_width and tile_height in tilex.yaml to at least 1",
            ));
        }
        if self.worker_timeout_secs == 0 {
            return Err(TileError::config(
                "worker_timeout_secs must be at least 1",
                "Remove worker_timeout_secs to use the default of 30",
            ));
        }
        Ok(())
    }

    /// Nominal tile size as `(width, height)`.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| TileError::Parse {
            message: format!("Failed to serialize manifest: {}", e),
            help: None,
        })
    }
}
