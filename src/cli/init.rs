//! Init command implementation.
//!
//! Generates a `tilex.yaml` manifest with one classification rule per
//! distinct centre colour found in a sample map.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::classify::{survey_center_colours, RuleSpec};
use crate::error::{Result, TileError};
use crate::manifest::{Manifest, MANIFEST_FILENAME};
use crate::output::{display_path, plural, Printer};
use crate::slicer::slice;
use crate::types::TileCategory;

/// Initialize a tilex project by generating a tilex.yaml manifest
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Sample map image to survey
    #[arg(required = true)]
    pub input: PathBuf,

    /// Tile size as WxH (default: 14x14)
    #[arg(long)]
    pub tile: Option<String>,

    /// Directory to write tilex.yaml into
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Overwrite existing tilex.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<Manifest> {
    let manifest_path = args.dir.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(TileError::config(
            format!("{} already exists", display_path(&manifest_path)),
            "Use --force to overwrite",
        ));
    }

    let mut manifest = Manifest::default();
    let (tw, th) = super::resolve_tile_size(args.tile.as_deref(), &manifest)?;
    manifest.tile_width = tw;
    manifest.tile_height = th;

    let image = super::load_image(&args.input, printer)?;
    printer.status("Surveying", &format!("{}x{} tiles", tw, th));
    let tiles = slice(image, tw, th)?;
    let survey = survey_center_colours(&tiles);

    manifest.rules = survey
        .iter()
        .map(|entry| RuleSpec {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            category: TileCategory::Land,
            center: entry.colour,
        })
        .collect();

    for entry in &survey {
        printer.verbose(
            &entry.name,
            &format!("{} ({})", entry.colour, plural(entry.count, "tile", "tiles")),
        );
    }

    fs::create_dir_all(&args.dir).map_err(|e| TileError::Io {
        path: args.dir.clone(),
        message: format!("Failed to create directory: {}", e),
    })?;
    fs::write(&manifest_path, manifest.to_yaml()?).map_err(|e| TileError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;

    printer.success(
        "Created",
        &format!(
            "{} ({})",
            display_path(&manifest_path),
            plural(manifest.rules.len(), "rule", "rules")
        ),
    );

    Ok(manifest)
}
