//! Slice command implementation.
//!
//! Cuts a map image into its tile grid and optionally writes every tile out
//! as its own PNG.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::error::{Result, TileError};
use crate::export::write_png;
use crate::output::{display_path, plural, Printer};
use crate::slicer::{slice, TileSet};

/// Slice a map image into a tile grid
#[derive(Args, Debug)]
pub struct SliceArgs {
    /// Map image to slice
    #[arg(required = true)]
    pub input: PathBuf,

    /// Tile size as WxH (default: from tilex.yaml, else 14x14)
    #[arg(long)]
    pub tile: Option<String>,

    /// Write each non-empty tile as <col>_<row>.png into DIR (default: manifest output)
    #[arg(long, short, value_name = "DIR", num_args = 0..=1)]
    pub output: Option<Option<PathBuf>>,

    /// Manifest to read instead of ./tilex.yaml
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

/// Report partial edges and empty cells for a sliced grid.
fn report_grid(tiles: &TileSet, image_size: (u32, u32), printer: &Printer) {
    let (w, h) = image_size;
    let (tw, th) = tiles.tile_size();

    if w % tw != 0 {
        printer.warning(
            "Warning",
            &format!(
                "Image width {} is not divisible by tile width {}; partial column included",
                w, tw
            ),
        );
    }
    if h % th != 0 {
        printer.warning(
            "Warning",
            &format!(
                "Image height {} is not divisible by tile height {}; partial row included",
                h, th
            ),
        );
    }

    printer.status(
        "Slicing",
        &format!("{}x{} grid ({}x{} tiles)", tiles.columns(), tiles.rows(), tw, th),
    );

    let empty = tiles.transparent_count();
    if empty > 0 {
        printer.info(
            "Finished",
            &format!("{} ({} empty)", plural(tiles.len(), "tile", "tiles"), empty),
        );
    } else {
        printer.info("Finished", &plural(tiles.len(), "tile", "tiles"));
    }
}

/// Write every non-transparent tile as `<col>_<row>.png`. Returns the count.
fn write_tiles(tiles: &TileSet, dir: &Path) -> Result<usize> {
    fs::create_dir_all(dir).map_err(|e| TileError::Io {
        path: dir.to_path_buf(),
        message: format!("Failed to create output directory: {}", e),
    })?;

    let mut written = 0;
    for tile in tiles.iter().filter(|t| !t.pixels().is_fully_transparent()) {
        let coord = tile.coord();
        write_png(
            tile.pixels(),
            &dir.join(format!("{}_{}.png", coord.col, coord.row)),
        )?;
        written += 1;
    }
    Ok(written)
}

pub fn run(args: SliceArgs, printer: &Printer) -> Result<TileSet> {
    let manifest = super::load_manifest(args.manifest.as_deref(), printer)?;
    let (tw, th) = super::resolve_tile_size(args.tile.as_deref(), &manifest)?;
    printer.verbose("Tile size", &format!("{}x{}", tw, th));

    let image = super::load_image(&args.input, printer)?;
    let image_size = (image.width(), image.height());
    let tiles = slice(image, tw, th)?;
    report_grid(&tiles, image_size, printer);

    if let Some(dir) = super::resolve_output(args.output, &manifest) {
        let written = write_tiles(&tiles, &dir)?;
        printer.success(
            "Wrote",
            &format!("{} to {}", plural(written, "tile", "tiles"), display_path(&dir)),
        );
    }

    Ok(tiles)
}
