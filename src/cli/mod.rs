pub mod analyze;
pub mod compare;
pub mod completions;
pub mod init;
pub mod serve;
pub mod slice;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::{Result, TileError};
use crate::manifest::Manifest;
use crate::output::{display_path, Printer};
use crate::types::PixelBuffer;

/// tilex - Slice map images into tiles, find duplicates and classify tile types
#[derive(Parser, Debug)]
#[command(name = "tilex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print per-stage details and debug logs
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Slice a map image into a tile grid
    Slice(slice::SliceArgs),

    /// Slice, deduplicate and classify a map image
    Analyze(analyze::AnalyzeArgs),

    /// Compare two images
    Compare(compare::CompareArgs),

    /// Run the tile upload server
    Serve(serve::ServeArgs),

    /// Generate a tilex.yaml from a map's centre colours
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Parse a "WxH" dimension string into (width, height).
pub(crate) fn parse_dimensions(s: &str) -> Result<(u32, u32)> {
    let parts: Vec<&str> = s.splitn(2, ['x', 'X']).collect();
    if parts.len() != 2 {
        return Err(TileError::Parse {
            message: format!("Invalid dimensions '{}': expected WxH (e.g. 14x14)", s),
            help: Some("Use the format WxH, for example: 14x14, 16x8".to_string()),
        });
    }

    let w: u32 = parts[0].parse().map_err(|_| TileError::Parse {
        message: format!("Invalid width '{}' in dimensions '{}'", parts[0], s),
        help: Some("Width must be a positive integer".to_string()),
    })?;

    let h: u32 = parts[1].parse().map_err(|_| TileError::Parse {
        message: format!("Invalid height '{}' in dimensions '{}'", parts[1], s),
        help: Some("Height must be a positive integer".to_string()),
    })?;

    if w == 0 || h == 0 {
        return Err(TileError::Parse {
            message: format!("Dimensions must be non-zero, got {}x{}", w, h),
            help: Some("Both width and height must be at least 1".to_string()),
        });
    }

    Ok((w, h))
}

/// Load the manifest named on the command line, or `tilex.yaml` in the
/// current directory, or the defaults.
pub(crate) fn load_manifest(explicit: Option<&Path>, printer: &Printer) -> Result<Manifest> {
    match explicit {
        Some(path) => {
            printer.verbose("Manifest", &display_path(path));
            Manifest::load(path)
        }
        None => Manifest::find(Path::new(".")),
    }
}

/// Tile size from `--tile`, falling back to the manifest.
pub(crate) fn resolve_tile_size(flag: Option<&str>, manifest: &Manifest) -> Result<(u32, u32)> {
    match flag {
        Some(s) => parse_dimensions(s),
        None => Ok(manifest.tile_size()),
    }
}

/// Directory for an optional-value output flag. A bare flag means the
/// manifest's `output` directory.
pub(crate) fn resolve_output(flag: Option<Option<PathBuf>>, manifest: &Manifest) -> Option<PathBuf> {
    flag.map(|dir| dir.unwrap_or_else(|| manifest.output.clone()))
}

/// Load a PNG as an RGBA8 pixel buffer.
pub(crate) fn load_image(path: &Path, printer: &Printer) -> Result<PixelBuffer> {
    let display = display_path(path);

    if !path.exists() {
        return Err(TileError::Io {
            path: path.to_path_buf(),
            message: format!("File not found: {}", display),
        });
    }

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if !is_png {
        printer.warning("Warning", &format!("{} does not have a .png extension", display));
    }

    printer.status("Loading", &display);

    let img = image::open(path)
        .map_err(|e| TileError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to load image: {}", e),
        })?
        .to_rgba8();

    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return Err(TileError::config(
            format!("Image has zero dimensions ({}x{})", w, h),
            "Input image must have non-zero width and height",
        ));
    }
    printer.verbose("Decoded", &format!("{}x{} image ({} pixels)", w, h, w as u64 * h as u64));

    Ok(PixelBuffer::from(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_dimensions_valid() {
        assert_eq!(parse_dimensions("14x14").unwrap(), (14, 14));
        assert_eq!(parse_dimensions("8x16").unwrap(), (8, 16));
        assert_eq!(parse_dimensions("8X16").unwrap(), (8, 16));
    }

    #[test]
    fn test_parse_dimensions_invalid() {
        assert!(parse_dimensions("abc").is_err());
        assert!(parse_dimensions("axb").is_err());
        assert!(parse_dimensions("0x16").is_err());
        assert!(parse_dimensions("16x0").is_err());
    }

    #[test]
    fn test_resolve_tile_size() {
        let manifest = Manifest::default();
        assert_eq!(resolve_tile_size(None, &manifest).unwrap(), (14, 14));
        assert_eq!(resolve_tile_size(Some("7x9"), &manifest).unwrap(), (7, 9));
    }

    #[test]
    fn test_load_image_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_image(&dir.path().join("nope.png"), &Printer::new(false)).unwrap_err();
        assert!(matches!(err, TileError::Io { .. }));
    }

    #[test]
    fn test_load_image_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let pixels = load_image(&path, &Printer::new(false)).unwrap();
        assert_eq!((pixels.width(), pixels.height()), (3, 2));
        assert_eq!(pixels.pixel(2, 1), Some([1, 2, 3, 255]));
    }

    #[test]
    fn test_resolve_output() {
        let manifest = Manifest::parse("output: build/tiles").unwrap();
        assert_eq!(resolve_output(None, &manifest), None);
        assert_eq!(
            resolve_output(Some(None), &manifest),
            Some(PathBuf::from("build/tiles"))
        );
        assert_eq!(
            resolve_output(Some(Some(PathBuf::from("out"))), &manifest),
            Some(PathBuf::from("out"))
        );
    }

    #[test]
    fn test_cli_bare_export_flag() {
        let cli = Cli::parse_from(["tilex", "analyze", "map.png", "--export"]);
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.export, Some(None)),
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["tilex", "analyze", "map.png", "--export", "out"]);
        match cli.command {
            Commands::Analyze(args) => assert_eq!(args.export, Some(Some(PathBuf::from("out")))),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::parse_from(["tilex", "-v", "analyze", "map.png", "--tile", "14x14"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Analyze(_)));
    }
}
