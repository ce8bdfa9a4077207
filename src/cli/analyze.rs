//! Analyze command implementation.
//!
//! Runs the full pipeline on a map image: slice, find unique tiles,
//! classify with the manifest's rules, and optionally export the unique
//! tiles.

use std::path::PathBuf;

use clap::Args;

use crate::classify::survey_center_colours;
use crate::error::{Result, TileError};
use crate::export::export_unique_tiles;
use crate::output::{display_path, plural, Printer};
use crate::session::{AnalysisReport, MapSession};

/// Slice, deduplicate and classify a map image
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Map image to analyze
    #[arg(required = true)]
    pub input: PathBuf,

    /// Tile size as WxH (default: from tilex.yaml, else 14x14)
    #[arg(long)]
    pub tile: Option<String>,

    /// Per-channel duplicate tolerance, 0-255 (default: from tilex.yaml, else 5)
    #[arg(long)]
    pub tolerance: Option<u8>,

    /// Manifest to read instead of ./tilex.yaml
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Write unique tiles and tiles.json into DIR (default: manifest output)
    #[arg(long, value_name = "DIR", num_args = 0..=1)]
    pub export: Option<Option<PathBuf>>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AnalyzeArgs, printer: &Printer) -> Result<AnalysisReport> {
    let manifest = super::load_manifest(args.manifest.as_deref(), printer)?;
    let (tw, th) = super::resolve_tile_size(args.tile.as_deref(), &manifest)?;

    let mut session = MapSession::from_manifest(&manifest);
    session.set_tile_size(tw, th);
    if let Some(tolerance) = args.tolerance {
        session.set_tolerance(tolerance);
    }
    if session.registry().is_empty() {
        printer.verbose("Rules", "none registered, every tile stays unknown");
    } else {
        printer.verbose("Rules", &plural(session.registry().len(), "rule", "rules"));
    }

    session.load_image(super::load_image(&args.input, printer)?);

    printer.status(
        "Analyzing",
        &format!(
            "{}x{} tiles, tolerance {}",
            tw,
            th,
            session.config().tolerance
        ),
    );
    let report = session.analyze().await?;

    printer.info(
        "Sliced",
        &format!(
            "{}x{} grid, {}",
            report.columns,
            report.rows,
            plural(report.tile_count, "tile", "tiles")
        ),
    );
    printer.info(
        "Unique",
        &format!(
            "{} of {}",
            plural(report.unique_count, "tile", "tiles"),
            report.tile_count
        ),
    );
    if printer.is_verbose() {
        if let Some(unique) = session.unique_tiles() {
            for class in unique.classes() {
                printer.verbose(
                    "Class",
                    &format!(
                        "{} ({})",
                        printer.cyan(&class.representative.coord().to_string()),
                        plural(class.members.len(), "member", "members")
                    ),
                );
            }
        }
    }

    printer.info("Classified", &report.classification.to_string());
    for (name, count) in &report.classification.by_type {
        printer.verbose("Type", &format!("{}: {}", name, count));
    }
    for failure in &report.classification.failures {
        printer.warning(
            "Warning",
            &format!(
                "rule '{}' failed on tile {}: {}",
                failure.rule_id, failure.coord, failure.message
            ),
        );
    }

    if let Some(tiles) = session.tiles() {
        let survey = survey_center_colours(tiles);
        printer.info(
            "Surveyed",
            &plural(survey.len(), "centre colour", "centre colours"),
        );
        for entry in &survey {
            printer.verbose(
                &entry.name,
                &format!(
                    "{} first at {} ({})",
                    entry.colour,
                    entry.first_seen,
                    plural(entry.count, "tile", "tiles")
                ),
            );
        }
    }

    if let Some(dir) = super::resolve_output(args.export, &manifest) {
        if let Some(unique) = session.unique_tiles() {
            let index = export_unique_tiles(unique, (tw, th), &dir)?;
            printer.success(
                "Exported",
                &format!(
                    "{} to {}",
                    plural(index.unique.len(), "unique tile", "unique tiles"),
                    display_path(&dir)
                ),
            );
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| TileError::Parse {
            message: format!("Failed to serialize report: {}", e),
            help: None,
        })?;
        println!("{}", json);
    }

    printer.success("Finished", &display_path(&args.input));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::INDEX_FILENAME;
    use std::fs;
    use tempfile::tempdir;

    /// 4x2 tiles of 2x2: alternating black and white columns.
    fn write_map(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("map.png");
        let img = image::RgbaImage::from_fn(8, 4, |x, _| {
            if (x / 2) % 2 == 0 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        img.save(&path).unwrap();
        path
    }

    fn args(input: PathBuf) -> AnalyzeArgs {
        AnalyzeArgs {
            input,
            tile: Some("2x2".to_string()),
            tolerance: None,
            manifest: None,
            export: None,
            json: false,
        }
    }

    #[tokio::test]
    async fn test_analyze_counts_unique_tiles() {
        let dir = tempdir().unwrap();
        let report = run(args(write_map(dir.path())), &Printer::new(false))
            .await
            .unwrap();

        assert_eq!(report.tile_count, 8);
        assert_eq!(report.unique_count, 2);
        assert_eq!(report.class_sizes, vec![4, 4]);
    }

    #[tokio::test]
    async fn test_analyze_with_manifest_rules() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("tilex.yaml");
        fs::write(
            &manifest,
            "rules:\n  - id: \"0\"\n    name: unexplored\n    category: special\n    center: \"#000000\"\n",
        )
        .unwrap();

        let mut a = args(write_map(dir.path()));
        a.manifest = Some(manifest);
        let report = run(a, &Printer::new(false)).await.unwrap();

        assert_eq!(report.classification.classified, 4);
        assert_eq!(report.classification.by_type["unexplored"], 4);
    }

    #[tokio::test]
    async fn test_analyze_exports() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("dist");
        let mut a = args(write_map(dir.path()));
        a.export = Some(Some(out.clone()));

        run(a, &Printer::new(false)).await.unwrap();

        assert!(out.join("0.png").exists());
        assert!(out.join("1.png").exists());
        assert!(out.join(INDEX_FILENAME).exists());
    }

    #[tokio::test]
    async fn test_analyze_bare_export_uses_manifest_output() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("from-manifest");
        let manifest = dir.path().join("tilex.yaml");
        fs::write(&manifest, format!("output: {}\n", out.display())).unwrap();

        let mut a = args(write_map(dir.path()));
        a.manifest = Some(manifest);
        a.export = Some(None);
        run(a, &Printer::new(false)).await.unwrap();

        assert!(out.join("0.png").exists());
        assert!(out.join(INDEX_FILENAME).exists());
    }
}
