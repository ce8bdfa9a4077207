//! Compare command implementation.

use std::path::PathBuf;

use clap::Args;

use crate::compare::{compare, CompareMode, CompareOptions, Comparison, ComparisonDetail};
use crate::error::Result;
use crate::output::Printer;

/// Compare two images
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First image
    pub a: PathBuf,

    /// Second image
    pub b: PathBuf,

    /// Compare mean colours instead of individual pixels
    #[arg(long)]
    pub average: bool,

    /// Pixel distance (pixel mode) or mean channel difference (average mode)
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Fraction of pixels that must match in pixel mode, 0-1
    #[arg(long)]
    pub threshold: Option<f64>,
}

impl CompareArgs {
    fn options(&self) -> CompareOptions {
        let mut options = CompareOptions::default();
        if self.average {
            options.mode = CompareMode::Average;
            if let Some(t) = self.tolerance {
                options.average_tolerance = t;
            }
        } else if let Some(t) = self.tolerance {
            options.pixel_tolerance = t;
        }
        if let Some(threshold) = self.threshold {
            options.pixel_match_threshold = threshold;
        }
        options
    }
}

pub fn run(args: CompareArgs, printer: &Printer) -> Result<Comparison> {
    let a = super::load_image(&args.a, printer)?;
    let b = super::load_image(&args.b, printer)?;
    let result = compare(&a, &b, &args.options());

    let detail = match result.detail {
        ComparisonDetail::DimensionMismatch => format!(
            "sizes differ ({}x{} vs {}x{})",
            a.width(),
            a.height(),
            b.width(),
            b.height()
        ),
        ComparisonDetail::Pixel { match_fraction } => {
            format!("{:.1}% of pixels match", match_fraction * 100.0)
        }
        ComparisonDetail::Average(diff) => format!(
            "mean difference {:.2} (r {:.2}, g {:.2}, b {:.2}, a {:.2})",
            diff.total, diff.r, diff.g, diff.b, diff.a
        ),
    };

    if result.similar {
        printer.success("Similar", &detail);
    } else {
        printer.warning("Different", &detail);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &std::path::Path, name: &str, w: u32, h: u32, rgba: [u8; 4]) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::from_pixel(w, h, image::Rgba(rgba))
            .save(&path)
            .unwrap();
        path
    }

    fn args(a: PathBuf, b: PathBuf) -> CompareArgs {
        CompareArgs {
            a,
            b,
            average: false,
            tolerance: None,
            threshold: None,
        }
    }

    #[test]
    fn test_compare_similar_pixels() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.png", 4, 4, [10, 10, 10, 255]);
        let b = write(dir.path(), "b.png", 4, 4, [13, 13, 13, 255]);

        let result = run(args(a, b), &Printer::new(false)).unwrap();
        assert!(result.similar);
    }

    #[test]
    fn test_compare_size_mismatch() {
        let dir = tempdir().unwrap();
        let a = write(dir.path(), "a.png", 4, 4, [10, 10, 10, 255]);
        let b = write(dir.path(), "b.png", 4, 5, [10, 10, 10, 255]);

        let result = run(args(a, b), &Printer::new(false)).unwrap();
        assert!(!result.similar);
        assert_eq!(result.detail, ComparisonDetail::DimensionMismatch);
    }

    #[test]
    fn test_options_from_flags() {
        let mut a = args(PathBuf::from("a.png"), PathBuf::from("b.png"));
        a.average = true;
        a.tolerance = Some(3.0);
        let options = a.options();
        assert_eq!(options.mode, CompareMode::Average);
        assert_eq!(options.average_tolerance, 3.0);
        assert_eq!(options.pixel_tolerance, 10.0);

        a.average = false;
        a.threshold = Some(0.5);
        let options = a.options();
        assert_eq!(options.mode, CompareMode::Pixel);
        assert_eq!(options.pixel_tolerance, 3.0);
        assert_eq!(options.pixel_match_threshold, 0.5);
    }
}
