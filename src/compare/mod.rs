//! General image comparison.
//!
//! Two modes, both looser than the duplicate finder's per-channel rule:
//!
//! - **Pixel**: a pixel matches when the Euclidean RGBA distance is within
//!   `pixel_tolerance`; the images are similar when the matching fraction
//!   reaches `pixel_match_threshold`.
//! - **Average**: compare mean R, G, B, A of each image; similar when the
//!   mean of the four absolute differences is within `average_tolerance`.

use serde::{Deserialize, Serialize};

use crate::types::PixelBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    #[default]
    Pixel,
    Average,
}

/// Comparison settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareOptions {
    pub mode: CompareMode,
    /// Maximum Euclidean RGBA distance for a pixel to count as matching.
    pub pixel_tolerance: f64,
    /// Fraction of pixels (0-1) that must match.
    pub pixel_match_threshold: f64,
    /// Maximum mean channel difference in average mode.
    pub average_tolerance: f64,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            mode: CompareMode::Pixel,
            pixel_tolerance: 10.0,
            pixel_match_threshold: 0.95,
            average_tolerance: 15.0,
        }
    }
}

/// Per-channel absolute differences of the mean colours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageDifference {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
    /// Mean of the four channel differences.
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComparisonDetail {
    DimensionMismatch,
    Pixel { match_fraction: f64 },
    Average(AverageDifference),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Comparison {
    pub similar: bool,
    pub detail: ComparisonDetail,
}

/// Compare two images with the given options.
pub fn compare(a: &PixelBuffer, b: &PixelBuffer, options: &CompareOptions) -> Comparison {
    if a.width() != b.width() || a.height() != b.height() {
        return Comparison {
            similar: false,
            detail: ComparisonDetail::DimensionMismatch,
        };
    }

    match options.mode {
        CompareMode::Pixel => compare_pixels(a, b, options),
        CompareMode::Average => compare_average(a, b, options.average_tolerance),
    }
}

fn compare_pixels(a: &PixelBuffer, b: &PixelBuffer, options: &CompareOptions) -> Comparison {
    let total = a.pixel_count();
    if total == 0 {
        return Comparison {
            similar: true,
            detail: ComparisonDetail::Pixel { match_fraction: 1.0 },
        };
    }

    let tolerance_sq = options.pixel_tolerance * options.pixel_tolerance;
    let matching = a
        .pixels()
        .zip(b.pixels())
        .filter(|(p, q)| {
            let dist_sq: f64 = p
                .iter()
                .zip(q.iter())
                .map(|(x, y)| {
                    let d = *x as f64 - *y as f64;
                    d * d
                })
                .sum();
            dist_sq <= tolerance_sq
        })
        .count();

    let match_fraction = matching as f64 / total as f64;
    Comparison {
        similar: match_fraction >= options.pixel_match_threshold,
        detail: ComparisonDetail::Pixel { match_fraction },
    }
}

/// Mean RGBA of a buffer. Zero for an empty buffer.
pub fn average_colour(pixels: &PixelBuffer) -> [f64; 4] {
    let count = pixels.pixel_count();
    if count == 0 {
        return [0.0; 4];
    }

    let mut sums = [0u64; 4];
    for px in pixels.pixels() {
        for (sum, channel) in sums.iter_mut().zip(px) {
            *sum += *channel as u64;
        }
    }
    sums.map(|s| s as f64 / count as f64)
}

fn compare_average(a: &PixelBuffer, b: &PixelBuffer, tolerance: f64) -> Comparison {
    let avg_a = average_colour(a);
    let avg_b = average_colour(b);

    let r = (avg_a[0] - avg_b[0]).abs();
    let g = (avg_a[1] - avg_b[1]).abs();
    let bl = (avg_a[2] - avg_b[2]).abs();
    let al = (avg_a[3] - avg_b[3]).abs();
    let total = (r + g + bl + al) / 4.0;

    Comparison {
        similar: total <= tolerance,
        detail: ComparisonDetail::Average(AverageDifference {
            r,
            g,
            b: bl,
            a: al,
            total,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_first_pixel(base: [u8; 4], first: [u8; 4], w: u32, h: u32) -> PixelBuffer {
        let mut data = PixelBuffer::filled(w, h, base).into_bytes();
        data[..4].copy_from_slice(&first);
        PixelBuffer::new(w, h, data).unwrap()
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = PixelBuffer::filled(2, 2, [0; 4]);
        let b = PixelBuffer::filled(2, 3, [0; 4]);
        let result = compare(&a, &b, &CompareOptions::default());
        assert!(!result.similar);
        assert_eq!(result.detail, ComparisonDetail::DimensionMismatch);
    }

    #[test]
    fn test_pixel_mode_identical() {
        let a = PixelBuffer::filled(4, 4, [10, 20, 30, 255]);
        let result = compare(&a, &a.clone(), &CompareOptions::default());
        assert!(result.similar);
        assert_eq!(result.detail, ComparisonDetail::Pixel { match_fraction: 1.0 });
    }

    #[test]
    fn test_pixel_mode_euclidean_tolerance() {
        // Distance sqrt(6^2 + 8^2) = 10: exactly at tolerance.
        let a = PixelBuffer::filled(1, 1, [0, 0, 0, 255]);
        let b = PixelBuffer::filled(1, 1, [6, 8, 0, 255]);
        assert!(compare(&a, &b, &CompareOptions::default()).similar);

        let c = PixelBuffer::filled(1, 1, [6, 9, 0, 255]);
        assert!(!compare(&a, &c, &CompareOptions::default()).similar);
    }

    #[test]
    fn test_pixel_mode_threshold() {
        // 1 of 20 pixels off: 95% match, meets the default threshold.
        let a = PixelBuffer::filled(5, 4, [0, 0, 0, 255]);
        let b = with_first_pixel([0, 0, 0, 255], [255, 255, 255, 255], 5, 4);
        let result = compare(&a, &b, &CompareOptions::default());
        assert!(result.similar);
        assert_eq!(result.detail, ComparisonDetail::Pixel { match_fraction: 0.95 });

        // 1 of 16 off: 93.75%, below threshold.
        let a = PixelBuffer::filled(4, 4, [0, 0, 0, 255]);
        let b = with_first_pixel([0, 0, 0, 255], [255, 255, 255, 255], 4, 4);
        assert!(!compare(&a, &b, &CompareOptions::default()).similar);
    }

    #[test]
    fn test_average_mode() {
        let options = CompareOptions {
            mode: CompareMode::Average,
            ..CompareOptions::default()
        };
        let a = PixelBuffer::filled(2, 2, [100, 100, 100, 255]);
        let b = PixelBuffer::filled(2, 2, [120, 100, 80, 255]);
        let result = compare(&a, &b, &options);

        // (20 + 0 + 20 + 0) / 4 = 10
        assert!(result.similar);
        match result.detail {
            ComparisonDetail::Average(diff) => {
                assert_eq!(diff.r, 20.0);
                assert_eq!(diff.g, 0.0);
                assert_eq!(diff.b, 20.0);
                assert_eq!(diff.a, 0.0);
                assert_eq!(diff.total, 10.0);
            }
            other => panic!("expected average detail, got {:?}", other),
        }
    }

    #[test]
    fn test_average_mode_outside_tolerance() {
        let options = CompareOptions {
            mode: CompareMode::Average,
            average_tolerance: 5.0,
            ..CompareOptions::default()
        };
        let a = PixelBuffer::filled(2, 2, [100, 100, 100, 255]);
        let b = PixelBuffer::filled(2, 2, [120, 100, 80, 255]);
        assert!(!compare(&a, &b, &options).similar);
    }

    #[test]
    fn test_average_hides_local_difference() {
        // One black pixel among 100 grey ones barely moves the mean.
        let a = PixelBuffer::filled(10, 10, [128, 128, 128, 255]);
        let b = with_first_pixel([128, 128, 128, 255], [0, 0, 0, 255], 10, 10);
        let options = CompareOptions {
            mode: CompareMode::Average,
            average_tolerance: 1.0,
            ..CompareOptions::default()
        };
        assert!(compare(&a, &b, &options).similar);
    }

    #[test]
    fn test_empty_buffers_are_similar() {
        let a = PixelBuffer::new(0, 0, vec![]).unwrap();
        assert!(compare(&a, &a.clone(), &CompareOptions::default()).similar);
        assert_eq!(average_colour(&a), [0.0; 4]);
    }
}
