//! Owned RGBA8 pixel buffers.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TileError};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// An owned, row-major RGBA8 pixel buffer.
///
/// `width * height * 4 == data.len()` holds for every value of this type;
/// the constructors refuse anything else. There are no mutable accessors, so
/// a buffer handed to a tile or a worker stays as it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPixels", into = "RawPixels")]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, checking the length against the dimensions.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL))
            .ok_or_else(|| {
                TileError::config(
                    format!("A {}x{} RGBA buffer is too large to address", width, height),
                    "Check the image dimensions",
                )
            })?;
        if data.len() != expected {
            return Err(TileError::Config {
                message: format!(
                    "Pixel data is {} bytes but a {}x{} RGBA buffer needs {}",
                    data.len(),
                    width,
                    height,
                    expected
                ),
                help: Some("Pixel data must be RGBA8, 4 bytes per pixel, row-major".to_string()),
            });
        }
        Ok(Self { width, height, data })
    }

    /// A buffer filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut data = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (not bytes).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw RGBA bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// The RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// The pixel at `(width / 2, height / 2)`.
    pub fn center(&self) -> Option<[u8; 4]> {
        self.pixel(self.width / 2, self.height / 2)
    }

    /// Iterate over pixels in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(BYTES_PER_PIXEL)
    }

    /// Returns true if every pixel has alpha == 0.
    pub fn is_fully_transparent(&self) -> bool {
        self.pixels().all(|p| p[3] == 0)
    }

    /// Copy a rectangular region into a new buffer.
    ///
    /// The region is clipped to the buffer, so a request that runs past the
    /// right or bottom edge yields a smaller buffer rather than padding.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> PixelBuffer {
        let w = width.min(self.width.saturating_sub(x));
        let h = height.min(self.height.saturating_sub(y));

        let row_bytes = w as usize * BYTES_PER_PIXEL;
        let mut data = Vec::with_capacity(row_bytes * h as usize);
        for row in 0..h {
            let start = ((y + row) as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }

        PixelBuffer {
            width: w,
            height: h,
            data,
        }
    }

    /// Convert into an `image` crate buffer for encoding.
    pub fn to_image(&self) -> RgbaImage {
        // Length is guaranteed by construction, so from_raw cannot fail.
        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

/// Serialised form shared with the worker message contracts.
#[derive(Serialize, Deserialize)]
struct RawPixels {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl TryFrom<RawPixels> for PixelBuffer {
    type Error = TileError;

    fn try_from(raw: RawPixels) -> Result<Self> {
        PixelBuffer::new(raw.width, raw.height, raw.data)
    }
}

impl From<PixelBuffer> for RawPixels {
    fn from(buf: PixelBuffer) -> Self {
        RawPixels {
            width: buf.width,
            height: buf.height,
            data: buf.data,
        }
    }
}
