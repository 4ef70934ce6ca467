// THEORY:
// The `PixelGrid` module is the Decoder/Downscaler stage. It turns arbitrary image bytes
// into a bounded, immutable rectangle of `Pixel`s that every later stage reads.
//
// Key architectural principles:
// 1.  **Bounded Work**: Everything downstream is O(pixel count), and the heuristics do
//     not get better above ~256 px on the long edge. So the grid is resampled (bilinear
//     by default) until `max(width, height) <= max_edge`, with aspect ratio preserved.
//     Images that already fit are never resampled.
// 2.  **Scoped Resources**: The decoder's intermediate buffers are owned values. They are
//     dropped when `decode` returns, on the success path and on every `?` alike.
// 3.  **Resource Limits**: The decoder runs under `image::Limits`. A limit breach and a
//     failed buffer reservation are both surfaced as `RenderSurface` errors, kept apart
//     from malformed input (`Decode`). The header is read first: a header that cannot
//     be read, or that declares far more pixels than the input could ever encode, is
//     malformed input and never reaches the allocator.
// 4.  **Data Container**: Like the `Pixel` it holds, a `PixelGrid` is "dumb". It knows its
//     geometry and nothing about leaves.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Limits};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GateConfig;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{GateError, Result};

/// Upper bound on decoded pixels per byte of input. Real codecs stay orders of
/// magnitude below it. Garbage behind a valid magic number does not.
pub const MAX_PIXELS_PER_INPUT_BYTE: u64 = 1 << 16;

/// Resampling quality used when an image must be shrunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeQuality {
    /// Triangle (bilinear).
    #[default]
    Fast,
    /// CatmullRom (bicubic).
    High,
}

impl ResizeQuality {
    pub fn filter(self) -> FilterType {
        match self {
            ResizeQuality::Fast => FilterType::Triangle,
            ResizeQuality::High => FilterType::CatmullRom,
        }
    }
}

/// An immutable `width x height` grid of pixels in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// Wraps an existing pixel vector. A length that disagrees with the dimensions is
    /// a programming error.
    pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel count does not match {}x{} grid",
            width,
            height
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Decodes raw image bytes and downscales the result to fit `config.max_edge`.
    pub fn decode(bytes: &[u8], config: &GateConfig) -> Result<Self> {
        if bytes.is_empty() {
            return Err(GateError::EmptyInput);
        }
        if bytes.len() > config.max_input_bytes {
            return Err(GateError::InputTooLarge {
                size: bytes.len(),
                limit: config.max_input_bytes,
            });
        }

        check_declared_dimensions(bytes)?;

        let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let mut limits = Limits::default();
        limits.max_alloc = Some(config.max_decode_alloc);
        reader.limits(limits);

        let decoded = reader.decode().map_err(GateError::from_image)?;
        Self::from_image(&decoded, config.max_edge, config.resize_quality)
    }

    /// Converts an already-decoded image, downscaling it when its long edge exceeds `max_edge`.
    pub fn from_image(image: &DynamicImage, max_edge: u32, quality: ResizeQuality) -> Result<Self> {
        let (source_width, source_height) = (image.width(), image.height());
        if source_width == 0 || source_height == 0 {
            return Err(GateError::EmptyInput);
        }

        let (width, height) = downscaled_dimensions(source_width, source_height, max_edge);
        let rgba = if (width, height) == (source_width, source_height) {
            image.to_rgba8()
        } else {
            image.resize_exact(width, height, quality.filter()).to_rgba8()
        };

        let total = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(total)
            .map_err(|error| GateError::RenderSurface {
                message: error.to_string(),
            })?;
        pixels.extend(rgba.pixels().map(|rgba| Pixel::from(*rgba)));

        debug!(
            source_width,
            source_height, width, height, "decoded image into pixel grid"
        );
        Ok(Self::new(width, height, pixels))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn total_pixels(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }
}

/// Reads only the header and checks that the declared size is plausible for `bytes`.
fn check_declared_dimensions(bytes: &[u8]) -> Result<()> {
    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()
        .map_err(GateError::Decode)?;

    let declared_pixels = u64::from(width) * u64::from(height);
    if declared_pixels > bytes.len() as u64 * MAX_PIXELS_PER_INPUT_BYTE {
        return Err(GateError::ImplausibleDimensions {
            width,
            height,
            size: bytes.len(),
        });
    }
    Ok(())
}

/// Target dimensions whose long edge is at most `max_edge`, aspect ratio preserved.
/// Neither edge collapses below one pixel.
pub fn downscaled_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let max_edge = max_edge.max(1);
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }

    let scale = max_edge as f64 / longest as f64;
    let scaled = |edge: u32| ((edge as f64 * scale).round() as u32).clamp(1, max_edge);
    (scaled(width), scaled(height))
}
