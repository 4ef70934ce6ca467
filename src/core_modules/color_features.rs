// THEORY:
// The `color_features` module is the Feature Extractor. It walks the `PixelGrid` once
// and builds everything the decision engine needs to know about colour and texture.
//
// Key architectural principles:
// 1.  **Single Pass**: One loop over the pixels fills the parallel per-pixel buffers
//     (`gray`, `green_mask`), the palette histogram, the running channel moments and
//     the masked hue samples. Only the edge pass needs neighbours, so it runs second,
//     over the finished `gray` buffer.
// 2.  **Parallel Buffers**: `gray[i]` and `green_mask[i]` describe `grid.pixels()[i]`.
//     Their length is always `width * height`.
// 3.  **Masked Statistics**: Hue variation and edge density only ever look at greenish
//     pixels. Background texture must not make a flat illustration look like a leaf.
// 4.  **Order-Independent Aggregation**: Every aggregate is a commutative sum or count.
//     The result does not depend on visiting order, which keeps the pass safe to split.

use std::collections::HashMap;

use serde::Serialize;

use crate::core_modules::pixel::pixel::{Hue, Luminance, PaletteCode};
use crate::core_modules::pixel_grid::PixelGrid;

/// Every channel's standard deviation below this marks a near-flat image.
pub const UNIFORM_CHANNEL_STD: f64 = 6.0;
/// Floor on the number of distinct palette buckets a photo is expected to show.
pub const MIN_PALETTE_BINS: usize = 32;
/// One extra expected bucket per this many pixels.
pub const PIXELS_PER_EXPECTED_BIN: usize = 3000;
/// How many of the most frequent palette buckets `top_share` sums.
pub const TOP_PALETTE_BINS: usize = 5;
/// Masked hue spread (hue in [0, 1]) below this is suspiciously flat.
pub const MIN_HUE_STD: f64 = 0.02;
/// Gradient magnitude above which an interior masked pixel counts as an edge.
pub const EDGE_GRADIENT_THRESHOLD: f64 = 10.0;

/// Per-pixel buffers and raw aggregates from the extraction pass.
#[derive(Debug, Clone)]
pub struct FeatureBuffers {
    pub width: u32,
    pub height: u32,
    /// BT.601 luma per pixel, 0..255.
    pub gray: Vec<Luminance>,
    /// True where the pixel falls in the foliage band.
    pub green_mask: Vec<bool>,
    pub green_pixel_count: usize,
    /// Hue in [0, 1] of every masked pixel, and of masked pixels only.
    pub masked_hues: Vec<Hue>,
    /// Occurrences per 12-bit palette code.
    pub palette: HashMap<PaletteCode, u32>,
    /// Population mean of R, G, B.
    pub channel_means: [f64; 3],
    /// Population standard deviation of R, G, B.
    pub channel_stds: [f64; 3],
}

/// The scalar signals derived from a `FeatureBuffers`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub total_pixels: usize,
    pub green_ratio: f64,
    pub channel_means: [f64; 3],
    pub channel_stds: [f64; 3],
    pub is_very_uniform: bool,
    pub unique_bin_count: usize,
    pub min_expected_bins: usize,
    pub palette_too_small: bool,
    pub top_share: f64,
    /// `None` when no pixel is masked.
    pub hue_std: Option<f64>,
    /// `None` when no pixel is masked; the signal is then undefined.
    pub hue_std_too_low: Option<bool>,
    pub edge_density: f64,
}

impl FeatureBuffers {
    /// Runs the single extraction pass over `grid`.
    pub fn extract(grid: &PixelGrid) -> Self {
        let total = grid.total_pixels();
        let mut gray = Vec::with_capacity(total);
        let mut green_mask = Vec::with_capacity(total);
        let mut masked_hues = Vec::new();
        let mut palette: HashMap<PaletteCode, u32> = HashMap::new();
        let mut green_pixel_count = 0usize;
        let mut sums = [0.0f64; 3];
        let mut sums_of_squares = [0.0f64; 3];

        for pixel in grid.pixels().iter().map(|pixel| pixel.visible()) {
            gray.push(pixel.luminance());
            *palette.entry(pixel.palette_code()).or_insert(0) += 1;

            for (channel, value) in [pixel.red, pixel.green, pixel.blue].into_iter().enumerate() {
                let value = value as f64;
                sums[channel] += value;
                sums_of_squares[channel] += value * value;
            }

            let hsv = pixel.hsv();
            let is_green = hsv.is_greenish();
            if is_green {
                green_pixel_count += 1;
                masked_hues.push(hsv.hue);
            }
            green_mask.push(is_green);
        }

        let mut channel_means = [0.0f64; 3];
        let mut channel_stds = [0.0f64; 3];
        if total > 0 {
            let n = total as f64;
            for channel in 0..3 {
                let mean = sums[channel] / n;
                let mean_of_squares = sums_of_squares[channel] / n;
                channel_means[channel] = mean;
                channel_stds[channel] = (mean_of_squares - mean * mean).max(0.0).sqrt();
            }
        }

        Self {
            width: grid.width(),
            height: grid.height(),
            gray,
            green_mask,
            green_pixel_count,
            masked_hues,
            palette,
            channel_means,
            channel_stds,
        }
    }

    pub fn total_pixels(&self) -> usize {
        self.gray.len()
    }

    pub fn green_ratio(&self) -> f64 {
        ratio(self.green_pixel_count, self.total_pixels())
    }

    pub fn is_very_uniform(&self) -> bool {
        self.channel_stds.iter().all(|&std| std < UNIFORM_CHANNEL_STD)
    }

    pub fn min_expected_bins(&self) -> usize {
        MIN_PALETTE_BINS.max(self.total_pixels() / PIXELS_PER_EXPECTED_BIN)
    }

    pub fn palette_too_small(&self) -> bool {
        self.palette.len() < self.min_expected_bins()
    }

    /// Share of all pixels that fall in the five most frequent palette buckets.
    pub fn top_share(&self) -> f64 {
        let mut counts: Vec<u32> = self.palette.values().copied().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let top: usize = counts.iter().take(TOP_PALETTE_BINS).map(|&count| count as usize).sum();
        ratio(top, self.total_pixels())
    }

    /// Population standard deviation of the masked hues.
    pub fn hue_std(&self) -> Option<f64> {
        if self.masked_hues.is_empty() {
            return None;
        }
        let n = self.masked_hues.len() as f64;
        let mean = self.masked_hues.iter().sum::<f64>() / n;
        let variance = self.masked_hues.iter().map(|hue| (hue - mean).powi(2)).sum::<f64>() / n;
        Some(variance.sqrt())
    }

    /// Fraction of interior masked pixels whose 4-neighbour gradient exceeds the edge
    /// threshold. The one-pixel border never participates. Zero when nothing qualifies.
    pub fn edge_density(&self) -> f64 {
        let width = self.width as usize;
        let height = self.height as usize;
        if width < 3 || height < 3 {
            return 0.0;
        }

        let mut edge_count = 0usize;
        let mut interior_count = 0usize;
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let index = y * width + x;
                if !self.green_mask[index] {
                    continue;
                }
                interior_count += 1;

                let center = self.gray[index];
                let magnitude = (self.gray[index + 1] - center).abs()
                    + (center - self.gray[index - 1]).abs()
                    + (self.gray[index + width] - center).abs()
                    + (center - self.gray[index - width]).abs();
                if magnitude > EDGE_GRADIENT_THRESHOLD {
                    edge_count += 1;
                }
            }
        }

        ratio(edge_count, interior_count)
    }

    pub fn summarize(&self) -> FeatureSummary {
        let hue_std = self.hue_std();
        FeatureSummary {
            total_pixels: self.total_pixels(),
            green_ratio: self.green_ratio(),
            channel_means: self.channel_means,
            channel_stds: self.channel_stds,
            is_very_uniform: self.is_very_uniform(),
            unique_bin_count: self.palette.len(),
            min_expected_bins: self.min_expected_bins(),
            palette_too_small: self.palette_too_small(),
            top_share: self.top_share(),
            hue_std,
            hue_std_too_low: hue_std.map(|std| std < MIN_HUE_STD),
            edge_density: self.edge_density(),
        }
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;

    fn solid(width: u32, height: u32, pixel: Pixel) -> PixelGrid {
        PixelGrid::new(width, height, vec![pixel; (width * height) as usize])
    }

    #[test]
    fn buffers_are_parallel_to_the_grid() {
        let grid = solid(7, 5, Pixel::opaque(60, 160, 60));
        let features = FeatureBuffers::extract(&grid);

        assert_eq!(features.gray.len(), 35);
        assert_eq!(features.green_mask.len(), 35);
        assert_eq!(features.total_pixels(), 35);
    }

    #[test]
    fn fully_transparent_foliage_is_not_masked() {
        let grid = solid(100, 100, Pixel::new(60, 160, 60, 0));
        let summary = FeatureBuffers::extract(&grid).summarize();

        assert_eq!(summary.green_ratio, 0.0);
        assert_eq!(summary.channel_means, [0.0, 0.0, 0.0]);
        assert_eq!(summary.hue_std, None);
    }

    #[test]
    fn solid_green_is_fully_masked_and_flat() {
        let grid = solid(100, 100, Pixel::opaque(60, 160, 60));
        let summary = FeatureBuffers::extract(&grid).summarize();

        assert_eq!(summary.green_ratio, 1.0);
        assert!(summary.is_very_uniform);
        assert_eq!(summary.unique_bin_count, 1);
        assert!(summary.palette_too_small);
        assert_eq!(summary.top_share, 1.0);
        assert!(summary.hue_std.unwrap() < 1e-9);
        assert_eq!(summary.hue_std_too_low, Some(true));
        assert_eq!(summary.edge_density, 0.0);
        assert_eq!(summary.channel_means, [60.0, 160.0, 60.0]);
    }

    #[test]
    fn unmasked_pixels_never_contribute_hue() {
        let grid = solid(20, 20, Pixel::opaque(200, 30, 30));
        let summary = FeatureBuffers::extract(&grid).summarize();

        assert_eq!(summary.green_ratio, 0.0);
        assert_eq!(summary.hue_std, None);
        assert_eq!(summary.hue_std_too_low, None);
        assert_eq!(summary.edge_density, 0.0);
    }

    #[test]
    fn channel_moments_are_population_statistics() {
        // Half black, half white in the red channel only.
        let mut pixels = vec![Pixel::opaque(0, 0, 0); 50];
        pixels.extend(vec![Pixel::opaque(200, 0, 0); 50]);
        let features = FeatureBuffers::extract(&PixelGrid::new(10, 10, pixels));

        assert!((features.channel_means[0] - 100.0).abs() < 1e-9);
        assert!((features.channel_stds[0] - 100.0).abs() < 1e-9);
        assert_eq!(features.channel_stds[1], 0.0);
        assert!(!features.is_very_uniform());
    }

    #[test]
    fn expected_bins_scale_with_pixel_count() {
        let small = FeatureBuffers::extract(&solid(100, 100, Pixel::default()));
        assert_eq!(small.min_expected_bins(), 32);

        let large = FeatureBuffers::extract(&solid(400, 300, Pixel::default()));
        assert_eq!(large.min_expected_bins(), 40);
    }

    #[test]
    fn top_share_sums_the_five_largest_buckets() {
        // Ten distinct buckets of 10 pixels each: the top five hold half the image.
        let pixels: Vec<Pixel> = (0..100u32)
            .map(|i| Pixel::opaque((i / 10 * 16) as u8, 0, 0))
            .collect();
        let features = FeatureBuffers::extract(&PixelGrid::new(10, 10, pixels));

        assert_eq!(features.palette.len(), 10);
        assert!((features.top_share() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn hue_std_is_computed_over_masked_pixels_only() {
        // Two greens at 90° and 150° plus red pixels that must be ignored.
        let green_a = Pixel::opaque(128, 255, 0);
        let green_b = Pixel::opaque(0, 255, 128);
        let red = Pixel::opaque(255, 0, 0);
        let pixels = vec![green_a, green_b, red, red];
        let features = FeatureBuffers::extract(&PixelGrid::new(2, 2, pixels));

        assert_eq!(features.masked_hues.len(), 2);
        let std = features.hue_std().unwrap();
        let expected = (features.masked_hues[0] - features.masked_hues[1]).abs() / 2.0;
        assert!((std - expected).abs() < 1e-12);
        assert!(std > MIN_HUE_STD);
    }

    #[test]
    fn edge_density_ignores_the_border_and_unmasked_pixels() {
        // 5x5 green grid with one bright green pixel in the centre.
        let dark = Pixel::opaque(30, 120, 30);
        let bright = Pixel::opaque(120, 250, 120);
        let mut pixels = vec![dark; 25];
        pixels[12] = bright;
        let features = FeatureBuffers::extract(&PixelGrid::new(5, 5, pixels));

        // Interior is the 3x3 block. The centre and its four neighbours see the jump,
        // the four corners do not.
        let density = features.edge_density();
        assert!((density - 5.0 / 9.0).abs() < 1e-12, "density was {density}");
    }

    #[test]
    fn edge_density_is_zero_without_interior() {
        let features = FeatureBuffers::extract(&solid(2, 50, Pixel::opaque(60, 160, 60)));
        assert_eq!(features.edge_density(), 0.0);
    }
}
