// Synthetic RGBA scenes for tests. Every generator is deterministic for a given seed.

use crate::core_modules::utils::image_helper::image_helper::encode_png;

/// Base colour of the synthetic leaf: hue ~100°, saturation 0.5, value 0.5.
pub const LEAF_GREEN: [u8; 3] = [85, 128, 64];
/// Bluish background that never falls in the foliage band, even with jitter.
pub const BACKGROUND_BLUE: [u8; 3] = [70, 90, 180];

/// xorshift64* generator; plenty for texture jitter.
pub struct Noise(u64);

impl Noise {
    pub fn new(seed: u64) -> Self {
        Noise(seed.max(1))
    }

    fn next(&mut self) -> u64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        self.0.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    /// Uniform integer in `[-amplitude, amplitude]`.
    pub fn jitter(&mut self, amplitude: i32) -> i32 {
        let span = (2 * amplitude + 1) as u64;
        (self.next() % span) as i32 - amplitude
    }
}

fn push_jittered(buffer: &mut Vec<u8>, rgb: [u8; 3], noise: &mut Noise, amplitude: i32) {
    for channel in rgb {
        buffer.push((channel as i32 + noise.jitter(amplitude)).clamp(0, 255) as u8);
    }
    buffer.push(255);
}

/// A centred green square covering roughly `leaf_fraction` of the frame on a blue
/// background, every channel jittered by up to ±16.
pub fn leaf_photo(width: u32, height: u32, leaf_fraction: f64, seed: u64) -> Vec<u8> {
    let side = ((width * height) as f64 * leaf_fraction).sqrt().round() as u32;
    let side = side.min(width).min(height);
    let left = (width - side) / 2;
    let top = (height - side) / 2;
    let mut noise = Noise::new(seed);

    let mut buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let inside = (left..left + side).contains(&x) && (top..top + side).contains(&y);
            let base = if inside { LEAF_GREEN } else { BACKGROUND_BLUE };
            push_jittered(&mut buffer, base, &mut noise, 16);
        }
    }
    buffer
}

pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let mut buffer = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..(width * height) {
        buffer.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
    }
    buffer
}

pub fn checkerboard(
    width: u32,
    height: u32,
    tile: u32,
    first: [u8; 3],
    second: [u8; 3],
) -> Vec<u8> {
    let mut buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let rgb = if (x / tile + y / tile) % 2 == 0 { first } else { second };
            buffer.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    buffer
}

/// 2x2 green dots on a 4-pixel lattice over a blue background: a quarter of the image
/// is green, yet no region is larger than four pixels.
pub fn speckles(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let rgb = if x % 4 < 2 && y % 4 < 2 { LEAF_GREEN } else { BACKGROUND_BLUE };
            buffer.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    buffer
}

pub fn png(width: u32, height: u32, buffer: &[u8]) -> Vec<u8> {
    encode_png(width, height, buffer).expect("synthetic image must encode")
}
