pub mod image_helper {
    use std::io::Cursor;
    use std::path::Path;

    use image::codecs::png::PngEncoder;
    use image::{ExtendedColorType, ImageEncoder};

    /// Encodes a tightly packed RGBA buffer as PNG bytes.
    pub fn encode_png(
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> Result<Vec<u8>, image::error::ImageError> {
        let mut output = Cursor::new(Vec::new());
        let encoder = PngEncoder::new(&mut output);

        encoder.write_image(buffer, width, height, ExtendedColorType::Rgba8)?;

        Ok(output.into_inner())
    }

    /// Writes a boolean mask as a black/white grayscale PNG. Masked pixels are white.
    pub fn save_mask(
        path: &Path,
        width: u32,
        height: u32,
        mask: &[bool],
    ) -> Result<(), image::error::ImageError> {
        let buffer: Vec<u8> = mask.iter().map(|&set| if set { 255 } else { 0 }).collect();
        let output = std::fs::File::create(path)?;
        let encoder = PngEncoder::new(output);

        encoder.write_image(&buffer, width, height, ExtendedColorType::L8)?;

        Ok(())
    }
}
