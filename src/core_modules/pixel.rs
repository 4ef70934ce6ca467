// THEORY (1D Pixel Heuristics):
// The `Pixel` module is the smallest unit of the leaf gate. It is a "dumb" data
// container for a single RGBA sample plus the heuristics that can be computed from
// that sample alone, with no knowledge of its neighbours. Anything that needs another
// pixel (gradients, connectivity) belongs to `color_features` or `blob_detector`.
//
// Heuristic families (all single-pixel):
// - Brightness:  luminance (Rec. 601 luma), the grayscale value the edge pass reads
// - Colour:      HSV triple with every component in [0, 1]
// - Palette:     12-bit code made of the top nibble of each channel
// - Foliage:     the greenish/yellowish band predicate that builds the leaf mask
//
// Alpha is carried through so a decoded RGBA buffer maps 1:1 onto pixels. The only
// place it matters is `visible`: a fully transparent pixel reads as black, the way a
// canvas hands it back.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Luminance = f64;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Value = f64;
    pub type PaletteCode = u16;

    /// Lower edge of the foliage hue band, in degrees. Includes yellow-green so that
    /// chlorotic or diseased tissue still counts.
    pub const FOLIAGE_HUE_MIN_DEGREES: Hue = 45.0;
    /// Upper edge of the foliage hue band, in degrees.
    pub const FOLIAGE_HUE_MAX_DEGREES: Hue = 160.0;
    pub const FOLIAGE_MIN_SATURATION: Saturation = 0.18;
    pub const FOLIAGE_MIN_VALUE: Value = 0.12;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
        pub alpha: Channel,
    }

    /// Hue, saturation and value, each normalized to [0, 1].
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Hsv {
        pub hue: Hue,
        pub saturation: Saturation,
        pub value: Value,
    }

    impl Hsv {
        pub fn hue_degrees(&self) -> Hue {
            self.hue * 360.0
        }

        /// The foliage band: hue in [45°, 160°], saturation >= 0.18, value >= 0.12.
        pub fn is_greenish(&self) -> bool {
            let degrees = self.hue_degrees();
            (FOLIAGE_HUE_MIN_DEGREES..=FOLIAGE_HUE_MAX_DEGREES).contains(&degrees)
                && self.saturation >= FOLIAGE_MIN_SATURATION
                && self.value >= FOLIAGE_MIN_VALUE
        }
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        pub fn opaque(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel::new(red, green, blue, Channel::MAX)
        }

        /// The colour the heuristics should see. Fully transparent pixels become
        /// transparent black, whatever RGB they happen to carry.
        pub fn visible(self) -> Self {
            if self.alpha == 0 { Pixel::default() } else { self }
        }

        /// Luminance estimate (Rec. 601 luma) on the 0..255 scale.
        pub fn luminance(&self) -> Luminance {
            0.299_f64 * self.red as f64
                + 0.587_f64 * self.green as f64
                + 0.114_f64 * self.blue as f64
        }

        /// Quantized colour bucket: the 4 most significant bits of each channel
        /// packed as `rrrr gggg bbbb`.
        pub fn palette_code(&self) -> PaletteCode {
            ((self.red >> 4) as PaletteCode) << 8
                | ((self.green >> 4) as PaletteCode) << 4
                | (self.blue >> 4) as PaletteCode
        }

        /// Standard max/min/delta HSV conversion. Hue is 0 when the pixel is achromatic.
        pub fn hsv(&self) -> Hsv {
            let red = self.red as f64 / 255.0;
            let green = self.green as f64 / 255.0;
            let blue = self.blue as f64 / 255.0;

            let maximum_channel = red.max(green.max(blue));
            let minimum_channel = red.min(green.min(blue));
            let delta = maximum_channel - minimum_channel;

            let hue = if delta == 0.0 {
                0.0
            } else {
                let (base_difference, sector_offset) = if maximum_channel == red {
                    ((green - blue) / delta, if green < blue { 6.0 } else { 0.0 })
                } else if maximum_channel == green {
                    ((blue - red) / delta, 2.0)
                } else {
                    ((red - green) / delta, 4.0)
                };
                (base_difference + sector_offset) / 6.0
            };

            let saturation = if maximum_channel == 0.0 {
                0.0
            } else {
                delta / maximum_channel
            };

            Hsv {
                hue,
                saturation,
                value: maximum_channel,
            }
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::new(red, green, blue, alpha)
        }
    }
}
