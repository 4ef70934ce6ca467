//! Configuration for the leaf gate.
//!
//! Only the decoding envelope and the presentation of reasons are tunable.
//! The heuristic thresholds themselves are product-tuned constants that live
//! next to the code that uses them (`color_features`, `decision`).
//!
//! ```no_run
//! use leaf_gate::GateConfig;
//! use std::path::Path;
//!
//! let config = GateConfig::from_json_file(Path::new("gate.json"))?;
//! # Ok::<(), leaf_gate::GateError>(())
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core_modules::pixel_grid::ResizeQuality;
use crate::core_modules::verdict::Locale;
use crate::error::Result;

/// Longest edge, in pixels, of the grid handed to feature extraction.
pub const DEFAULT_MAX_EDGE: u32 = 256;

/// Inputs larger than this are refused before decoding.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 50 * 1024 * 1024;

/// Allocation ceiling handed to the decoder.
pub const DEFAULT_MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Longest edge after downscaling. Aspect ratio is always preserved.
    pub max_edge: u32,

    /// Resampling filter used when downscaling.
    pub resize_quality: ResizeQuality,

    /// Byte ceiling for raw input.
    pub max_input_bytes: usize,

    /// Decoder allocation ceiling. Breaching it is reported as a surface
    /// allocation failure.
    pub max_decode_alloc: u64,

    /// Language of the end-user reason strings.
    pub locale: Locale,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_MAX_EDGE,
            resize_quality: ResizeQuality::Fast,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_decode_alloc: DEFAULT_MAX_DECODE_ALLOC,
            locale: Locale::English,
        }
    }
}

impl GateConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}
