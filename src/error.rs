//! Error types for the leaf gate.
//!
//! Only the decoder and the I/O edges can fail. Everything after a successful
//! decode is pure arithmetic over a bounded grid and never returns an error.

use thiserror::Error;

/// Result type alias for leaf gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

/// Coarse classification of a `GateError`, used to pick the reason code of a
/// rejection verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not a supported raster image.
    Decode,
    /// A decoding or analysis surface could not be allocated.
    Resource,
    /// File system or configuration problems outside the pipeline proper.
    Environment,
}

#[derive(Error, Debug)]
pub enum GateError {
    /// Input bytes could not be interpreted as a supported raster image.
    #[error("unsupported or corrupt image: {0}")]
    Decode(#[source] image::ImageError),

    /// The decoder refused to allocate, or the pixel buffer could not be reserved.
    #[error("could not allocate a drawing surface: {message}")]
    RenderSurface { message: String },

    /// The header parsed, but declares a canvas the input bytes could never encode.
    #[error("unsupported or corrupt image: {width}x{height} header in {size} bytes")]
    ImplausibleDimensions { width: u32, height: u32, size: usize },

    #[error("empty image data")]
    EmptyInput,

    #[error("image data too large: {size} bytes (limit {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl GateError {
    /// Maps a decoder failure onto the gate's taxonomy. Limit breaches are
    /// resource exhaustion, not malformed input.
    pub fn from_image(error: image::ImageError) -> Self {
        match error {
            image::ImageError::Limits(limit_error) => Self::RenderSurface {
                message: limit_error.to_string(),
            },
            other => Self::Decode(other),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::Decode(_)
            | GateError::ImplausibleDimensions { .. }
            | GateError::EmptyInput => ErrorKind::Decode,
            GateError::RenderSurface { .. } | GateError::InputTooLarge { .. } => {
                ErrorKind::Resource
            }
            GateError::Io(_) | GateError::Config(_) => ErrorKind::Environment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::error::{LimitError, LimitErrorKind};

    #[test]
    fn limit_errors_are_resource_failures() {
        let error = GateError::from_image(image::ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::InsufficientMemory,
        )));
        assert_eq!(error.kind(), ErrorKind::Resource);
        assert!(error.to_string().starts_with("could not allocate"));
    }

    #[test]
    fn oversized_input_is_a_resource_failure() {
        let error = GateError::InputTooLarge { size: 10, limit: 5 };
        assert_eq!(error.kind(), ErrorKind::Resource);
        assert_eq!(error.to_string(), "image data too large: 10 bytes (limit 5 bytes)");
    }

    #[test]
    fn implausible_header_is_a_decode_failure() {
        let error = GateError::ImplausibleDimensions {
            width: 25_120,
            height: 29_813,
            size: 21,
        };
        assert_eq!(error.kind(), ErrorKind::Decode);
        assert_eq!(
            error.to_string(),
            "unsupported or corrupt image: 25120x29813 header in 21 bytes"
        );
    }

    #[test]
    fn empty_input_is_a_decode_failure() {
        assert_eq!(GateError::EmptyInput.kind(), ErrorKind::Decode);
    }
}
