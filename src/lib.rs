// THEORY:
// This file is the main entry point for the `leaf_gate` library crate. The gate is a
// cheap, explainable pre-filter that sits in front of a plant-disease classifier: given
// the bytes of an uploaded image it decides, from colour, connectivity and texture
// statistics alone, whether the image plausibly shows a single plant leaf.
//
// The public surface is deliberately small:
// - `validate` / `LeafGate::validate` for the yes/no verdict with a localized reason.
// - `LeafGate::analyze` for the full diagnostic breakdown behind a verdict.
// - `ValidationPool` for validating many uploads concurrently from async code.
// The stage implementations live in `core_modules` and are public for diagnostics, but
// callers should not need them.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::GateConfig;
pub use core_modules::verdict::{Locale, RejectReason, ValidationVerdict};
pub use error::{GateError, Result};
pub use parallel_pipeline::ValidationPool;
pub use pipeline::{Analysis, Inspection, LeafGate};

/// Validates `image_bytes` with the default configuration.
pub fn validate(image_bytes: &[u8]) -> ValidationVerdict {
    LeafGate::default().validate(image_bytes)
}
