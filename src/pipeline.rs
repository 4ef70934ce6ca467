// THEORY:
// The `pipeline` module is the top-level API of the leaf gate. It wires the four stages
// into one linear, synchronous computation per image:
//
//     bytes -> PixelGrid -> FeatureBuffers -> ComponentLabelingResult -> ValidationVerdict
//
// Key architectural principles:
// 1.  **Pure Function**: A `LeafGate` holds only its immutable config. Every buffer is
//     created fresh for one call and dropped at its end, so the same bytes always give
//     the same verdict and any number of threads may share one gate.
// 2.  **Short-Circuiting Guards**: The shape guard runs before feature extraction, and
//     the content guards run before the soft score. A stage that never ran leaves its
//     slot in `Analysis` empty.
// 3.  **Nothing Escapes**: `validate`/`inspect` fold every failure into a rejection
//     verdict. That covers decode errors, surface allocation errors and panics. The
//     caller only ever sees "valid" or "not valid, because ...".

use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::core_modules::blob_detector::blob_detector;
use crate::core_modules::color_features::{FeatureBuffers, FeatureSummary};
use crate::core_modules::decision::{self, SoftSignals, Stage};
use crate::core_modules::leaf_blob::ComponentLabelingResult;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::core_modules::verdict::{RejectReason, ValidationVerdict};
use crate::error::{ErrorKind, GateError, Result};

/// Everything a verdict was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub verdict: ValidationVerdict,
    /// The phase in which evaluation ended.
    pub stage: Stage,
    /// Dimensions of the analysed (downscaled) grid.
    pub width: u32,
    pub height: u32,
    pub features: Option<FeatureSummary>,
    pub components: Option<ComponentLabelingResult>,
    pub signals: Option<SoftSignals>,
    pub score: Option<u8>,
    /// The greenish mask, row-major, when feature extraction ran.
    #[serde(skip)]
    pub green_mask: Option<Vec<bool>>,
}

/// A verdict plus, when the image could be analysed, the analysis behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub verdict: ValidationVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
}

impl Inspection {
    pub fn fault(code: RejectReason, message: impl Into<String>) -> Self {
        Self {
            verdict: ValidationVerdict::fault(code, message),
            analysis: None,
        }
    }
}

/// The leaf admission gate.
#[derive(Debug, Clone, Default)]
pub struct LeafGate {
    config: GateConfig,
}

impl LeafGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decides whether `bytes` plausibly show a single plant leaf. Never fails.
    pub fn validate(&self, bytes: &[u8]) -> ValidationVerdict {
        self.inspect(bytes).verdict
    }

    /// Like `validate`, but keeps the analysis for diagnostics.
    pub fn inspect(&self, bytes: &[u8]) -> Inspection {
        self.guarded(|| self.analyze(bytes))
    }

    /// Decodes and analyses `bytes`. Decode and surface failures are returned as errors.
    pub fn analyze(&self, bytes: &[u8]) -> Result<Analysis> {
        let grid = PixelGrid::decode(bytes, &self.config)?;
        Ok(self.analyze_grid(&grid))
    }

    /// Runs the three decision phases over an already-decoded grid.
    pub fn analyze_grid(&self, grid: &PixelGrid) -> Analysis {
        let locale = self.config.locale;
        let (width, height) = (grid.width(), grid.height());

        // --- Phase 1: Shape Guards ---
        if let Some(rejection) = decision::check_shape(width, height) {
            info!(width, height, reason = ?rejection, "rejected by shape guard");
            return Analysis {
                verdict: ValidationVerdict::reject(rejection, locale),
                stage: Stage::ShapeGuard,
                width,
                height,
                features: None,
                components: None,
                signals: None,
                score: None,
                green_mask: None,
            };
        }

        // --- Feature Extraction & Labeling ---
        let buffers = FeatureBuffers::extract(grid);
        let features = buffers.summarize();
        let components = blob_detector::find_largest_component(&buffers.green_mask, width, height);
        debug!(
            green_ratio = features.green_ratio,
            largest_component_ratio = components.largest_component_ratio,
            component_count = components.component_count,
            top_share = features.top_share,
            edge_density = features.edge_density,
            hue_std = ?features.hue_std,
            "extracted leaf features"
        );

        // --- Phases 2 & 3: Content Guards, then Soft Score ---
        let outcome = decision::decide(&features, &components);
        let score = outcome.score();
        let verdict = match outcome.rejection {
            Some(rejection) => {
                info!(stage = ?outcome.stage, score, reason = ?rejection, "image rejected");
                ValidationVerdict::reject(rejection, locale)
            }
            None => {
                info!(score, "image accepted");
                ValidationVerdict::accept()
            }
        };

        Analysis {
            verdict,
            stage: outcome.stage,
            width,
            height,
            features: Some(features),
            components: Some(components),
            signals: outcome.signals,
            score,
            green_mask: Some(buffers.green_mask),
        }
    }

    /// Runs `analysis`, converting errors and panics into rejection verdicts.
    fn guarded<F>(&self, analysis: F) -> Inspection
    where
        F: FnOnce() -> Result<Analysis>,
    {
        match panic::catch_unwind(AssertUnwindSafe(analysis)) {
            Ok(Ok(analysis)) => Inspection {
                verdict: analysis.verdict.clone(),
                analysis: Some(analysis),
            },
            Ok(Err(error)) => {
                warn!(error = %error, "image could not be validated");
                Inspection::fault(fault_code(&error), error.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(%message, "validation panicked");
                Inspection::fault(RejectReason::InternalFault, message)
            }
        }
    }
}

fn fault_code(error: &GateError) -> RejectReason {
    match error.kind() {
        ErrorKind::Decode => RejectReason::DecodeFailure,
        ErrorKind::Resource => RejectReason::ResourceFailure,
        ErrorKind::Environment => RejectReason::InternalFault,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal error during validation".to_string()
    }
}
