// THEORY:
// The `decision` module is the Decision Engine. It is not a long-lived state machine;
// it is a linear evaluation whose three phases each end in a determinate state.
//
// 1.  **Shape Guards** (image-level): too few pixels, or an aspect ratio no leaf photo
//     has. These run before any feature is extracted.
// 2.  **Content Guards** (mandatory): there must be a meaningful, cohesive greenish
//     object, and the image must not be a single flat green. These encode conditions
//     that are necessary for every real leaf photo.
// 3.  **Soft Score**: five independent weak signals vote, and a majority (3 of 5)
//     accepts. Diseased leaves legitimately fail one or two of them (odd hue, odd
//     texture), so unanimity is never required.
//
// A guard rejection short-circuits: the soft score is not computed and cannot
// override it. The five signals stay five literal named predicates. Their thresholds
// are product-tuned constants, not a learned weight vector.

use serde::Serialize;

use crate::core_modules::color_features::FeatureSummary;
use crate::core_modules::leaf_blob::ComponentLabelingResult;
use crate::core_modules::verdict::RejectReason;

// --- Shape guards ---
pub const MIN_TOTAL_PIXELS: usize = 8000;
pub const MAX_ASPECT_RATIO: f64 = 7.0;

// --- Content guards ---
pub const MIN_GREEN_RATIO: f64 = 0.18;
pub const MIN_LARGEST_COMPONENT_RATIO: f64 = 0.12;
pub const MAX_GREEN_RATIO: f64 = 0.995;

// --- Soft score ---
pub const MIN_EDGE_DENSITY: f64 = 0.015;
pub const MAX_EDGE_DENSITY: f64 = 0.60;
pub const MAX_TOP_SHARE: f64 = 0.70;
pub const ACCEPT_SCORE: u8 = 3;

/// The phase in which evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ShapeGuard,
    ContentGuard,
    SoftScore,
}

/// Phase 1. Returns the rejection, if any, for an image of the given dimensions.
pub fn check_shape(width: u32, height: u32) -> Option<RejectReason> {
    let total_pixels = width as usize * height as usize;
    if total_pixels < MIN_TOTAL_PIXELS {
        return Some(RejectReason::ImageTooSmall);
    }

    let long_edge = width.max(height) as f64;
    let short_edge = width.min(height).max(1) as f64;
    if long_edge / short_edge > MAX_ASPECT_RATIO {
        return Some(RejectReason::ExtremeAspectRatio);
    }

    None
}

/// Phase 2. Returns the rejection, if any, from the mandatory content guards.
pub fn check_content(
    features: &FeatureSummary,
    components: &ComponentLabelingResult,
) -> Option<RejectReason> {
    if features.green_ratio < MIN_GREEN_RATIO {
        return Some(RejectReason::LeafAreaTooSmall);
    }
    if components.largest_component_ratio < MIN_LARGEST_COMPONENT_RATIO {
        return Some(RejectReason::FragmentedLeaf);
    }
    if features.green_ratio > MAX_GREEN_RATIO {
        return Some(RejectReason::SingleColorDominant);
    }
    None
}

/// The five soft-score votes, one field per signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SoftSignals {
    /// Enough green, in one dominant region. Always true once the content guards pass.
    pub green_coverage_adequate: bool,
    /// Not near-flat, or at least a photo-sized palette.
    pub color_variety: bool,
    /// No edges at all, or a natural amount of them.
    pub edge_density_plausible: bool,
    /// Masked hue varies, or there were no masked hues to judge.
    pub hue_variation_plausible: bool,
    /// The five commonest colours do not dominate the image.
    pub palette_not_concentrated: bool,
}

impl SoftSignals {
    pub fn evaluate(features: &FeatureSummary, components: &ComponentLabelingResult) -> Self {
        let edge_density = features.edge_density;
        Self {
            green_coverage_adequate: features.green_ratio >= MIN_GREEN_RATIO
                && components.largest_component_ratio >= MIN_LARGEST_COMPONENT_RATIO,
            color_variety: !features.is_very_uniform || !features.palette_too_small,
            edge_density_plausible: edge_density == 0.0
                || (MIN_EDGE_DENSITY..=MAX_EDGE_DENSITY).contains(&edge_density),
            hue_variation_plausible: features.hue_std_too_low != Some(true),
            palette_not_concentrated: features.top_share <= MAX_TOP_SHARE,
        }
    }

    pub fn score(&self) -> u8 {
        [
            self.green_coverage_adequate,
            self.color_variety,
            self.edge_density_plausible,
            self.hue_variation_plausible,
            self.palette_not_concentrated,
        ]
        .into_iter()
        .filter(|&vote| vote)
        .count() as u8
    }

    pub fn accepts(&self) -> bool {
        self.score() >= ACCEPT_SCORE
    }

    /// The single most specific reason among the failed signals.
    pub fn rejection_reason(&self, features: &FeatureSummary) -> RejectReason {
        if !self.green_coverage_adequate {
            return RejectReason::FragmentedLeaf;
        }
        if !self.color_variety && features.is_very_uniform {
            return RejectReason::UniformColor;
        }
        if (!self.color_variety && features.palette_too_small) || !self.palette_not_concentrated {
            return RejectReason::IconLikePalette;
        }
        if !self.edge_density_plausible && features.edge_density > MAX_EDGE_DENSITY {
            return RejectReason::HardEdges;
        }
        if !self.edge_density_plausible || !self.hue_variation_plausible {
            return RejectReason::FlatTexture;
        }
        RejectReason::NoLeafCharacteristics
    }
}

/// The outcome of phases 2 and 3.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub stage: Stage,
    /// Present only when the soft score ran.
    pub signals: Option<SoftSignals>,
    pub rejection: Option<RejectReason>,
}

impl Decision {
    pub fn score(&self) -> Option<u8> {
        self.signals.as_ref().map(SoftSignals::score)
    }
}

/// Runs the content guards and, only if they pass, the soft score.
pub fn decide(features: &FeatureSummary, components: &ComponentLabelingResult) -> Decision {
    if let Some(rejection) = check_content(features, components) {
        return Decision {
            stage: Stage::ContentGuard,
            signals: None,
            rejection: Some(rejection),
        };
    }

    let signals = SoftSignals::evaluate(features, components);
    let rejection = (!signals.accepts()).then(|| signals.rejection_reason(features));
    Decision {
        stage: Stage::SoftScore,
        signals: Some(signals),
        rejection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A summary that passes every guard and every signal.
    fn leafy() -> FeatureSummary {
        FeatureSummary {
            total_pixels: 40_000,
            green_ratio: 0.55,
            channel_means: [90.0, 130.0, 70.0],
            channel_stds: [30.0, 35.0, 25.0],
            is_very_uniform: false,
            unique_bin_count: 300,
            min_expected_bins: 32,
            palette_too_small: false,
            top_share: 0.25,
            hue_std: Some(0.05),
            hue_std_too_low: Some(false),
            edge_density: 0.2,
        }
    }

    fn components(ratio: f64) -> ComponentLabelingResult {
        ComponentLabelingResult {
            largest_component_ratio: ratio,
            component_count: 1,
            largest: None,
        }
    }

    #[test]
    fn shape_guard_rejects_small_images() {
        assert_eq!(check_shape(89, 89), Some(RejectReason::ImageTooSmall));
        assert_eq!(check_shape(80, 100), None);
    }

    #[test]
    fn shape_guard_rejects_extreme_aspect_ratios() {
        assert_eq!(check_shape(2400, 300), Some(RejectReason::ExtremeAspectRatio));
        assert_eq!(check_shape(300, 2400), Some(RejectReason::ExtremeAspectRatio));
        assert_eq!(check_shape(2100, 300), None);
    }

    #[test]
    fn aspect_guard_applies_once_size_passes() {
        assert_eq!(check_shape(10, 2000), Some(RejectReason::ExtremeAspectRatio));
        assert_eq!(check_shape(1, 256), Some(RejectReason::ImageTooSmall));
    }

    #[test]
    fn content_guards_in_order() {
        let mut features = leafy();
        features.green_ratio = 0.1;
        assert_eq!(
            check_content(&features, &components(0.0)),
            Some(RejectReason::LeafAreaTooSmall)
        );

        features.green_ratio = 0.5;
        assert_eq!(check_content(&features, &components(0.11)), Some(RejectReason::FragmentedLeaf));

        features.green_ratio = 0.999;
        assert_eq!(
            check_content(&features, &components(0.999)),
            Some(RejectReason::SingleColorDominant)
        );

        features.green_ratio = 0.995;
        assert_eq!(check_content(&features, &components(0.995)), None);
    }

    #[test]
    fn guard_rejection_never_reaches_the_soft_score() {
        let mut features = leafy();
        features.green_ratio = 1.0;
        let decision = decide(&features, &components(1.0));

        assert_eq!(decision.stage, Stage::ContentGuard);
        assert_eq!(decision.signals, None);
        assert_eq!(decision.score(), None);
        assert_eq!(decision.rejection, Some(RejectReason::SingleColorDominant));
    }

    #[test]
    fn leafy_summary_scores_five() {
        let decision = decide(&leafy(), &components(0.5));
        assert_eq!(decision.stage, Stage::SoftScore);
        assert_eq!(decision.score(), Some(5));
        assert_eq!(decision.rejection, None);
    }

    #[test]
    fn zero_edge_density_is_plausible() {
        let mut features = leafy();
        features.edge_density = 0.0;
        assert!(SoftSignals::evaluate(&features, &components(0.5)).edge_density_plausible);

        features.edge_density = 0.01;
        assert!(!SoftSignals::evaluate(&features, &components(0.5)).edge_density_plausible);
    }

    #[test]
    fn undefined_hue_signal_counts_as_satisfied() {
        let mut features = leafy();
        features.hue_std = None;
        features.hue_std_too_low = None;
        assert!(SoftSignals::evaluate(&features, &components(0.5)).hue_variation_plausible);
    }

    #[test]
    fn two_failed_signals_still_accept() {
        let mut features = leafy();
        features.top_share = 0.9;
        features.hue_std_too_low = Some(true);
        let decision = decide(&features, &components(0.5));
        assert_eq!(decision.score(), Some(3));
        assert_eq!(decision.rejection, None);
    }

    #[test]
    fn flat_illustration_is_rejected_as_uniform() {
        let mut features = leafy();
        features.is_very_uniform = true;
        features.palette_too_small = true;
        features.top_share = 0.95;
        features.hue_std_too_low = Some(true);
        let decision = decide(&features, &components(0.5));

        assert_eq!(decision.score(), Some(2));
        assert_eq!(decision.rejection, Some(RejectReason::UniformColor));
    }

    #[test]
    fn concentrated_palette_with_hard_edges_is_icon_like() {
        let mut features = leafy();
        features.top_share = 0.8;
        features.edge_density = 0.9;
        features.hue_std_too_low = Some(true);
        let decision = decide(&features, &components(0.5));

        assert_eq!(decision.score(), Some(2));
        assert_eq!(decision.rejection, Some(RejectReason::IconLikePalette));
    }

    #[test]
    fn line_art_is_rejected_for_hard_edges() {
        let mut features = leafy();
        features.edge_density = 0.9;
        features.hue_std_too_low = Some(true);
        features.is_very_uniform = true;
        features.palette_too_small = true;
        let signals = SoftSignals::evaluate(&features, &components(0.5));
        // Uniform colour outranks hard edges.
        assert_eq!(signals.rejection_reason(&features), RejectReason::UniformColor);

        features.is_very_uniform = false;
        let signals = SoftSignals::evaluate(&features, &components(0.5));
        assert_eq!(signals.rejection_reason(&features), RejectReason::HardEdges);
    }

    #[test]
    fn low_edges_and_flat_hue_are_flat_texture() {
        let mut features = leafy();
        features.edge_density = 0.005;
        features.hue_std_too_low = Some(true);
        let signals = SoftSignals::evaluate(&features, &components(0.5));
        assert_eq!(signals.rejection_reason(&features), RejectReason::FlatTexture);
    }

    #[test]
    fn nothing_failed_falls_back_to_the_generic_reason() {
        let features = leafy();
        let signals = SoftSignals::evaluate(&features, &components(0.5));
        assert_eq!(signals.rejection_reason(&features), RejectReason::NoLeafCharacteristics);
    }
}
