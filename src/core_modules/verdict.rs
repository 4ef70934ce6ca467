// THEORY:
// The `verdict` module defines the only thing the gate ever hands back to its caller:
// a `ValidationVerdict`. It is a terminal, immutable value, built once by the decision
// engine (or by the fault handler in `pipeline`) and never mutated afterwards.
//
// Every rejection carries exactly one `RejectReason` from a fixed catalogue, plus the
// end-user sentence for that reason in the configured `Locale`. The catalogue is the
// contract; the wording is presentation and may change without breaking callers that
// branch on the code.

use serde::{Deserialize, Serialize};

/// Language of end-user reason strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    English,
    Indonesian,
}

/// The fixed catalogue of rejection categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    // --- Shape guards ---
    ImageTooSmall,
    ExtremeAspectRatio,

    // --- Content guards ---
    LeafAreaTooSmall,
    /// No single dominant green region. Raised by the content guard, and by the soft
    /// score when the coverage signal fails.
    FragmentedLeaf,
    SingleColorDominant,

    // --- Soft score ---
    UniformColor,
    IconLikePalette,
    HardEdges,
    FlatTexture,
    NoLeafCharacteristics,

    // --- Faults ---
    DecodeFailure,
    ResourceFailure,
    InternalFault,
}

impl RejectReason {
    /// The end-user sentence for this reason.
    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => self.message_en(),
            Locale::Indonesian => self.message_id(),
        }
    }

    fn message_en(&self) -> &'static str {
        match self {
            RejectReason::ImageTooSmall => "Image is too small to analyze.",
            RejectReason::ExtremeAspectRatio => "Image aspect ratio is too extreme.",
            RejectReason::LeafAreaTooSmall => {
                "Leaf area is too small, or the object is not a leaf."
            }
            RejectReason::FragmentedLeaf => {
                "Green object is too small or fragmented (no single dominant leaf)."
            }
            RejectReason::SingleColorDominant => {
                "Image is dominated by a single color (likely a background or illustration)."
            }
            RejectReason::UniformColor => "Image colors are too uniform to be a leaf photo.",
            RejectReason::IconLikePalette => {
                "Color palette is too limited; the image looks like an icon."
            }
            RejectReason::HardEdges => "Image has too many hard edges; it looks like line art.",
            RejectReason::FlatTexture => "Leaf texture is too flat.",
            RejectReason::NoLeafCharacteristics => "No clear leaf characteristics were found.",
            RejectReason::DecodeFailure => "Image could not be read.",
            RejectReason::ResourceFailure => "Image could not be processed.",
            RejectReason::InternalFault => "Image could not be validated.",
        }
    }

    fn message_id(&self) -> &'static str {
        match self {
            RejectReason::ImageTooSmall => "Gambar terlalu kecil untuk dianalisis.",
            RejectReason::ExtremeAspectRatio => "Rasio aspek gambar terlalu ekstrem.",
            RejectReason::LeafAreaTooSmall => "Area daun terlalu kecil atau objek bukan daun.",
            RejectReason::FragmentedLeaf => {
                "Objek hijau terlalu kecil atau terpecah (tidak ada satu daun yang dominan)."
            }
            RejectReason::SingleColorDominant => {
                "Gambar didominasi satu warna (kemungkinan latar belakang atau ilustrasi)."
            }
            RejectReason::UniformColor => "Warna gambar terlalu seragam untuk foto daun.",
            RejectReason::IconLikePalette => "Palet warna terlalu sedikit, gambar menyerupai ikon.",
            RejectReason::HardEdges => "Terlalu banyak tepi tajam, gambar menyerupai gambar garis.",
            RejectReason::FlatTexture => "Tekstur daun terlalu datar.",
            RejectReason::NoLeafCharacteristics => "Tidak ditemukan karakteristik daun yang jelas.",
            RejectReason::DecodeFailure => "Gambar tidak dapat dibaca.",
            RejectReason::ResourceFailure => "Gambar tidak dapat diproses.",
            RejectReason::InternalFault => "Gambar tidak dapat divalidasi.",
        }
    }

    /// True for fault categories, as opposed to ordinary negative outcomes.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            RejectReason::DecodeFailure
                | RejectReason::ResourceFailure
                | RejectReason::InternalFault
        )
    }
}

/// The gate's answer for one image.
///
/// `reason` is present exactly when `valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<RejectReason>,
}

impl ValidationVerdict {
    pub fn accept() -> Self {
        Self {
            valid: true,
            reason: None,
            code: None,
        }
    }

    pub fn reject(code: RejectReason, locale: Locale) -> Self {
        Self {
            valid: false,
            reason: Some(code.message(locale).to_string()),
            code: Some(code),
        }
    }

    /// A rejection whose reason is a fault's own message rather than catalogue text.
    pub fn fault(code: RejectReason, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(message.into()),
            code: Some(code),
        }
    }
}
