use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Label reported when the confidence gate rejects an image.
pub const REJECTED_LABEL: &str = "Gambar Bukan Pisang";

/// Dryness class of an accepted banana image.
///
/// The discriminants match the classifier's output indices, so the
/// ordinal level of a class is the enum value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum Dryness {
    Basah,
    Sedang,
    Kering,
}

impl Dryness {
    /// Map a classifier output index to its dryness class.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Dryness::Basah),
            1 => Some(Dryness::Sedang),
            2 => Some(Dryness::Kering),
            _ => None,
        }
    }

    pub fn level(&self) -> i32 {
        *self as i32
    }
}

/// Result of classifying one uploaded image.
///
/// This is the wire format exchanged between the gateway and the
/// inference service, returned to clients and persisted to history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub filename: String,
    pub classification: String,
    pub accuracy: f32,
    #[serde(rename = "drynessLevel")]
    pub dryness_level: i32,
    pub is_banana: bool,
}

impl ClassificationResult {
    /// Build the rejection result used when confidence stays below the gate.
    pub fn rejected(filename: impl Into<String>, accuracy: f32) -> Self {
        Self {
            filename: filename.into(),
            classification: REJECTED_LABEL.to_string(),
            accuracy,
            dryness_level: -1,
            is_banana: false,
        }
    }

    /// Build the acceptance result for a gated-in dryness class.
    pub fn accepted(filename: impl Into<String>, dryness: Dryness, accuracy: f32) -> Self {
        Self {
            filename: filename.into(),
            classification: dryness.to_string(),
            accuracy,
            dryness_level: dryness.level(),
            is_banana: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dryness_indices_are_a_bijection() {
        assert_eq!(Dryness::from_index(0), Some(Dryness::Basah));
        assert_eq!(Dryness::from_index(1), Some(Dryness::Sedang));
        assert_eq!(Dryness::from_index(2), Some(Dryness::Kering));
        assert_eq!(Dryness::from_index(3), None);
        for index in 0..3 {
            assert_eq!(Dryness::from_index(index).unwrap().level(), index as i32);
        }
    }

    #[test]
    fn dryness_labels_render_verbatim() {
        assert_eq!(Dryness::Basah.to_string(), "Basah");
        assert_eq!(Dryness::Sedang.to_string(), "Sedang");
        assert_eq!(Dryness::Kering.to_string(), "Kering");
    }

    #[test]
    fn rejected_result_is_consistent() {
        let result = ClassificationResult::rejected("pisang.jpg", 60.0);
        assert_eq!(result.classification, REJECTED_LABEL);
        assert_eq!(result.dryness_level, -1);
        assert!(!result.is_banana);
    }

    #[test]
    fn wire_format_uses_camel_case_dryness_level() {
        let result = ClassificationResult::accepted("pisang.jpg", Dryness::Sedang, 85.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["classification"], "Sedang");
        assert_eq!(json["drynessLevel"], 1);
        assert_eq!(json["is_banana"], true);
        assert_eq!(json["accuracy"], 85.0);
        assert_eq!(json["filename"], "pisang.jpg");
    }
}
