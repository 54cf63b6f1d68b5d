use std::path::Path;
use std::sync::Mutex;

use ndarray::Array2;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use shared::{ClassificationResult, Dryness};

use super::ModelError;
use crate::model::embedder::EMBEDDING_DIM;

/// Number of dryness classes the booster was trained on.
pub const NUM_CLASSES: usize = 3;

/// Minimum confidence (percent) below which an image is rejected as
/// not being a banana at all.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 76.0;

/// Output tensor name of the exported probability head.
const PROBABILITIES_OUTPUT: &str = "probabilities";

/// Frozen gradient-boosted dryness classifier behind an ONNX session.
///
/// The session is an export of the trained XGBoost model; it takes a
/// `[1, 768]` feature row and yields the class probability distribution.
pub struct DrynessClassifier {
    session: Mutex<Session>,
    min_confidence: f32,
}

impl DrynessClassifier {
    pub fn load(path: &Path, min_confidence: f32) -> Result<Self, ModelError> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;
        Ok(Self {
            session: Mutex::new(session),
            min_confidence,
        })
    }

    /// Convert a feature vector into a gated dryness decision.
    pub fn classify(
        &self,
        features: &[f32],
        filename: &str,
    ) -> Result<ClassificationResult, ModelError> {
        let probabilities = self.probabilities(features)?;
        decide(&probabilities, filename, self.min_confidence)
    }

    fn probabilities(&self, features: &[f32]) -> Result<Vec<f32>, ModelError> {
        if features.len() != EMBEDDING_DIM {
            return Err(ModelError::FeatureShapeMismatch {
                expected: EMBEDDING_DIM,
                actual: features.len(),
            });
        }

        let input = Array2::from_shape_vec((1, EMBEDDING_DIM), features.to_vec())
            .map_err(|e| ModelError::Inference(e.to_string()))?;
        let input = Value::from_array(input)?;

        let mut session = self.session.lock().unwrap();
        let outputs = session.run(ort::inputs![input])?;
        let output = outputs
            .get(PROBABILITIES_OUTPUT)
            .ok_or_else(|| ModelError::Inference("model has no probability output".to_string()))?;
        let tensor = output.try_extract_tensor::<f32>()?;

        let data = tensor.1;
        if data.len() != NUM_CLASSES {
            return Err(ModelError::Inference(format!(
                "expected {NUM_CLASSES} class probabilities, got {}",
                data.len()
            )));
        }
        Ok(data.to_vec())
    }
}

/// Threshold decision over a class probability distribution.
///
/// Confidence is the maximum probability expressed as a percentage,
/// rounded to one decimal place. Strictly below `min_confidence` the
/// image is rejected; at or above it the arg-max class wins. An index
/// outside the trained classes is a hard fault, not a silent label.
pub fn decide(
    probabilities: &[f32],
    filename: &str,
    min_confidence: f32,
) -> Result<ClassificationResult, ModelError> {
    if probabilities.is_empty() {
        return Err(ModelError::Inference(
            "empty probability distribution".to_string(),
        ));
    }

    let (index, max) = probabilities
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
            if p > best.1 { (i, p) } else { best }
        });
    let confidence = round_one_decimal(max * 100.0);

    if confidence < min_confidence {
        return Ok(ClassificationResult::rejected(filename, confidence));
    }

    let dryness = Dryness::from_index(index).ok_or_else(|| {
        ModelError::Inference(format!("class index {index} outside trained classes"))
    })?;
    Ok(ClassificationResult::accepted(filename, dryness, confidence))
}

fn round_one_decimal(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::REJECTED_LABEL;

    #[test]
    fn confident_distribution_maps_to_its_arg_max_class() {
        let result = decide(&[0.10, 0.85, 0.05], "pisang.jpg", DEFAULT_MIN_CONFIDENCE).unwrap();
        assert_eq!(result.classification, "Sedang");
        assert_eq!(result.accuracy, 85.0);
        assert_eq!(result.dryness_level, 1);
        assert!(result.is_banana);
        assert_eq!(result.filename, "pisang.jpg");
    }

    #[test]
    fn low_confidence_is_rejected_as_not_a_banana() {
        let result = decide(&[0.60, 0.25, 0.15], "apel.jpg", DEFAULT_MIN_CONFIDENCE).unwrap();
        assert_eq!(result.classification, REJECTED_LABEL);
        assert_eq!(result.accuracy, 60.0);
        assert_eq!(result.dryness_level, -1);
        assert!(!result.is_banana);
    }

    #[test]
    fn gate_boundary_is_accepted() {
        let result = decide(&[0.76, 0.14, 0.10], "pisang.jpg", DEFAULT_MIN_CONFIDENCE).unwrap();
        assert!(result.is_banana);
        assert_eq!(result.classification, "Basah");
        assert_eq!(result.dryness_level, 0);
    }

    #[test]
    fn just_below_the_gate_is_rejected() {
        let result = decide(&[0.759, 0.141, 0.10], "pisang.jpg", DEFAULT_MIN_CONFIDENCE).unwrap();
        assert!(!result.is_banana);
        assert_eq!(result.accuracy, 75.9);
    }

    #[test]
    fn accuracy_is_rounded_to_one_decimal() {
        let result = decide(&[0.12345, 0.87654, 0.00001], "pisang.jpg", 76.0).unwrap();
        assert_eq!(result.accuracy, 87.7);
        assert!((0.0..=100.0).contains(&result.accuracy));
    }

    #[test]
    fn accepted_levels_stay_in_range() {
        for (distribution, level) in [
            ([0.9f32, 0.05, 0.05], 0),
            ([0.05, 0.9, 0.05], 1),
            ([0.05, 0.05, 0.9], 2),
        ] {
            let result = decide(&distribution, "pisang.jpg", 76.0).unwrap();
            assert_eq!(result.dryness_level, level);
        }
    }

    #[test]
    fn out_of_range_index_is_a_hard_fault() {
        // A fourth class means the exported model and the label table
        // disagree.
        let err = decide(&[0.01, 0.01, 0.01, 0.97], "pisang.jpg", 76.0).unwrap_err();
        assert!(matches!(err, ModelError::Inference(_)));
    }

    #[test]
    fn empty_distribution_is_an_inference_error() {
        assert!(decide(&[], "pisang.jpg", 76.0).is_err());
    }

    #[test]
    fn decision_is_deterministic() {
        let a = decide(&[0.2, 0.3, 0.5], "pisang.jpg", 40.0).unwrap();
        let b = decide(&[0.2, 0.3, 0.5], "pisang.jpg", 40.0).unwrap();
        assert_eq!(a.classification, b.classification);
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.dryness_level, b.dryness_level);
    }
}
