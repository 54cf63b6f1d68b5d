use shared::ClassificationResult;

use crate::model::ModelError;
use crate::model::classifier::DrynessClassifier;
use crate::model::embedder::Embedder;

/// The two-stage decision pipeline: embedding extraction followed by the
/// confidence-gated dryness classification.
///
/// Stateless across calls; both models are frozen after load, so one
/// instance serves concurrent requests.
pub struct Pipeline {
    embedder: Embedder,
    classifier: DrynessClassifier,
}

impl Pipeline {
    pub fn new(embedder: Embedder, classifier: DrynessClassifier) -> Self {
        Self {
            embedder,
            classifier,
        }
    }

    /// Classify one image, synchronously, on the calling thread.
    pub fn classify(
        &self,
        image_bytes: &[u8],
        filename: &str,
    ) -> Result<ClassificationResult, ModelError> {
        let features = self.embedder.embed(image_bytes)?;
        self.classifier.classify(&features, filename)
    }
}
