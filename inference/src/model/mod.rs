pub mod classifier;
pub mod embedder;

/// Faults raised by the embedding and classification models.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Feature vector has {actual} values, expected {expected}")]
    FeatureShapeMismatch { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),
    #[error("ONNX runtime error: {0}")]
    Onnx(#[from] ort::Error),
}
