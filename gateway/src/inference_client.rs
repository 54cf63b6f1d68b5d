use reqwest::multipart::{Form, Part};

use shared::ClassificationResult;

#[derive(Debug, thiserror::Error)]
pub enum InferenceClientError {
    #[error("ML service is unavailable: {0}")]
    Unavailable(String),
    #[error("Unsupported content type '{0}'")]
    ContentType(String),
}

/// Typed client for the inference service's classify operation.
///
/// One request/response exchange per upload, at most once; any
/// connection failure, non-success status or unreadable body is
/// surfaced as the service being unavailable.
#[derive(Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    base_url: String,
}

impl InferenceClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn classify(
        &self,
        image: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<ClassificationResult, InferenceClientError> {
        let part = Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|_| InferenceClientError::ContentType(content_type.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .http
            .post(format!("{}/predict", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceClientError::Unavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| InferenceClientError::Unavailable(e.to_string()))?;

        response
            .json::<ClassificationResult>()
            .await
            .map_err(|e| InferenceClientError::Unavailable(e.to_string()))
    }
}
