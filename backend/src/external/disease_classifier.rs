//! Plant disease classification client
//!
//! Client for an HTTP-hosted image classifier. The image is uploaded as
//! base64; the service answers with one probability per class and the
//! class index is translated with a JSON class-name map.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::FallbackReason;

use crate::config::ModelsConfig;
use crate::error::{AppError, AppResult};

/// Label used when the classifier returns an index with no known name
pub const UNKNOWN_DISEASE: &str = "Unknown Disease";

/// Top class reported by a classifier
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

/// Image classifier for crop diseases
#[async_trait]
pub trait DiseaseClassifier: Send + Sync {
    async fn classify(&self, image: &[u8]) -> Result<Classification, FallbackReason>;
}

/// Client for the disease classification service
#[derive(Clone)]
pub struct HttpDiseaseClassifier {
    api_endpoint: String,
    api_key: Option<String>,
    http_client: Client,
    class_names: HashMap<usize, String>,
}

/// Request to classify an image
#[derive(Debug, Serialize)]
pub struct ClassifyRequest {
    pub image_base64: String,
}

/// Response from the classification API
#[derive(Debug, Deserialize)]
pub struct ClassifyResponse {
    pub probabilities: Vec<f32>,
}

/// Index and probability of the most likely class
pub fn top_class(probabilities: &[f32]) -> Result<(usize, f32), FallbackReason> {
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(FallbackReason::MalformedPrediction(
            "classifier returned a non-finite probability".to_string(),
        ));
    }

    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, p)| match best {
            Some((_, top)) if top >= p => best,
            _ => Some((index, p)),
        })
        .ok_or_else(|| {
            FallbackReason::MalformedPrediction("classifier returned no probabilities".to_string())
        })
}

/// Read the class-index to disease-name map.
///
/// Keys are class indices written as strings, e.g. `{"0": "Healthy"}`.
/// `None` when the file does not exist.
pub fn load_class_names(path: impl AsRef<Path>) -> AppResult<Option<HashMap<usize, String>>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Configuration(format!("Cannot read class names {}: {}", path.display(), e))
    })?;
    let names: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
        AppError::Configuration(format!("Cannot parse class names {}: {}", path.display(), e))
    })?;

    names
        .into_iter()
        .map(|(index, name)| {
            index
                .parse::<usize>()
                .map(|index| (index, name))
                .map_err(|_| {
                    AppError::Configuration(format!("Class index '{}' is not a number", index))
                })
        })
        .collect::<AppResult<HashMap<_, _>>>()
        .map(Some)
}

impl HttpDiseaseClassifier {
    /// Create a new disease classification client
    pub fn new(
        api_endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
        class_names: HashMap<usize, String>,
    ) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Classifier HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint,
            api_key,
            http_client,
            class_names,
        })
    }

    /// Create a client from configuration.
    ///
    /// `None` when no endpoint is set or the class-name map is missing;
    /// either way there is no usable classification.
    pub fn from_config(config: &ModelsConfig) -> AppResult<Option<Self>> {
        let Some(endpoint) = config.disease_endpoint.clone().filter(|e| !e.trim().is_empty())
        else {
            return Ok(None);
        };

        let Some(class_names) = load_class_names(&config.disease_class_names_path)? else {
            tracing::warn!(
                path = %config.disease_class_names_path,
                "Disease class names not found, classification disabled"
            );
            return Ok(None);
        };
        Self::new(
            endpoint,
            config.disease_api_key.clone(),
            Duration::from_secs(config.timeout_secs),
            class_names,
        )
        .map(Some)
    }

    /// Disease name for a class index
    pub fn label_for(&self, index: usize) -> String {
        self.class_names
            .get(&index)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_DISEASE.to_string())
    }
}

#[async_trait]
impl DiseaseClassifier for HttpDiseaseClassifier {
    async fn classify(&self, image: &[u8]) -> Result<Classification, FallbackReason> {
        let request = ClassifyRequest {
            image_base64: STANDARD.encode(image),
        };

        let mut builder = self.http_client.post(&self.api_endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("x-api-key", api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FallbackReason::ClassificationFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FallbackReason::ClassificationFailed(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: ClassifyResponse = response.json().await.map_err(|e| {
            FallbackReason::ClassificationFailed(format!("Failed to parse response: {}", e))
        })?;

        let (index, confidence) = top_class(&result.probabilities)?;
        Ok(Classification {
            label: self.label_for(index),
            confidence,
        })
    }
}
