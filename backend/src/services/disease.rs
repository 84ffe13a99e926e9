//! Disease detection service
//!
//! Stores the uploaded crop image, asks the classifier for a diagnosis
//! and records the outcome in the farm's detection history.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{classify_disease, validate_image_filename, DiseaseResult};
use uuid::Uuid;

use super::load_farm_and_crop;
use crate::error::{AppError, AppResult};
use crate::external::DiseaseClassifier;
use crate::store::{CropRepository, DetectionStore, FarmRepository, NewDetection};

/// Upper bound on an uploaded image
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Disease advisor over an optional classifier
#[derive(Clone)]
pub struct DiseaseAdvisor {
    classifier: Option<Arc<dyn DiseaseClassifier>>,
    upload_dir: PathBuf,
}

/// Outcome of one detection request
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    pub detection_id: Uuid,
    pub crop_id: Uuid,
    pub image_path: String,
    #[serde(flatten)]
    pub result: DiseaseResult,
}

impl DiseaseAdvisor {
    pub fn new(classifier: Option<Arc<dyn DiseaseClassifier>>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            classifier,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Diagnose an image; classifier problems become fixed results
    pub async fn diagnose(&self, image: &[u8]) -> DiseaseResult {
        let Some(classifier) = &self.classifier else {
            return DiseaseResult::unknown();
        };

        match classifier.classify(image).await {
            Ok(classification) => classify_disease(&classification.label, classification.confidence),
            Err(reason) => {
                tracing::warn!(%reason, "Disease classification failed");
                DiseaseResult::detection_error()
            }
        }
    }

    /// Save, diagnose and record an uploaded crop image
    pub async fn detect_for_crop<S>(
        &self,
        store: &S,
        farm_id: Uuid,
        crop_id: Uuid,
        filename: &str,
        image: &[u8],
    ) -> AppResult<DetectionReport>
    where
        S: FarmRepository + CropRepository + DetectionStore,
    {
        validate_image_filename(filename).map_err(|message| AppError::Validation {
            field: "image".to_string(),
            message: message.to_string(),
        })?;
        if image.is_empty() {
            return Err(AppError::Validation {
                field: "image".to_string(),
                message: "Image is empty".to_string(),
            });
        }
        if image.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation {
                field: "image".to_string(),
                message: "Image exceeds 10 MB".to_string(),
            });
        }

        load_farm_and_crop(store, farm_id, crop_id).await?;

        let image_path = self.save_image(farm_id, crop_id, filename, image).await?;
        let result = self.diagnose(image).await;

        let detection = store
            .record_detection(NewDetection {
                farm_id,
                crop_id,
                image_path: image_path.clone(),
                predicted_disease: result.disease_name.clone(),
                confidence_score: result.confidence,
            })
            .await?;

        tracing::info!(
            %farm_id,
            %crop_id,
            disease = %result.disease_name,
            confidence = result.confidence,
            "Disease detection recorded"
        );

        Ok(DetectionReport {
            detection_id: detection.id,
            crop_id,
            image_path,
            result,
        })
    }

    async fn save_image(
        &self,
        farm_id: Uuid,
        crop_id: Uuid,
        filename: &str,
        image: &[u8],
    ) -> AppResult<String> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "jpg".to_string());
        let name = format!(
            "disease_{}_{}_{}.{}",
            farm_id,
            crop_id,
            Utc::now().format("%Y%m%d_%H%M%S_%3f"),
            extension
        );
        let path = self.upload_dir.join(name);

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot create upload directory: {}", e)))?;
        tokio::fs::write(&path, image)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot save image: {}", e)))?;

        Ok(path.to_string_lossy().into_owned())
    }
}
