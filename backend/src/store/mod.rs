//! Storage interfaces the advisory core depends on
//!
//! Farms and crops are written by an external registry; the core only
//! reads them. Advisory records and disease detections are appended by
//! the core and never deleted by it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use shared::{AdvisoryRecord, CropContext, FarmContext, NewAdvisory};
use uuid::Uuid;

use crate::error::AppResult;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Read access to registered farms
#[async_trait]
pub trait FarmRepository: Send + Sync {
    async fn get_farm(&self, farm_id: Uuid) -> AppResult<Option<FarmContext>>;
}

/// Read access to crops planted on a farm
#[async_trait]
pub trait CropRepository: Send + Sync {
    /// Crops in registration order; the first one is the farm's subject crop
    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<CropContext>>;

    async fn get_crop(&self, farm_id: Uuid, crop_id: Uuid) -> AppResult<Option<CropContext>>;
}

/// Destination for generated advisory records
#[async_trait]
pub trait AdvisorySink: Send + Sync {
    /// Number of records created for the farm on the given UTC day
    async fn count_for_day(&self, farm_id: Uuid, day: NaiveDate) -> AppResult<i64>;

    /// Persist a farm's batch atomically: either every record is stored or none.
    ///
    /// Returns the stored records. An implementation that detects a batch
    /// already written for the same day returns an empty list.
    async fn append_batch(
        &self,
        farm_id: Uuid,
        created_at: DateTime<Utc>,
        records: Vec<NewAdvisory>,
    ) -> AppResult<Vec<AdvisoryRecord>>;

    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<AdvisoryRecord>>;
}

/// A stored disease detection
#[derive(Debug, Clone, Serialize)]
pub struct DiseaseDetection {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    pub image_path: String,
    pub predicted_disease: String,
    pub confidence_score: f32,
    pub detected_at: DateTime<Utc>,
}

/// Input for recording a detection
#[derive(Debug, Clone)]
pub struct NewDetection {
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    pub image_path: String,
    pub predicted_disease: String,
    pub confidence_score: f32,
}

/// Disease detection history
#[async_trait]
pub trait DetectionStore: Send + Sync {
    async fn record_detection(&self, detection: NewDetection) -> AppResult<DiseaseDetection>;

    async fn list_detections(&self, farm_id: Uuid) -> AppResult<Vec<DiseaseDetection>>;
}
