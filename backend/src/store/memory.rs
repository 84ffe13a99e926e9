//! In-memory storage for service tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{AdvisoryRecord, CropContext, FarmContext, NewAdvisory};
use uuid::Uuid;

use super::{
    AdvisorySink, CropRepository, DetectionStore, DiseaseDetection, FarmRepository, NewDetection,
};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct State {
    farms: Vec<FarmContext>,
    crops: Vec<CropContext>,
    advisories: Vec<AdvisoryRecord>,
    detections: Vec<DiseaseDetection>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_appends: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_farm(&self, farm: FarmContext) {
        self.lock().farms.push(farm);
    }

    pub fn add_crop(&self, crop: CropContext) {
        self.lock().crops.push(crop);
    }

    /// Make every subsequent `append_batch` fail like a broken connection
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn advisories(&self) -> Vec<AdvisoryRecord> {
        self.lock().advisories.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FarmRepository for MemoryStore {
    async fn get_farm(&self, farm_id: Uuid) -> AppResult<Option<FarmContext>> {
        Ok(self.lock().farms.iter().find(|f| f.id == farm_id).cloned())
    }
}

#[async_trait]
impl CropRepository for MemoryStore {
    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<CropContext>> {
        Ok(self
            .lock()
            .crops
            .iter()
            .filter(|c| c.farm_id == farm_id)
            .cloned()
            .collect())
    }

    async fn get_crop(&self, farm_id: Uuid, crop_id: Uuid) -> AppResult<Option<CropContext>> {
        Ok(self
            .lock()
            .crops
            .iter()
            .find(|c| c.farm_id == farm_id && c.id == crop_id)
            .cloned())
    }
}

#[async_trait]
impl AdvisorySink for MemoryStore {
    async fn count_for_day(&self, farm_id: Uuid, day: NaiveDate) -> AppResult<i64> {
        Ok(self
            .lock()
            .advisories
            .iter()
            .filter(|a| a.farm_id == farm_id && a.created_at.date_naive() == day)
            .count() as i64)
    }

    async fn append_batch(
        &self,
        _farm_id: Uuid,
        created_at: DateTime<Utc>,
        records: Vec<NewAdvisory>,
    ) -> AppResult<Vec<AdvisoryRecord>> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::Storage("connection reset".to_string()));
        }

        let stored: Vec<AdvisoryRecord> = records
            .into_iter()
            .map(|r| AdvisoryRecord {
                id: Uuid::new_v4(),
                farm_id: r.farm_id,
                crop_id: r.crop_id,
                advisory_type: r.advisory_type,
                title: r.title,
                description: r.description,
                priority: r.priority,
                status: r.status,
                created_at,
            })
            .collect();
        self.lock().advisories.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<AdvisoryRecord>> {
        Ok(self
            .lock()
            .advisories
            .iter()
            .filter(|a| a.farm_id == farm_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DetectionStore for MemoryStore {
    async fn record_detection(&self, detection: NewDetection) -> AppResult<DiseaseDetection> {
        let stored = DiseaseDetection {
            id: Uuid::new_v4(),
            farm_id: detection.farm_id,
            crop_id: detection.crop_id,
            image_path: detection.image_path,
            predicted_disease: detection.predicted_disease,
            confidence_score: detection.confidence_score,
            detected_at: Utc::now(),
        };
        self.lock().detections.push(stored.clone());
        Ok(stored)
    }

    async fn list_detections(&self, farm_id: Uuid) -> AppResult<Vec<DiseaseDetection>> {
        Ok(self
            .lock()
            .detections
            .iter()
            .filter(|d| d.farm_id == farm_id)
            .cloned()
            .collect())
    }
}
