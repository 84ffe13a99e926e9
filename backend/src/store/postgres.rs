//! PostgreSQL-backed storage

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use shared::{
    AdvisoryRecord, AdvisoryStatus, AdvisoryType, CropContext, CropStage, FarmContext,
    GpsCoordinates, NewAdvisory, Priority, SoilType,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    AdvisorySink, CropRepository, DetectionStore, DiseaseDetection, FarmRepository, NewDetection,
};
use crate::error::{AppError, AppResult};

/// Storage service over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct FarmRow {
    id: Uuid,
    name: String,
    soil_type: String,
    latitude: Decimal,
    longitude: Decimal,
    size_acres: Decimal,
}

impl From<FarmRow> for FarmContext {
    fn from(row: FarmRow) -> Self {
        FarmContext {
            id: row.id,
            name: row.name,
            soil_type: SoilType::from_label(&row.soil_type),
            location: GpsCoordinates::new(row.latitude, row.longitude),
            size_acres: row.size_acres,
        }
    }
}

#[derive(Debug, FromRow)]
struct CropRow {
    id: Uuid,
    farm_id: Uuid,
    crop_name: String,
    current_stage: String,
    area_planted: Decimal,
}

impl From<CropRow> for CropContext {
    fn from(row: CropRow) -> Self {
        CropContext {
            id: row.id,
            farm_id: row.farm_id,
            crop_name: row.crop_name,
            current_stage: CropStage::from_label(&row.current_stage),
            area_planted_acres: row.area_planted,
        }
    }
}

#[derive(Debug, FromRow)]
struct AdvisoryRow {
    id: Uuid,
    farm_id: Uuid,
    crop_id: Uuid,
    recommendation_type: String,
    title: String,
    description: String,
    priority: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdvisoryRow> for AdvisoryRecord {
    type Error = AppError;

    fn try_from(row: AdvisoryRow) -> Result<Self, Self::Error> {
        let unknown = |column: &str, value: &str| {
            AppError::Internal(format!("Unknown {} '{}' in advisory {}", column, value, row.id))
        };

        Ok(AdvisoryRecord {
            id: row.id,
            farm_id: row.farm_id,
            crop_id: row.crop_id,
            advisory_type: AdvisoryType::from_label(&row.recommendation_type)
                .ok_or_else(|| unknown("type", &row.recommendation_type))?,
            priority: Priority::from_label(&row.priority)
                .ok_or_else(|| unknown("priority", &row.priority))?,
            status: AdvisoryStatus::from_label(&row.status)
                .ok_or_else(|| unknown("status", &row.status))?,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct DetectionRow {
    id: Uuid,
    farm_id: Uuid,
    crop_id: Uuid,
    image_path: String,
    predicted_disease: String,
    confidence_score: f32,
    detection_date: DateTime<Utc>,
}

impl From<DetectionRow> for DiseaseDetection {
    fn from(row: DetectionRow) -> Self {
        DiseaseDetection {
            id: row.id,
            farm_id: row.farm_id,
            crop_id: row.crop_id,
            image_path: row.image_path,
            predicted_disease: row.predicted_disease,
            confidence_score: row.confidence_score,
            detected_at: row.detection_date,
        }
    }
}

/// Half-open UTC interval covering one calendar day
fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::default()));
    (start, start + Duration::days(1))
}

impl PgStore {
    /// Create a new PgStore instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}

#[async_trait]
impl FarmRepository for PgStore {
    async fn get_farm(&self, farm_id: Uuid) -> AppResult<Option<FarmContext>> {
        let farm = sqlx::query_as::<_, FarmRow>(
            r#"
            SELECT id, name, soil_type, latitude, longitude, size_acres
            FROM farms
            WHERE id = $1
            "#,
        )
        .bind(farm_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(farm.map(FarmContext::from))
    }
}

#[async_trait]
impl CropRepository for PgStore {
    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<CropContext>> {
        let crops = sqlx::query_as::<_, CropRow>(
            r#"
            SELECT id, farm_id, crop_name, current_stage, area_planted
            FROM crops
            WHERE farm_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(farm_id)
        .fetch_all(&self.db)
        .await?;

        Ok(crops.into_iter().map(CropContext::from).collect())
    }

    async fn get_crop(&self, farm_id: Uuid, crop_id: Uuid) -> AppResult<Option<CropContext>> {
        let crop = sqlx::query_as::<_, CropRow>(
            r#"
            SELECT id, farm_id, crop_name, current_stage, area_planted
            FROM crops
            WHERE id = $1 AND farm_id = $2
            "#,
        )
        .bind(crop_id)
        .bind(farm_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(crop.map(CropContext::from))
    }
}

#[async_trait]
impl AdvisorySink for PgStore {
    async fn count_for_day(&self, farm_id: Uuid, day: NaiveDate) -> AppResult<i64> {
        let (start, end) = day_bounds(day);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM recommendations
            WHERE farm_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(farm_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    async fn append_batch(
        &self,
        farm_id: Uuid,
        created_at: DateTime<Utc>,
        records: Vec<NewAdvisory>,
    ) -> AppResult<Vec<AdvisoryRecord>> {
        let mut tx = self.db.begin().await?;

        // Serialize generation per farm; released at commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(farm_id.to_string())
            .execute(&mut *tx)
            .await?;

        let (start, end) = day_bounds(created_at.date_naive());
        let existing: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM recommendations
            WHERE farm_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(farm_id)
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await?;

        if existing > 0 {
            tx.rollback().await?;
            tracing::debug!(%farm_id, "Advisory batch already written by a concurrent request");
            return Ok(Vec::new());
        }

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            let row = sqlx::query_as::<_, AdvisoryRow>(
                r#"
                INSERT INTO recommendations (
                    farm_id, crop_id, recommendation_type, title, description,
                    priority, status, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id, farm_id, crop_id, recommendation_type, title, description,
                          priority, status, created_at
                "#,
            )
            .bind(record.farm_id)
            .bind(record.crop_id)
            .bind(record.advisory_type.as_str())
            .bind(&record.title)
            .bind(&record.description)
            .bind(record.priority.as_str())
            .bind(record.status.as_str())
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(AdvisoryRecord::try_from(row)?);
        }

        // Dropping the transaction on an early return rolls it back
        tx.commit().await?;

        Ok(stored)
    }

    async fn list_for_farm(&self, farm_id: Uuid) -> AppResult<Vec<AdvisoryRecord>> {
        let rows = sqlx::query_as::<_, AdvisoryRow>(
            r#"
            SELECT id, farm_id, crop_id, recommendation_type, title, description,
                   priority, status, created_at
            FROM recommendations
            WHERE farm_id = $1
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(farm_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(AdvisoryRecord::try_from).collect()
    }
}

#[async_trait]
impl DetectionStore for PgStore {
    async fn record_detection(&self, detection: NewDetection) -> AppResult<DiseaseDetection> {
        let row = sqlx::query_as::<_, DetectionRow>(
            r#"
            INSERT INTO disease_detections (
                farm_id, crop_id, image_path, predicted_disease, confidence_score
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, farm_id, crop_id, image_path, predicted_disease,
                      confidence_score, detection_date
            "#,
        )
        .bind(detection.farm_id)
        .bind(detection.crop_id)
        .bind(&detection.image_path)
        .bind(&detection.predicted_disease)
        .bind(detection.confidence_score)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn list_detections(&self, farm_id: Uuid) -> AppResult<Vec<DiseaseDetection>> {
        let rows = sqlx::query_as::<_, DetectionRow>(
            r#"
            SELECT id, farm_id, crop_id, image_path, predicted_disease,
                   confidence_score, detection_date
            FROM disease_detections
            WHERE farm_id = $1
            ORDER BY detection_date DESC
            "#,
        )
        .bind(farm_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(DiseaseDetection::from).collect())
    }
}
