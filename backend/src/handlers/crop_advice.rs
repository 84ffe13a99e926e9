//! HTTP handlers for per-crop advice: irrigation, fertilizer and disease detection

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use shared::{FertilizerRecommendation, SoilData};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::disease::DetectionReport;
use crate::services::fertilizer::fertilizer_for_crop;
use crate::services::irrigation::{irrigation_for_crop, IrrigationAdvice};
use crate::services::load_farm;
use crate::store::{DetectionStore, DiseaseDetection};
use crate::AppState;

/// Get irrigation advice for a crop
pub async fn get_irrigation(
    State(state): State<AppState>,
    Path((farm_id, crop_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<IrrigationAdvice>> {
    let advice =
        irrigation_for_crop(&state.store, state.weather.as_ref(), farm_id, crop_id).await?;
    Ok(Json(advice))
}

/// Get fertilizer advice for a crop from optional soil test values
pub async fn get_fertilizer(
    State(state): State<AppState>,
    Path((farm_id, crop_id)): Path<(Uuid, Uuid)>,
    Query(soil): Query<SoilData>,
) -> AppResult<Json<FertilizerRecommendation>> {
    let recommendation = fertilizer_for_crop(
        &state.store,
        state.fertilizer.as_deref(),
        farm_id,
        crop_id,
        soil,
    )
    .await?;
    Ok(Json(recommendation))
}

/// Upload a crop image for disease detection
pub async fn detect_disease(
    State(state): State<AppState>,
    Path((farm_id, crop_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> AppResult<Json<DetectionReport>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(invalid_upload)? {
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.jpg").to_string();
        let bytes = field.bytes().await.map_err(invalid_upload)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| AppError::Validation {
        field: "image".to_string(),
        message: "An image file is required".to_string(),
    })?;

    let report = state
        .disease
        .detect_for_crop(&state.store, farm_id, crop_id, &filename, &bytes)
        .await?;
    Ok(Json(report))
}

/// Get a farm's disease detection history
pub async fn get_disease_history(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Vec<DiseaseDetection>>> {
    load_farm(&state.store, farm_id).await?;
    let detections = state.store.list_detections(farm_id).await?;
    Ok(Json(detections))
}

fn invalid_upload(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation {
        field: "image".to_string(),
        message: format!("Invalid upload: {}", e),
    }
}
