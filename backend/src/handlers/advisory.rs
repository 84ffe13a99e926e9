//! HTTP handlers for farm advisories

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use shared::AdvisoryRecord;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::advisory::farm_recommendations;
use crate::AppState;

/// List a farm's advisories, generating today's batch first if needed
pub async fn list_recommendations(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<Vec<AdvisoryRecord>>> {
    let records =
        farm_recommendations(&state.store, state.weather.as_ref(), farm_id, Utc::now()).await?;
    Ok(Json(records))
}
