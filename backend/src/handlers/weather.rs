//! HTTP handlers for farm weather endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::{validate_forecast_days, WeatherForecast, WeatherSnapshot, MAX_FORECAST_DAYS};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::weather::synthetic_snapshot;
use crate::services::load_farm;
use crate::AppState;

/// Query parameters for a forecast
#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub days: Option<u32>,
}

/// Get current weather at a farm
pub async fn get_farm_weather(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
) -> AppResult<Json<WeatherSnapshot>> {
    let farm = load_farm(&state.store, farm_id).await?;
    let snapshot = state
        .weather
        .current(farm.location)
        .await
        .unwrap_or_else(|reason| {
            tracing::warn!(%farm_id, %reason, "Serving synthetic weather");
            synthetic_snapshot(farm.location)
        });
    Ok(Json(snapshot))
}

/// Get the weather forecast for a farm
pub async fn get_farm_forecast(
    State(state): State<AppState>,
    Path(farm_id): Path<Uuid>,
    Query(query): Query<ForecastQuery>,
) -> AppResult<Json<WeatherForecast>> {
    let days = query.days.unwrap_or(MAX_FORECAST_DAYS);
    validate_forecast_days(days).map_err(|message| AppError::Validation {
        field: "days".to_string(),
        message: message.to_string(),
    })?;

    let farm = load_farm(&state.store, farm_id).await?;
    let forecast = state.weather.forecast(farm.location, days).await;
    Ok(Json(forecast))
}
