//! Route definitions for the Agricultural Advisory Platform

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::{handlers, services::disease::MAX_IMAGE_BYTES, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/farms/:farm_id", farm_routes())
}

/// Routes scoped to one farm
fn farm_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(handlers::list_recommendations))
        .route("/weather", get(handlers::get_farm_weather))
        .route("/weather/forecast", get(handlers::get_farm_forecast))
        .route("/disease-history", get(handlers::get_disease_history))
        .nest("/crops/:crop_id", crop_routes())
}

/// Routes scoped to one crop of a farm
fn crop_routes() -> Router<AppState> {
    Router::new()
        .route("/irrigation", get(handlers::get_irrigation))
        .route("/fertilizer", get(handlers::get_fertilizer))
        .route(
            "/disease-detection",
            post(handlers::detect_disease).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}
