//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub database: String,
    pub fertilizer_model: String,
    pub disease_classifier: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if state.store.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    let fertilizer_model = state
        .fertilizer
        .as_ref()
        .map(|advisor| advisor.strategy().name())
        .unwrap_or("unavailable");

    let disease_classifier = if state.disease.has_classifier() {
        "configured"
    } else {
        "not_configured"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        database: database.to_string(),
        fertilizer_model: fertilizer_model.to_string(),
        disease_classifier: disease_classifier.to_string(),
    })
}
