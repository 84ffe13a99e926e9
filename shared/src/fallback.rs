//! Reasons an advisor fell back to a deterministic default

use thiserror::Error;

/// Why a live input (weather, model, classifier) could not be used.
///
/// Fallbacks are never surfaced to API callers as errors. They are
/// returned at the seams so the caller can log them and tests can
/// inspect which path was taken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FallbackReason {
    #[error("prediction model not loaded")]
    ModelNotLoaded,

    #[error("unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("model inference failed: {0}")]
    InferenceFailed(String),

    #[error("malformed prediction: {0}")]
    MalformedPrediction(String),

    #[error("arithmetic overflow while computing {0}")]
    ArithmeticOverflow(&'static str),

    #[error("disease classifier not configured")]
    ClassifierUnavailable,

    #[error("disease classification failed: {0}")]
    ClassificationFailed(String),

    #[error("weather data unavailable: {0}")]
    WeatherUnavailable(String),
}
