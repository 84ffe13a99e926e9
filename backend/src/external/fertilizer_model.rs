//! Fertilizer prediction model loading
//!
//! A model artifact is a JSON document. Its shape is inspected once at
//! load time and turned into a `ModelStrategy`; callers never probe the
//! artifact again per request.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use shared::FallbackReason;

use crate::error::{AppError, AppResult};

/// Number of features in a soil feature vector
pub const FEATURE_COUNT: usize = 6;

pub type Features = [f64; FEATURE_COUNT];

/// Predicts a single value directly
pub type DirectFn = Arc<dyn Fn(&Features) -> Result<f64, FallbackReason> + Send + Sync>;

/// Predicts a probability per class
pub type ProbabilisticFn = Arc<dyn Fn(&Features) -> Result<Vec<f64>, FallbackReason> + Send + Sync>;

/// How the fertilizer advisor should use the loaded model
#[derive(Clone)]
pub enum ModelStrategy {
    NotLoaded,
    DirectPredictor(DirectFn),
    ProbabilisticPredictor(ProbabilisticFn),
    /// The artifact loaded but exposes no usable prediction capability
    Unsupported(String),
}

impl ModelStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ModelStrategy::NotLoaded => "not_loaded",
            ModelStrategy::DirectPredictor(_) => "direct",
            ModelStrategy::ProbabilisticPredictor(_) => "probabilistic",
            ModelStrategy::Unsupported(_) => "unsupported",
        }
    }
}

impl std::fmt::Debug for ModelStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStrategy::Unsupported(why) => write!(f, "Unsupported({})", why),
            other => f.write_str(other.name()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LinearModel {
    weights: Vec<f64>,
    intercept: f64,
}

#[derive(Debug, Deserialize)]
struct SoftmaxModel {
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

fn dot(weights: &[f64], features: &Features) -> f64 {
    weights.iter().zip(features.iter()).map(|(w, x)| w * x).sum()
}

impl LinearModel {
    fn into_strategy(self) -> ModelStrategy {
        if self.weights.len() != FEATURE_COUNT {
            return ModelStrategy::Unsupported(format!(
                "linear model has {} weights, expected {}",
                self.weights.len(),
                FEATURE_COUNT
            ));
        }

        let predict = move |features: &Features| -> Result<f64, FallbackReason> {
            let value = dot(&self.weights, features) + self.intercept;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(FallbackReason::InferenceFailed(
                    "linear model produced a non-finite value".to_string(),
                ))
            }
        };
        ModelStrategy::DirectPredictor(Arc::new(predict))
    }
}

impl SoftmaxModel {
    fn into_strategy(self) -> ModelStrategy {
        if self.coefficients.len() != self.intercepts.len() {
            return ModelStrategy::Unsupported(format!(
                "softmax model has {} coefficient rows but {} intercepts",
                self.coefficients.len(),
                self.intercepts.len()
            ));
        }
        if let Some(row) = self.coefficients.iter().find(|row| row.len() != FEATURE_COUNT) {
            return ModelStrategy::Unsupported(format!(
                "softmax coefficient row has {} values, expected {}",
                row.len(),
                FEATURE_COUNT
            ));
        }

        let predict = move |features: &Features| -> Result<Vec<f64>, FallbackReason> {
            let logits: Vec<f64> = self
                .coefficients
                .iter()
                .zip(&self.intercepts)
                .map(|(row, intercept)| dot(row, features) + intercept)
                .collect();

            let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
            let total: f64 = exps.iter().sum();
            if !total.is_finite() || total <= 0.0 {
                return Err(FallbackReason::InferenceFailed(
                    "softmax normalisation failed".to_string(),
                ));
            }
            Ok(exps.into_iter().map(|e| e / total).collect())
        };
        ModelStrategy::ProbabilisticPredictor(Arc::new(predict))
    }
}

/// Inspect a parsed artifact and pick the strategy for it
pub fn strategy_from_artifact(artifact: Value) -> ModelStrategy {
    let kind = match &artifact {
        Value::Object(map) => map.get("kind").and_then(Value::as_str).map(str::to_string),
        other => {
            return ModelStrategy::Unsupported(format!(
                "model artifact is a JSON {}, not an object",
                json_kind(other)
            ))
        }
    };

    match kind.as_deref() {
        Some("linear") => match serde_json::from_value::<LinearModel>(artifact) {
            Ok(model) => model.into_strategy(),
            Err(e) => ModelStrategy::Unsupported(format!("malformed linear model: {}", e)),
        },
        Some("softmax") => match serde_json::from_value::<SoftmaxModel>(artifact) {
            Ok(model) => model.into_strategy(),
            Err(e) => ModelStrategy::Unsupported(format!("malformed softmax model: {}", e)),
        },
        _ => ModelStrategy::Unsupported("mapping without a recognised model".to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load the fertilizer model artifact.
///
/// A missing file means no model was deployed and yields `NotLoaded`.
/// An unreadable or unparseable file is a construction failure.
pub fn load_fertilizer_model(path: impl AsRef<Path>) -> AppResult<ModelStrategy> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!(path = %path.display(), "No fertilizer model found, using rule-based advice");
        return Ok(ModelStrategy::NotLoaded);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Configuration(format!("Cannot read fertilizer model {}: {}", path.display(), e))
    })?;
    let artifact: Value = serde_json::from_str(&raw).map_err(|e| {
        AppError::Configuration(format!("Cannot parse fertilizer model {}: {}", path.display(), e))
    })?;

    let strategy = strategy_from_artifact(artifact);
    tracing::info!(path = %path.display(), strategy = strategy.name(), "Fertilizer model loaded");
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FEATURES: Features = [6.5, 2.0, 50.0, 30.0, 100.0, 1.0];

    #[test]
    fn test_linear_artifact_is_direct() {
        let strategy = strategy_from_artifact(json!({
            "kind": "linear",
            "weights": [0.0, 0.0, 0.0, 0.0, 0.0, 2.0],
            "intercept": 1.5
        }));
        match strategy {
            ModelStrategy::DirectPredictor(predict) => {
                assert_eq!(predict(&FEATURES).unwrap(), 3.5);
            }
            other => panic!("expected direct predictor, got {:?}", other),
        }
    }

    #[test]
    fn test_softmax_artifact_is_probabilistic() {
        let strategy = strategy_from_artifact(json!({
            "kind": "softmax",
            "coefficients": [[0, 0, 0, 0, 0, 0], [0, 0, 0, 0, 0, 1]],
            "intercepts": [0.0, 0.0]
        }));
        match strategy {
            ModelStrategy::ProbabilisticPredictor(predict) => {
                let probabilities = predict(&FEATURES).unwrap();
                assert_eq!(probabilities.len(), 2);
                assert!(probabilities[1] > probabilities[0]);
                let total: f64 = probabilities.iter().sum();
                assert!((total - 1.0).abs() < 1e-9);
            }
            other => panic!("expected probabilistic predictor, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_mapping_is_unsupported() {
        let strategy = strategy_from_artifact(json!({"model": "random_forest", "trees": 100}));
        assert!(matches!(strategy, ModelStrategy::Unsupported(_)));
    }

    #[test]
    fn test_non_object_is_unsupported() {
        assert!(matches!(
            strategy_from_artifact(json!([1, 2, 3])),
            ModelStrategy::Unsupported(_)
        ));
        assert!(matches!(
            strategy_from_artifact(json!("model")),
            ModelStrategy::Unsupported(_)
        ));
    }

    #[test]
    fn test_wrong_feature_count_is_unsupported() {
        let strategy = strategy_from_artifact(json!({
            "kind": "linear",
            "weights": [1.0, 2.0],
            "intercept": 0.0
        }));
        assert!(matches!(strategy, ModelStrategy::Unsupported(_)));
    }

    #[test]
    fn test_missing_file_is_not_loaded() {
        let strategy = load_fertilizer_model("/nonexistent/fertilizer_model.json").unwrap();
        assert!(matches!(strategy, ModelStrategy::NotLoaded));
    }

    #[test]
    fn test_unparseable_file_fails_construction() {
        let path = std::env::temp_dir().join(format!("fertilizer-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = load_fertilizer_model(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
