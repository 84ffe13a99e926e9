//! Fertilizer advisory service
//!
//! Dispatches on the model strategy chosen at startup and falls back to
//! the rule-based advisor whenever the model path cannot produce advice.

use rust_decimal::prelude::ToPrimitive;
use shared::{
    recommendation_from_prediction, rule_based_fertilizer, FallbackReason,
    FertilizerRecommendation, SoilData,
};
use uuid::Uuid;
use validator::Validate;

use super::load_farm_and_crop;
use crate::config::ModelsConfig;
use crate::error::AppResult;
use crate::external::fertilizer_model::{load_fertilizer_model, ModelStrategy};
use crate::store::{CropRepository, FarmRepository};

/// Fertilizer advisor holding the loaded model strategy
#[derive(Clone, Debug)]
pub struct FertilizerAdvisor {
    strategy: ModelStrategy,
}

impl FertilizerAdvisor {
    pub fn new(strategy: ModelStrategy) -> Self {
        Self { strategy }
    }

    /// Build the advisor from the configured model artifact
    pub fn from_config(config: &ModelsConfig) -> AppResult<Self> {
        load_fertilizer_model(&config.fertilizer_model_path).map(Self::new)
    }

    pub fn strategy(&self) -> &ModelStrategy {
        &self.strategy
    }

    /// Model-backed advice, or the reason the model path was not usable
    pub fn try_model_recommendation(
        &self,
        soil: &SoilData,
    ) -> Result<FertilizerRecommendation, FallbackReason> {
        let features = soil.feature_vector();
        let prediction = match &self.strategy {
            ModelStrategy::NotLoaded => return Err(FallbackReason::ModelNotLoaded),
            ModelStrategy::Unsupported(why) => {
                return Err(FallbackReason::UnsupportedModel(why.clone()))
            }
            ModelStrategy::DirectPredictor(predict) => predict(&features)?,
            ModelStrategy::ProbabilisticPredictor(predict) => {
                let probabilities = predict(&features)?;
                arg_max(&probabilities)? as f64
            }
        };

        recommendation_from_prediction(prediction, soil)
    }

    /// Fertilizer advice for the given soil; never fails
    pub fn recommend(&self, soil: &SoilData) -> FertilizerRecommendation {
        match self.try_model_recommendation(soil) {
            Ok(recommendation) => recommendation,
            Err(FallbackReason::ModelNotLoaded) => rule_based_fertilizer(soil),
            Err(reason) => {
                tracing::warn!(%reason, "Fertilizer model unusable, using rule-based advice");
                rule_based_fertilizer(soil)
            }
        }
    }
}

/// Advice from an advisor if one could be constructed, else the static default
pub fn recommend_or_default(
    advisor: Option<&FertilizerAdvisor>,
    soil: &SoilData,
) -> FertilizerRecommendation {
    match advisor {
        Some(advisor) => advisor.recommend(soil),
        None => FertilizerRecommendation::unavailable(),
    }
}

/// Fertilizer advice for a registered crop.
///
/// The treated area defaults to the crop's planted area.
pub async fn fertilizer_for_crop<S>(
    store: &S,
    advisor: Option<&FertilizerAdvisor>,
    farm_id: Uuid,
    crop_id: Uuid,
    mut soil: SoilData,
) -> AppResult<FertilizerRecommendation>
where
    S: FarmRepository + CropRepository,
{
    soil.validate()?;
    let (_, crop) = load_farm_and_crop(store, farm_id, crop_id).await?;

    if soil.area_acres.is_none() {
        soil.area_acres = crop.area_planted_acres.to_f64();
    }

    Ok(recommend_or_default(advisor, &soil))
}

fn arg_max(probabilities: &[f64]) -> Result<usize, FallbackReason> {
    if probabilities.iter().any(|p| p.is_nan()) {
        return Err(FallbackReason::MalformedPrediction(
            "probability vector contains NaN".to_string(),
        ));
    }

    probabilities
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, &p)| match best {
            Some((_, top)) if top >= p => best,
            _ => Some((index, p)),
        })
        .map(|(index, _)| index)
        .ok_or_else(|| FallbackReason::MalformedPrediction("empty probability vector".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::fertilizer_model::Features;
    use std::sync::Arc;

    fn direct(value: f64) -> FertilizerAdvisor {
        FertilizerAdvisor::new(ModelStrategy::DirectPredictor(Arc::new(
            move |_: &Features| -> Result<f64, FallbackReason> { Ok(value) },
        )))
    }

    fn probabilistic(probabilities: Vec<f64>) -> FertilizerAdvisor {
        FertilizerAdvisor::new(ModelStrategy::ProbabilisticPredictor(Arc::new(
            move |_: &Features| -> Result<Vec<f64>, FallbackReason> { Ok(probabilities.clone()) },
        )))
    }

    #[test]
    fn test_no_model_uses_rules() {
        let advisor = FertilizerAdvisor::new(ModelStrategy::NotLoaded);
        let rec = advisor.recommend(&SoilData::default());
        assert_eq!(rec.fertilizer_type, "NPK 20-20-20");
        assert_eq!(rec.amount_per_acre, 50.0);
        assert_eq!(rec.application_method, "Side dressing");
        assert_eq!(
            advisor.try_model_recommendation(&SoilData::default()),
            Err(FallbackReason::ModelNotLoaded)
        );
    }

    #[test]
    fn test_direct_prediction_maps_onto_catalog() {
        let rec = direct(7.5).recommend(&SoilData::default());
        // trunc(7.5) = 7 -> catalog[2], methods[3]
        assert_eq!(rec.fertilizer_type, "DAP");
        assert_eq!(rec.application_method, "Deep placement");
        assert_eq!(rec.amount_per_acre, 75.0);
        assert_eq!(rec.npk_analysis.phosphorus, 46);
    }

    #[test]
    fn test_negative_direct_prediction_maps_onto_catalog() {
        let soil = SoilData {
            soil_ph: Some(5.5),
            ..Default::default()
        };
        let rec = direct(-1.0).recommend(&soil);
        // trunc(-1.0) = -1 -> catalog[4], methods[3]
        assert_eq!(rec.fertilizer_type, "Organic Compost");
        assert_eq!(rec.application_method, "Deep placement");
        assert_eq!(rec.amount_per_acre, 20.0);
        assert!(rec.reason.starts_with("Based on soil analysis"));
    }

    #[test]
    fn test_probabilistic_prediction_uses_arg_max() {
        let rec = probabilistic(vec![0.1, 0.2, 0.05, 0.6, 0.05]).recommend(&SoilData::default());
        assert_eq!(rec.fertilizer_type, "MOP");
        assert_eq!(rec.application_method, "Deep placement");
        assert_eq!(rec.amount_per_acre, 30.0);
    }

    #[test]
    fn test_unusable_predictions_fall_back_to_rules() {
        let soil = SoilData {
            soil_ph: Some(5.5),
            ..Default::default()
        };
        for advisor in [
            direct(f64::NAN),
            probabilistic(vec![]),
            FertilizerAdvisor::new(ModelStrategy::Unsupported("mapping".to_string())),
        ] {
            let rec = advisor.recommend(&soil);
            assert_eq!(rec.fertilizer_type, "Lime + NPK 15-15-15");
            assert_eq!(rec.amount_per_acre, 60.0);
        }
    }

    #[test]
    fn test_inference_error_falls_back_to_rules() {
        let advisor = FertilizerAdvisor::new(ModelStrategy::DirectPredictor(Arc::new(
            |_: &Features| -> Result<f64, FallbackReason> {
                Err(FallbackReason::InferenceFailed("boom".to_string()))
            },
        )));
        let rec = advisor.recommend(&SoilData::default());
        assert!(rec.reason.starts_with("Rule-based recommendation"));
    }

    #[tokio::test]
    async fn test_crop_area_is_the_default_area() {
        use crate::store::memory::MemoryStore;
        use rust_decimal::Decimal;
        use shared::{CropContext, CropStage, FarmContext, GpsCoordinates, SoilType};

        let store = MemoryStore::new();
        let farm_id = Uuid::new_v4();
        let crop_id = Uuid::new_v4();
        store.add_farm(FarmContext {
            id: farm_id,
            name: "Valley".to_string(),
            soil_type: SoilType::Clay,
            location: GpsCoordinates::new(Decimal::from(10), Decimal::from(76)),
            size_acres: Decimal::from(8),
        });
        store.add_crop(CropContext {
            id: crop_id,
            farm_id,
            crop_name: "Banana".to_string(),
            current_stage: CropStage::Vegetative,
            area_planted_acres: Decimal::new(25, 1),
        });

        // Weight only the area feature so the prediction reveals it
        let advisor = FertilizerAdvisor::new(ModelStrategy::DirectPredictor(Arc::new(
            |features: &Features| -> Result<f64, FallbackReason> { Ok(features[5]) },
        )));
        let rec = fertilizer_for_crop(&store, Some(&advisor), farm_id, crop_id, SoilData::default())
            .await
            .unwrap();
        // trunc(2.5) = 2 -> DAP, 2.5 * 10 = 25 kg
        assert_eq!(rec.fertilizer_type, "DAP");
        assert_eq!(rec.amount_per_acre, 25.0);

        let invalid = SoilData {
            soil_ph: Some(15.0),
            ..Default::default()
        };
        let result = fertilizer_for_crop(&store, None, farm_id, crop_id, invalid).await;
        assert!(matches!(result, Err(crate::error::AppError::Validation { .. })));
    }

    #[test]
    fn test_missing_advisor_uses_static_default() {
        let rec = recommend_or_default(None, &SoilData::default());
        assert_eq!(rec, FertilizerRecommendation::unavailable());
        assert_eq!(rec.application_method, "Broadcast");
        assert_eq!(rec.application_tips.len(), 3);
    }
}
