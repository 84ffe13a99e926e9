//! Irrigation advice for a registered crop

use serde::Serialize;
use shared::{
    recommend_irrigation, IrrigationInput, IrrigationRecommendation, WeatherSnapshot,
};
use uuid::Uuid;

use super::load_farm_and_crop;
use crate::error::AppResult;
use crate::external::WeatherProvider;
use crate::store::{CropRepository, FarmRepository};

/// Irrigation advice together with the conditions it was based on
#[derive(Debug, Clone, Serialize)]
pub struct IrrigationAdvice {
    pub farm_id: Uuid,
    pub crop_id: Uuid,
    pub crop_name: String,
    /// `None` when no snapshot was available and defaults were used
    pub weather: Option<WeatherSnapshot>,
    #[serde(flatten)]
    pub recommendation: IrrigationRecommendation,
}

/// Irrigation advice for one crop from its farm's current weather
pub async fn irrigation_for_crop<S>(
    store: &S,
    weather: &dyn WeatherProvider,
    farm_id: Uuid,
    crop_id: Uuid,
) -> AppResult<IrrigationAdvice>
where
    S: FarmRepository + CropRepository,
{
    let (farm, crop) = load_farm_and_crop(store, farm_id, crop_id).await?;

    let snapshot = match weather.current(farm.location).await {
        Ok(snapshot) => Some(snapshot),
        Err(reason) => {
            tracing::warn!(%farm_id, %reason, "No weather for irrigation advice, using defaults");
            None
        }
    };

    let input = match &snapshot {
        Some(snapshot) => {
            IrrigationInput::from_conditions(snapshot, crop.current_stage, farm.soil_type)
        }
        None => IrrigationInput {
            crop_stage: Some(crop.current_stage),
            soil_type: Some(farm.soil_type),
            ..Default::default()
        },
    };

    Ok(IrrigationAdvice {
        farm_id,
        crop_id,
        crop_name: crop.crop_name,
        weather: snapshot,
        recommendation: recommend_irrigation(&input),
    })
}
