//! Daily advisory generation
//!
//! Turns the current weather, crop stages and soil type of a farm into a
//! batch of advisory records. At most one batch is written per farm per
//! UTC calendar day.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shared::{
    AdvisoryRecord, AdvisoryType, CropContext, CropStage, FarmContext, NewAdvisory, Priority,
    SoilType, WeatherSnapshot,
};
use uuid::Uuid;

use super::load_farm;
use crate::error::AppResult;
use crate::external::WeatherProvider;
use crate::store::{AdvisorySink, CropRepository, FarmRepository};

/// Farm-wide alerts from current conditions, attached to the subject crop
pub fn weather_advisories(
    farm_id: Uuid,
    subject: &CropContext,
    weather: &WeatherSnapshot,
) -> Vec<NewAdvisory> {
    let mut advisories = Vec::new();

    if weather.temperature_celsius > Decimal::from(35) {
        advisories.push(NewAdvisory::new(
            farm_id,
            subject.id,
            AdvisoryType::Irrigation,
            Priority::High,
            "High Temperature Alert",
            format!(
                "Temperature is {:.1}°C. Consider increasing irrigation frequency to prevent heat stress.",
                weather.temperature_celsius
            ),
        ));
    }

    if weather.humidity_percent < Decimal::from(30) {
        advisories.push(NewAdvisory::new(
            farm_id,
            subject.id,
            AdvisoryType::Irrigation,
            Priority::Medium,
            "Low Humidity Alert",
            format!(
                "Humidity is {:.1}%. Consider misting or increasing irrigation to maintain soil moisture.",
                weather.humidity_percent
            ),
        ));
    }

    if weather.wind_speed_kmh > Decimal::from(15) {
        advisories.push(NewAdvisory::new(
            farm_id,
            subject.id,
            AdvisoryType::General,
            Priority::Medium,
            "High Wind Warning",
            format!(
                "Wind speed is {:.1} km/h. Consider protecting young plants and checking irrigation systems.",
                weather.wind_speed_kmh
            ),
        ));
    }

    advisories
}

/// Stage-specific care for one crop
pub fn stage_advisory(farm_id: Uuid, crop: &CropContext) -> Option<NewAdvisory> {
    let (advisory_type, priority, title, description) = match crop.current_stage {
        CropStage::Seedling => (
            AdvisoryType::Fertilizer,
            Priority::Medium,
            "Seedling Stage Care",
            format!(
                "Your {} is in seedling stage. Apply light fertilizer and ensure consistent moisture.",
                crop.crop_name
            ),
        ),
        CropStage::Flowering => (
            AdvisoryType::Fertilizer,
            Priority::High,
            "Flowering Stage Nutrition",
            format!(
                "Your {} is flowering. Apply phosphorus-rich fertilizer to support flower development.",
                crop.crop_name
            ),
        ),
        CropStage::Fruiting => (
            AdvisoryType::Irrigation,
            Priority::High,
            "Fruiting Stage Watering",
            format!(
                "Your {} is fruiting. Maintain consistent soil moisture for optimal fruit development.",
                crop.crop_name
            ),
        ),
        CropStage::Vegetative | CropStage::Harvesting | CropStage::Unknown => return None,
    };

    Some(NewAdvisory::new(
        farm_id,
        crop.id,
        advisory_type,
        priority,
        title,
        description,
    ))
}

/// Soil management advice, attached to the subject crop
pub fn soil_advisory(farm: &FarmContext, subject: &CropContext) -> Option<NewAdvisory> {
    match farm.soil_type {
        SoilType::Sandy => Some(NewAdvisory::new(
            farm.id,
            subject.id,
            AdvisoryType::Fertilizer,
            Priority::Medium,
            "Sandy Soil Management",
            "Sandy soil drains quickly. Consider adding organic matter and applying fertilizer in smaller, more frequent doses.",
        )),
        SoilType::Clay => Some(NewAdvisory::new(
            farm.id,
            subject.id,
            AdvisoryType::Irrigation,
            Priority::Medium,
            "Clay Soil Management",
            "Clay soil retains water well. Be careful not to overwater and ensure good drainage.",
        )),
        SoilType::Loamy | SoilType::Other => None,
    }
}

/// Assemble the day's batch in rule order: weather, stages, soil.
///
/// `weather` is `None` when no snapshot could be obtained; only the
/// weather rules are skipped then.
pub fn build_daily_advisories(
    farm: &FarmContext,
    crops: &[CropContext],
    weather: Option<&WeatherSnapshot>,
) -> Vec<NewAdvisory> {
    let Some(subject) = crops.first() else {
        return Vec::new();
    };

    let mut batch = weather
        .map(|w| weather_advisories(farm.id, subject, w))
        .unwrap_or_default();
    batch.extend(crops.iter().filter_map(|crop| stage_advisory(farm.id, crop)));
    batch.extend(soil_advisory(farm, subject));
    batch
}

/// Generate and persist today's advisories for a farm.
///
/// Returns the records written by this call; empty when a batch already
/// exists for `now`'s date or the farm has no crops. A failed write
/// leaves nothing behind and is returned as an error.
pub async fn generate_daily_recommendations(
    farm: &FarmContext,
    crops: &[CropContext],
    weather: &dyn WeatherProvider,
    sink: &dyn AdvisorySink,
    now: DateTime<Utc>,
) -> AppResult<Vec<AdvisoryRecord>> {
    let today = now.date_naive();
    if sink.count_for_day(farm.id, today).await? > 0 {
        tracing::debug!(farm_id = %farm.id, %today, "Advisories already generated today");
        return Ok(Vec::new());
    }

    if crops.is_empty() {
        tracing::debug!(farm_id = %farm.id, "Farm has no crops, nothing to advise");
        return Ok(Vec::new());
    }

    let snapshot = match weather.current(farm.location).await {
        Ok(snapshot) => Some(snapshot),
        Err(reason) => {
            tracing::warn!(farm_id = %farm.id, %reason, "Skipping weather advisories");
            None
        }
    };

    let batch = build_daily_advisories(farm, crops, snapshot.as_ref());
    if batch.is_empty() {
        return Ok(Vec::new());
    }

    let stored = sink.append_batch(farm.id, now, batch).await?;
    tracing::info!(farm_id = %farm.id, count = stored.len(), "Generated daily advisories");
    Ok(stored)
}

/// Generate today's batch on a best-effort basis, then list every record for the farm
pub async fn farm_recommendations<S>(
    store: &S,
    weather: &dyn WeatherProvider,
    farm_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<Vec<AdvisoryRecord>>
where
    S: FarmRepository + CropRepository + AdvisorySink,
{
    let farm = load_farm(store, farm_id).await?;
    let crops = CropRepository::list_for_farm(store, farm_id).await?;

    if let Err(e) = generate_daily_recommendations(&farm, &crops, weather, store, now).await {
        tracing::warn!(%farm_id, error = %e, "Advisory generation failed, returning existing records");
    }

    AdvisorySink::list_for_farm(store, farm_id).await
}
