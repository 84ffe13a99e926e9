//! Irrigation advisor
//!
//! Rule-based water requirement estimate from current weather, crop
//! stage and soil type. Every adjustment is a multiplier on a base of
//! 20 liters per day per acre; the multipliers compose in a fixed order
//! so the reasoning can be audited step by step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::fallback::FallbackReason;
use crate::models::{CropStage, SoilType, WeatherSnapshot};

/// Inputs to the irrigation advisor. Missing readings take documented defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrrigationInput {
    pub temperature_celsius: Option<Decimal>,
    pub humidity_percent: Option<Decimal>,
    pub rainfall_mm: Option<Decimal>,
    pub crop_stage: Option<CropStage>,
    pub soil_type: Option<SoilType>,
}

impl IrrigationInput {
    pub fn from_conditions(weather: &WeatherSnapshot, stage: CropStage, soil: SoilType) -> Self {
        Self {
            temperature_celsius: Some(weather.temperature_celsius),
            humidity_percent: Some(weather.humidity_percent),
            rainfall_mm: Some(weather.rainfall_mm),
            crop_stage: Some(stage),
            soil_type: Some(soil),
        }
    }
}

/// Irrigation advice for one crop
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IrrigationRecommendation {
    /// Liters per day per acre, rounded to 2 decimal places
    pub recommended_water_amount: Decimal,
    pub frequency: IrrigationFrequency,
    pub best_time: IrrigationTime,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IrrigationFrequency {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "every_2_days")]
    EveryTwoDays,
    #[serde(rename = "weekly")]
    Weekly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationTime {
    EarlyMorning,
    Evening,
}

impl IrrigationRecommendation {
    /// Fixed advice used when the estimate cannot be computed
    pub fn fallback(reason: &FallbackReason) -> Self {
        Self {
            recommended_water_amount: Decimal::new(2000, 2),
            frequency: IrrigationFrequency::Daily,
            best_time: IrrigationTime::EarlyMorning,
            reason: format!("Default recommendation - error: {}", reason),
        }
    }
}

fn base_water_liters() -> Decimal {
    Decimal::from(20)
}

/// Temperature adjustment: >30 °C ×1.5, >25 °C ×1.2
pub fn temperature_factor(temperature: Decimal) -> Decimal {
    if temperature > Decimal::from(30) {
        Decimal::new(15, 1)
    } else if temperature > Decimal::from(25) {
        Decimal::new(12, 1)
    } else {
        Decimal::ONE
    }
}

/// Humidity adjustment: <40% ×1.3, >80% ×0.7, neutral in between
pub fn humidity_factor(humidity: Decimal) -> Decimal {
    if humidity < Decimal::from(40) {
        Decimal::new(13, 1)
    } else if humidity > Decimal::from(80) {
        Decimal::new(7, 1)
    } else {
        Decimal::ONE
    }
}

pub fn stage_factor(stage: CropStage) -> Decimal {
    match stage {
        CropStage::Seedling => Decimal::new(5, 1),
        CropStage::Vegetative => Decimal::ONE,
        CropStage::Flowering => Decimal::new(13, 1),
        CropStage::Fruiting => Decimal::new(15, 1),
        CropStage::Harvesting => Decimal::new(8, 1),
        CropStage::Unknown => Decimal::ONE,
    }
}

pub fn soil_factor(soil: SoilType) -> Decimal {
    match soil {
        SoilType::Sandy => Decimal::new(13, 1),
        SoilType::Loamy => Decimal::ONE,
        SoilType::Clay => Decimal::new(8, 1),
        SoilType::Other => Decimal::ONE,
    }
}

/// Recent rainfall adjustment: >10 mm ×0.3, >5 mm ×0.6
pub fn rainfall_factor(rainfall: Decimal) -> Decimal {
    if rainfall > Decimal::from(10) {
        Decimal::new(3, 1)
    } else if rainfall > Decimal::from(5) {
        Decimal::new(6, 1)
    } else {
        Decimal::ONE
    }
}

/// Frequency from the final amount: >30 daily, >15 every two days, else weekly
pub fn frequency_for(amount: Decimal) -> IrrigationFrequency {
    if amount > Decimal::from(30) {
        IrrigationFrequency::Daily
    } else if amount > Decimal::from(15) {
        IrrigationFrequency::EveryTwoDays
    } else {
        IrrigationFrequency::Weekly
    }
}

fn scale(value: Decimal, factor: Decimal, what: &'static str) -> Result<Decimal, FallbackReason> {
    value
        .checked_mul(factor)
        .ok_or(FallbackReason::ArithmeticOverflow(what))
}

/// Compute the irrigation estimate, reporting why it could not be computed
pub fn try_recommend_irrigation(
    input: &IrrigationInput,
) -> Result<IrrigationRecommendation, FallbackReason> {
    let temperature = input.temperature_celsius.unwrap_or_else(|| Decimal::from(25));
    let humidity = input.humidity_percent.unwrap_or_else(|| Decimal::from(60));
    let rainfall = input.rainfall_mm.unwrap_or(Decimal::ZERO);
    let stage = input.crop_stage.unwrap_or_default();
    let soil = input.soil_type.unwrap_or_default();

    let mut multiplier = temperature_factor(temperature);
    multiplier = scale(multiplier, humidity_factor(humidity), "humidity adjustment")?;
    multiplier = scale(multiplier, stage_factor(stage), "crop stage adjustment")?;
    multiplier = scale(multiplier, soil_factor(soil), "soil adjustment")?;
    multiplier = scale(multiplier, rainfall_factor(rainfall), "rainfall adjustment")?;

    let amount = scale(base_water_liters(), multiplier, "water amount")?.round_dp(2);

    let best_time = if temperature > Decimal::from(30) {
        IrrigationTime::EarlyMorning
    } else {
        IrrigationTime::Evening
    };

    Ok(IrrigationRecommendation {
        recommended_water_amount: amount,
        frequency: frequency_for(amount),
        best_time,
        reason: format!(
            "Based on temperature: {}°C, humidity: {}%, rainfall: {}mm, crop stage: {}",
            temperature, humidity, rainfall, stage
        ),
    })
}

/// Irrigation advice that never fails
pub fn recommend_irrigation(input: &IrrigationInput) -> IrrigationRecommendation {
    try_recommend_irrigation(input).unwrap_or_else(|reason| IrrigationRecommendation::fallback(&reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_hot_dry_fruiting_sandy() {
        let input = IrrigationInput {
            temperature_celsius: Some(dec("32")),
            humidity_percent: Some(dec("35")),
            rainfall_mm: Some(Decimal::ZERO),
            crop_stage: Some(CropStage::Fruiting),
            soil_type: Some(SoilType::Sandy),
        };
        let rec = recommend_irrigation(&input);
        assert_eq!(rec.recommended_water_amount, dec("76.05"));
        assert_eq!(rec.frequency, IrrigationFrequency::Daily);
        assert_eq!(rec.best_time, IrrigationTime::EarlyMorning);
        assert!(rec.reason.contains("crop stage: fruiting"));
    }

    #[test]
    fn test_all_defaults() {
        let rec = recommend_irrigation(&IrrigationInput::default());
        assert_eq!(rec.recommended_water_amount, dec("20"));
        assert_eq!(rec.frequency, IrrigationFrequency::EveryTwoDays);
        assert_eq!(rec.best_time, IrrigationTime::Evening);
        assert_eq!(
            rec.reason,
            "Based on temperature: 25°C, humidity: 60%, rainfall: 0mm, crop stage: vegetative"
        );
    }

    #[test]
    fn test_humidity_neutral_band() {
        assert_eq!(humidity_factor(dec("40")), Decimal::ONE);
        assert_eq!(humidity_factor(dec("80")), Decimal::ONE);
        assert_eq!(humidity_factor(dec("39.9")), dec("1.3"));
        assert_eq!(humidity_factor(dec("80.1")), dec("0.7"));
    }

    #[test]
    fn test_rainfall_bands() {
        assert_eq!(rainfall_factor(dec("5")), Decimal::ONE);
        assert_eq!(rainfall_factor(dec("10")), dec("0.6"));
        assert_eq!(rainfall_factor(dec("10.5")), dec("0.3"));
    }

    #[test]
    fn test_heavy_rain_on_seedlings_is_weekly() {
        let input = IrrigationInput {
            temperature_celsius: Some(dec("22")),
            humidity_percent: Some(dec("85")),
            rainfall_mm: Some(dec("12")),
            crop_stage: Some(CropStage::Seedling),
            soil_type: Some(SoilType::Clay),
        };
        let rec = recommend_irrigation(&input);
        // 20 × 1.0 × 0.7 × 0.5 × 0.8 × 0.3
        assert_eq!(rec.recommended_water_amount, dec("1.68"));
        assert_eq!(rec.frequency, IrrigationFrequency::Weekly);
        assert_eq!(rec.best_time, IrrigationTime::Evening);
    }

    #[test]
    fn test_frequency_thresholds() {
        assert_eq!(frequency_for(dec("35")), IrrigationFrequency::Daily);
        assert_eq!(frequency_for(dec("30")), IrrigationFrequency::EveryTwoDays);
        assert_eq!(frequency_for(dec("20")), IrrigationFrequency::EveryTwoDays);
        assert_eq!(frequency_for(dec("15")), IrrigationFrequency::Weekly);
        assert_eq!(frequency_for(dec("10")), IrrigationFrequency::Weekly);
    }

    #[test]
    fn test_fallback_shape() {
        let rec = IrrigationRecommendation::fallback(&FallbackReason::ArithmeticOverflow("water amount"));
        assert_eq!(rec.recommended_water_amount, dec("20.00"));
        assert_eq!(rec.frequency, IrrigationFrequency::Daily);
        assert_eq!(rec.best_time, IrrigationTime::EarlyMorning);
        assert!(rec.reason.starts_with("Default recommendation - error:"));
    }

    #[test]
    fn test_frequency_serializes_with_legacy_labels() {
        let json = serde_json::to_string(&IrrigationFrequency::EveryTwoDays).unwrap();
        assert_eq!(json, "\"every_2_days\"");
    }
}
