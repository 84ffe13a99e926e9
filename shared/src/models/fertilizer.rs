//! Fertilizer advisor
//!
//! Two paths share one output contract: a mapping from a model
//! prediction onto a small product catalog, and a deterministic
//! rule chain over soil chemistry used whenever no model is usable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::fallback::FallbackReason;

pub const DEFAULT_SOIL_PH: f64 = 6.5;
pub const DEFAULT_ORGANIC_MATTER: f64 = 2.0;
pub const DEFAULT_NITROGEN: f64 = 50.0;
pub const DEFAULT_PHOSPHORUS: f64 = 30.0;
pub const DEFAULT_POTASSIUM: f64 = 100.0;
pub const DEFAULT_AREA_ACRES: f64 = 1.0;

/// Products a model prediction indexes into
pub const FERTILIZER_CATALOG: [&str; 5] = ["NPK 20-20-20", "Urea", "DAP", "MOP", "Organic Compost"];

/// Application methods a model prediction indexes into
pub const APPLICATION_METHODS: [&str; 4] =
    ["Broadcast", "Side dressing", "Foliar spray", "Deep placement"];

const GROWTH_STAGE_TIMING: &str = "Before planting and during growth stages";

static NPK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"NPK\s+(\d+)-(\d+)-(\d+)").expect("NPK pattern is a valid regex")
});

/// Soil chemistry submitted for a fertilizer recommendation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SoilData {
    #[validate(range(min = 0.0, max = 14.0))]
    pub soil_ph: Option<f64>,
    /// Percent
    #[validate(range(min = 0.0, max = 100.0))]
    pub organic_matter: Option<f64>,
    #[validate(range(min = 0.0))]
    pub nitrogen: Option<f64>,
    #[validate(range(min = 0.0))]
    pub phosphorus: Option<f64>,
    #[validate(range(min = 0.0))]
    pub potassium: Option<f64>,
    #[validate(range(min = 0.0))]
    pub area_acres: Option<f64>,
}

impl SoilData {
    pub fn soil_ph(&self) -> f64 {
        self.soil_ph.unwrap_or(DEFAULT_SOIL_PH)
    }

    pub fn organic_matter(&self) -> f64 {
        self.organic_matter.unwrap_or(DEFAULT_ORGANIC_MATTER)
    }

    pub fn nitrogen(&self) -> f64 {
        self.nitrogen.unwrap_or(DEFAULT_NITROGEN)
    }

    pub fn phosphorus(&self) -> f64 {
        self.phosphorus.unwrap_or(DEFAULT_PHOSPHORUS)
    }

    pub fn potassium(&self) -> f64 {
        self.potassium.unwrap_or(DEFAULT_POTASSIUM)
    }

    pub fn area_acres(&self) -> f64 {
        self.area_acres.unwrap_or(DEFAULT_AREA_ACRES)
    }

    /// Model features in fixed order: pH, organic matter, N, P, K, area
    pub fn feature_vector(&self) -> [f64; 6] {
        [
            self.soil_ph(),
            self.organic_matter(),
            self.nitrogen(),
            self.phosphorus(),
            self.potassium(),
            self.area_acres(),
        ]
    }
}

/// Nutrient percentages of a fertilizer product
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NpkAnalysis {
    pub nitrogen: u64,
    pub phosphorus: u64,
    pub potassium: u64,
}

impl NpkAnalysis {
    pub const fn new(nitrogen: u64, phosphorus: u64, potassium: u64) -> Self {
        Self {
            nitrogen,
            phosphorus,
            potassium,
        }
    }
}

impl Default for NpkAnalysis {
    fn default() -> Self {
        Self::new(20, 20, 20)
    }
}

/// Fertilizer advice for a field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FertilizerRecommendation {
    pub fertilizer_type: String,
    /// Kilograms per acre
    pub amount_per_acre: f64,
    pub application_method: String,
    pub timing: String,
    pub reason: String,
    pub npk_analysis: NpkAnalysis,
    pub application_tips: Vec<String>,
}

fn application_tips(include_storage: bool) -> Vec<String> {
    let mut tips = vec![
        "Apply fertilizer evenly across the field".to_string(),
        "Avoid applying during heavy rainfall".to_string(),
        "Water the field after application".to_string(),
    ];
    if include_storage {
        tips.push("Store fertilizer in a dry, cool place".to_string());
    }
    tips
}

impl FertilizerRecommendation {
    /// Static advice used when no advisor could be constructed at all
    pub fn unavailable() -> Self {
        Self {
            fertilizer_type: "NPK 20-20-20".to_string(),
            amount_per_acre: 50.0,
            application_method: "Broadcast".to_string(),
            timing: "Before planting".to_string(),
            reason: "Default recommendation - model not available".to_string(),
            npk_analysis: NpkAnalysis::default(),
            application_tips: application_tips(false),
        }
    }
}

/// Derive the nutrient breakdown from a product name.
///
/// A ratio too large for `u64` leaves the 20-20-20 default.
pub fn extract_npk(fertilizer_type: &str) -> NpkAnalysis {
    if fertilizer_type.contains("NPK") {
        return NPK_PATTERN
            .captures(fertilizer_type)
            .and_then(|caps| {
                let n = caps[1].parse().ok()?;
                let p = caps[2].parse().ok()?;
                let k = caps[3].parse().ok()?;
                Some(NpkAnalysis::new(n, p, k))
            })
            .unwrap_or_default();
    }

    if fertilizer_type.contains("Urea") {
        NpkAnalysis::new(46, 0, 0)
    } else if fertilizer_type.contains("DAP") {
        NpkAnalysis::new(18, 46, 0)
    } else if fertilizer_type.contains("MOP") {
        NpkAnalysis::new(0, 0, 60)
    } else if fertilizer_type.contains("Organic") {
        NpkAnalysis::new(2, 1, 1)
    } else {
        NpkAnalysis::default()
    }
}

/// Deterministic recommendation; the first matching soil condition wins
pub fn rule_based_fertilizer(soil: &SoilData) -> FertilizerRecommendation {
    let ph = soil.soil_ph();
    let organic_matter = soil.organic_matter();
    let nitrogen = soil.nitrogen();
    let phosphorus = soil.phosphorus();
    let potassium = soil.potassium();

    let (fertilizer_type, amount) = if ph < 6.0 {
        ("Lime + NPK 15-15-15", 60.0)
    } else if ph > 8.0 {
        ("Sulfur + NPK 20-20-20", 45.0)
    } else if organic_matter < 1.0 {
        ("Organic Compost + NPK 20-20-20", 70.0)
    } else if nitrogen < 30.0 {
        ("Urea + NPK 20-20-20", 55.0)
    } else if phosphorus < 20.0 {
        ("DAP + NPK 20-20-20", 50.0)
    } else if potassium < 80.0 {
        ("MOP + NPK 20-20-20", 50.0)
    } else {
        ("NPK 20-20-20", 50.0)
    };

    let application_method = if amount > 60.0 {
        "Broadcast"
    } else {
        "Side dressing"
    };

    FertilizerRecommendation {
        fertilizer_type: fertilizer_type.to_string(),
        amount_per_acre: amount,
        application_method: application_method.to_string(),
        timing: GROWTH_STAGE_TIMING.to_string(),
        reason: format!(
            "Rule-based recommendation - pH: {}, Organic matter: {}%, N: {}, P: {}, K: {}",
            ph, organic_matter, nitrogen, phosphorus, potassium
        ),
        npk_analysis: extract_npk(fertilizer_type),
        application_tips: application_tips(true),
    }
}

fn catalog_slot(index: i64, len: usize) -> usize {
    index.rem_euclid(len as i64) as usize
}

/// Map a raw model prediction onto the product catalog.
///
/// The index is the truncated prediction taken modulo the catalog size,
/// always non-negative, so negative predictions wrap around the catalog.
/// The amount is the prediction scaled by ten, clamped to 20..=100 kg.
pub fn recommendation_from_prediction(
    prediction: f64,
    soil: &SoilData,
) -> Result<FertilizerRecommendation, FallbackReason> {
    if !prediction.is_finite() {
        return Err(FallbackReason::MalformedPrediction(format!(
            "prediction {} is not a finite number",
            prediction
        )));
    }

    let index = prediction.trunc() as i64;
    let fertilizer_type = FERTILIZER_CATALOG[catalog_slot(index, FERTILIZER_CATALOG.len())];
    let application_method = APPLICATION_METHODS[catalog_slot(index, APPLICATION_METHODS.len())];
    let amount = (prediction * 10.0).clamp(20.0, 100.0);

    Ok(FertilizerRecommendation {
        fertilizer_type: fertilizer_type.to_string(),
        amount_per_acre: amount,
        application_method: application_method.to_string(),
        timing: GROWTH_STAGE_TIMING.to_string(),
        reason: format!(
            "Based on soil analysis - pH: {}, Organic matter: {}%",
            soil.soil_ph(),
            soil.organic_matter()
        ),
        npk_analysis: extract_npk(fertilizer_type),
        application_tips: application_tips(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reach_else_branch() {
        let rec = rule_based_fertilizer(&SoilData::default());
        assert_eq!(rec.fertilizer_type, "NPK 20-20-20");
        assert_eq!(rec.amount_per_acre, 50.0);
        assert_eq!(rec.application_method, "Side dressing");
        assert_eq!(rec.npk_analysis, NpkAnalysis::new(20, 20, 20));
        assert_eq!(
            rec.reason,
            "Rule-based recommendation - pH: 6.5, Organic matter: 2%, N: 50, P: 30, K: 100"
        );
    }

    #[test]
    fn test_acidic_soil_short_circuits() {
        let soil = SoilData {
            soil_ph: Some(5.5),
            nitrogen: Some(5.0),
            phosphorus: Some(1.0),
            potassium: Some(2.0),
            ..Default::default()
        };
        let rec = rule_based_fertilizer(&soil);
        assert_eq!(rec.fertilizer_type, "Lime + NPK 15-15-15");
        assert_eq!(rec.amount_per_acre, 60.0);
        assert_eq!(rec.application_method, "Side dressing");
        assert_eq!(rec.npk_analysis, NpkAnalysis::new(15, 15, 15));
    }

    #[test]
    fn test_low_organic_matter_is_broadcast() {
        let soil = SoilData {
            organic_matter: Some(0.5),
            ..Default::default()
        };
        let rec = rule_based_fertilizer(&soil);
        assert_eq!(rec.fertilizer_type, "Organic Compost + NPK 20-20-20");
        assert_eq!(rec.amount_per_acre, 70.0);
        assert_eq!(rec.application_method, "Broadcast");
    }

    #[test]
    fn test_rule_priority_order() {
        let cases = [
            (SoilData { soil_ph: Some(8.5), ..Default::default() }, "Sulfur + NPK 20-20-20", 45.0),
            (SoilData { nitrogen: Some(10.0), ..Default::default() }, "Urea + NPK 20-20-20", 55.0),
            (SoilData { phosphorus: Some(10.0), ..Default::default() }, "DAP + NPK 20-20-20", 50.0),
            (SoilData { potassium: Some(60.0), ..Default::default() }, "MOP + NPK 20-20-20", 50.0),
        ];
        for (soil, expected, amount) in cases {
            let rec = rule_based_fertilizer(&soil);
            assert_eq!(rec.fertilizer_type, expected);
            assert_eq!(rec.amount_per_acre, amount);
        }
    }

    #[test]
    fn test_extract_npk_special_products() {
        assert_eq!(extract_npk("Urea"), NpkAnalysis::new(46, 0, 0));
        assert_eq!(extract_npk("DAP"), NpkAnalysis::new(18, 46, 0));
        assert_eq!(extract_npk("MOP"), NpkAnalysis::new(0, 0, 60));
        assert_eq!(extract_npk("Organic Compost"), NpkAnalysis::new(2, 1, 1));
        assert_eq!(extract_npk("Bone meal"), NpkAnalysis::default());
        // A product containing NPK without a ratio keeps the default
        assert_eq!(extract_npk("Urea NPK blend"), NpkAnalysis::default());
    }

    #[test]
    fn test_prediction_mapping() {
        let soil = SoilData::default();
        let rec = recommendation_from_prediction(7.0, &soil).unwrap();
        assert_eq!(rec.fertilizer_type, "DAP");
        assert_eq!(rec.application_method, "Deep placement");
        assert_eq!(rec.amount_per_acre, 70.0);
        assert_eq!(rec.npk_analysis, NpkAnalysis::new(18, 46, 0));

        let low = recommendation_from_prediction(0.0, &soil).unwrap();
        assert_eq!(low.fertilizer_type, "NPK 20-20-20");
        assert_eq!(low.amount_per_acre, 20.0);

        let high = recommendation_from_prediction(42.0, &soil).unwrap();
        assert_eq!(high.amount_per_acre, 100.0);
    }

    #[test]
    fn test_prediction_rejects_non_finite() {
        for prediction in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = recommendation_from_prediction(prediction, &SoilData::default());
            assert!(matches!(result, Err(FallbackReason::MalformedPrediction(_))));
        }
    }

    #[test]
    fn test_negative_prediction_wraps_catalog() {
        let rec = recommendation_from_prediction(-3.7, &SoilData::default()).unwrap();
        assert_eq!(rec.fertilizer_type, "DAP");
        assert_eq!(rec.application_method, "Side dressing");
        assert_eq!(rec.amount_per_acre, 20.0);

        let rec = recommendation_from_prediction(-1.0, &SoilData::default()).unwrap();
        assert_eq!(rec.fertilizer_type, "Organic Compost");
        assert_eq!(rec.application_method, "Deep placement");
    }

    #[test]
    fn test_extract_npk_large_ratio() {
        assert_eq!(
            extract_npk("NPK 5000000000-1-1"),
            NpkAnalysis::new(5_000_000_000, 1, 1)
        );
    }

    #[test]
    fn test_unavailable_default() {
        let rec = FertilizerRecommendation::unavailable();
        assert_eq!(rec.application_method, "Broadcast");
        assert_eq!(rec.timing, "Before planting");
        assert_eq!(rec.application_tips.len(), 3);
    }

    #[test]
    fn test_soil_validation() {
        let soil = SoilData {
            soil_ph: Some(15.0),
            ..Default::default()
        };
        assert!(soil.validate().is_err());
        assert!(SoilData::default().validate().is_ok());
    }
}
