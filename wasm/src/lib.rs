//! WebAssembly module for the Agricultural Advisory Platform
//!
//! Runs the pure advisors in the browser so farmers get advice offline:
//! - Irrigation estimates
//! - Rule-based fertilizer advice and NPK breakdowns
//! - Disease catalog lookup for a classifier label

use rust_decimal::Decimal;
use serde::Serialize;
use validator::Validate;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
}

fn invalid_input(what: &str, e: impl std::fmt::Display) -> JsValue {
    let message = format!("Invalid {} JSON: {}", what, e);
    web_sys::console::warn_1(&JsValue::from_str(&message));
    JsValue::from_str(&message)
}

/// Irrigation recommendation from an `IrrigationInput` JSON object
#[wasm_bindgen]
pub fn recommend_irrigation_json(input_json: &str) -> Result<String, JsValue> {
    let input: IrrigationInput =
        serde_json::from_str(input_json).map_err(|e| invalid_input("irrigation input", e))?;
    to_json(&recommend_irrigation(&input))
}

/// Rule-based fertilizer recommendation from a `SoilData` JSON object
#[wasm_bindgen]
pub fn recommend_fertilizer_json(soil_json: &str) -> Result<String, JsValue> {
    let soil: SoilData =
        serde_json::from_str(soil_json).map_err(|e| invalid_input("soil data", e))?;
    soil.validate().map_err(|e| invalid_input("soil data", e))?;
    to_json(&rule_based_fertilizer(&soil))
}

/// NPK breakdown of a fertilizer product name
#[wasm_bindgen]
pub fn extract_npk_json(fertilizer_type: &str) -> Result<String, JsValue> {
    to_json(&extract_npk(fertilizer_type))
}

/// Disease result for a classifier label and confidence
#[wasm_bindgen]
pub fn classify_disease_json(label: &str, confidence: f32) -> Result<String, JsValue> {
    to_json(&classify_disease(label, confidence))
}

/// Treatment steps for a disease label
#[wasm_bindgen]
pub fn disease_treatments(label: &str) -> js_sys::Array {
    let (treatments, _) = disease_recommendations(label);
    treatments.into_iter().map(JsValue::from).collect()
}

/// Irrigation frequency label for a daily water amount in liters
#[wasm_bindgen]
pub fn irrigation_frequency(liters: f64) -> String {
    let amount = Decimal::try_from(liters).unwrap_or(Decimal::ZERO);
    match frequency_for(amount) {
        IrrigationFrequency::Daily => "daily",
        IrrigationFrequency::EveryTwoDays => "every_2_days",
        IrrigationFrequency::Weekly => "weekly",
    }
    .to_string()
}
