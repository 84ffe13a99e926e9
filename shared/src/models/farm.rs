//! Farm and crop models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GpsCoordinates;

/// A registered farm, as read by the advisory core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmContext {
    pub id: Uuid,
    pub name: String,
    pub soil_type: SoilType,
    pub location: GpsCoordinates,
    pub size_acres: Decimal,
}

/// A crop planted on a farm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropContext {
    pub id: Uuid,
    pub farm_id: Uuid,
    pub crop_name: String,
    pub current_stage: CropStage,
    pub area_planted_acres: Decimal,
}

/// Soil classification of a farm
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoilType {
    Sandy,
    Clay,
    #[default]
    Loamy,
    #[serde(other)]
    Other,
}

impl SoilType {
    /// Parse a stored soil label. Unrecognized labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "sandy" => SoilType::Sandy,
            "clay" => SoilType::Clay,
            "loamy" => SoilType::Loamy,
            _ => SoilType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Sandy => "sandy",
            SoilType::Clay => "clay",
            SoilType::Loamy => "loamy",
            SoilType::Other => "other",
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse phenological phase of a crop
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropStage {
    Seedling,
    #[default]
    Vegetative,
    Flowering,
    Fruiting,
    Harvesting,
    /// A stage label the registry stored but we do not recognize
    #[serde(other)]
    Unknown,
}

impl CropStage {
    /// Parse a stored stage label. Unrecognized labels map to `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "seedling" => CropStage::Seedling,
            "vegetative" => CropStage::Vegetative,
            "flowering" => CropStage::Flowering,
            "fruiting" => CropStage::Fruiting,
            "harvesting" => CropStage::Harvesting,
            _ => CropStage::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropStage::Seedling => "seedling",
            CropStage::Vegetative => "vegetative",
            CropStage::Flowering => "flowering",
            CropStage::Fruiting => "fruiting",
            CropStage::Harvesting => "harvesting",
            CropStage::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CropStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
