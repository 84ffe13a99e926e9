//! Weather data models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DataSource, GpsCoordinates};

/// A point-in-time weather reading for a farm location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub timestamp: DateTime<Utc>,
    pub location: GpsCoordinates,
    pub temperature_celsius: Decimal,
    pub humidity_percent: Decimal,
    /// Recent accumulated rainfall
    pub rainfall_mm: Decimal,
    pub wind_speed_kmh: Decimal,
    pub pressure_hpa: Decimal,
    pub description: String,
    pub source: DataSource,
}

/// Multi-day forecast in three-hour steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub location_name: String,
    pub country: String,
    pub source: DataSource,
    pub items: Vec<ForecastItem>,
}

/// A single forecast step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastItem {
    pub timestamp: DateTime<Utc>,
    pub temperature_celsius: Decimal,
    pub humidity_percent: Decimal,
    pub rainfall_mm: Decimal,
    pub wind_speed_kmh: Decimal,
    pub description: String,
}

/// Forecast steps per day (three-hour intervals)
pub const FORECAST_STEPS_PER_DAY: usize = 8;
