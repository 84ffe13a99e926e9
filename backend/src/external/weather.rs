//! Weather API client for fetching weather data
//!
//! Integrates with OpenWeatherMap for current conditions and forecasts.
//! Requests are bounded by a timeout; on any failure the client serves
//! synthetic readings tagged `source = synthetic` instead of an error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    validate_coordinates, DataSource, FallbackReason, ForecastItem, GpsCoordinates,
    WeatherForecast, WeatherSnapshot, FORECAST_STEPS_PER_DAY,
};

use crate::config::WeatherConfig;
use crate::error::{AppError, AppResult};

/// Source of point-in-time weather readings
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Current conditions at a location
    async fn current(&self, location: GpsCoordinates) -> Result<WeatherSnapshot, FallbackReason>;

    /// Three-hourly forecast for the next `days` days
    async fn forecast(&self, location: GpsCoordinates, days: u32) -> WeatherForecast;
}

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    weather: Vec<OWMWeather>,
    main: OWMMain,
    wind: OWMWind,
    rain: Option<OWMRain>,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct OWMWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: f64,
    #[serde(default)]
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    /// Meters per second with metric units
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

/// OpenWeatherMap API response for forecast
#[derive(Debug, Deserialize)]
struct OWMForecastResponse {
    city: OWMCity,
    list: Vec<OWMForecastItem>,
}

#[derive(Debug, Deserialize)]
struct OWMCity {
    name: String,
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct OWMForecastItem {
    dt: i64,
    main: OWMMain,
    weather: Vec<OWMWeather>,
    wind: OWMWind,
    rain: Option<OWMRain>,
}

fn decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64_retain(value)
        .unwrap_or_default()
        .round_dp(dp)
}

fn kmh_from_mps(speed: f64) -> Decimal {
    decimal(speed * 3.6, 1)
}

fn tenths(value: i64) -> Decimal {
    Decimal::new(value, 1)
}

impl WeatherClient {
    /// Create a new WeatherClient from configuration
    pub fn new(config: &WeatherConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Weather HTTP client: {}", e)))?;

        let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("Weather API key not configured, serving synthetic weather data");
        }

        Ok(Self {
            client,
            api_key,
            base_url: config.api_endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        location: GpsCoordinates,
    ) -> Result<T, FallbackReason> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FallbackReason::WeatherUnavailable("API key not configured".to_string()))?;

        validate_coordinates(location.latitude, location.longitude)
            .map_err(|e| FallbackReason::WeatherUnavailable(e.to_string()))?;

        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(|e| FallbackReason::WeatherUnavailable(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(FallbackReason::WeatherUnavailable(format!(
                "API returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FallbackReason::WeatherUnavailable(format!("malformed response: {}", e)))
    }

    /// Fetch live conditions without falling back
    pub async fn fetch_current(
        &self,
        location: GpsCoordinates,
    ) -> Result<WeatherSnapshot, FallbackReason> {
        let data: OWMCurrentResponse = self.fetch("weather", location).await?;
        Ok(convert_current_response(data, location))
    }

    /// Fetch a live forecast without falling back
    pub async fn fetch_forecast(
        &self,
        location: GpsCoordinates,
        days: u32,
    ) -> Result<WeatherForecast, FallbackReason> {
        let data: OWMForecastResponse = self.fetch("forecast", location).await?;
        Ok(convert_forecast_response(data, days))
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn current(&self, location: GpsCoordinates) -> Result<WeatherSnapshot, FallbackReason> {
        match self.fetch_current(location).await {
            Ok(snapshot) => Ok(snapshot),
            Err(reason) => {
                if self.api_key.is_some() {
                    tracing::warn!(%reason, "Serving synthetic current weather");
                }
                Ok(synthetic_snapshot(location))
            }
        }
    }

    async fn forecast(&self, location: GpsCoordinates, days: u32) -> WeatherForecast {
        match self.fetch_forecast(location, days).await {
            Ok(forecast) => forecast,
            Err(reason) => {
                if self.api_key.is_some() {
                    tracing::warn!(%reason, "Serving synthetic forecast");
                }
                synthetic_forecast(location, days)
            }
        }
    }
}

/// Convert OpenWeatherMap current response to our format
fn convert_current_response(data: OWMCurrentResponse, location: GpsCoordinates) -> WeatherSnapshot {
    WeatherSnapshot {
        timestamp: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
        location,
        temperature_celsius: decimal(data.main.temp, 2),
        humidity_percent: decimal(data.main.humidity, 1),
        rainfall_mm: decimal(data.rain.and_then(|r| r.one_hour).unwrap_or(0.0), 2),
        wind_speed_kmh: kmh_from_mps(data.wind.speed),
        pressure_hpa: decimal(data.main.pressure, 1),
        description: data
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_default(),
        source: DataSource::Live,
    }
}

/// Convert OpenWeatherMap forecast response to our format
fn convert_forecast_response(data: OWMForecastResponse, days: u32) -> WeatherForecast {
    let steps = days as usize * FORECAST_STEPS_PER_DAY;
    let items = data
        .list
        .into_iter()
        .take(steps)
        .map(|item| ForecastItem {
            timestamp: DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now),
            temperature_celsius: decimal(item.main.temp, 2),
            humidity_percent: decimal(item.main.humidity, 1),
            rainfall_mm: decimal(item.rain.and_then(|r| r.three_hour).unwrap_or(0.0), 2),
            wind_speed_kmh: kmh_from_mps(item.wind.speed),
            description: item
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_default(),
        })
        .collect();

    WeatherForecast {
        location_name: data.city.name,
        country: data.city.country,
        source: DataSource::Live,
        items,
    }
}

/// Plausible random conditions used when live data is unavailable
pub fn synthetic_snapshot(location: GpsCoordinates) -> WeatherSnapshot {
    let mut rng = rand::thread_rng();
    WeatherSnapshot {
        timestamp: Utc::now(),
        location,
        temperature_celsius: tenths(rng.gen_range(200..=350)),
        humidity_percent: tenths(rng.gen_range(400..=800)),
        rainfall_mm: tenths(rng.gen_range(0..=50)),
        wind_speed_kmh: tenths(rng.gen_range(20..=150)),
        pressure_hpa: tenths(rng.gen_range(10000..=10200)),
        description: "partly cloudy".to_string(),
        source: DataSource::Synthetic,
    }
}

const SYNTHETIC_DESCRIPTIONS: [&str; 5] = [
    "clear sky",
    "few clouds",
    "scattered clouds",
    "broken clouds",
    "light rain",
];

/// Plausible random forecast used when live data is unavailable
pub fn synthetic_forecast(location: GpsCoordinates, days: u32) -> WeatherForecast {
    let mut rng = rand::thread_rng();
    let start = Utc::now();
    let items = (0..days as i64 * FORECAST_STEPS_PER_DAY as i64)
        .map(|step| ForecastItem {
            timestamp: start + chrono::Duration::hours(step * 3),
            temperature_celsius: tenths(rng.gen_range(200..=350)),
            humidity_percent: tenths(rng.gen_range(400..=800)),
            rainfall_mm: tenths(rng.gen_range(0..=30)),
            wind_speed_kmh: tenths(rng.gen_range(20..=150)),
            description: SYNTHETIC_DESCRIPTIONS[rng.gen_range(0..SYNTHETIC_DESCRIPTIONS.len())]
                .to_string(),
        })
        .collect();

    WeatherForecast {
        location_name: format!("{}, {}", location.latitude, location.longitude),
        country: String::new(),
        source: DataSource::Synthetic,
        items,
    }
}
