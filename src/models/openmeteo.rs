//! `OpenMeteo` API response structures

use serde::Deserialize;

/// Forecast endpoint response; only the `current` block is used for collection
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    /// Offset of the reported local times from UTC; 0 unless a timezone was requested
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub current: Option<CurrentData>,
}

/// Current weather data from `OpenMeteo`
#[derive(Debug, Deserialize)]
pub struct CurrentData {
    /// ISO 8601 time in the response's timezone, without seconds, e.g. `2025-03-01T14:15`
    pub time: Option<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: f32,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: f32,
    pub rain: Option<f32>,
    pub precipitation_probability: Option<f32>,
    #[serde(rename = "weather_code", alias = "weathercode")]
    pub weather_code: u16,
}
