//! Mapping of raw `OpenMeteo` responses to weather records

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::openmeteo::ForecastResponse;
use crate::models::{WeatherCode, WeatherRecord, ZoneId};
use crate::{CollectorError, Result};

/// Turns a decoded API response into a record for the given zone
pub trait ResponseParser: Send + Sync {
    fn parse(&self, raw: &Value, zone_id: ZoneId) -> Result<WeatherRecord>;
}

/// Parser for the `current` block of the `OpenMeteo` forecast endpoint
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenMeteoParser;

impl ResponseParser for OpenMeteoParser {
    fn parse(&self, raw: &Value, zone_id: ZoneId) -> Result<WeatherRecord> {
        let response = ForecastResponse::deserialize(raw)
            .map_err(|e| CollectorError::parse(format!("Invalid OpenMeteo response: {e}")))?;

        let Some(current) = response.current else {
            return Err(CollectorError::parse(
                "No current weather data available from OpenMeteo",
            ));
        };

        let observed_at = current
            .time
            .as_deref()
            .and_then(|time| observed_at_utc(time, response.utc_offset_seconds));

        if current.precipitation_probability.is_none() {
            debug!(zone_id, "Response carries no precipitation probability");
        }

        Ok(WeatherRecord {
            zone_id,
            temperature: current.temperature,
            humidity: current.humidity,
            rain_probability: current.precipitation_probability,
            rain_volume: current.rain,
            code: WeatherCode(current.weather_code),
            collected_at: Utc::now(),
            observed_at,
        })
    }
}

/// Local wall-clock `time` shifted back to UTC by the response's offset
fn observed_at_utc(time: &str, utc_offset_seconds: i32) -> Option<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M").ok()?;
    let offset = FixedOffset::east_opt(utc_offset_seconds)?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
