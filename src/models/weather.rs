//! Weather record model and WMO weather codes

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::ZoneId;

/// WMO weather interpretation code as reported by Open-Meteo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherCode(pub u16);

impl WeatherCode {
    pub const CLEAR_SKY: Self = Self(0);
    pub const MAINLY_CLEAR: Self = Self(1);
    pub const PARTLY_CLOUDY: Self = Self(2);
    pub const OVERCAST: Self = Self(3);
    pub const FOG: Self = Self(45);
    pub const RIME_FOG: Self = Self(48);
    pub const DRIZZLE_LIGHT: Self = Self(51);
    pub const DRIZZLE_MODERATE: Self = Self(53);
    pub const DRIZZLE_DENSE: Self = Self(55);
    pub const FREEZING_DRIZZLE_LIGHT: Self = Self(56);
    pub const FREEZING_DRIZZLE_DENSE: Self = Self(57);
    pub const RAIN_SLIGHT: Self = Self(61);
    pub const RAIN_MODERATE: Self = Self(63);
    pub const RAIN_HEAVY: Self = Self(65);
    pub const FREEZING_RAIN_LIGHT: Self = Self(66);
    pub const FREEZING_RAIN_HEAVY: Self = Self(67);
    pub const SNOW_SLIGHT: Self = Self(71);
    pub const SNOW_MODERATE: Self = Self(73);
    pub const SNOW_HEAVY: Self = Self(75);
    pub const SNOW_GRAINS: Self = Self(77);
    pub const SHOWERS_SLIGHT: Self = Self(80);
    pub const SHOWERS_MODERATE: Self = Self(81);
    pub const SHOWERS_VIOLENT: Self = Self(82);
    pub const SNOW_SHOWERS_SLIGHT: Self = Self(85);
    pub const SNOW_SHOWERS_HEAVY: Self = Self(86);
    pub const THUNDERSTORM: Self = Self(95);
    pub const THUNDERSTORM_SLIGHT_HAIL: Self = Self(96);
    pub const THUNDERSTORM_HEAVY_HAIL: Self = Self(99);

    /// Convert the weather code to a human-readable description
    #[must_use]
    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "Clear sky",
            1 => "Mainly clear",
            2 => "Partly cloudy",
            3 => "Overcast",
            45 => "Fog",
            48 => "Depositing rime fog",
            51 => "Light drizzle",
            53 => "Moderate drizzle",
            55 => "Dense drizzle",
            56 => "Light freezing drizzle",
            57 => "Dense freezing drizzle",
            61 => "Slight rain",
            63 => "Moderate rain",
            65 => "Heavy rain",
            66 => "Light freezing rain",
            67 => "Heavy freezing rain",
            71 => "Slight snow fall",
            73 => "Moderate snow fall",
            75 => "Heavy snow fall",
            77 => "Snow grains",
            80 => "Slight rain showers",
            81 => "Moderate rain showers",
            82 => "Violent rain showers",
            85 => "Slight snow showers",
            86 => "Heavy snow showers",
            95 => "Thunderstorm",
            96 => "Thunderstorm with slight hail",
            99 => "Thunderstorm with heavy hail",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for WeatherCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.0)
    }
}

/// One weather observation collected for one zone
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherRecord {
    /// Zone the observation belongs to
    pub zone_id: ZoneId,
    /// Temperature in Celsius
    pub temperature: f32,
    /// Relative humidity percentage (0-100)
    pub humidity: f32,
    /// Precipitation probability percentage (0-100), when the API reports it
    pub rain_probability: Option<f32>,
    /// Rain volume in mm, not every response carries it
    pub rain_volume: Option<f32>,
    /// Weather condition
    pub code: WeatherCode,
    /// When the collector produced this record
    pub collected_at: DateTime<Utc>,
    /// Observation time reported by the API
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherRecord {
    /// Whether the record was collected inside the inclusive `[from, to]` day range
    #[must_use]
    pub fn collected_between(&self, from: NaiveDate, to: NaiveDate) -> bool {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to
            .and_hms_opt(23, 59, 59)
            .map_or(start, |end_of_day| end_of_day.and_utc());
        self.collected_at >= start && self.collected_at <= end
    }
}
