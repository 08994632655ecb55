//! Data models for zones, collection jobs and weather records

pub mod job;
pub mod openmeteo;
pub mod weather;
pub mod zone;

pub use job::{ApiTemplate, CollectionJob};
pub use weather::{WeatherCode, WeatherRecord};
pub use zone::{Zone, ZoneId};
