//! `Zonewatch` - periodic weather collection for registered zones
//!
//! A scheduler triggers collection runs at a fixed cadence. Each run loads the
//! active zones, fetches and parses current conditions for every zone on a
//! bounded worker pool, and persists one record per zone. A failing zone never
//! affects the others.

pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parse;
pub mod store;
pub mod telemetry;

// Re-export core types for public API
pub use collector::{CollectionRun, Orchestrator, RunReport, Scheduler, SchedulerState, WorkerPool};
pub use config::ZonewatchConfig;
pub use error::{CollectionError, CollectorError, Stage};
pub use fetch::{Fetcher, OpenMeteoClient};
pub use models::{ApiTemplate, CollectionJob, WeatherCode, WeatherRecord, Zone, ZoneId};
pub use parse::{OpenMeteoParser, ResponseParser};
pub use store::{MemoryRecordStore, MemoryZoneRepository, RecordStore, ZoneRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CollectorError>;
