//! Storage collaborators used by the collection pipeline
//!
//! The collector only reads active zones and inserts records; the remaining
//! zone operations exist for the composition layer and the in-memory backend.

mod memory;

pub use memory::{MemoryRecordStore, MemoryZoneRepository};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::Result;
use crate::models::{WeatherRecord, Zone, ZoneId};

#[async_trait]
pub trait ZoneRepository: Send + Sync + 'static {
    /// Zones whose active flag is set
    async fn find_active_zones(&self) -> Result<Vec<Zone>>;
    async fn find_all(&self) -> Result<Vec<Zone>>;
    async fn find_by_id(&self, id: ZoneId) -> Result<Option<Zone>>;
    /// Insert or replace the zone with the same id
    async fn upsert(&self, zone: Zone) -> Result<()>;
    /// Returns whether a zone was removed
    async fn delete(&self, id: ZoneId) -> Result<bool>;
}

#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn insert(&self, record: WeatherRecord) -> Result<()>;
    /// Records of a zone collected within the inclusive `[from, to]` day range
    async fn find_by_zone(
        &self,
        zone_id: ZoneId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeatherRecord>>;
}
