use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{RecordStore, ZoneRepository};
use crate::Result;
use crate::models::{WeatherRecord, Zone, ZoneId};

/// Zone repository kept in process memory, ordered by zone id
#[derive(Clone, Debug, Default)]
pub struct MemoryZoneRepository {
    zones: Arc<RwLock<BTreeMap<ZoneId, Zone>>>,
}

impl MemoryZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let zones = zones.into_iter().map(|zone| (zone.id, zone)).collect();
        Self {
            zones: Arc::new(RwLock::new(zones)),
        }
    }
}

#[async_trait]
impl ZoneRepository for MemoryZoneRepository {
    async fn find_active_zones(&self) -> Result<Vec<Zone>> {
        let zones = self.zones.read().await;
        Ok(zones.values().filter(|zone| zone.active).cloned().collect())
    }

    async fn find_all(&self) -> Result<Vec<Zone>> {
        Ok(self.zones.read().await.values().cloned().collect())
    }

    async fn find_by_id(&self, id: ZoneId) -> Result<Option<Zone>> {
        Ok(self.zones.read().await.get(&id).cloned())
    }

    async fn upsert(&self, zone: Zone) -> Result<()> {
        self.zones.write().await.insert(zone.id, zone);
        Ok(())
    }

    async fn delete(&self, id: ZoneId) -> Result<bool> {
        Ok(self.zones.write().await.remove(&id).is_some())
    }
}

/// Append-only record store kept in process memory
#[derive(Clone, Debug, Default)]
pub struct MemoryRecordStore {
    records: Arc<RwLock<Vec<WeatherRecord>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Copy of every stored record in insertion order
    pub async fn all(&self) -> Vec<WeatherRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: WeatherRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn find_by_zone(
        &self,
        zone_id: ZoneId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeatherRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.zone_id == zone_id && record.collected_between(from, to))
            .cloned()
            .collect())
    }
}
