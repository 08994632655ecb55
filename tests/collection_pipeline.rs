//! End-to-end collection runs against scripted collaborators

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rstest::rstest;
use serde_json::{Value, json};

use zonewatch::{
    ApiTemplate, CollectorError, Fetcher, MemoryRecordStore, MemoryZoneRepository,
    OpenMeteoParser, Orchestrator, RecordStore, Result, Stage, WeatherRecord, WorkerPool, Zone,
    ZoneId, ZoneRepository,
};

/// Answers every zone with a valid payload except the scripted ones.
/// Zone ids are recovered from the `latitude` query parameter.
#[derive(Default)]
struct ScriptedFetcher {
    calls: AtomicUsize,
    unreachable: HashSet<ZoneId>,
    malformed: HashSet<ZoneId>,
    panicking: HashSet<ZoneId>,
}

impl ScriptedFetcher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn zone_id_of(url: &str) -> ZoneId {
    let url = reqwest::Url::parse(url).unwrap();
    let (_, latitude) = url
        .query_pairs()
        .find(|(key, _)| key == "latitude")
        .unwrap();
    latitude.parse::<f64>().unwrap() as ZoneId
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let zone_id = zone_id_of(url);

        if self.unreachable.contains(&zone_id) {
            return Err(CollectorError::api("Network error: connection refused"));
        }
        if self.panicking.contains(&zone_id) {
            panic!("fetcher bug for zone {zone_id}");
        }
        if self.malformed.contains(&zone_id) {
            return Ok(json!({ "latitude": 1.0, "longitude": 1.0 }));
        }

        Ok(json!({
            "latitude": zone_id as f64,
            "longitude": 10.0,
            "current": {
                "time": "2025-06-01T12:00",
                "temperature_2m": 15.0 + zone_id as f64,
                "relative_humidity_2m": 60.0,
                "rain": 0.2,
                "precipitation_probability": 35.0,
                "weather_code": 61
            }
        }))
    }
}

/// Rejects inserts for the scripted zones, delegates the rest
#[derive(Default)]
struct FlakyRecordStore {
    inner: MemoryRecordStore,
    rejected: HashSet<ZoneId>,
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn insert(&self, record: WeatherRecord) -> Result<()> {
        if self.rejected.contains(&record.zone_id) {
            return Err(CollectorError::storage("disk full"));
        }
        self.inner.insert(record).await
    }

    async fn find_by_zone(
        &self,
        zone_id: ZoneId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<WeatherRecord>> {
        self.inner.find_by_zone(zone_id, from, to).await
    }
}

struct BrokenZoneRepository;

#[async_trait]
impl ZoneRepository for BrokenZoneRepository {
    async fn find_active_zones(&self) -> Result<Vec<Zone>> {
        Err(CollectorError::zone_query("connection reset by peer"))
    }

    async fn find_all(&self) -> Result<Vec<Zone>> {
        self.find_active_zones().await
    }

    async fn find_by_id(&self, _id: ZoneId) -> Result<Option<Zone>> {
        Ok(None)
    }

    async fn upsert(&self, _zone: Zone) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _id: ZoneId) -> Result<bool> {
        Ok(false)
    }
}

fn zones(n: u64) -> MemoryZoneRepository {
    MemoryZoneRepository::with_zones((1..=n).map(|id| Zone::new(id, format!("zone-{id}"), id as f64, 10.0)))
}

fn orchestrator(
    workers: usize,
    zones: Arc<dyn ZoneRepository>,
    records: Arc<dyn RecordStore>,
    fetcher: Arc<ScriptedFetcher>,
) -> Orchestrator {
    let pool = WorkerPool::new(workers, fetcher, Arc::new(OpenMeteoParser), Duration::from_secs(5)).unwrap();
    let template = ApiTemplate::parse(
        "http://localhost:8080/v1/forecast?current=temperature_2m,relative_humidity_2m,weather_code",
    )
    .unwrap();
    Orchestrator::new(zones, records, pool, template)
}

#[rstest]
#[tokio::test]
async fn test_one_outcome_per_zone(#[values(1, 2, 10)] workers: usize, #[values(0, 1, 5, 50)] n: u64) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(workers, Arc::new(zones(n)), Arc::new(store.clone()), fetcher.clone());

    let result = orchestrator.run().await;

    if n == 0 {
        assert!(result.unwrap_err().is_nothing_to_collect());
        assert_eq!(fetcher.calls(), 0);
        return;
    }

    let report = result.unwrap();
    assert_eq!(report.zones, n as usize);
    assert_eq!(report.persisted, n as usize);
    assert!(report.is_clean());
    assert_eq!(fetcher.calls(), n as usize);

    let mut ids: Vec<_> = store.all().await.iter().map(|r| r.zone_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=n).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_three_zones_two_workers() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(2, Arc::new(zones(3)), Arc::new(store.clone()), fetcher.clone());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.persisted, 3);
    assert_eq!(store.len().await, 3);

    let record = store
        .all()
        .await
        .into_iter()
        .find(|r| r.zone_id == 2)
        .unwrap();
    assert_eq!(record.temperature, 17.0);
    assert_eq!(record.rain_probability, Some(35.0));
    assert_eq!(record.rain_volume, Some(0.2));
    assert!(record.observed_at.is_some());
}

#[tokio::test]
async fn test_fetch_failure_is_isolated_to_its_zone() {
    let fetcher = Arc::new(ScriptedFetcher {
        unreachable: HashSet::from([1]),
        ..ScriptedFetcher::default()
    });
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(2, Arc::new(zones(2)), Arc::new(store.clone()), fetcher.clone());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.persisted, 1);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].zone_id, 1);
    assert_eq!(report.failures[0].stage, Stage::Fetch);
    assert!(report.failures[0].reason.contains("connection refused"));
    assert_eq!(fetcher.calls(), 2);

    let stored = store.all().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].zone_id, 2);
}

#[tokio::test]
async fn test_panicking_fetch_fails_only_its_zone() {
    let fetcher = Arc::new(ScriptedFetcher {
        panicking: HashSet::from([1]),
        ..ScriptedFetcher::default()
    });
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(1, Arc::new(zones(3)), Arc::new(store.clone()), fetcher.clone());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.persisted, 2);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.failures[0].zone_id, 1);
    assert!(report.failures[0].reason.contains("panicked"));
    assert_eq!(report.lost_jobs, 0);
    assert_eq!(report.crashed_workers, 0);
    assert_eq!(fetcher.calls(), 3);

    let mut ids: Vec<_> = store.all().await.iter().map(|r| r.zone_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_malformed_payload_is_a_parse_failure() {
    let fetcher = Arc::new(ScriptedFetcher {
        malformed: HashSet::from([2]),
        ..ScriptedFetcher::default()
    });
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(3, Arc::new(zones(4)), Arc::new(store.clone()), fetcher);

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.persisted, 3);
    assert_eq!(report.parse_failures, 1);
    assert_eq!(report.failures_at(Stage::Parse).next().unwrap().zone_id, 2);
}

#[tokio::test]
async fn test_persist_failure_does_not_stop_the_run() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let store = Arc::new(FlakyRecordStore {
        rejected: HashSet::from([3]),
        ..FlakyRecordStore::default()
    });
    let orchestrator = orchestrator(2, Arc::new(zones(5)), store.clone(), fetcher);

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.collected, 5);
    assert_eq!(report.persisted, 4);
    assert_eq!(report.persist_failures, 1);
    assert_eq!(report.lost_jobs, 0);
    assert_eq!(store.inner.len().await, 4);
}

#[tokio::test]
async fn test_zone_query_failure_skips_fetching() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(4, Arc::new(BrokenZoneRepository), Arc::new(store.clone()), fetcher.clone());

    let err = orchestrator.run().await.unwrap_err();

    assert!(matches!(err, CollectorError::ZoneQuery { .. }));
    assert_eq!(fetcher.calls(), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_inactive_zones_are_not_fetched() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let repository = zones(3);
    repository
        .upsert(Zone::new(2, "zone-2", 2.0, 10.0).deactivated())
        .await
        .unwrap();
    let store = MemoryRecordStore::new();
    let orchestrator = orchestrator(2, Arc::new(repository), Arc::new(store.clone()), fetcher.clone());

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.zones, 2);
    assert_eq!(fetcher.calls(), 2);
    let from = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2100, 1, 1).unwrap();
    assert!(store.find_by_zone(2, from, to).await.unwrap().is_empty());
}
