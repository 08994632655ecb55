//! Collection run: active zones → jobs → worker pool → record store

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use super::pool::{PoolEvent, WorkerPool};
use super::report::RunReport;
use crate::config::ZonewatchConfig;
use crate::error::{CollectionError, Stage};
use crate::fetch::Fetcher;
use crate::models::{ApiTemplate, CollectionJob};
use crate::parse::ResponseParser;
use crate::store::{RecordStore, ZoneRepository};
use crate::{CollectorError, Result};

/// Something the scheduler can trigger once per tick
#[async_trait]
pub trait CollectionRun: Send + Sync + 'static {
    async fn run(&self) -> Result<RunReport>;
}

/// Drives one collection run over all active zones
pub struct Orchestrator {
    zones: Arc<dyn ZoneRepository>,
    records: Arc<dyn RecordStore>,
    pool: WorkerPool,
    template: ApiTemplate,
}

impl Orchestrator {
    pub fn new(
        zones: Arc<dyn ZoneRepository>,
        records: Arc<dyn RecordStore>,
        pool: WorkerPool,
        template: ApiTemplate,
    ) -> Self {
        Self {
            zones,
            records,
            pool,
            template,
        }
    }

    /// Build the orchestrator and its worker pool from configuration.
    /// An invalid worker count or URL template fails here, not per run.
    pub fn from_config(
        config: &ZonewatchConfig,
        zones: Arc<dyn ZoneRepository>,
        records: Arc<dyn RecordStore>,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn ResponseParser>,
    ) -> Result<Self> {
        let template = ApiTemplate::parse(&config.weather.api_url_template)?;
        let pool = WorkerPool::new(
            config.collector.worker_count,
            fetcher,
            parser,
            config.weather.request_timeout(),
        )?;

        Ok(Self::new(zones, records, pool, template))
    }

    /// Collect and persist one record per active zone.
    ///
    /// Fails only when the zone query fails or no zone is active; per-zone
    /// fetch, parse and persist failures end up in the returned report.
    #[instrument(name = "collection_run", skip(self), fields(workers = self.pool.workers()))]
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();

        let zones = self.zones.find_active_zones().await.map_err(|e| {
            error!("Failed to load active zones: {}", e);
            e
        })?;

        if zones.is_empty() {
            info!("No active zones registered, skipping collection");
            return Err(CollectorError::NothingToCollect);
        }

        let jobs: Vec<CollectionJob> = zones.iter().map(|zone| self.template.job_for(zone)).collect();
        info!("Collecting weather data for {} zones", jobs.len());

        let mut report = RunReport::new(jobs.len());
        let mut pool = self.pool.start(jobs.len());
        let queued = pool.submit_all(jobs);
        if queued < report.zones {
            warn!("Only {} of {} jobs were queued", queued, report.zones);
        }

        // Drain while the workers are still producing; persistence is serialized here.
        while let Some(event) = pool.next_event().await {
            match event {
                PoolEvent::Record(record) => {
                    report.collected += 1;
                    let zone_id = record.zone_id;
                    match self.records.insert(record).await {
                        Ok(()) => {
                            report.persisted += 1;
                            debug!(zone_id, "Weather record stored");
                        }
                        Err(e) => {
                            let failure = CollectionError::new(zone_id, Stage::Persist, e);
                            error!(zone_id, stage = %failure.stage, "Error saving weather data: {}", failure.reason);
                            report.record_failure(failure);
                        }
                    }
                }
                PoolEvent::Failure(failure) => {
                    warn!(
                        zone_id = failure.zone_id,
                        stage = %failure.stage,
                        "Weather collection failed: {}",
                        failure.reason
                    );
                    report.record_failure(failure);
                }
                PoolEvent::WorkerExited(Ok(summary)) => {
                    debug!(worker = summary.worker, processed = summary.processed, "Worker exited");
                }
                PoolEvent::WorkerExited(Err(e)) => {
                    error!("Worker task failed: {}", e);
                    report.crashed_workers += 1;
                }
            }
        }

        report.lost_jobs = report.zones.saturating_sub(report.terminal_outcomes());
        if report.lost_jobs > 0 {
            error!("{} jobs ended without an outcome", report.lost_jobs);
        }

        report.elapsed = started.elapsed();
        info!(
            zones = report.zones,
            persisted = report.persisted,
            fetch_failures = report.fetch_failures,
            parse_failures = report.parse_failures,
            persist_failures = report.persist_failures,
            "Collection run finished in {:.3}s",
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }
}

#[async_trait]
impl CollectionRun for Orchestrator {
    async fn run(&self) -> Result<RunReport> {
        Orchestrator::run(self).await
    }
}
