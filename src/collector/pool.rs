//! Bounded worker pool
//!
//! A fixed number of tokio tasks share one job queue. Every job ends in exactly
//! one output: a record on the success sink or a [`CollectionError`] on the
//! failure sink. Fetch and parse run in their own tasks, so a panic fails only
//! the job that caused it. Both sinks are buffered to the job count, so workers
//! never wait on the consumer. The pool's `JoinSet` is the completion barrier: once it is
//! empty and both sinks report closed, every output has been delivered.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};

use crate::error::{CollectionError, Stage};
use crate::fetch::Fetcher;
use crate::models::{CollectionJob, WeatherRecord};
use crate::parse::ResponseParser;
use crate::{CollectorError, Result};

/// Worker configuration and collaborators; cheap to reuse across runs
#[derive(Clone)]
pub struct WorkerPool {
    workers: NonZeroUsize,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn ResponseParser>,
    request_timeout: Duration,
}

impl WorkerPool {
    /// Fails when `workers` is zero
    pub fn new(
        workers: usize,
        fetcher: Arc<dyn Fetcher>,
        parser: Arc<dyn ResponseParser>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let workers = NonZeroUsize::new(workers)
            .ok_or_else(|| CollectorError::config("Worker count must be at least 1"))?;

        Ok(Self {
            workers,
            fetcher,
            parser,
            request_timeout,
        })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Spawn the workers for one run. `capacity` is the number of jobs that
    /// will be submitted; queue and sinks are sized to it.
    pub fn start(&self, capacity: usize) -> RunningPool {
        let capacity = capacity.max(1);
        let (job_tx, job_rx) = mpsc::channel(capacity);
        let (record_tx, record_rx) = mpsc::channel(capacity);
        let (failure_tx, failure_rx) = mpsc::channel(capacity);

        let queue = JobQueue {
            receiver: Arc::new(Mutex::new(job_rx)),
        };

        let mut workers = JoinSet::new();
        for id in 0..self.workers.get() {
            let worker = Worker {
                id,
                queue: queue.clone(),
                fetcher: self.fetcher.clone(),
                parser: self.parser.clone(),
                request_timeout: self.request_timeout,
                records: record_tx.clone(),
                failures: failure_tx.clone(),
            };
            workers.spawn(worker.run());
        }

        // Only the workers hold senders now: both sinks close when the last worker exits.
        drop(record_tx);
        drop(failure_tx);

        RunningPool {
            jobs: Some(job_tx),
            records: record_rx,
            failures: failure_rx,
            workers,
        }
    }
}

/// Output of one pool for one run, in the order the orchestrator observes it
#[derive(Debug)]
pub enum PoolEvent {
    Record(WeatherRecord),
    Failure(CollectionError),
    /// A worker task returned; `Err` when it panicked
    WorkerExited(std::result::Result<WorkerSummary, JoinError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker: usize,
    pub processed: usize,
}

/// Handle to a started pool
pub struct RunningPool {
    jobs: Option<mpsc::Sender<CollectionJob>>,
    records: mpsc::Receiver<WeatherRecord>,
    failures: mpsc::Receiver<CollectionError>,
    workers: JoinSet<WorkerSummary>,
}

impl RunningPool {
    /// Queue every job, then close the queue so workers stop once it is drained.
    /// Returns the number of jobs accepted.
    pub fn submit_all(&mut self, jobs: impl IntoIterator<Item = CollectionJob>) -> usize {
        let Some(sender) = self.jobs.take() else {
            warn!("Job queue already closed, dropping submitted jobs");
            return 0;
        };

        let mut accepted = 0;
        for job in jobs {
            match sender.try_send(job) {
                Ok(()) => accepted += 1,
                Err(e) => {
                    let job = e.into_inner();
                    warn!(zone_id = job.zone_id, "Job queue rejected job");
                }
            }
        }
        accepted
    }

    /// Next success, failure or worker exit. `None` once every worker has
    /// exited and both sinks are drained.
    pub async fn next_event(&mut self) -> Option<PoolEvent> {
        tokio::select! {
            Some(record) = self.records.recv() => Some(PoolEvent::Record(record)),
            Some(failure) = self.failures.recv() => Some(PoolEvent::Failure(failure)),
            Some(joined) = self.workers.join_next() => Some(PoolEvent::WorkerExited(joined)),
            else => None,
        }
    }
}

/// Shared job source; workers take turns on the receiver
#[derive(Clone)]
struct JobQueue {
    receiver: Arc<Mutex<mpsc::Receiver<CollectionJob>>>,
}

impl JobQueue {
    async fn next(&self) -> Option<CollectionJob> {
        self.receiver.lock().await.recv().await
    }
}

struct Worker {
    id: usize,
    queue: JobQueue,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn ResponseParser>,
    request_timeout: Duration,
    records: mpsc::Sender<WeatherRecord>,
    failures: mpsc::Sender<CollectionError>,
}

impl Worker {
    async fn run(self) -> WorkerSummary {
        let mut processed = 0;

        while let Some(job) = self.queue.next().await {
            processed += 1;
            debug!(worker = self.id, zone_id = job.zone_id, url = %job.url, "Fetching weather data");

            let delivered = match self.process(&job).await {
                Ok(record) => self.records.send(record).await.is_ok(),
                Err(failure) => self.failures.send(failure).await.is_ok(),
            };

            if !delivered {
                warn!(worker = self.id, "Output receiver dropped, stopping worker");
                break;
            }
        }

        debug!(worker = self.id, processed, "Worker finished");
        WorkerSummary {
            worker: self.id,
            processed,
        }
    }

    /// Fetch then parse one job. A panicking fetcher or parser becomes a failure
    /// of that job's stage; the worker keeps taking jobs.
    async fn process(&self, job: &CollectionJob) -> std::result::Result<WeatherRecord, CollectionError> {
        let fetcher = self.fetcher.clone();
        let url = job.url.to_string();
        let mut fetch = tokio::spawn(async move { fetcher.get(&url).await });

        let raw = match tokio::time::timeout(self.request_timeout, &mut fetch).await {
            Ok(Ok(Ok(raw))) => raw,
            Ok(Ok(Err(e))) => return Err(CollectionError::new(job.zone_id, Stage::Fetch, e)),
            Ok(Err(e)) => {
                error!(worker = self.id, zone_id = job.zone_id, "Fetch task failed: {}", e);
                let reason = format!("fetch task failed: {e}");
                return Err(CollectionError::new(job.zone_id, Stage::Fetch, reason));
            }
            Err(_) => {
                fetch.abort();
                let timeout = CollectorError::Timeout {
                    after: self.request_timeout,
                };
                return Err(CollectionError::new(job.zone_id, Stage::Fetch, timeout));
            }
        };

        let parser = self.parser.clone();
        let zone_id = job.zone_id;
        match tokio::task::spawn_blocking(move || parser.parse(&raw, zone_id)).await {
            Ok(result) => result.map_err(|e| CollectionError::new(zone_id, Stage::Parse, e)),
            Err(e) => {
                error!(worker = self.id, zone_id, "Parse task failed: {}", e);
                let reason = format!("parse task failed: {e}");
                Err(CollectionError::new(zone_id, Stage::Parse, reason))
            }
        }
    }
}
