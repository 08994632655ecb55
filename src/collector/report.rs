//! Per-run outcome accounting

use std::time::Duration;

use serde::Serialize;

use crate::error::{CollectionError, Stage};

/// Outcome counts of one collection run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Active zones, i.e. jobs built for this run
    pub zones: usize,
    /// Records produced by the workers
    pub collected: usize,
    /// Records the store accepted
    pub persisted: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub persist_failures: usize,
    /// Jobs without an outcome because their worker panicked
    pub lost_jobs: usize,
    /// Worker tasks that panicked
    pub crashed_workers: usize,
    pub failures: Vec<CollectionError>,
    pub elapsed: Duration,
}

impl RunReport {
    #[must_use]
    pub fn new(zones: usize) -> Self {
        Self {
            zones,
            ..Self::default()
        }
    }

    pub fn record_failure(&mut self, failure: CollectionError) {
        match failure.stage {
            Stage::Fetch => self.fetch_failures += 1,
            Stage::Parse => self.parse_failures += 1,
            Stage::Persist => self.persist_failures += 1,
        }
        self.failures.push(failure);
    }

    /// Fetch and parse outcomes; equals `zones` unless a worker crashed
    #[must_use]
    pub fn terminal_outcomes(&self) -> usize {
        self.collected + self.fetch_failures + self.parse_failures
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.lost_jobs == 0
    }

    /// Failures of one stage
    pub fn failures_at(&self, stage: Stage) -> impl Iterator<Item = &CollectionError> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}
