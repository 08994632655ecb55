//! Periodic weather collection: scheduler, orchestrator and worker pool

mod orchestrator;
mod pool;
mod report;
mod scheduler;

pub use orchestrator::{CollectionRun, Orchestrator};
pub use pool::{PoolEvent, RunningPool, WorkerPool, WorkerSummary};
pub use report::RunReport;
pub use scheduler::{Scheduler, SchedulerState};
