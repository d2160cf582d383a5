use crate::db::entities::check_job;
use crate::db::enums::CheckJobStatus;
use crate::db::services::check_job_service;
use crate::monitoring::orchestrator::CheckOrchestrator;
use crate::monitoring::scheduler::JobSink;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);
/// A running job untouched for this long is treated as orphaned.
const STALE_RUNNING_MINUTES: i64 = 5;
const FAILED_RETENTION_HOURS: i64 = 24;

/// Durable check queue backed by the check_jobs table. Workers poll for
/// pending jobs and claim them with a conditional update, so any number of
/// workers (in any number of processes) can drain the same queue.
pub struct CheckQueue {
    db: DatabaseConnection,
    orchestrator: Arc<CheckOrchestrator>,
}

#[async_trait]
impl JobSink for CheckQueue {
    async fn submit(&self, monitor_id: i32) {
        if let Err(e) = check_job_service::enqueue(&self.db, monitor_id).await {
            error!(monitor_id = monitor_id, error = %e, "Failed to enqueue check job.");
        }
    }
}

impl CheckQueue {
    pub fn new(db: DatabaseConnection, orchestrator: Arc<CheckOrchestrator>) -> Self {
        Self { db, orchestrator }
    }

    pub fn spawn_workers(self: &Arc<Self>, count: usize) {
        for worker_id in 0..count {
            let queue = self.clone();
            tokio::spawn(async move {
                queue.worker_loop(worker_id).await;
            });
        }
        info!(count = count, "Check workers started.");
    }

    async fn worker_loop(&self, worker_id: usize) {
        loop {
            match check_job_service::claim_next(&self.db).await {
                Ok(Some(job)) => self.execute(worker_id, job).await,
                Ok(None) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(e) => {
                    error!(worker = worker_id, error = %e, "Queue poll failed.");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    async fn execute(&self, worker_id: usize, job: check_job::Model) {
        debug!(
            worker = worker_id,
            job_id = job.id,
            monitor_id = job.monitor_id,
            "Executing check job."
        );
        match self.orchestrator.run_check(job.monitor_id).await {
            Ok(()) => {
                if let Err(e) = check_job_service::complete(&self.db, job.id).await {
                    error!(job_id = job.id, error = %e, "Failed to remove completed job.");
                }
            }
            Err(e) => match check_job_service::record_failure(&self.db, &job).await {
                Ok(CheckJobStatus::Failed) => {
                    error!(
                        job_id = job.id,
                        monitor_id = job.monitor_id,
                        error = %e,
                        "Check job exhausted its attempts."
                    );
                }
                Ok(_) => {
                    warn!(
                        job_id = job.id,
                        monitor_id = job.monitor_id,
                        attempt = job.attempts + 1,
                        error = %e,
                        "Check job failed, requeued."
                    );
                }
                Err(update_err) => {
                    error!(job_id = job.id, error = %update_err, "Failed to record job failure.");
                }
            },
        }
    }

    /// Periodic queue hygiene: requeue orphaned running jobs and drop old
    /// failed ones.
    pub fn spawn_maintenance(self: &Arc<Self>) {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
            loop {
                ticker.tick().await;
                let now = Utc::now();

                match check_job_service::requeue_stale(
                    &queue.db,
                    now - ChronoDuration::minutes(STALE_RUNNING_MINUTES),
                )
                .await
                {
                    Ok(0) => {}
                    Ok(n) => warn!(count = n, "Requeued stale running jobs."),
                    Err(e) => error!(error = %e, "Stale job requeue failed."),
                }

                match check_job_service::prune_failed(
                    &queue.db,
                    now - ChronoDuration::hours(FAILED_RETENTION_HOURS),
                )
                .await
                {
                    Ok(0) => {}
                    Ok(n) => debug!(count = n, "Pruned old failed jobs."),
                    Err(e) => error!(error = %e, "Failed job pruning failed."),
                }
            }
        });
    }
}
