use crate::db::enums::MonitorStatus;
use crate::db::models::ProbeError;
use crate::db::services::monitor_service;
use crate::incidents::IncidentManager;
use crate::monitoring::prober;
use crate::notifications::dispatcher::NotificationDispatcher;
use crate::notifications::models::MonitorEvent;
use crate::server::broadcaster::StatusBroadcaster;
use crate::status_page::cache::CacheMaterializer;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::try_join_all;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Consecutive failed cycles before a monitor is declared down.
pub const FAILURE_THRESHOLD: i32 = 3;

/// The state transition computed from one aggregated check cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDecision {
    pub status: MonitorStatus,
    pub consecutive_fails: i32,
    pub changed: bool,
}

/// Aggregate verdict for one cycle: the check passes only when every region
/// reported up.
pub fn aggregate_up(region_up: &[bool]) -> bool {
    region_up.iter().all(|up| *up)
}

/// One cycle of the health state machine. A single fully-up cycle recovers a
/// monitor immediately; failures only flip it down once the threshold of
/// consecutive failed cycles is reached.
pub fn next_state(
    current: &MonitorStatus,
    consecutive_fails: i32,
    all_regions_up: bool,
) -> StateDecision {
    if all_regions_up {
        return StateDecision {
            status: MonitorStatus::Up,
            consecutive_fails: 0,
            changed: *current != MonitorStatus::Up,
        };
    }
    let fails = consecutive_fails + 1;
    if fails >= FAILURE_THRESHOLD {
        StateDecision {
            status: MonitorStatus::Down,
            consecutive_fails: fails,
            changed: *current != MonitorStatus::Down,
        }
    } else {
        StateDecision {
            status: current.clone(),
            consecutive_fails: fails,
            changed: false,
        }
    }
}

/// Runs check cycles end to end: probe every region, decide the new health
/// state, persist it, and trigger the downstream effects. Holds a per-monitor
/// lock so concurrent cycles for the same monitor serialize in-process; the
/// conditional write in `apply_check_outcome` covers races across processes.
pub struct CheckOrchestrator {
    db: DatabaseConnection,
    locks: DashMap<i32, Arc<Mutex<()>>>,
    incidents: Arc<IncidentManager>,
    notifier: Arc<NotificationDispatcher>,
    cache: Arc<CacheMaterializer>,
    broadcaster: Arc<StatusBroadcaster>,
}

impl CheckOrchestrator {
    pub fn new(
        db: DatabaseConnection,
        incidents: Arc<IncidentManager>,
        notifier: Arc<NotificationDispatcher>,
        cache: Arc<CacheMaterializer>,
        broadcaster: Arc<StatusBroadcaster>,
    ) -> Self {
        Self {
            db,
            locks: DashMap::new(),
            incidents,
            notifier,
            cache,
            broadcaster,
        }
    }

    /// Drops the execution lock of a deleted monitor so the lock map does not
    /// grow without bound in a long-lived process.
    pub fn forget_monitor(&self, monitor_id: i32) {
        self.locks.remove(&monitor_id);
    }

    /// Executes one full check cycle for a monitor. A vanished monitor is a
    /// quiet no-op so stale queue entries drain harmlessly.
    pub async fn run_check(&self, monitor_id: i32) -> Result<(), DbErr> {
        let lock = self
            .locks
            .entry(monitor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Read inside the lock so the conditional write below is anchored to
        // the freshest last_check value.
        let Some(monitor) = monitor_service::get_monitor_by_id(&self.db, monitor_id).await? else {
            debug!(monitor_id = monitor_id, "Monitor no longer exists, dropping check.");
            drop(_guard);
            self.locks.remove(&monitor_id);
            return Ok(());
        };
        if !monitor.active {
            debug!(monitor_id = monitor_id, "Monitor is paused, dropping check.");
            return Ok(());
        }

        let regions = monitor.region_list();
        // Every region must report before the aggregate is judged.
        let results = try_join_all(
            regions
                .iter()
                .map(|region| prober::check_region(&self.db, &monitor, region)),
        )
        .await?;
        let region_up: Vec<bool> = results.iter().map(|r| r.is_up).collect();
        let all_up = aggregate_up(&region_up);

        let decision = next_state(&monitor.status, monitor.consecutive_fails, all_up);
        let now = Utc::now();
        let applied = monitor_service::apply_check_outcome(
            &self.db,
            &monitor,
            decision.status.clone(),
            decision.consecutive_fails,
            decision.changed,
            now,
        )
        .await?;
        if !applied {
            warn!(
                monitor_id = monitor_id,
                "Another execution updated this monitor first, skipping side effects."
            );
            return Ok(());
        }

        if !decision.changed {
            return Ok(());
        }

        info!(
            monitor_id = monitor_id,
            name = %monitor.name,
            from = %monitor.status,
            to = %decision.status,
            "Monitor status changed."
        );

        let event = match decision.status {
            MonitorStatus::Up => {
                self.incidents.resolve_for_up(&monitor, now).await?;
                MonitorEvent::Up
            }
            MonitorStatus::Down => {
                let root_cause = results.iter().find_map(|r| {
                    let error: ProbeError =
                        serde_json::from_value(r.error.clone()?).ok()?;
                    Some(format!("{} ({}): {}", r.region, error.kind, error.message))
                });
                self.incidents.open_for_down(&monitor, root_cause, now).await?;
                MonitorEvent::Down
            }
            MonitorStatus::Paused => return Ok(()),
        };

        self.broadcaster
            .monitor_status_change(&monitor, &decision.status);

        // Alert delivery and cache regeneration never delay the cycle.
        let notifier = self.notifier.clone();
        let notified = monitor.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch(&notified, event).await {
                error!(monitor_id = notified.id, error = %e, "Notification dispatch failed.");
            }
        });
        let cache = self.cache.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.rebuild_pages_for_monitor(monitor_id).await {
                error!(monitor_id = monitor_id, error = %e, "Status page cache rebuild failed.");
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::config::ServerConfig;

    fn test_orchestrator() -> CheckOrchestrator {
        let db = DatabaseConnection::default();
        let config = ServerConfig {
            database_url: String::new(),
            smtp_host: None,
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            email_from: "alerts@pulsewatch.local".to_string(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_from_number: None,
            check_worker_count: 1,
            log_dir: "logs".to_string(),
        };
        let broadcaster = Arc::new(StatusBroadcaster::new(8));
        CheckOrchestrator::new(
            db.clone(),
            Arc::new(IncidentManager::new(db.clone(), broadcaster.clone())),
            Arc::new(NotificationDispatcher::new(db.clone(), &config)),
            Arc::new(CacheMaterializer::new(db)),
            broadcaster,
        )
    }

    #[test]
    fn forgetting_a_monitor_releases_its_lock() {
        let orchestrator = test_orchestrator();
        orchestrator.locks.insert(5, Arc::new(Mutex::new(())));
        assert!(orchestrator.locks.contains_key(&5));

        orchestrator.forget_monitor(5);
        assert!(!orchestrator.locks.contains_key(&5));
    }

    #[test]
    fn one_failing_region_fails_the_whole_cycle() {
        assert!(aggregate_up(&[true, true]));
        assert!(!aggregate_up(&[true, false]));
        assert!(!aggregate_up(&[false, false]));
        assert!(aggregate_up(&[true]));
    }

    #[test]
    fn partial_region_failures_flip_down_after_three_cycles() {
        // Two regions, one keeps timing out while the other stays healthy.
        let mut status = MonitorStatus::Up;
        let mut fails = 0;
        for cycle in 1..=3 {
            let decision = next_state(&status, fails, aggregate_up(&[true, false]));
            status = decision.status;
            fails = decision.consecutive_fails;
            assert_eq!(fails, cycle);
        }
        assert_eq!(status, MonitorStatus::Down);

        // One fully clean cycle recovers.
        let decision = next_state(&status, fails, aggregate_up(&[true, true]));
        assert_eq!(decision.status, MonitorStatus::Up);
        assert!(decision.changed);
    }

    #[test]
    fn recovery_needs_a_single_clean_cycle() {
        let decision = next_state(&MonitorStatus::Down, 5, true);
        assert_eq!(decision.status, MonitorStatus::Up);
        assert_eq!(decision.consecutive_fails, 0);
        assert!(decision.changed);
    }

    #[test]
    fn staying_up_is_not_a_change() {
        let decision = next_state(&MonitorStatus::Up, 0, true);
        assert_eq!(decision.status, MonitorStatus::Up);
        assert!(!decision.changed);
    }

    #[test]
    fn failures_below_threshold_keep_current_status() {
        let first = next_state(&MonitorStatus::Up, 0, false);
        assert_eq!(first.status, MonitorStatus::Up);
        assert_eq!(first.consecutive_fails, 1);
        assert!(!first.changed);

        let second = next_state(&MonitorStatus::Up, 1, false);
        assert_eq!(second.status, MonitorStatus::Up);
        assert_eq!(second.consecutive_fails, 2);
        assert!(!second.changed);
    }

    #[test]
    fn third_consecutive_failure_flips_down() {
        let decision = next_state(&MonitorStatus::Up, 2, false);
        assert_eq!(decision.status, MonitorStatus::Down);
        assert_eq!(decision.consecutive_fails, 3);
        assert!(decision.changed);
    }

    #[test]
    fn failures_past_threshold_keep_counting_without_re_flipping() {
        let decision = next_state(&MonitorStatus::Down, 3, false);
        assert_eq!(decision.status, MonitorStatus::Down);
        assert_eq!(decision.consecutive_fails, 4);
        assert!(!decision.changed);
    }
}
