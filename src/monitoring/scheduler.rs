use crate::db::entities::monitor;
use crate::db::models::MaintenanceWindow;
use crate::db::services::monitor_service;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Where due checks go. The scheduler only ever emits "check monitor N now"
/// signals; execution lives behind this seam.
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn submit(&self, monitor_id: i32);
}

/// Both window bounds are inclusive.
pub fn in_maintenance(windows: &[MaintenanceWindow], now: DateTime<Utc>) -> bool {
    windows.iter().any(|w| w.start <= now && now <= w.end)
}

/// One interval timer per active monitor. Scheduling is idempotent: a second
/// call for the same monitor replaces its timer, so updates never leave two
/// timers running.
pub struct Scheduler {
    timers: Mutex<HashMap<i32, JoinHandle<()>>>,
    sink: Arc<dyn JobSink>,
}

impl Scheduler {
    pub fn new(sink: Arc<dyn JobSink>) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            sink,
        }
    }

    pub async fn schedule(&self, monitor: &monitor::Model) {
        let monitor_id = monitor.id;
        let interval = Duration::from_secs(monitor.interval_seconds.max(1) as u64);
        let windows = monitor.maintenance_window_list();
        let sink = self.sink.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; consume it so the first
            // submission happens one full interval from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if in_maintenance(&windows, Utc::now()) {
                    debug!(monitor_id = monitor_id, "In maintenance window, skipping check.");
                    continue;
                }
                sink.submit(monitor_id).await;
            }
        });

        let mut timers = self.timers.lock().await;
        if let Some(old) = timers.insert(monitor_id, handle) {
            old.abort();
        }
        debug!(
            monitor_id = monitor_id,
            interval_seconds = interval.as_secs(),
            "Scheduled monitor."
        );
    }

    pub async fn unschedule(&self, monitor_id: i32) {
        let mut timers = self.timers.lock().await;
        if let Some(handle) = timers.remove(&monitor_id) {
            handle.abort();
            debug!(monitor_id = monitor_id, "Unscheduled monitor.");
        }
    }

    /// Rebuilds every timer from the database. Run at startup so schedules
    /// survive a restart.
    pub async fn load_all(&self, db: &DatabaseConnection) -> Result<usize, DbErr> {
        let monitors = monitor_service::get_active_monitors(db).await?;
        let count = monitors.len();
        for monitor in &monitors {
            self.schedule(monitor).await;
        }
        info!(count = count, "Loaded monitor schedules.");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::MonitorStatus;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(AtomicUsize);

    #[async_trait]
    impl JobSink for CountingSink {
        async fn submit(&self, _monitor_id: i32) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_monitor(id: i32, interval_seconds: i32) -> monitor::Model {
        let now = Utc::now();
        monitor::Model {
            id,
            user_id: 1,
            name: format!("monitor-{}", id),
            url: "https://example.com/health".to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            timeout_seconds: 10,
            interval_seconds,
            regions: serde_json::json!(["default"]),
            expected_status_codes: None,
            status: MonitorStatus::Up,
            consecutive_fails: 0,
            last_check: None,
            last_status_change: None,
            active: true,
            maintenance_windows: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn maintenance_window_bounds() {
        let start = Utc.with_ymd_and_hms(2025, 6, 1, 2, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 4, 0, 0).unwrap();
        let windows = vec![MaintenanceWindow {
            start,
            end,
            reason: None,
        }];

        assert!(!in_maintenance(&windows, start - chrono::Duration::seconds(1)));
        assert!(in_maintenance(&windows, start));
        assert!(in_maintenance(&windows, end - chrono::Duration::seconds(1)));
        assert!(in_maintenance(&windows, end));
        assert!(!in_maintenance(&windows, end + chrono::Duration::seconds(1)));
        assert!(!in_maintenance(&[], Utc::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_timer() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let scheduler = Scheduler::new(sink.clone());
        let monitor = test_monitor(1, 60);

        scheduler.schedule(&monitor).await;
        scheduler.schedule(&monitor).await;

        // Two live timers would submit four times in this span.
        tokio::time::sleep(Duration::from_secs(125)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unschedule_stops_submissions() {
        let sink = Arc::new(CountingSink(AtomicUsize::new(0)));
        let scheduler = Scheduler::new(sink.clone());
        let monitor = test_monitor(2, 30);

        scheduler.schedule(&monitor).await;
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);

        scheduler.unschedule(monitor.id).await;
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }
}
