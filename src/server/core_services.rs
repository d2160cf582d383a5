use crate::db::entities::incident;
use crate::db::enums::IncidentStatus;
use crate::db::services::{check_job_service, monitor_service};
use crate::incidents::IncidentManager;
use crate::monitoring::orchestrator::CheckOrchestrator;
use crate::monitoring::queue::CheckQueue;
use crate::monitoring::scheduler::{JobSink, Scheduler};
use crate::notifications::NotificationDispatcher;
use crate::server::broadcaster::StatusBroadcaster;
use crate::server::config::ServerConfig;
use crate::status_page::CacheMaterializer;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// The wired-up pipeline. Everything downstream of monitor CRUD goes through
/// here: scheduling, on-demand checks, pause and resume, deletion, cache
/// rebuilds, and the realtime event feed.
pub struct CoreServices {
    db: DatabaseConnection,
    config: ServerConfig,
    scheduler: Arc<Scheduler>,
    queue: Arc<CheckQueue>,
    orchestrator: Arc<CheckOrchestrator>,
    incidents: Arc<IncidentManager>,
    cache: Arc<CacheMaterializer>,
    broadcaster: Arc<StatusBroadcaster>,
}

impl CoreServices {
    pub fn new(db: DatabaseConnection, config: ServerConfig) -> Self {
        let broadcaster = Arc::new(StatusBroadcaster::new(256));
        let incidents = Arc::new(IncidentManager::new(db.clone(), broadcaster.clone()));
        let notifier = Arc::new(NotificationDispatcher::new(db.clone(), &config));
        let cache = Arc::new(CacheMaterializer::new(db.clone()));
        let orchestrator = Arc::new(CheckOrchestrator::new(
            db.clone(),
            incidents.clone(),
            notifier,
            cache.clone(),
            broadcaster.clone(),
        ));
        let queue = Arc::new(CheckQueue::new(db.clone(), orchestrator.clone()));
        let scheduler = Arc::new(Scheduler::new(queue.clone() as Arc<dyn JobSink>));

        Self {
            db,
            config,
            scheduler,
            queue,
            orchestrator,
            incidents,
            cache,
            broadcaster,
        }
    }

    /// Starts the queue workers and its maintenance task, then restores every
    /// active monitor's schedule from the database.
    pub async fn start(&self) -> Result<(), DbErr> {
        self.queue.spawn_workers(self.config.check_worker_count);
        self.queue.spawn_maintenance();
        self.load_all_schedules().await?;
        Ok(())
    }

    /// (Re)schedules a monitor after create or update. Inactive monitors are
    /// unscheduled instead.
    pub async fn schedule_monitor(&self, monitor_id: i32) -> Result<(), DbErr> {
        match monitor_service::get_monitor_by_id(&self.db, monitor_id).await? {
            Some(monitor) if monitor.active => self.scheduler.schedule(&monitor).await,
            Some(_) => self.scheduler.unschedule(monitor_id).await,
            None => {
                warn!(monitor_id = monitor_id, "Cannot schedule unknown monitor.");
                self.scheduler.unschedule(monitor_id).await;
            }
        }
        Ok(())
    }

    pub async fn unschedule_monitor(&self, monitor_id: i32) {
        self.scheduler.unschedule(monitor_id).await;
    }

    /// Rebuilds every active monitor's timer from the database.
    pub async fn load_all_schedules(&self) -> Result<usize, DbErr> {
        self.scheduler.load_all(&self.db).await
    }

    /// Queues an immediate check without touching the monitor's schedule.
    pub async fn enqueue_check(&self, monitor_id: i32) -> Result<(), DbErr> {
        check_job_service::enqueue(&self.db, monitor_id).await?;
        Ok(())
    }

    /// Runs a full check cycle inline, bypassing the queue.
    pub async fn run_check_now(&self, monitor_id: i32) -> Result<(), DbErr> {
        self.orchestrator.run_check(monitor_id).await
    }

    pub async fn pause_monitor(&self, monitor_id: i32) -> Result<(), DbErr> {
        self.scheduler.unschedule(monitor_id).await;
        if monitor_service::mark_paused(&self.db, monitor_id).await?.is_some() {
            info!(monitor_id = monitor_id, "Monitor paused.");
        }
        Ok(())
    }

    /// Resumes a paused monitor, optimistically marking it up and queueing an
    /// immediate check to verify.
    pub async fn resume_monitor(&self, monitor_id: i32) -> Result<(), DbErr> {
        let Some(monitor) = monitor_service::mark_resumed(&self.db, monitor_id).await? else {
            warn!(monitor_id = monitor_id, "Cannot resume unknown monitor.");
            return Ok(());
        };
        self.scheduler.schedule(&monitor).await;
        check_job_service::enqueue(&self.db, monitor_id).await?;
        info!(monitor_id = monitor_id, "Monitor resumed.");
        Ok(())
    }

    /// Removes a monitor and all its dependent data, then rebuilds the caches
    /// of every status page that referenced it.
    pub async fn delete_monitor(&self, monitor_id: i32) -> Result<(), DbErr> {
        self.scheduler.unschedule(monitor_id).await;
        let affected_pages = monitor_service::delete_monitor_cascade(&self.db, monitor_id).await?;
        self.orchestrator.forget_monitor(monitor_id);
        for page_id in affected_pages {
            self.cache.rebuild(page_id).await?;
        }
        Ok(())
    }

    pub async fn rebuild_status_page_cache(
        &self,
        page_id: i32,
    ) -> Result<Option<serde_json::Value>, DbErr> {
        self.cache.rebuild(page_id).await
    }

    /// The public, cache-backed view of a status page.
    pub async fn get_public_status_page(
        &self,
        slug: &str,
    ) -> Result<Option<serde_json::Value>, DbErr> {
        self.cache.get_public(slug).await
    }

    /// Appends a manual update to an incident, optionally changing its status.
    pub async fn add_incident_update(
        &self,
        incident_id: i32,
        message: &str,
        author: &str,
        new_status: Option<IncidentStatus>,
    ) -> Result<incident::Model, DbErr> {
        self.incidents
            .add_update(incident_id, message, author, new_status)
            .await
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<String> {
        self.broadcaster.subscribe()
    }
}
