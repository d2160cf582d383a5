use crate::db::entities::{incident, monitor, status_page};
use crate::db::services::{
    check_result_service, incident_service, monitor_service, status_page_service,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseConnection, DbErr};
use std::collections::HashMap;
use tracing::{debug, info};

/// How far back the incident history feed on a page reaches.
const INCIDENT_HISTORY_DAYS: i64 = 90;

/// Uptime history buckets for a window: short windows get fine-grained
/// buckets, long windows fall back to daily.
pub fn bucket_plan(days: i64) -> (i64, Duration) {
    if days <= 7 {
        (days * 6, Duration::hours(4))
    } else if days <= 30 {
        (days * 2, Duration::hours(12))
    } else {
        (days, Duration::days(1))
    }
}

/// Uptime over a bucket as a percentage with two decimals. A bucket with no
/// checks at all reports -1 so the page can render it as "no data" rather
/// than as an outage.
pub fn uptime_percentage(total: u64, down: u64) -> f64 {
    if total == 0 {
        return -1.0;
    }
    let up = total.saturating_sub(down) as f64;
    ((up / total as f64) * 100.0 * 100.0).round() / 100.0
}

/// Mean uptime across monitors, three decimals. Monitors with no data are
/// excluded; a page with no data at all reads fully up.
pub fn overall_uptime(values: &[f64]) -> String {
    let with_data: Vec<f64> = values.iter().copied().filter(|v| *v >= 0.0).collect();
    if with_data.is_empty() {
        return "100.000".to_string();
    }
    let mean = with_data.iter().sum::<f64>() / with_data.len() as f64;
    format!("{:.3}", mean)
}

/// Computed uptime history for one monitor reference on a page.
#[derive(Debug, Clone)]
pub struct MonitorHistory {
    pub window_uptime: f64,
    pub buckets: Vec<(DateTime<Utc>, f64)>,
}

/// Assembles the servable snapshot from already-loaded inputs. Pure: the same
/// inputs always produce the same document.
pub fn build_page_data(
    page: &status_page::Model,
    monitors: &HashMap<i32, monitor::Model>,
    histories: &HashMap<(i32, i64), MonitorHistory>,
    incidents: &[incident::Model],
    generated_at: DateTime<Utc>,
) -> serde_json::Value {
    let mut window_uptimes = Vec::new();
    let sections: Vec<serde_json::Value> = page
        .sections()
        .iter()
        .map(|section| {
            let entries: Vec<serde_json::Value> = section
                .monitors
                .iter()
                .filter_map(|reference| {
                    let monitor = monitors.get(&reference.monitor_id)?;
                    let history = histories.get(&(reference.monitor_id, reference.history_duration));
                    let window_uptime = history.map(|h| h.window_uptime).unwrap_or(-1.0);
                    window_uptimes.push(window_uptime);
                    let buckets: Vec<serde_json::Value> = history
                        .map(|h| {
                            h.buckets
                                .iter()
                                .map(|(ts, uptime)| {
                                    serde_json::json!({
                                        "timestamp": ts.to_rfc3339(),
                                        "uptime": uptime
                                    })
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    let monitor_incidents: Vec<i32> = incidents
                        .iter()
                        .filter(|i| {
                            i.monitor_id == Some(reference.monitor_id)
                                || i.affected_monitor_ids().contains(&reference.monitor_id)
                        })
                        .map(|i| i.id)
                        .collect();
                    Some(serde_json::json!({
                        "id": monitor.id,
                        "name": reference.name.clone().unwrap_or_else(|| monitor.name.clone()),
                        "description": reference.description,
                        "status": monitor.status,
                        "uptime": window_uptime,
                        "history": buckets,
                        "incidents": monitor_incidents
                    }))
                })
                .collect();
            serde_json::json!({ "name": section.name, "monitors": entries })
        })
        .collect();

    let incident_feed: Vec<serde_json::Value> = incidents
        .iter()
        .map(|i| {
            serde_json::json!({
                "id": i.id,
                "title": i.title,
                "status": i.status,
                "severity": i.severity,
                "startedAt": i.started_at.to_rfc3339(),
                "resolvedAt": i.resolved_at.map(|t| t.to_rfc3339()),
                "affectedServices": i.affected_monitor_ids()
            })
        })
        .collect();

    serde_json::json!({
        "name": page.name,
        "slug": page.slug,
        "description": page.description,
        "branding": page.branding,
        "sections": sections,
        "overallUptime": overall_uptime(&window_uptimes),
        "incidents": incident_feed,
        "generatedAt": generated_at.to_rfc3339()
    })
}

/// Regenerates status page caches. Rebuilds are wholesale: the entire page
/// document is recomputed and swapped in one upsert.
pub struct CacheMaterializer {
    db: DatabaseConnection,
}

impl CacheMaterializer {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn rebuild(&self, page_id: i32) -> Result<Option<serde_json::Value>, DbErr> {
        let Some(page) = status_page_service::get_page_by_id(&self.db, page_id).await? else {
            debug!(page_id = page_id, "Status page vanished before rebuild.");
            return Ok(None);
        };
        Ok(Some(self.rebuild_page(&page).await?))
    }

    pub async fn rebuild_pages_for_monitor(&self, monitor_id: i32) -> Result<(), DbErr> {
        let pages = status_page_service::pages_referencing_monitor(&self.db, monitor_id).await?;
        for page in &pages {
            self.rebuild_page(page).await?;
        }
        Ok(())
    }

    /// Serves a page by slug, from cache when possible. A miss rebuilds the
    /// snapshot synchronously and serves the fresh document.
    pub async fn get_public(&self, slug: &str) -> Result<Option<serde_json::Value>, DbErr> {
        if let Some(cached) = status_page_service::get_cache_by_slug(&self.db, slug).await? {
            return Ok(Some(cached.page_data));
        }
        let Some(page) = status_page_service::get_active_page_by_slug(&self.db, slug).await? else {
            return Ok(None);
        };
        debug!(slug = slug, "Cache miss, rebuilding status page.");
        Ok(Some(self.rebuild_page(&page).await?))
    }

    async fn rebuild_page(&self, page: &status_page::Model) -> Result<serde_json::Value, DbErr> {
        let now = Utc::now();
        let ids = page.referenced_monitor_ids();

        let monitors: HashMap<i32, monitor::Model> =
            monitor_service::get_monitors_by_ids(&self.db, &ids)
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

        let mut histories: HashMap<(i32, i64), MonitorHistory> = HashMap::new();
        for section in page.sections() {
            for reference in &section.monitors {
                let key = (reference.monitor_id, reference.history_duration);
                if histories.contains_key(&key) || !monitors.contains_key(&reference.monitor_id) {
                    continue;
                }
                let history = self
                    .compute_history(reference.monitor_id, reference.history_duration, now)
                    .await?;
                histories.insert(key, history);
            }
        }

        let incidents = incident_service::recent_for_monitors(
            &self.db,
            &ids,
            now - Duration::days(INCIDENT_HISTORY_DAYS),
        )
        .await?;

        let data = build_page_data(page, &monitors, &histories, &incidents, now);
        status_page_service::upsert_cache(&self.db, page.id, &page.slug, data.clone(), now).await?;
        info!(page_id = page.id, slug = %page.slug, "Rebuilt status page cache.");
        Ok(data)
    }

    async fn compute_history(
        &self,
        monitor_id: i32,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<MonitorHistory, DbErr> {
        let (count, bucket_len) = bucket_plan(days.max(1));
        let window_start = now - bucket_len * count as i32;

        let mut buckets = Vec::with_capacity(count as usize);
        for i in 0..count {
            let start = window_start + bucket_len * i as i32;
            let end = start + bucket_len;
            let total = check_result_service::count_in_range(&self.db, monitor_id, start, end).await?;
            let down =
                check_result_service::count_down_in_range(&self.db, monitor_id, start, end).await?;
            buckets.push((start, uptime_percentage(total, down)));
        }

        let window_total =
            check_result_service::count_in_range(&self.db, monitor_id, window_start, now).await?;
        let window_down =
            check_result_service::count_down_in_range(&self.db, monitor_id, window_start, now)
                .await?;

        Ok(MonitorHistory {
            window_uptime: uptime_percentage(window_total, window_down),
            buckets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enums::MonitorStatus;
    use crate::db::models::{MonitorSection, SectionMonitorRef};

    #[test]
    fn bucket_plans_by_window_length() {
        assert_eq!(bucket_plan(1), (6, Duration::hours(4)));
        assert_eq!(bucket_plan(7), (42, Duration::hours(4)));
        assert_eq!(bucket_plan(8), (16, Duration::hours(12)));
        assert_eq!(bucket_plan(30), (60, Duration::hours(12)));
        assert_eq!(bucket_plan(90), (90, Duration::days(1)));
    }

    #[test]
    fn uptime_math() {
        assert_eq!(uptime_percentage(0, 0), -1.0);
        assert_eq!(uptime_percentage(4, 0), 100.0);
        assert_eq!(uptime_percentage(4, 1), 75.0);
        assert_eq!(uptime_percentage(3, 1), 66.67);
    }

    #[test]
    fn overall_uptime_ignores_empty_buckets() {
        assert_eq!(overall_uptime(&[]), "100.000");
        assert_eq!(overall_uptime(&[-1.0, -1.0]), "100.000");
        assert_eq!(overall_uptime(&[100.0, 99.0]), "99.500");
        assert_eq!(overall_uptime(&[100.0, -1.0]), "100.000");
    }

    fn fixture() -> (
        status_page::Model,
        HashMap<i32, monitor::Model>,
        HashMap<(i32, i64), MonitorHistory>,
    ) {
        let now = Utc::now();
        let sections = vec![MonitorSection {
            name: "Core".to_string(),
            monitors: vec![SectionMonitorRef {
                monitor_id: 1,
                name: Some("Public API".to_string()),
                description: None,
                history_duration: 7,
            }],
        }];
        let page = status_page::Model {
            id: 1,
            user_id: 1,
            name: "Example Status".to_string(),
            slug: "example".to_string(),
            description: None,
            branding: None,
            monitor_sections: serde_json::to_value(&sections).unwrap(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        let monitor = monitor::Model {
            id: 1,
            user_id: 1,
            name: "api-internal".to_string(),
            url: "https://api.example.com".to_string(),
            method: "GET".to_string(),
            headers: None,
            body: None,
            timeout_seconds: 10,
            interval_seconds: 60,
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
        };
        let mut monitors = HashMap::new();
        monitors.insert(1, monitor);
        let mut histories = HashMap::new();
        histories.insert(
            (1, 7),
            MonitorHistory {
                window_uptime: 99.5,
                buckets: vec![(now - Duration::hours(4), 99.5)],
            },
        );
        (page, monitors, histories)
    }

    #[test]
    fn page_data_uses_section_overrides() {
        let (page, monitors, histories) = fixture();
        let data = build_page_data(&page, &monitors, &histories, &[], Utc::now());
        assert_eq!(data["sections"][0]["monitors"][0]["name"], "Public API");
        assert_eq!(data["sections"][0]["monitors"][0]["uptime"], 99.5);
        assert_eq!(data["overallUptime"], "99.500");
    }

    #[test]
    fn page_data_is_deterministic_for_fixed_inputs() {
        let (page, monitors, histories) = fixture();
        let at = Utc::now();
        let first = build_page_data(&page, &monitors, &histories, &[], at);
        let second = build_page_data(&page, &monitors, &histories, &[], at);
        assert_eq!(first, second);
    }

    #[test]
    fn deleted_monitors_are_skipped() {
        let (page, _, histories) = fixture();
        let data = build_page_data(&page, &HashMap::new(), &histories, &[], Utc::now());
        assert_eq!(data["sections"][0]["monitors"].as_array().unwrap().len(), 0);
        assert_eq!(data["overallUptime"], "100.000");
    }
}
