use crate::db::entities::{prelude::*, status_page, status_page_cache};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};

pub async fn get_page_by_id(
    db: &DatabaseConnection,
    page_id: i32,
) -> Result<Option<status_page::Model>, DbErr> {
    StatusPage::find_by_id(page_id).one(db).await
}

pub async fn get_active_page_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<status_page::Model>, DbErr> {
    StatusPage::find()
        .filter(status_page::Column::Slug.eq(slug))
        .filter(status_page::Column::Active.eq(true))
        .one(db)
        .await
}

/// Every status page, active or not, whose sections reference the monitor.
/// Section membership lives inside a Json column, so the filter happens here
/// rather than in SQL; page counts are small.
pub async fn pages_referencing_monitor(
    db: &DatabaseConnection,
    monitor_id: i32,
) -> Result<Vec<status_page::Model>, DbErr> {
    let pages = StatusPage::find().all(db).await?;
    Ok(pages
        .into_iter()
        .filter(|p| p.referenced_monitor_ids().contains(&monitor_id))
        .collect())
}

pub async fn get_cache_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<status_page_cache::Model>, DbErr> {
    StatusPageCache::find()
        .filter(status_page_cache::Column::Slug.eq(slug))
        .one(db)
        .await
}

/// Inserts or replaces the cached snapshot for a page. Keyed on the page id
/// so a slug rename simply rewrites the row with the new slug.
pub async fn upsert_cache(
    db: &DatabaseConnection,
    status_page_id: i32,
    slug: &str,
    page_data: serde_json::Value,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    let cache = status_page_cache::ActiveModel {
        status_page_id: Set(status_page_id),
        slug: Set(slug.to_string()),
        page_data: Set(page_data),
        last_updated_at: Set(now),
        ..Default::default()
    };
    StatusPageCache::insert(cache)
        .on_conflict(
            OnConflict::column(status_page_cache::Column::StatusPageId)
                .update_columns([
                    status_page_cache::Column::Slug,
                    status_page_cache::Column::PageData,
                    status_page_cache::Column::LastUpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;
    Ok(())
}
