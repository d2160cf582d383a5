use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Denormalized, publicly servable snapshot of one status page. Pure derived
/// state: regenerated wholesale whenever an upstream monitor, section, or
/// incident changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "status_page_caches")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub status_page_id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub page_data: Json,
    pub last_updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::status_page::Entity",
        from = "Column::StatusPageId",
        to = "super::status_page::Column::Id",
        on_delete = "Cascade"
    )]
    StatusPage,
}

impl Related<super::status_page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusPage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
