use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A configured notification channel (email address, webhook URL, bot token,
/// and so on). `integration_type` selects the sender adapter; `details` holds
/// the channel-specific fields as Json.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "integrations")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub integration_type: String,
    pub name: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub details: Json,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::notification_binding::Entity")]
    NotificationBinding,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::notification_binding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::NotificationBinding.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
