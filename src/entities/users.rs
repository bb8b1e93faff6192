use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub total_points: i64,
    /// Streak cache; source of truth is the verified submission history.
    pub current_streak: i32,
    pub longest_streak: i32,
    pub grace_day_used: bool,
    /// Local-day label (YYYY-MM-DD) of the consumed grace day, if any.
    pub grace_day_date: Option<String>,
    pub last_activity_date: Option<String>,
    pub unread_notifications: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
