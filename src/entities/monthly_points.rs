use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Per-user per-month point accumulator, keyed by (user_id, "YYYY-MM").
/// A derived cache of verified submissions, persisted for fast leaderboard
/// reads; incremented additively, never decremented by the application.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "monthly_points")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub month: String,
    pub points: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
