//! Point crediting: the user's lifetime total plus the per-month accumulator
//! behind the leaderboard. Both are additive caches over verified
//! submissions.

use crate::database::DbPool;
use crate::entities::{monthly_points_entity, user_entity};
use crate::error::AppError;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, Set};

/// Month key for a point credit, e.g. "2026-08". Always UTC.
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

#[derive(Clone)]
pub struct PointsService {
    db: DbPool,
}

impl PointsService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Add points to the user's total and to the current month's row.
    /// Increments are done in SQL so concurrent awards cannot lose updates.
    pub async fn credit(&self, user_id: i64, points: i64) -> Result<(), AppError> {
        if points <= 0 {
            return Ok(());
        }

        user_entity::Entity::update_many()
            .col_expr(
                user_entity::Column::TotalPoints,
                Expr::col(user_entity::Column::TotalPoints).add(points),
            )
            .col_expr(
                user_entity::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(user_entity::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;

        self.credit_month(user_id, &current_month(), points).await
    }

    async fn credit_month(&self, user_id: i64, month: &str, points: i64) -> Result<(), AppError> {
        // Ensure the row exists, then increment. The unique (user_id, month)
        // index makes the insert race-safe: the loser of a concurrent insert
        // falls through to the increment.
        let existing = monthly_points_entity::Entity::find()
            .filter(monthly_points_entity::Column::UserId.eq(user_id))
            .filter(monthly_points_entity::Column::Month.eq(month))
            .one(&self.db)
            .await?;

        if existing.is_none() {
            let row = monthly_points_entity::ActiveModel {
                id: NotSet,
                user_id: Set(user_id),
                month: Set(month.to_string()),
                points: Set(0),
                created_at: Set(Some(Utc::now())),
                updated_at: Set(Some(Utc::now())),
            };
            if let Err(e) = row.insert(&self.db).await {
                log::debug!("monthly_points insert raced for user {user_id}: {e}");
            }
        }

        monthly_points_entity::Entity::update_many()
            .col_expr(
                monthly_points_entity::Column::Points,
                Expr::col(monthly_points_entity::Column::Points).add(points),
            )
            .col_expr(
                monthly_points_entity::Column::UpdatedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(monthly_points_entity::Column::UserId.eq(user_id))
            .filter(monthly_points_entity::Column::Month.eq(month))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
