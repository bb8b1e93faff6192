//! In-app notifications plus the cached unread counter on `users`.

use crate::database::DbPool;
use crate::entities::{notification_entity, user_entity};
use crate::error::AppError;
use crate::models::{NotificationResponse, NotificationType};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
};

/// How many notifications a single list call returns.
const LIST_LIMIT: u64 = 50;

#[derive(Clone)]
pub struct NotificationService {
    db: DbPool,
}

impl NotificationService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Insert a notification and bump the user's unread counter. Callers on
    /// award paths treat a failure here as non-fatal.
    pub async fn notify(
        &self,
        user_id: i64,
        notification_type: NotificationType,
        title: &str,
        message: &str,
        submission_id: Option<i64>,
        points_delta: Option<i64>,
    ) -> Result<(), AppError> {
        let row = notification_entity::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            notification_type: Set(notification_type),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            submission_id: Set(submission_id),
            points_delta: Set(points_delta),
            is_read: Set(false),
            created_at: Set(Some(Utc::now())),
        };
        row.insert(&self.db).await?;

        user_entity::Entity::update_many()
            .col_expr(
                user_entity::Column::UnreadNotifications,
                Expr::col(user_entity::Column::UnreadNotifications).add(1),
            )
            .filter(user_entity::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    /// Most recent notifications first.
    pub async fn list(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<NotificationResponse>, AppError> {
        let mut query = notification_entity::Entity::find()
            .filter(notification_entity::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notification_entity::Column::IsRead.eq(false));
        }
        let rows = query
            .order_by_desc(notification_entity::Column::CreatedAt)
            .limit(LIST_LIMIT)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(NotificationResponse::from).collect())
    }

    pub async fn unread_count(&self, user_id: i64) -> Result<i32, AppError> {
        let user = user_entity::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.unread_notifications)
    }

    /// Mark one notification read. The counter decrement is guarded so that
    /// a replayed request cannot push it negative.
    pub async fn mark_read(&self, user_id: i64, notification_id: i64) -> Result<(), AppError> {
        let updated = notification_entity::Entity::update_many()
            .col_expr(notification_entity::Column::IsRead, Expr::value(true))
            .filter(notification_entity::Column::Id.eq(notification_id))
            .filter(notification_entity::Column::UserId.eq(user_id))
            .filter(notification_entity::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        if updated.rows_affected == 0 {
            // Either it does not exist / belongs to someone else, or it was
            // already read. Only the former is an error.
            let exists = notification_entity::Entity::find()
                .filter(notification_entity::Column::Id.eq(notification_id))
                .filter(notification_entity::Column::UserId.eq(user_id))
                .one(&self.db)
                .await?
                .is_some();
            if !exists {
                return Err(AppError::NotFound("Notification not found".to_string()));
            }
            return Ok(());
        }

        user_entity::Entity::update_many()
            .col_expr(
                user_entity::Column::UnreadNotifications,
                Expr::col(user_entity::Column::UnreadNotifications).sub(1),
            )
            .filter(user_entity::Column::Id.eq(user_id))
            .filter(user_entity::Column::UnreadNotifications.gt(0))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: i64) -> Result<u64, AppError> {
        let updated = notification_entity::Entity::update_many()
            .col_expr(notification_entity::Column::IsRead, Expr::value(true))
            .filter(notification_entity::Column::UserId.eq(user_id))
            .filter(notification_entity::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        user_entity::Entity::update_many()
            .col_expr(user_entity::Column::UnreadNotifications, Expr::value(0))
            .filter(user_entity::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(updated.rows_affected)
    }
}
