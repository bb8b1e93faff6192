use crate::entities::notification_entity as notifications;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "submission_approved")]
    SubmissionApproved,
    #[sea_orm(string_value = "submission_rejected")]
    SubmissionRejected,
    #[sea_orm(string_value = "points_awarded")]
    PointsAwarded,
    #[sea_orm(string_value = "streak_milestone")]
    StreakMilestone,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub submission_id: Option<i64>,
    pub points_delta: Option<i64>,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<notifications::Model> for NotificationResponse {
    fn from(n: notifications::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            title: n.title,
            message: n.message,
            submission_id: n.submission_id,
            points_delta: n.points_delta,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}
