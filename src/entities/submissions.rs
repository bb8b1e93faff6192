use crate::models::{ActionType, SubmissionStatus};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// One user's claim of a social-media action with screenshot proof.
///
/// The `*_detected` flags, `primary_action`, `assigned_points`,
/// `action_confidence`, `duplicate_risk` and `content_quality_pass` columns
/// mirror the raw AI classifier verdict and stay NULL until the workflow
/// reports back. `streak_multiplier` is snapshotted at submission time and
/// never rewritten, so a pending submission keeps the multiplier the user had
/// when it was created.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub action_type: ActionType,
    pub image_url: String,
    pub workflow_id: Option<String>,
    pub platform_detected: Option<String>,
    pub like_detected: Option<bool>,
    pub comment_detected: Option<bool>,
    pub repost_detected: Option<bool>,
    pub tag_detected: Option<bool>,
    pub original_post_detected: Option<bool>,
    pub primary_action: Option<String>,
    pub assigned_points: Option<i64>,
    pub action_confidence: Option<f64>,
    pub duplicate_risk: Option<String>,
    pub content_quality_pass: Option<bool>,
    pub status: SubmissionStatus,
    /// Non-zero only when status is `verified`.
    pub points_awarded: i64,
    pub streak_multiplier: f64,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            SubmissionStatus::Verified | SubmissionStatus::Rejected
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
