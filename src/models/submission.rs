use crate::entities::submission_entity as submissions;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The engagement type a user asserts they performed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    #[sea_orm(string_value = "LIKE")]
    Like,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "REPOST")]
    Repost,
    #[sea_orm(string_value = "TAG")]
    Tag,
    #[sea_orm(string_value = "ORIGINAL_POST")]
    OriginalPost,
}

impl ActionType {
    /// Name of the classifier detection flag that must back this claim.
    pub fn detection_flag(&self) -> &'static str {
        match self {
            ActionType::Like => "like_detected",
            ActionType::Comment => "comment_detected",
            ActionType::Repost => "repost_detected",
            ActionType::Tag => "tag_detected",
            ActionType::OriginalPost => "original_post_detected",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Like => write!(f, "LIKE"),
            ActionType::Comment => write!(f, "COMMENT"),
            ActionType::Repost => write!(f, "REPOST"),
            ActionType::Tag => write!(f, "TAG"),
            ActionType::OriginalPost => write!(f, "ORIGINAL_POST"),
        }
    }
}

/// Submission lifecycle status. Transitions are forward-only:
/// pending -> manual_review -> {verified, rejected}, or pending directly to a
/// terminal state in blocking mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "verified")]
    Verified,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "manual_review")]
    ManualReview,
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Verified => write!(f, "verified"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
            SubmissionStatus::ManualReview => write!(f, "manual_review"),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubmissionRequest {
    pub action_type: ActionType,
    /// Screenshot bytes, base64-encoded.
    pub image_base64: String,
    #[schema(example = "image/png")]
    pub content_type: Option<String>,
    pub notes: Option<String>,
    /// Client timezone offset in minutes (e.g. -480 for PST).
    pub timezone_offset: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: i64,
    pub action_type: ActionType,
    pub image_url: String,
    pub status: SubmissionStatus,
    pub points_awarded: i64,
    pub streak_multiplier: f64,
    pub platform_detected: Option<String>,
    pub primary_action: Option<String>,
    pub assigned_points: Option<i64>,
    pub action_confidence: Option<f64>,
    pub duplicate_risk: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<submissions::Model> for SubmissionResponse {
    fn from(m: submissions::Model) -> Self {
        Self {
            id: m.id,
            action_type: m.action_type,
            image_url: m.image_url,
            status: m.status,
            points_awarded: m.points_awarded,
            streak_multiplier: m.streak_multiplier,
            platform_detected: m.platform_detected,
            primary_action: m.primary_action,
            assigned_points: m.assigned_points,
            action_confidence: m.action_confidence,
            duplicate_risk: m.duplicate_risk,
            notes: m.notes,
            admin_notes: m.admin_notes,
            submitted_at: m.submitted_at,
            verified_at: m.verified_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSubmissionResponse {
    pub submission: SubmissionResponse,
    pub message: String,
}

/// AI recommendation surfaced to the client once the async workflow finishes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AiRecommendation {
    pub status: SubmissionStatus,
    pub suggested_points: i64,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PollStatusResponse {
    pub done: bool,
    pub workflow_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_recommendation: Option<AiRecommendation>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminSubmissionsQuery {
    pub status: Option<SubmissionStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Review-queue entry with the submitter attached.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminSubmissionView {
    pub submission: SubmissionResponse,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveSubmissionRequest {
    pub submission_id: i64,
    /// Base points before the stored streak multiplier is applied.
    pub points: i64,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectSubmissionRequest {
    pub submission_id: i64,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApproveSubmissionResponse {
    pub points_awarded: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckPendingResponse {
    pub checked: usize,
    pub resolved: usize,
    pub still_pending: usize,
}
