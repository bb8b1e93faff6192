//! Submission intake and the verification pipeline.
//!
//! A submission is created once and then only moved forward:
//! pending -> manual_review -> {verified, rejected}, or straight to a
//! terminal state in blocking mode. Every transition out of `pending` is a
//! compare-and-set on the status column, so concurrent polls, the admin
//! sweep and admin decisions cannot double-resolve a row. Side effects of an
//! award (point credits, notifications, streak cache) run after the status
//! transition commits and are logged on failure rather than rolled back.

use crate::config::VerificationMode;
use crate::database::DbPool;
use crate::entities::{submission_entity, user_entity};
use crate::error::AppError;
use crate::external::{
    AiVerifierClient, BlockingVerifyOutcome, StartedWorkflow, StorageClient,
    extract_verdict_object, is_terminal_verdict,
};
use crate::models::{
    AiRecommendation, CheckPendingResponse, CreateSubmissionRequest, CreateSubmissionResponse,
    NotificationType, PaginatedResponse, PaginationParams, PollStatusResponse, SubmissionResponse,
    SubmissionStatus,
};
use crate::services::notification_service::NotificationService;
use crate::services::points_service::PointsService;
use crate::services::streak_service::StreakService;
use crate::services::verdict::{Decision, DecisionPolicy, VerdictFields, decide};
use crate::utils::{apply_multiplier, streak_multiplier};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde_json::Value;
use std::sync::Arc;

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Streak lengths that trigger a milestone notification.
const STREAK_MILESTONES: [i32; 2] = [5, 10];

/// What one status payload means for a pending submission, before any
/// persistence happens.
enum StatusCheck {
    /// Workflow still running and no error reported.
    StillRunning { workflow_status: String },
    /// Park in manual_review with this note; partial verdict fields are
    /// persisted so admins see whatever the AI did manage to produce.
    Park {
        workflow_status: String,
        note: String,
        fields: VerdictFields,
    },
    /// Terminal verdict present, ready for a recommendation.
    Completed { fields: VerdictFields },
}

/// What happened to a pending submission after one status check.
enum ResolveOutcome {
    /// Workflow still running, stay pending.
    StillRunning { workflow_status: String },
    /// Moved to manual_review, with the AI recommendation when one exists.
    MovedToReview {
        workflow_status: String,
        message: String,
        recommendation: Option<AiRecommendation>,
    },
}

#[derive(Clone)]
pub struct SubmissionService {
    db: DbPool,
    verifier: Arc<AiVerifierClient>,
    storage: Arc<StorageClient>,
    streaks: StreakService,
    points: PointsService,
    notifications: NotificationService,
}

impl SubmissionService {
    pub fn new(
        db: DbPool,
        verifier: Arc<AiVerifierClient>,
        storage: Arc<StorageClient>,
        streaks: StreakService,
        points: PointsService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            db,
            verifier,
            storage,
            streaks,
            points,
            notifications,
        }
    }

    /// Accept a screenshot proof: upload it, snapshot the user's current
    /// multiplier onto the row, then hand it to the configured verification
    /// mode. A verifier outage never fails the request; the submission is
    /// parked in manual_review instead.
    pub async fn create(
        &self,
        user_id: i64,
        req: CreateSubmissionRequest,
    ) -> Result<CreateSubmissionResponse, AppError> {
        let bytes = BASE64
            .decode(req.image_base64.trim())
            .map_err(|_| AppError::ValidationError("Invalid base64 image data".to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::ValidationError(
                "Image exceeds the 10MB limit".to_string(),
            ));
        }

        let content_type = req.content_type.as_deref().unwrap_or("image/png");
        let timezone = req.timezone_offset.unwrap_or(0);
        let image_url = self.storage.upload(user_id, bytes, content_type).await?;
        let multiplier = self.streaks.current_multiplier(user_id, timezone).await?;

        let submission = submission_entity::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            action_type: Set(req.action_type),
            image_url: Set(image_url),
            workflow_id: Set(None),
            platform_detected: Set(None),
            like_detected: Set(None),
            comment_detected: Set(None),
            repost_detected: Set(None),
            tag_detected: Set(None),
            original_post_detected: Set(None),
            primary_action: Set(None),
            assigned_points: Set(None),
            action_confidence: Set(None),
            duplicate_risk: Set(None),
            content_quality_pass: Set(None),
            status: Set(SubmissionStatus::Pending),
            points_awarded: Set(0),
            streak_multiplier: Set(multiplier),
            notes: Set(req.notes.clone()),
            admin_notes: Set(None),
            submitted_at: Set(Utc::now()),
            verified_at: Set(None),
        }
        .insert(&self.db)
        .await?;

        log::info!(
            "submission {} created by user {} ({})",
            submission.id,
            user_id,
            submission.action_type
        );

        let message = match self.verifier.mode() {
            VerificationMode::Async => self.start_async(&submission).await?,
            VerificationMode::Blocking => self.finish_blocking(&submission).await?,
        };

        let fresh = self.reload(submission.id).await?;
        Ok(CreateSubmissionResponse {
            submission: fresh.into(),
            message,
        })
    }

    async fn reload(&self, submission_id: i64) -> Result<submission_entity::Model, AppError> {
        submission_entity::Entity::find_by_id(submission_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))
    }

    async fn start_async(&self, submission: &submission_entity::Model) -> Result<String, AppError> {
        match self.verifier.start(&submission.image_url).await {
            Ok(StartedWorkflow {
                workflow_id: Some(workflow_id),
                ..
            }) => {
                let mut active: submission_entity::ActiveModel = submission.clone().into();
                active.workflow_id = Set(Some(workflow_id.clone()));
                active.update(&self.db).await?;
                log::info!(
                    "submission {} started workflow {workflow_id}",
                    submission.id
                );
                Ok("Verification started, poll the status endpoint for the result".to_string())
            }
            Ok(_) => {
                self.cas_to_manual_review(
                    submission.id,
                    "AI verifier returned no workflow id".to_string(),
                )
                .await?;
                Ok("Submission queued for manual review".to_string())
            }
            Err(e) => {
                log::warn!("failed to start workflow for submission {}: {e}", submission.id);
                self.cas_to_manual_review(
                    submission.id,
                    format!("Failed to start AI verification: {e}"),
                )
                .await?;
                Ok("Submission queued for manual review".to_string())
            }
        }
    }

    async fn finish_blocking(
        &self,
        submission: &submission_entity::Model,
    ) -> Result<String, AppError> {
        match self.verifier.verify_blocking(&submission.image_url).await {
            Ok(BlockingVerifyOutcome::Completed(verdict)) => {
                self.apply_blocking_verdict(submission, &verdict).await
            }
            Ok(BlockingVerifyOutcome::TimedOut) => {
                self.cas_to_manual_review(
                    submission.id,
                    "AI verification timed out".to_string(),
                )
                .await?;
                Ok("Verification timed out, submission queued for manual review".to_string())
            }
            Err(e) => {
                log::warn!("blocking verification failed for submission {}: {e}", submission.id);
                self.cas_to_manual_review(submission.id, format!("AI verification failed: {e}"))
                    .await?;
                Ok("Submission queued for manual review".to_string())
            }
        }
    }

    async fn apply_blocking_verdict(
        &self,
        submission: &submission_entity::Model,
        verdict: &Value,
    ) -> Result<String, AppError> {
        let fields = VerdictFields::from_value(verdict);
        let decision = decide(DecisionPolicy::LegacyAuto, submission.action_type, &fields);

        match decision.status {
            SubmissionStatus::Verified => {
                let awarded = apply_multiplier(decision.points, submission.streak_multiplier);
                let transitioned = self
                    .cas_update(
                        submission.id,
                        verdict_active_model(&fields, SubmissionStatus::Verified, Some(awarded)),
                    )
                    .await?;
                if transitioned {
                    self.post_award(
                        submission.user_id,
                        submission.id,
                        awarded,
                        NotificationType::PointsAwarded,
                    )
                    .await;
                }
                Ok(format!("Submission verified, {awarded} points awarded"))
            }
            SubmissionStatus::Rejected => {
                let mut active = verdict_active_model(&fields, SubmissionStatus::Rejected, None);
                active.admin_notes = Set(Some(decision.reason.clone()));
                let transitioned = self.cas_update(submission.id, active).await?;
                if transitioned {
                    self.notify_rejection(submission.user_id, submission.id, &decision.reason)
                        .await;
                }
                Ok(format!("Submission rejected: {}", decision.reason))
            }
            _ => {
                let mut active =
                    verdict_active_model(&fields, SubmissionStatus::ManualReview, None);
                active.admin_notes = Set(Some(decision.reason.clone()));
                self.cas_update(submission.id, active).await?;
                Ok("Submission queued for manual review".to_string())
            }
        }
    }

    /// Poll the verification status of one of the caller's own submissions.
    /// Safe to call repeatedly; already-resolved rows return immediately.
    pub async fn poll_status(
        &self,
        user_id: i64,
        submission_id: i64,
    ) -> Result<PollStatusResponse, AppError> {
        let submission = submission_entity::Entity::find_by_id(submission_id)
            .filter(submission_entity::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        if submission.status != SubmissionStatus::Pending {
            return Ok(PollStatusResponse {
                done: true,
                workflow_status: submission.status.to_string(),
                message: None,
                ai_recommendation: None,
            });
        }

        match self.resolve_pending(&submission).await? {
            ResolveOutcome::StillRunning { workflow_status } => Ok(PollStatusResponse {
                done: false,
                workflow_status,
                message: None,
                ai_recommendation: None,
            }),
            ResolveOutcome::MovedToReview {
                workflow_status,
                message,
                recommendation,
            } => Ok(PollStatusResponse {
                done: true,
                workflow_status,
                message: Some(message),
                ai_recommendation: recommendation,
            }),
        }
    }

    /// One status check for a pending submission. Any outcome other than a
    /// still-running workflow parks the row in manual_review; classifier
    /// failures become review notes, never handler errors.
    async fn resolve_pending(
        &self,
        submission: &submission_entity::Model,
    ) -> Result<ResolveOutcome, AppError> {
        let Some(workflow_id) = submission.workflow_id.as_deref() else {
            self.cas_to_manual_review(
                submission.id,
                "No AI workflow was started for this submission".to_string(),
            )
            .await?;
            return Ok(moved("manual_review", "Submission queued for manual review", None));
        };

        let payload = match self.verifier.status(workflow_id).await {
            Ok(p) => p,
            Err(e) => {
                log::warn!("status check failed for workflow {workflow_id}: {e}");
                self.cas_to_manual_review(submission.id, format!("AI status check failed: {e}"))
                    .await?;
                return Ok(moved(
                    "manual_review",
                    "Submission queued for manual review",
                    None,
                ));
            }
        };

        match interpret_status(&payload) {
            StatusCheck::StillRunning { workflow_status } => {
                Ok(ResolveOutcome::StillRunning { workflow_status })
            }
            StatusCheck::Park {
                workflow_status,
                note,
                fields,
            } => {
                let mut active =
                    verdict_active_model(&fields, SubmissionStatus::ManualReview, None);
                active.admin_notes = Set(Some(note));
                self.cas_update(submission.id, active).await?;
                Ok(moved(
                    &workflow_status,
                    "Submission queued for manual review",
                    None,
                ))
            }
            StatusCheck::Completed { fields } => {
                let decision = decide(DecisionPolicy::Recommend, submission.action_type, &fields);
                let note = recommendation_note(&decision);

                // The AI only recommends here; the row always lands in
                // manual_review and an admin makes the final call.
                let mut active =
                    verdict_active_model(&fields, SubmissionStatus::ManualReview, None);
                active.admin_notes = Set(Some(note));
                self.cas_update(submission.id, active).await?;

                log::info!(
                    "submission {} recommendation: {} ({})",
                    submission.id,
                    decision.status,
                    decision.reason
                );
                Ok(moved(
                    "completed",
                    "AI review complete, awaiting admin decision",
                    Some(AiRecommendation {
                        status: decision.status,
                        suggested_points: decision.points,
                        reason: decision.reason,
                    }),
                ))
            }
        }
    }

    /// Admin sweep: run one status check for every pending submission.
    pub async fn check_pending_all(&self) -> Result<CheckPendingResponse, AppError> {
        let pending = submission_entity::Entity::find()
            .filter(submission_entity::Column::Status.eq(SubmissionStatus::Pending))
            .order_by_asc(submission_entity::Column::SubmittedAt)
            .all(&self.db)
            .await?;

        let checked = pending.len();
        let mut resolved = 0;
        for submission in &pending {
            match self.resolve_pending(submission).await {
                Ok(ResolveOutcome::MovedToReview { .. }) => resolved += 1,
                Ok(ResolveOutcome::StillRunning { .. }) => {}
                Err(e) => log::warn!("sweep failed for submission {}: {e}", submission.id),
            }
        }

        log::info!("pending sweep: {checked} checked, {resolved} resolved");
        Ok(CheckPendingResponse {
            checked,
            resolved,
            still_pending: checked - resolved,
        })
    }

    /// The caller's own submissions, newest first.
    pub async fn list_for_user(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<SubmissionResponse>, AppError> {
        let paginator = submission_entity::Entity::find()
            .filter(submission_entity::Column::UserId.eq(user_id))
            .order_by_desc(submission_entity::Column::SubmittedAt)
            .paginate(&self.db, params.get_limit());

        let total = paginator.num_items().await? as i64;
        let rows = paginator.fetch_page((params.get_page() - 1) as u64).await?;
        let items = rows.into_iter().map(SubmissionResponse::from).collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    /// Forward-only transition out of `pending`. Returns whether this call
    /// won the transition.
    async fn cas_update(
        &self,
        submission_id: i64,
        set: submission_entity::ActiveModel,
    ) -> Result<bool, AppError> {
        let result = submission_entity::Entity::update_many()
            .set(set)
            .filter(submission_entity::Column::Id.eq(submission_id))
            .filter(submission_entity::Column::Status.eq(SubmissionStatus::Pending))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn cas_to_manual_review(
        &self,
        submission_id: i64,
        note: String,
    ) -> Result<bool, AppError> {
        self.cas_update(
            submission_id,
            submission_entity::ActiveModel {
                status: Set(SubmissionStatus::ManualReview),
                admin_notes: Set(Some(note)),
                ..Default::default()
            },
        )
        .await
    }

    /// Side effects of a committed award. Failures are logged and swallowed;
    /// the verified status is already durable at this point.
    pub(crate) async fn post_award(
        &self,
        user_id: i64,
        submission_id: i64,
        points: i64,
        kind: NotificationType,
    ) {
        if let Err(e) = self.points.credit(user_id, points).await {
            log::error!("failed to credit {points} points to user {user_id}: {e}");
        }

        let (title, message) = match kind {
            NotificationType::SubmissionApproved => (
                "Submission approved",
                format!("Your submission was approved, you earned {points} points"),
            ),
            _ => (
                "Points awarded",
                format!("You earned {points} points for a verified submission"),
            ),
        };
        if let Err(e) = self
            .notifications
            .notify(user_id, kind, title, &message, Some(submission_id), Some(points))
            .await
        {
            log::error!("failed to notify user {user_id} of award: {e}");
        }

        let previous_streak = match user_entity::Entity::find_by_id(user_id).one(&self.db).await {
            Ok(Some(u)) => u.current_streak,
            _ => 0,
        };

        match self.streaks.refresh_cache(user_id).await {
            Ok(comp) => {
                for milestone in STREAK_MILESTONES {
                    if comp.current_streak >= milestone && previous_streak < milestone {
                        let multiplier = streak_multiplier(comp.current_streak);
                        if let Err(e) = self
                            .notifications
                            .notify(
                                user_id,
                                NotificationType::StreakMilestone,
                                "Streak milestone",
                                &format!(
                                    "{milestone}-day streak reached! Your multiplier is now {multiplier}x"
                                ),
                                None,
                                None,
                            )
                            .await
                        {
                            log::warn!("failed to notify user {user_id} of milestone: {e}");
                        }
                    }
                }
            }
            Err(e) => log::error!("failed to refresh streak cache for user {user_id}: {e}"),
        }
    }

    pub(crate) async fn notify_rejection(&self, user_id: i64, submission_id: i64, reason: &str) {
        if let Err(e) = self
            .notifications
            .notify(
                user_id,
                NotificationType::SubmissionRejected,
                "Submission rejected",
                reason,
                Some(submission_id),
                None,
            )
            .await
        {
            log::error!("failed to notify user {user_id} of rejection: {e}");
        }
    }
}

/// Classify one status payload. The verdict fields live under top-level
/// `response`; an error of any JSON type counts as an error, with non-string
/// values serialized into the admin note.
fn interpret_status(payload: &Value) -> StatusCheck {
    let workflow_status = payload
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("unknown")
        .to_string();
    let requires_input = payload
        .get("requires_input")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let error = match payload.get("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    if workflow_status == "pending" && !requires_input && error.is_none() {
        return StatusCheck::StillRunning { workflow_status };
    }

    let verdict = extract_verdict_object(payload);
    let fields = VerdictFields::from_value(verdict);

    if requires_input || error.is_some() {
        let note = match error {
            Some(e) => format!("AI workflow error: {e}"),
            None => "AI workflow requires manual input".to_string(),
        };
        return StatusCheck::Park {
            workflow_status,
            note,
            fields,
        };
    }

    if workflow_status != "completed" {
        let note = format!("AI workflow ended with status: {workflow_status}");
        return StatusCheck::Park {
            workflow_status,
            note,
            fields,
        };
    }

    if !is_terminal_verdict(verdict) {
        return StatusCheck::Park {
            workflow_status,
            note: "AI workflow completed with malformed output".to_string(),
            fields,
        };
    }

    StatusCheck::Completed { fields }
}

fn moved(workflow_status: &str, message: &str, recommendation: Option<AiRecommendation>) -> ResolveOutcome {
    ResolveOutcome::MovedToReview {
        workflow_status: workflow_status.to_string(),
        message: message.to_string(),
        recommendation,
    }
}

/// Admin note summarizing the AI's recommendation for the review queue.
fn recommendation_note(decision: &Decision) -> String {
    format!(
        "AI Recommendation: {} ({}). Suggested points: {}",
        decision.status.to_string().to_uppercase(),
        decision.reason,
        decision.points
    )
}

/// ActiveModel carrying the raw verdict columns plus the target status.
fn verdict_active_model(
    fields: &VerdictFields,
    status: SubmissionStatus,
    points_awarded: Option<i64>,
) -> submission_entity::ActiveModel {
    let mut active = submission_entity::ActiveModel {
        status: Set(status),
        platform_detected: Set(fields.platform_detected.clone()),
        like_detected: Set(fields.like_detected),
        comment_detected: Set(fields.comment_detected),
        repost_detected: Set(fields.repost_detected),
        tag_detected: Set(fields.tag_detected),
        original_post_detected: Set(fields.original_post_detected),
        primary_action: Set(fields.primary_action.clone()),
        assigned_points: Set(fields.assigned_points),
        action_confidence: Set(fields.action_confidence),
        duplicate_risk: Set(fields.duplicate_risk.clone()),
        content_quality_pass: Set(fields.content_quality_pass),
        ..Default::default()
    };
    if let Some(points) = points_awarded {
        active.points_awarded = Set(points);
        active.verified_at = Set(Some(Utc::now()));
    }
    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionType;

    #[test]
    fn test_recommendation_note_format() {
        let decision = decision_fixture();
        assert_eq!(
            recommendation_note(&decision),
            "AI Recommendation: MANUAL_REVIEW (Low confidence (0.6)). Suggested points: 0"
        );
    }

    fn decision_fixture() -> Decision {
        decide(
            DecisionPolicy::Recommend,
            ActionType::Like,
            &VerdictFields {
                action_confidence: Some(0.6),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_completed_status_reads_verdict_from_response_field() {
        let payload = serde_json::json!({
            "status": "completed",
            "response": {
                "platform_detected": "LinkedIn",
                "like_detected": true,
                "action_confidence": 0.9,
                "assigned_points": 5
            }
        });
        match interpret_status(&payload) {
            StatusCheck::Completed { fields } => {
                assert_eq!(fields.platform_detected.as_deref(), Some("LinkedIn"));
                assert_eq!(fields.action_confidence, Some(0.9));
                assert_eq!(fields.assigned_points, Some(5));
            }
            _ => panic!("completed payload with a response verdict must resolve"),
        }
    }

    #[test]
    fn test_completed_status_without_verdict_is_malformed() {
        let payload = serde_json::json!({ "status": "completed" });
        match interpret_status(&payload) {
            StatusCheck::Park { note, .. } => {
                assert_eq!(note, "AI workflow completed with malformed output");
            }
            _ => panic!("completed payload without a verdict must park"),
        }
    }

    #[test]
    fn test_pending_status_without_error_keeps_running() {
        let payload = serde_json::json!({ "status": "pending" });
        assert!(matches!(
            interpret_status(&payload),
            StatusCheck::StillRunning { .. }
        ));

        let payload = serde_json::json!({ "status": "pending", "error": null });
        assert!(matches!(
            interpret_status(&payload),
            StatusCheck::StillRunning { .. }
        ));
    }

    #[test]
    fn test_object_valued_error_parks_the_submission() {
        let payload = serde_json::json!({
            "status": "pending",
            "error": { "code": "WORKER_CRASH" }
        });
        match interpret_status(&payload) {
            StatusCheck::Park { note, .. } => {
                assert!(note.starts_with("AI workflow error:"));
                assert!(note.contains("WORKER_CRASH"));
            }
            _ => panic!("a reported error must park the submission"),
        }
    }

    #[test]
    fn test_parked_outcomes_carry_partial_verdict_fields() {
        let payload = serde_json::json!({
            "status": "failed",
            "response": {
                "platform_detected": "LinkedIn",
                "action_confidence": 0.4
            }
        });
        match interpret_status(&payload) {
            StatusCheck::Park {
                workflow_status,
                note,
                fields,
            } => {
                assert_eq!(workflow_status, "failed");
                assert_eq!(note, "AI workflow ended with status: failed");
                assert_eq!(fields.platform_detected.as_deref(), Some("LinkedIn"));
                assert_eq!(fields.action_confidence, Some(0.4));
            }
            _ => panic!("non-completed terminal status must park"),
        }
    }

    #[test]
    fn test_verdict_active_model_sets_award_columns_only_when_awarded() {
        let fields = VerdictFields::default();
        let active = verdict_active_model(&fields, SubmissionStatus::ManualReview, None);
        assert!(matches!(active.points_awarded, sea_orm::ActiveValue::NotSet));
        assert!(matches!(active.verified_at, sea_orm::ActiveValue::NotSet));

        let active = verdict_active_model(&fields, SubmissionStatus::Verified, Some(8));
        assert!(matches!(active.points_awarded, sea_orm::ActiveValue::Set(8)));
    }
}
