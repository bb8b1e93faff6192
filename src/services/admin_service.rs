//! Admin review queue and manual decisions.
//!
//! Admin rights come from a row in the `admins` table. Approve and reject
//! are compare-and-set transitions out of `manual_review`, so two admins
//! deciding the same submission cannot both win, and a replayed approve
//! cannot award points twice.

use crate::database::DbPool;
use crate::entities::{admin_entity, submission_entity, user_entity};
use crate::error::AppError;
use crate::models::{
    AdminSubmissionView, ApproveSubmissionRequest, ApproveSubmissionResponse,
    CheckPendingResponse, NotificationType, PaginatedResponse, PaginationParams,
    RejectSubmissionRequest, SubmissionStatus,
};
use crate::services::submission_service::SubmissionService;
use crate::utils::apply_multiplier;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct AdminService {
    db: DbPool,
    submissions: SubmissionService,
}

impl AdminService {
    pub fn new(db: DbPool, submissions: SubmissionService) -> Self {
        Self { db, submissions }
    }

    pub async fn is_admin(&self, user_id: i64) -> Result<bool, AppError> {
        let row = admin_entity::Entity::find()
            .filter(admin_entity::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn require_admin(&self, user_id: i64) -> Result<(), AppError> {
        if self.is_admin(user_id).await? {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(
                "Admin privileges required".to_string(),
            ))
        }
    }

    /// Review queue, oldest first, optionally filtered by status. Each entry
    /// carries the submitter so admins do not need a second lookup.
    pub async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        params: &PaginationParams,
    ) -> Result<PaginatedResponse<AdminSubmissionView>, AppError> {
        let mut query = submission_entity::Entity::find();
        if let Some(status) = status {
            query = query.filter(submission_entity::Column::Status.eq(status));
        }
        let paginator = query
            .order_by_asc(submission_entity::Column::SubmittedAt)
            .paginate(&self.db, params.get_limit());

        let total = paginator.num_items().await? as i64;
        let rows = paginator.fetch_page((params.get_page() - 1) as u64).await?;

        let user_ids: Vec<i64> = rows.iter().map(|s| s.user_id).collect();
        let users: HashMap<i64, user_entity::Model> = user_entity::Entity::find()
            .filter(user_entity::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let items = rows
            .into_iter()
            .map(|s| {
                let (user_name, user_email) = users
                    .get(&s.user_id)
                    .map(|u| (u.name.clone(), u.email.clone()))
                    .unwrap_or_default();
                AdminSubmissionView {
                    submission: s.into(),
                    user_name,
                    user_email,
                }
            })
            .collect();
        Ok(PaginatedResponse::new(items, params, total))
    }

    /// Approve a submission awaiting review. `points` is the base award; the
    /// multiplier snapshotted at submission time is applied here, so a streak
    /// broken while the row sat in review still pays out at the old rate.
    pub async fn approve(
        &self,
        req: &ApproveSubmissionRequest,
    ) -> Result<ApproveSubmissionResponse, AppError> {
        if req.points <= 0 {
            return Err(AppError::ValidationError(
                "points must be positive".to_string(),
            ));
        }

        let submission = submission_entity::Entity::find_by_id(req.submission_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let awarded = apply_multiplier(req.points, submission.streak_multiplier);

        let mut set = submission_entity::ActiveModel {
            status: Set(SubmissionStatus::Verified),
            points_awarded: Set(awarded),
            verified_at: Set(Some(Utc::now())),
            ..Default::default()
        };
        if let Some(notes) = &req.admin_notes {
            set.admin_notes = Set(Some(notes.clone()));
        }

        let result = submission_entity::Entity::update_many()
            .set(set)
            .filter(submission_entity::Column::Id.eq(req.submission_id))
            .filter(submission_entity::Column::Status.eq(SubmissionStatus::ManualReview))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Submission is not awaiting review".to_string(),
            ));
        }

        log::info!(
            "submission {} approved: {} base x{} = {awarded}",
            submission.id,
            req.points,
            submission.streak_multiplier
        );
        self.submissions
            .post_award(
                submission.user_id,
                submission.id,
                awarded,
                NotificationType::SubmissionApproved,
            )
            .await;
        Ok(ApproveSubmissionResponse {
            points_awarded: awarded,
        })
    }

    pub async fn reject(&self, req: &RejectSubmissionRequest) -> Result<(), AppError> {
        let submission = submission_entity::Entity::find_by_id(req.submission_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Submission not found".to_string()))?;

        let reason = req
            .admin_notes
            .clone()
            .unwrap_or_else(|| "Rejected by admin".to_string());

        let result = submission_entity::Entity::update_many()
            .set(submission_entity::ActiveModel {
                status: Set(SubmissionStatus::Rejected),
                admin_notes: Set(Some(reason.clone())),
                ..Default::default()
            })
            .filter(submission_entity::Column::Id.eq(req.submission_id))
            .filter(submission_entity::Column::Status.eq(SubmissionStatus::ManualReview))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::ValidationError(
                "Submission is not awaiting review".to_string(),
            ));
        }

        log::info!("submission {} rejected: {reason}", submission.id);
        self.submissions
            .notify_rejection(submission.user_id, submission.id, &reason)
            .await;
        Ok(())
    }

    /// Sweep all pending submissions against the classifier once.
    pub async fn check_pending(&self) -> Result<CheckPendingResponse, AppError> {
        self.submissions.check_pending_all().await
    }
}
