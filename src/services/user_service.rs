use crate::database::DbPool;
use crate::entities::{monthly_points_entity, submission_entity, user_entity};
use crate::error::{AppError, AppResult};
use crate::models::{
    ChangePasswordRequest, SubmissionStatus, UpdateUserRequest, UserResponse, UserStatistics,
};
use crate::services::points_service::current_month;
use crate::utils::{hash_password, validate_password, verify_password};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};

#[derive(Clone)]
pub struct UserService {
    db: DbPool,
}

impl UserService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn get_user(&self, user_id: i64) -> AppResult<user_entity::Model> {
        user_entity::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        Ok(UserResponse::from(self.get_user(user_id).await?))
    }

    pub async fn get_statistics(&self, user_id: i64) -> AppResult<UserStatistics> {
        let count_with_status = |status: Option<SubmissionStatus>| {
            let mut query = submission_entity::Entity::find()
                .filter(submission_entity::Column::UserId.eq(user_id));
            if let Some(status) = status {
                query = query.filter(submission_entity::Column::Status.eq(status));
            }
            query.count(&self.db)
        };

        let total = count_with_status(None).await? as i64;
        let verified = count_with_status(Some(SubmissionStatus::Verified)).await? as i64;
        let rejected = count_with_status(Some(SubmissionStatus::Rejected)).await? as i64;
        // Awaiting anything: still running or sitting in the review queue.
        let pending = total - verified - rejected;

        let current_month_points = monthly_points_entity::Entity::find()
            .filter(monthly_points_entity::Column::UserId.eq(user_id))
            .filter(monthly_points_entity::Column::Month.eq(current_month()))
            .one(&self.db)
            .await?
            .map(|m| m.points)
            .unwrap_or(0);

        Ok(UserStatistics {
            total_submissions: total,
            verified_submissions: verified,
            pending_submissions: pending,
            rejected_submissions: rejected,
            current_month_points,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
    ) -> AppResult<UserResponse> {
        let user = self.get_user(user_id).await?;
        let mut active: user_entity::ActiveModel = user.into();

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::ValidationError("Name cannot be empty".to_string()));
            }
            active.name = Set(name);
        }
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(&self.db).await?;
        Ok(UserResponse::from(updated))
    }

    pub async fn change_password(
        &self,
        user_id: i64,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        let user = self.get_user(user_id).await?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Current password is incorrect".to_string(),
            ));
        }
        validate_password(&request.new_password)?;

        let mut active: user_entity::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;

        log::info!("user {user_id} changed password");
        Ok(())
    }
}
