//! Monthly leaderboard over the `monthly_points` accumulator.

use crate::database::DbPool;
use crate::entities::{monthly_points_entity, user_entity};
use crate::error::{AppError, AppResult};
use crate::models::{LeaderboardEntry, LeaderboardResponse};
use crate::services::points_service::current_month;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::collections::HashMap;

/// Leaderboard depth per month.
const LEADERBOARD_LIMIT: u64 = 100;

#[derive(Clone)]
pub struct LeaderboardService {
    db: DbPool,
}

impl LeaderboardService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Top earners of a month, rank 1 first. Ties keep insertion order, so
    /// equal totals get distinct consecutive ranks.
    pub async fn get_leaderboard(&self, month: Option<String>) -> AppResult<LeaderboardResponse> {
        let month = match month {
            Some(m) => {
                validate_month(&m)?;
                m
            }
            None => current_month(),
        };

        let rows = monthly_points_entity::Entity::find()
            .filter(monthly_points_entity::Column::Month.eq(&month))
            .order_by_desc(monthly_points_entity::Column::Points)
            .limit(LEADERBOARD_LIMIT)
            .all(&self.db)
            .await?;

        let user_ids: Vec<i64> = rows.iter().map(|r| r.user_id).collect();
        let users: HashMap<i64, user_entity::Model> = user_entity::Entity::find()
            .filter(user_entity::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let leaderboard = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let (name, email) = users
                    .get(&row.user_id)
                    .map(|u| (u.name.clone(), u.email.clone()))
                    .unwrap_or_default();
                LeaderboardEntry {
                    user_id: row.user_id,
                    name,
                    email,
                    points: row.points,
                    rank: i as i64 + 1,
                }
            })
            .collect();

        Ok(LeaderboardResponse { month, leaderboard })
    }
}

/// Accepts exactly "YYYY-MM".
fn validate_month(month: &str) -> AppResult<()> {
    let bytes = month.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
        && month[5..].parse::<u8>().is_ok_and(|m| (1..=12).contains(&m));
    if well_formed {
        Ok(())
    } else {
        Err(AppError::ValidationError(
            "month must be in YYYY-MM format".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_month() {
        assert!(validate_month("2026-08").is_ok());
        assert!(validate_month("2026-12").is_ok());
        assert!(validate_month("2026-00").is_err());
        assert!(validate_month("2026-13").is_err());
        assert!(validate_month("2026-8").is_err());
        assert!(validate_month("26-08").is_err());
        assert!(validate_month("2026/08").is_err());
    }
}
