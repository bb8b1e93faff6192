use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub points: i64,
    pub rank: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub month: String,
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LeaderboardQuery {
    /// Target month (YYYY-MM); defaults to the current month.
    pub month: Option<String>,
}
