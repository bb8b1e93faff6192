use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Classification of one local calendar day in the 7-day view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayClass {
    Verified,
    Missed,
    GraceUsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DayStatus {
    /// Local-day label, YYYY-MM-DD.
    pub date: String,
    pub status: DayClass,
    pub submission_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StreakResponse {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub current_multiplier: f64,
    pub grace_day_available: bool,
    pub grace_used_date: Option<String>,
    pub last_activity_date: Option<String>,
    pub calendar: Vec<DayStatus>,
    pub average_daily_points: f64,
    pub multiplier_bonus: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StreakQuery {
    /// Timezone offset in minutes (e.g. -480 for PST).
    #[serde(default)]
    pub timezone: i32,
}
