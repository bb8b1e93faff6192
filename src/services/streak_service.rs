//! Streak computation and the per-user streak cache.
//!
//! The verified submission history is the source of truth. The cached
//! columns on `users` exist so the leaderboard and notifications can read a
//! streak without replaying history, and they are refreshed on every read
//! here. Day math uses the client-supplied minute offset, see
//! [`crate::utils::time_window`].

use crate::database::DbPool;
use crate::entities::{submission_entity, user_entity};
use crate::error::AppError;
use crate::models::{DayClass, DayStatus, StreakResponse, SubmissionStatus};
use crate::utils::{last_n_local_days, streak_multiplier, to_local_day};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::collections::{HashMap, HashSet};

/// How far back the streak walk looks before giving up.
const MAX_STREAK_DAYS: i64 = 365;

/// One verified submission, reduced to what streak math needs.
#[derive(Debug, Clone, Copy)]
pub struct ActivityRecord {
    pub at: DateTime<Utc>,
    pub points: i64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreakComputation {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub grace_used: bool,
    pub grace_used_date: Option<String>,
    pub last_activity_date: Option<String>,
}

fn bucket_by_day(records: &[ActivityRecord], timezone: i32) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for r in records {
        *counts.entry(to_local_day(r.at, timezone)).or_insert(0) += 1;
    }
    counts
}

/// Walk backwards from today. A day with a verified submission extends the
/// streak; the first empty day consumes the single grace day if the streak
/// has already started, and the second empty day (or an empty day with no
/// streak behind it) ends the walk. Today counts as the first day, so a user
/// who has not submitted yet today reads as streak 0 until they do.
pub fn compute_streak(
    records: &[ActivityRecord],
    timezone: i32,
    now: DateTime<Utc>,
    recorded_longest: i32,
) -> StreakComputation {
    let counts = bucket_by_day(records, timezone);

    let mut current_streak = 0;
    let mut grace_used = false;
    let mut grace_used_date = None;
    let mut last_activity_date = None;

    for i in 0..MAX_STREAK_DAYS {
        let day = to_local_day(now - Duration::days(i), timezone);
        if counts.contains_key(&day) {
            current_streak += 1;
            if last_activity_date.is_none() {
                last_activity_date = Some(day);
            }
        } else if !grace_used && current_streak > 0 {
            grace_used = true;
            grace_used_date = Some(day);
        } else {
            break;
        }
    }

    StreakComputation {
        current_streak,
        longest_streak: recorded_longest.max(current_streak),
        grace_used,
        grace_used_date,
        last_activity_date,
    }
}

/// Seven-day calendar, oldest day first.
pub fn build_calendar(
    records: &[ActivityRecord],
    timezone: i32,
    now: DateTime<Utc>,
    grace_used_date: Option<&str>,
) -> Vec<DayStatus> {
    let counts = bucket_by_day(records, timezone);
    last_n_local_days(now, 7, timezone)
        .into_iter()
        .map(|date| {
            let submission_count = counts.get(&date).copied().unwrap_or(0);
            let status = if submission_count > 0 {
                DayClass::Verified
            } else if grace_used_date == Some(date.as_str()) {
                DayClass::GraceUsed
            } else {
                DayClass::Missed
            };
            DayStatus {
                date,
                status,
                submission_count,
            }
        })
        .collect()
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Average daily points and multiplier bonus over the trailing seven local
/// days. The window cutoff is UTC midnight of the oldest day label; the
/// average divides by days that actually had activity, not by seven.
pub fn compute_points_stats(
    records: &[ActivityRecord],
    timezone: i32,
    now: DateTime<Utc>,
) -> (f64, f64) {
    let labels = last_n_local_days(now, 7, timezone);
    let Some(oldest) = labels.first() else {
        return (0.0, 0.0);
    };
    let Ok(date) = NaiveDate::parse_from_str(oldest, "%Y-%m-%d") else {
        return (0.0, 0.0);
    };
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        return (0.0, 0.0);
    };
    let cutoff = midnight.and_utc();

    let mut total_awarded = 0i64;
    let mut base_sum = 0.0f64;
    let mut active_days = HashSet::new();
    for r in records.iter().filter(|r| r.at >= cutoff) {
        total_awarded += r.points;
        let multiplier = if r.multiplier > 0.0 { r.multiplier } else { 1.0 };
        base_sum += r.points as f64 / multiplier;
        active_days.insert(to_local_day(r.at, timezone));
    }

    let average = if active_days.is_empty() {
        0.0
    } else {
        round2(total_awarded as f64 / active_days.len() as f64)
    };
    let bonus = round2(total_awarded as f64 - base_sum);
    (average, bonus)
}

#[derive(Clone)]
pub struct StreakService {
    db: DbPool,
}

impl StreakService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    async fn load_activity(&self, user_id: i64) -> Result<Vec<ActivityRecord>, AppError> {
        let rows = submission_entity::Entity::find()
            .filter(submission_entity::Column::UserId.eq(user_id))
            .filter(submission_entity::Column::Status.eq(SubmissionStatus::Verified))
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|s| ActivityRecord {
                at: s.submitted_at,
                points: s.points_awarded,
                multiplier: s.streak_multiplier,
            })
            .collect())
    }

    async fn persist_cache(
        &self,
        user: &user_entity::Model,
        comp: &StreakComputation,
    ) -> Result<(), AppError> {
        let unchanged = user.current_streak == comp.current_streak
            && user.longest_streak == comp.longest_streak
            && user.grace_day_used == comp.grace_used
            && user.grace_day_date == comp.grace_used_date
            && user.last_activity_date == comp.last_activity_date;
        if unchanged {
            return Ok(());
        }

        let mut active: user_entity::ActiveModel = user.clone().into();
        active.current_streak = Set(comp.current_streak);
        active.longest_streak = Set(comp.longest_streak);
        active.grace_day_used = Set(comp.grace_used);
        active.grace_day_date = Set(comp.grace_used_date.clone());
        active.last_activity_date = Set(comp.last_activity_date.clone());
        active.updated_at = Set(Some(Utc::now()));
        active.update(&self.db).await?;
        Ok(())
    }

    /// Full streak view for a user, refreshing the cache as a side effect.
    pub async fn get_streak(
        &self,
        user_id: i64,
        timezone: i32,
    ) -> Result<StreakResponse, AppError> {
        let user = user_entity::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let records = self.load_activity(user_id).await?;
        let now = Utc::now();
        let comp = compute_streak(&records, timezone, now, user.longest_streak);
        self.persist_cache(&user, &comp).await?;

        let calendar = build_calendar(&records, timezone, now, comp.grace_used_date.as_deref());
        let (average_daily_points, multiplier_bonus) =
            compute_points_stats(&records, timezone, now);

        Ok(StreakResponse {
            current_streak: comp.current_streak,
            longest_streak: comp.longest_streak,
            current_multiplier: streak_multiplier(comp.current_streak),
            grace_day_available: !comp.grace_used,
            grace_used_date: comp.grace_used_date,
            last_activity_date: comp.last_activity_date,
            calendar,
            average_daily_points,
            multiplier_bonus,
        })
    }

    /// Multiplier to snapshot onto a new submission.
    pub async fn current_multiplier(
        &self,
        user_id: i64,
        timezone: i32,
    ) -> Result<f64, AppError> {
        let records = self.load_activity(user_id).await?;
        let comp = compute_streak(&records, timezone, Utc::now(), 0);
        Ok(streak_multiplier(comp.current_streak))
    }

    /// Recompute and persist the cache after an award. Runs with a zero
    /// offset since no client timezone is in scope here.
    pub async fn refresh_cache(&self, user_id: i64) -> Result<StreakComputation, AppError> {
        let user = user_entity::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        let records = self.load_activity(user_id).await?;
        let comp = compute_streak(&records, 0, Utc::now(), user.longest_streak);
        self.persist_cache(&user, &comp).await?;
        Ok(comp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap()
    }

    fn record(days_ago: i64, points: i64, multiplier: f64) -> ActivityRecord {
        ActivityRecord {
            at: noon() - Duration::days(days_ago),
            points,
            multiplier,
        }
    }

    #[test]
    fn test_consecutive_days_count() {
        let records: Vec<_> = (0..4).map(|d| record(d, 5, 1.0)).collect();
        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.current_streak, 4);
        assert!(!comp.grace_used);
        assert_eq!(comp.last_activity_date.as_deref(), Some("2025-06-20"));
    }

    #[test]
    fn test_no_submission_today_reads_as_zero() {
        // History exists but today is empty; the walk ends immediately
        // because no streak has started yet when today is examined.
        let records: Vec<_> = (1..5).map(|d| record(d, 5, 1.0)).collect();
        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.current_streak, 0);
        assert!(!comp.grace_used);
        assert_eq!(comp.last_activity_date, None);
    }

    #[test]
    fn test_single_gap_consumes_grace_day() {
        // Active today and yesterday, gap two days ago, active before that.
        let records = vec![
            record(0, 5, 1.0),
            record(1, 5, 1.0),
            record(3, 5, 1.0),
            record(4, 5, 1.0),
        ];
        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.current_streak, 4);
        assert!(comp.grace_used);
        assert_eq!(comp.grace_used_date.as_deref(), Some("2025-06-18"));
    }

    #[test]
    fn test_second_gap_breaks_the_streak() {
        let records = vec![
            record(0, 5, 1.0),
            record(2, 5, 1.0),
            record(4, 5, 1.0), // second gap at day 3 ends the walk
            record(5, 5, 1.0),
        ];
        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.current_streak, 2);
        assert!(comp.grace_used);
        assert_eq!(comp.grace_used_date.as_deref(), Some("2025-06-19"));
    }

    #[test]
    fn test_multiple_submissions_on_one_day_count_once() {
        let records = vec![record(0, 5, 1.0), record(0, 10, 1.0), record(1, 5, 1.0)];
        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.current_streak, 2);
    }

    #[test]
    fn test_longest_streak_never_shrinks() {
        let records = vec![record(0, 5, 1.0)];
        let comp = compute_streak(&records, 0, noon(), 30);
        assert_eq!(comp.current_streak, 1);
        assert_eq!(comp.longest_streak, 30);

        let comp = compute_streak(&records, 0, noon(), 0);
        assert_eq!(comp.longest_streak, 1);
    }

    #[test]
    fn test_timezone_offset_changes_day_buckets() {
        // 01:30 UTC today is yesterday at UTC-8.
        let early = Utc.with_ymd_and_hms(2025, 6, 20, 1, 30, 0).unwrap();
        let records = vec![ActivityRecord {
            at: early,
            points: 5,
            multiplier: 1.0,
        }];
        assert_eq!(compute_streak(&records, 0, noon(), 0).current_streak, 1);
        assert_eq!(compute_streak(&records, -480, noon(), 0).current_streak, 0);
    }

    #[test]
    fn test_calendar_marks_grace_and_missed_days() {
        let records = vec![record(0, 5, 1.0), record(0, 5, 1.0), record(1, 5, 1.0)];
        let calendar = build_calendar(&records, 0, noon(), Some("2025-06-18"));
        assert_eq!(calendar.len(), 7);
        assert_eq!(calendar[0].date, "2025-06-14");
        assert_eq!(calendar[0].status, DayClass::Missed);
        assert_eq!(calendar[4].date, "2025-06-18");
        assert_eq!(calendar[4].status, DayClass::GraceUsed);
        assert_eq!(calendar[5].status, DayClass::Verified);
        assert_eq!(calendar[5].submission_count, 1);
        assert_eq!(calendar[6].status, DayClass::Verified);
        assert_eq!(calendar[6].submission_count, 2);
    }

    #[test]
    fn test_points_average_divides_by_active_days_only() {
        let records = vec![record(0, 10, 1.0), record(0, 20, 1.0), record(2, 30, 1.0)];
        let (average, bonus) = compute_points_stats(&records, 0, noon());
        // 60 points over 2 active days, all at 1.0x.
        assert_eq!(average, 30.0);
        assert_eq!(bonus, 0.0);
    }

    #[test]
    fn test_multiplier_bonus_uses_each_submissions_own_rate() {
        // 8 awarded at 1.5x (base ~5.33) and 10 awarded at 2.0x (base 5).
        let records = vec![record(0, 8, 1.5), record(1, 10, 2.0)];
        let (average, bonus) = compute_points_stats(&records, 0, noon());
        assert_eq!(average, 9.0);
        assert_eq!(bonus, 7.67); // 18 - (8/1.5 + 10/2.0), rounded
    }

    #[test]
    fn test_points_window_excludes_older_submissions() {
        let records = vec![record(0, 10, 1.0), record(7, 100, 1.0)];
        let (average, _) = compute_points_stats(&records, 0, noon());
        assert_eq!(average, 10.0);
    }

    #[test]
    fn test_zero_multiplier_reads_as_one() {
        let records = vec![record(0, 10, 0.0)];
        let (_, bonus) = compute_points_stats(&records, 0, noon());
        assert_eq!(bonus, 0.0);
    }

    #[test]
    fn test_empty_history() {
        let comp = compute_streak(&[], 0, noon(), 0);
        assert_eq!(comp.current_streak, 0);
        assert_eq!(comp.longest_streak, 0);
        let (average, bonus) = compute_points_stats(&[], 0, noon());
        assert_eq!(average, 0.0);
        assert_eq!(bonus, 0.0);
    }
}
