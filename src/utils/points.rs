//! Point values and the streak multiplier policy.

use crate::models::ActionType;

/// Fixed per-action point table. Product data; do not tweak casually.
pub fn action_base_points(action: ActionType) -> i64 {
    match action {
        ActionType::Like => 5,
        ActionType::Comment => 10,
        ActionType::Repost => 15,
        ActionType::Tag => 20,
        ActionType::OriginalPost => 25,
    }
}

/// Step function from streak length to point multiplier.
pub fn streak_multiplier(streak_days: i32) -> f64 {
    if streak_days >= 10 {
        2.0
    } else if streak_days >= 5 {
        1.5
    } else {
        1.0
    }
}

/// Apply a multiplier to base points, rounding half away from zero.
pub fn apply_multiplier(base_points: i64, multiplier: f64) -> i64 {
    (base_points as f64 * multiplier).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_base_points_table() {
        assert_eq!(action_base_points(ActionType::Like), 5);
        assert_eq!(action_base_points(ActionType::Comment), 10);
        assert_eq!(action_base_points(ActionType::Repost), 15);
        assert_eq!(action_base_points(ActionType::Tag), 20);
        assert_eq!(action_base_points(ActionType::OriginalPost), 25);
    }

    #[test]
    fn test_streak_multiplier_breakpoints() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(4), 1.0);
        assert_eq!(streak_multiplier(5), 1.5);
        assert_eq!(streak_multiplier(9), 1.5);
        assert_eq!(streak_multiplier(10), 2.0);
        assert_eq!(streak_multiplier(25), 2.0);
    }

    #[test]
    fn test_apply_multiplier_rounds_half_up() {
        assert_eq!(apply_multiplier(5, 1.5), 8); // 7.5 rounds up
        assert_eq!(apply_multiplier(10, 1.5), 15);
        assert_eq!(apply_multiplier(25, 2.0), 50);
        assert_eq!(apply_multiplier(7, 1.0), 7);
    }
}
