//! Mapping of raw classifier payloads to verification decisions.
//!
//! Two policies exist because the product migrated from a synchronous
//! auto-verify flow to an async flow where the AI only recommends and an
//! admin makes the final call. Both are kept selectable so neither behavior
//! is lost; `VerificationMode` in the config picks which one runs.

use crate::models::{ActionType, SubmissionStatus};
use crate::utils::action_base_points;
use serde_json::Value;

/// Typed view over the classifier verdict. Every field is optional: the
/// upstream payload is not trusted to be complete or well-typed, and a value
/// of the wrong JSON type reads as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerdictFields {
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
}

fn get_string(v: &Value, key: &str) -> Option<String> {
    v.get(key).and_then(|x| x.as_str()).map(|s| s.to_string())
}

fn get_bool(v: &Value, key: &str) -> Option<bool> {
    v.get(key).and_then(|x| x.as_bool())
}

fn get_f64(v: &Value, key: &str) -> Option<f64> {
    v.get(key).and_then(|x| x.as_f64())
}

fn get_i64(v: &Value, key: &str) -> Option<i64> {
    v.get(key)
        .and_then(|x| x.as_i64().or_else(|| x.as_f64().map(|f| f as i64)))
}

impl VerdictFields {
    pub fn from_value(v: &Value) -> Self {
        Self {
            platform_detected: get_string(v, "platform_detected"),
            like_detected: get_bool(v, "like_detected"),
            comment_detected: get_bool(v, "comment_detected"),
            repost_detected: get_bool(v, "repost_detected"),
            tag_detected: get_bool(v, "tag_detected"),
            original_post_detected: get_bool(v, "original_post_detected"),
            primary_action: get_string(v, "primary_action"),
            assigned_points: get_i64(v, "assigned_points"),
            action_confidence: get_f64(v, "action_confidence"),
            duplicate_risk: get_string(v, "duplicate_risk"),
            content_quality_pass: get_bool(v, "content_quality_pass"),
        }
    }

    /// Detection flag backing the user's claimed action.
    pub fn flag_for(&self, action: ActionType) -> Option<bool> {
        match action {
            ActionType::Like => self.like_detected,
            ActionType::Comment => self.comment_detected,
            ActionType::Repost => self.repost_detected,
            ActionType::Tag => self.tag_detected,
            ActionType::OriginalPost => self.original_post_detected,
        }
    }

    fn duplicate_risk_high(&self) -> bool {
        self.duplicate_risk
            .as_deref()
            .map(|r| r.to_uppercase() == "HIGH")
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPolicy {
    /// Current policy: the AI recommends, an admin decides. Used by the async
    /// poll path; the submission always lands in manual_review and this
    /// decision becomes the recommendation note.
    Recommend,
    /// Legacy policy: high-confidence verdicts auto-verify. Used by the
    /// blocking mode.
    LegacyAuto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub status: SubmissionStatus,
    pub points: i64,
    pub reason: String,
}

impl Decision {
    fn new(status: SubmissionStatus, points: i64, reason: impl Into<String>) -> Self {
        Self {
            status,
            points,
            reason: reason.into(),
        }
    }
}

/// Evaluate a verdict against the claimed action. Deterministic: identical
/// input always yields an identical decision.
pub fn decide(policy: DecisionPolicy, claimed: ActionType, verdict: &VerdictFields) -> Decision {
    match policy {
        DecisionPolicy::Recommend => decide_recommend(claimed, verdict),
        DecisionPolicy::LegacyAuto => decide_legacy_auto(claimed, verdict),
    }
}

const MIN_CONFIDENCE: f64 = 0.75;

fn decide_recommend(claimed: ActionType, verdict: &VerdictFields) -> Decision {
    // Hard fail first; ordering of all checks is part of the contract.
    if verdict.content_quality_pass == Some(false) {
        return Decision::new(SubmissionStatus::Rejected, 0, "Content quality failed");
    }

    if verdict.duplicate_risk_high() {
        return Decision::new(SubmissionStatus::ManualReview, 0, "High duplicate risk");
    }

    if let Some(confidence) = verdict.action_confidence
        && confidence < MIN_CONFIDENCE
    {
        return Decision::new(
            SubmissionStatus::ManualReview,
            0,
            format!("Low confidence ({confidence})"),
        );
    }

    let flag_name = claimed.detection_flag();
    match verdict.flag_for(claimed) {
        Some(false) => {
            return Decision::new(SubmissionStatus::Rejected, 0, format!("{flag_name} = false"));
        }
        None => {
            return Decision::new(
                SubmissionStatus::ManualReview,
                0,
                format!("Missing {flag_name}"),
            );
        }
        Some(true) => {}
    }

    let assigned = verdict.assigned_points.unwrap_or(0);
    if assigned > 0 {
        Decision::new(SubmissionStatus::Verified, assigned, "Verified by AI")
    } else {
        Decision::new(SubmissionStatus::ManualReview, 0, "No points assigned")
    }
}

const LEGACY_AUTO_VERIFY_CONFIDENCE: f64 = 0.8;
const LEGACY_MATCH_CONFIDENCE: f64 = 0.6;

fn decide_legacy_auto(claimed: ActionType, verdict: &VerdictFields) -> Decision {
    if verdict.platform_detected.as_deref() != Some("LinkedIn") {
        return Decision::new(SubmissionStatus::Rejected, 0, "Platform is not LinkedIn");
    }

    let confidence = verdict.action_confidence.unwrap_or(0.0);
    if confidence >= LEGACY_AUTO_VERIFY_CONFIDENCE {
        return Decision::new(
            SubmissionStatus::Verified,
            verdict.assigned_points.unwrap_or(0),
            "High confidence",
        );
    }

    if verdict.duplicate_risk_high() {
        return Decision::new(SubmissionStatus::Rejected, 0, "High duplicate risk");
    }

    if let Some(primary) = verdict.primary_action.as_deref()
        && normalize_primary_action(primary) == claimed
        && confidence >= LEGACY_MATCH_CONFIDENCE
    {
        return Decision::new(
            SubmissionStatus::Verified,
            action_base_points(claimed),
            "Claimed action matched",
        );
    }

    Decision::new(SubmissionStatus::ManualReview, 0, "Needs manual review")
}

/// Normalize the classifier's free-form primary action label to a claimed
/// action type. Substring match, first hit wins; SHARE folds into REPOST and
/// ARTICLE into ORIGINAL_POST. Unknown labels fall back to LIKE.
pub fn normalize_primary_action(primary_action: &str) -> ActionType {
    const MAP: [(&str, ActionType); 7] = [
        ("LIKE", ActionType::Like),
        ("COMMENT", ActionType::Comment),
        ("REPOST", ActionType::Repost),
        ("SHARE", ActionType::Repost),
        ("TAG", ActionType::Tag),
        ("ORIGINAL_POST", ActionType::OriginalPost),
        ("ARTICLE", ActionType::OriginalPost),
    ];

    let upper = primary_action.to_uppercase();
    for (pattern, action) in MAP {
        if upper.contains(pattern) {
            return action;
        }
    }
    ActionType::Like
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_verdict() -> VerdictFields {
        VerdictFields {
            platform_detected: Some("LinkedIn".to_string()),
            like_detected: Some(true),
            comment_detected: Some(false),
            repost_detected: Some(false),
            tag_detected: Some(false),
            original_post_detected: Some(false),
            primary_action: Some("LIKE".to_string()),
            assigned_points: Some(5),
            action_confidence: Some(0.9),
            duplicate_risk: Some("LOW".to_string()),
            content_quality_pass: Some(true),
        }
    }

    #[test]
    fn test_recommend_verifies_clean_payload() {
        let d = decide(DecisionPolicy::Recommend, ActionType::Like, &full_verdict());
        assert_eq!(d.status, SubmissionStatus::Verified);
        assert_eq!(d.points, 5);
        assert_eq!(d.reason, "Verified by AI");
    }

    #[test]
    fn test_recommend_quality_check_short_circuits_duplicate_check() {
        let mut v = full_verdict();
        v.content_quality_pass = Some(false);
        v.duplicate_risk = Some("HIGH".to_string());
        let d = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::Rejected);
        assert_eq!(d.reason, "Content quality failed");
    }

    #[test]
    fn test_recommend_high_duplicate_risk_goes_to_review() {
        let mut v = full_verdict();
        v.duplicate_risk = Some("HIGH".to_string());
        let d = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);
        assert_eq!(d.reason, "High duplicate risk");
    }

    #[test]
    fn test_recommend_low_confidence_goes_to_review() {
        let mut v = full_verdict();
        v.action_confidence = Some(0.74);
        let d = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);
        assert!(d.reason.starts_with("Low confidence"));
    }

    #[test]
    fn test_recommend_flag_explicitly_false_rejects() {
        let mut v = full_verdict();
        v.comment_detected = Some(false);
        let d = decide(DecisionPolicy::Recommend, ActionType::Comment, &v);
        assert_eq!(d.status, SubmissionStatus::Rejected);
        assert_eq!(d.reason, "comment_detected = false");
    }

    #[test]
    fn test_recommend_missing_flag_goes_to_review() {
        let mut v = full_verdict();
        v.tag_detected = None;
        let d = decide(DecisionPolicy::Recommend, ActionType::Tag, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);
        assert_eq!(d.reason, "Missing tag_detected");
    }

    #[test]
    fn test_recommend_zero_assigned_points_goes_to_review() {
        let mut v = full_verdict();
        v.assigned_points = Some(0);
        let d = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);
        assert_eq!(d.reason, "No points assigned");
    }

    #[test]
    fn test_recommend_is_deterministic() {
        let v = full_verdict();
        let a = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        let b = decide(DecisionPolicy::Recommend, ActionType::Like, &v);
        assert_eq!(a, b);
    }

    #[test]
    fn test_legacy_rejects_other_platforms() {
        let mut v = full_verdict();
        v.platform_detected = Some("Twitter".to_string());
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::Rejected);

        v.platform_detected = None;
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::Rejected);
    }

    #[test]
    fn test_legacy_high_confidence_auto_verifies_with_ai_points() {
        let mut v = full_verdict();
        v.assigned_points = Some(12);
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::Verified);
        assert_eq!(d.points, 12);
    }

    #[test]
    fn test_legacy_duplicate_risk_rejects_below_threshold() {
        let mut v = full_verdict();
        v.action_confidence = Some(0.7);
        v.duplicate_risk = Some("HIGH".to_string());
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::Rejected);
    }

    #[test]
    fn test_legacy_action_match_uses_fixed_point_table() {
        let mut v = full_verdict();
        v.action_confidence = Some(0.65);
        v.primary_action = Some("SHARE".to_string());
        v.assigned_points = Some(99);
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Repost, &v);
        assert_eq!(d.status, SubmissionStatus::Verified);
        assert_eq!(d.points, 15); // REPOST table value, not the AI's 99
    }

    #[test]
    fn test_legacy_mismatch_or_low_confidence_goes_to_review() {
        let mut v = full_verdict();
        v.action_confidence = Some(0.65);
        v.primary_action = Some("COMMENT".to_string());
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);

        v.primary_action = Some("LIKE".to_string());
        v.action_confidence = Some(0.55);
        let d = decide(DecisionPolicy::LegacyAuto, ActionType::Like, &v);
        assert_eq!(d.status, SubmissionStatus::ManualReview);
    }

    #[test]
    fn test_normalize_primary_action() {
        assert_eq!(normalize_primary_action("LIKE"), ActionType::Like);
        assert_eq!(normalize_primary_action("share"), ActionType::Repost);
        assert_eq!(normalize_primary_action("ARTICLE"), ActionType::OriginalPost);
        assert_eq!(
            normalize_primary_action("ORIGINAL_POST"),
            ActionType::OriginalPost
        );
        assert_eq!(normalize_primary_action("something else"), ActionType::Like);
    }

    #[test]
    fn test_verdict_fields_ignore_wrong_types() {
        let payload = serde_json::json!({
            "platform_detected": "LinkedIn",
            "like_detected": "yes",          // wrong type, reads as absent
            "action_confidence": "0.9",      // wrong type
            "assigned_points": 5.0,          // float is accepted for points
            "duplicate_risk": "low",
        });
        let v = VerdictFields::from_value(&payload);
        assert_eq!(v.platform_detected.as_deref(), Some("LinkedIn"));
        assert_eq!(v.like_detected, None);
        assert_eq!(v.action_confidence, None);
        assert_eq!(v.assigned_points, Some(5));
        assert!(!v.duplicate_risk_high());
    }
}
