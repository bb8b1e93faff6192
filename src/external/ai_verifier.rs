//! Client for the external AI screenshot classifier.
//!
//! Two interaction modes are supported:
//! - async start/poll: `start` kicks off a remote workflow and returns a
//!   workflow id; `status` is called once per client poll and reports whether
//!   the workflow finished.
//! - blocking: `verify_blocking` repeatedly calls the start endpoint under an
//!   exponential backoff schedule until the response carries a full verdict or
//!   the wall-clock budget runs out. Timeout is a sentinel outcome, not an
//!   error; the caller falls back to manual review.

use crate::config::VerifierConfig;
use crate::error::{AppError, AppResult};
use rand::Rng;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::{Duration, Instant};

const INITIAL_POLL_DELAY_MS: u64 = 900;
const BACKOFF_FACTOR: f64 = 1.6;
const MAX_POLL_DELAY_MS: u64 = 5_000;
const JITTER_RATIO: f64 = 0.15;

#[derive(Debug, Clone)]
pub struct StartedWorkflow {
    pub workflow_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub enum BlockingVerifyOutcome {
    /// Terminal verdict payload (already unwrapped from any `response` nesting).
    Completed(Value),
    /// Budget elapsed without a terminal payload.
    TimedOut,
}

#[derive(Clone)]
pub struct AiVerifierClient {
    http: Client,
    cfg: VerifierConfig,
}

impl AiVerifierClient {
    pub fn new(cfg: VerifierConfig) -> Self {
        let http = Client::builder()
            .user_agent("amplify-backend/verifier")
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }

    pub fn mode(&self) -> crate::config::VerificationMode {
        self.cfg.mode
    }

    /// Start a classification workflow for an uploaded screenshot.
    pub async fn start(&self, image_url: &str) -> AppResult<StartedWorkflow> {
        let body = serde_json::json!({ "proof_image": image_url });
        let resp = self
            .http
            .post(&self.cfg.start_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "AI start failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let value: Value = resp.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("AI start returned invalid JSON: {e}"))
        })?;

        Ok(StartedWorkflow {
            workflow_id: value
                .get("workflow_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            status: value
                .get("status")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }

    /// One status poll. Returns the raw JSON payload; interpretation is the
    /// caller's job so malformed shapes can be routed to manual review rather
    /// than dropped.
    pub async fn status(&self, workflow_id: &str) -> AppResult<Value> {
        let url = derive_status_url(&self.cfg.start_url, workflow_id)?;
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.cfg.api_key)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "AI status failed: HTTP {}: {}",
                status.as_u16(),
                truncate(&text, 500)
            )));
        }

        serde_json::from_str(&text).map_err(|_| {
            AppError::ExternalApiError(format!(
                "AI status returned non-JSON: {}",
                truncate(&text, 500)
            ))
        })
    }

    /// Legacy blocking verification: poll the classifier until it returns a
    /// terminal verdict or the budget elapses.
    pub async fn verify_blocking(&self, image_url: &str) -> AppResult<BlockingVerifyOutcome> {
        let deadline = Instant::now() + Duration::from_millis(self.cfg.poll_budget_ms);
        let mut attempt: u32 = 0;

        loop {
            match self.try_classify(image_url).await {
                Ok(Some(verdict)) => return Ok(BlockingVerifyOutcome::Completed(verdict)),
                Ok(None) => {
                    log::debug!("AI verdict not terminal yet (attempt {attempt})");
                }
                Err(e) => {
                    // Transient upstream failures are retried under the budget.
                    log::warn!("AI classify attempt {attempt} failed: {e}");
                }
            }

            let delay = Duration::from_millis(jittered_delay_ms(attempt));
            attempt += 1;
            if Instant::now() + delay >= deadline {
                return Ok(BlockingVerifyOutcome::TimedOut);
            }
            tokio::time::sleep(delay).await;
        }
    }

    async fn try_classify(&self, image_url: &str) -> AppResult<Option<Value>> {
        let body = serde_json::json!({ "proof_image": image_url });
        let resp = self
            .http
            .post(&self.cfg.start_url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "AI classify failed: HTTP {}",
                resp.status().as_u16()
            )));
        }

        let value: Value = resp.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("AI classify returned invalid JSON: {e}"))
        })?;

        let verdict = extract_verdict_object(&value);
        if is_terminal_verdict(verdict) {
            Ok(Some(verdict.clone()))
        } else {
            Ok(None)
        }
    }
}

/// The status API wraps the actual verification fields under `response`;
/// older deployments returned them at the top level.
pub fn extract_verdict_object(payload: &Value) -> &Value {
    match payload.get("response") {
        Some(inner) if inner.is_object() => inner,
        _ => payload,
    }
}

/// A payload counts as terminal once the required verdict fields are present.
pub fn is_terminal_verdict(verdict: &Value) -> bool {
    verdict.get("platform_detected").is_some() && verdict.get("action_confidence").is_some()
}

/// Build the status URL from the start URL.
///
/// Start URLs look like
/// `https://host/trigger/start/{project}/{token}/{env}`; the status endpoint
/// lives at `{origin}/trigger/status/{project}/{workflow_id}`.
pub fn derive_status_url(start_url: &str, workflow_id: &str) -> AppResult<String> {
    let url = Url::parse(start_url)
        .map_err(|e| AppError::ConfigError(format!("Invalid verifier start_url: {e}")))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    let trigger_idx = segments
        .iter()
        .position(|s| *s == "trigger")
        .ok_or_else(|| AppError::ConfigError("start_url has no /trigger segment".to_string()))?;
    let start_idx = segments[trigger_idx..]
        .iter()
        .position(|s| *s == "start")
        .map(|i| i + trigger_idx)
        .ok_or_else(|| AppError::ConfigError("start_url has no /start segment".to_string()))?;
    let project = segments.get(start_idx + 1).ok_or_else(|| {
        AppError::ConfigError("start_url has no project id after /start".to_string())
    })?;

    Ok(format!(
        "{}/trigger/status/{}/{}",
        url.origin().ascii_serialization(),
        project,
        workflow_id
    ))
}

/// Nominal backoff delay for the given attempt, before jitter.
fn nominal_delay_ms(attempt: u32) -> u64 {
    let delay = INITIAL_POLL_DELAY_MS as f64 * BACKOFF_FACTOR.powi(attempt as i32);
    (delay as u64).min(MAX_POLL_DELAY_MS)
}

fn jittered_delay_ms(attempt: u32) -> u64 {
    let nominal = nominal_delay_ms(attempt) as f64;
    let jitter = rand::thread_rng().gen_range(-JITTER_RATIO..=JITTER_RATIO);
    (nominal * (1.0 + jitter)) as u64
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_status_url() {
        let start = "https://ai-core.example.com/trigger/start/QZ-3DDP/16qObTjWO/production";
        let url = derive_status_url(start, "wf-123").unwrap();
        assert_eq!(
            url,
            "https://ai-core.example.com/trigger/status/QZ-3DDP/wf-123"
        );
    }

    #[test]
    fn test_derive_status_url_rejects_bad_shapes() {
        assert!(derive_status_url("https://example.com/other/path", "wf").is_err());
        assert!(derive_status_url("not a url", "wf").is_err());
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(nominal_delay_ms(0), 900);
        assert_eq!(nominal_delay_ms(1), 1440);
        assert_eq!(nominal_delay_ms(2), 2304);
        assert_eq!(nominal_delay_ms(3), 3686);
        assert_eq!(nominal_delay_ms(4), 5000); // capped
        assert_eq!(nominal_delay_ms(10), 5000);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        for attempt in 0..6 {
            let nominal = nominal_delay_ms(attempt) as f64;
            for _ in 0..50 {
                let d = jittered_delay_ms(attempt) as f64;
                assert!(d >= nominal * 0.85 - 1.0);
                assert!(d <= nominal * 1.15 + 1.0);
            }
        }
    }

    #[test]
    fn test_extract_verdict_prefers_nested_response() {
        let nested = serde_json::json!({
            "workflow_id": "wf",
            "status": "completed",
            "response": { "platform_detected": "LinkedIn", "action_confidence": 0.9 }
        });
        let verdict = extract_verdict_object(&nested);
        assert_eq!(verdict["platform_detected"], "LinkedIn");
        assert!(is_terminal_verdict(verdict));

        let flat = serde_json::json!({ "platform_detected": "LinkedIn", "action_confidence": 0.9 });
        assert!(is_terminal_verdict(extract_verdict_object(&flat)));

        let partial = serde_json::json!({ "status": "pending" });
        assert!(!is_terminal_verdict(extract_verdict_object(&partial)));
    }
}
