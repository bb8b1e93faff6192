//! Object storage client for proof screenshots.
//!
//! Thin wrapper over a Supabase-style storage HTTP API: upload bytes, get a
//! public URL back. Durability and CDN behavior are the provider's concern.

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use uuid::Uuid;

#[derive(Clone)]
pub struct StorageClient {
    http: Client,
    cfg: StorageConfig,
}

impl StorageClient {
    pub fn new(cfg: StorageConfig) -> Self {
        let http = Client::builder()
            .user_agent("amplify-backend/storage")
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }

    /// Upload image bytes under a per-user path and return the public URL.
    pub async fn upload(
        &self,
        user_id: i64,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> AppResult<String> {
        let object_path = format!(
            "{}/{}-{}.{}",
            user_id,
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4().simple(),
            extension_for(content_type)
        );

        let upload_url = format!(
            "{}/storage/v1/object/{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.bucket,
            object_path
        );

        let resp = self
            .http
            .post(&upload_url)
            .bearer_auth(&self.cfg.service_key)
            .header("Content-Type", content_type)
            .header("Cache-Control", "3600")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "Image upload failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.bucket,
            object_path
        ))
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        // jpeg covers image/jpeg and anything unrecognized
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "jpg");
    }
}
