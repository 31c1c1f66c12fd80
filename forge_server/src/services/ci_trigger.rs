//! Outbound CI integration — fire a build request at the external runner.
//!
//! The trigger hands the runner everything it needs to build and to
//! report back: the config snapshot, platform identity fields, and the
//! callback binding (base URL + shared secret).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::snapshot::BuildConfigSnapshot;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CiTriggerRequest {
    pub link_id: i64,
    pub owner_id: i64,
    pub project_id: i64,
    pub slug: String,
    pub app_name: String,
    pub platform: String,
    pub android_package: String,
    pub android_version_code: i32,
    pub android_version_name: String,
    pub ios_bundle_id: String,
    pub ios_build_number: i32,
    pub ios_version_name: String,
    pub logo_url: Option<String>,
    /// Owner identity, needed by signing/notarization steps on the CI
    /// side for iOS.
    pub owner_email: Option<String>,
    pub owner_name: Option<String>,
    pub config: BuildConfigSnapshot,
    pub callback_base_url: String,
    pub callback_token: String,
}

/// What the CI system answers synchronously. Some runners assign a build
/// id immediately; others return an empty body and the dispatcher
/// synthesizes a surrogate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CiTriggerReply {
    pub ci_build_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CiTriggerError {
    #[error("CI trigger endpoint not configured")]
    NotConfigured,

    #[error("CI trigger failed: {0}")]
    Http(String),
}

#[async_trait]
pub trait CiTrigger: Send + Sync {
    async fn trigger(&self, req: &CiTriggerRequest) -> Result<CiTriggerReply, CiTriggerError>;
}

/// Production trigger: POST the request as JSON to the runner's API.
pub struct HttpCiTrigger {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpCiTrigger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CiTrigger for HttpCiTrigger {
    async fn trigger(&self, req: &CiTriggerRequest) -> Result<CiTriggerReply, CiTriggerError> {
        if self.endpoint.is_empty() {
            return Err(CiTriggerError::NotConfigured);
        }

        let resp = self
            .client
            .post(&self.endpoint)
            .header("User-Agent", "appforge-server")
            .json(req)
            .send()
            .await
            .map_err(|e| CiTriggerError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("CI trigger rejected: {} {}", status, text);
            return Err(CiTriggerError::Http(format!("{status}: {text}")));
        }

        // Tolerate empty or unexpected bodies; the dispatcher falls back
        // to a surrogate id.
        Ok(resp.json().await.unwrap_or_default())
    }
}
