//! Manifest Poller — pull-based fallback for artifact delivery.
//!
//! Some runner deployments cannot reach the callback endpoint and publish
//! a manifest file instead. Pulling fetches that manifest and reconciles
//! the link's artifact URLs exactly like a successful push callback. A
//! manifest that is not yet published is a retryable "no update", not an
//! error, and unknown or missing manifest fields leave the link unchanged.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OrchestratorError;
use crate::metrics;
use crate::models::app_link::AppLink;
use crate::models::build_job::ArtifactUrls;
use crate::store::Store;

/// Published build descriptor. Tolerant of schema drift: every field is
/// optional and unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestDoc {
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest base URL not configured")]
    NotConfigured,

    #[error("manifest fetch failed: {0}")]
    Http(String),
}

#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// None means the manifest is not published yet.
    async fn fetch(
        &self,
        owner_id: i64,
        project_id: i64,
        slug: &str,
    ) -> Result<Option<ManifestDoc>, ManifestError>;
}

/// Production source: GET the manifest from its deterministic location.
pub struct HttpManifestSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpManifestSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(
        &self,
        owner_id: i64,
        project_id: i64,
        slug: &str,
    ) -> Result<Option<ManifestDoc>, ManifestError> {
        if self.base_url.is_empty() {
            return Err(ManifestError::NotConfigured);
        }

        let url = format!(
            "{}/{}/{}/{}/manifest.json",
            self.base_url.trim_end_matches('/'),
            owner_id,
            project_id,
            slug
        );

        let resp = self
            .client
            .get(&url)
            .header("User-Agent", "appforge-server")
            .send()
            .await
            .map_err(|e| ManifestError::Http(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(ManifestError::Http(resp.status().to_string()));
        }

        let doc = resp
            .json::<ManifestDoc>()
            .await
            .map_err(|e| ManifestError::Http(format!("manifest parse: {e}")))?;
        Ok(Some(doc))
    }
}

impl From<ManifestError> for OrchestratorError {
    fn from(e: ManifestError) -> Self {
        OrchestratorError::DispatchFailure(e.to_string())
    }
}

/// Pull the manifest for a link and reconcile its artifact URLs.
pub async fn pull(
    store: &dyn Store,
    source: &dyn ManifestSource,
    owner_id: i64,
    project_id: i64,
    slug: &str,
) -> Result<AppLink, OrchestratorError> {
    let link = store
        .link_by_key(owner_id, project_id, slug)
        .await?
        .ok_or(OrchestratorError::NotFound)?;

    let doc = match source.fetch(owner_id, project_id, slug).await? {
        Some(doc) => doc,
        None => {
            metrics::manifest_polled(false);
            tracing::info!(link_id = link.id, slug, "manifest not yet published, no update");
            return Ok(link);
        }
    };

    let urls = ArtifactUrls {
        apk_url: doc.apk_url,
        bundle_url: doc.bundle_url,
        ipa_url: doc.ipa_url,
    };
    if urls.is_empty() {
        metrics::manifest_polled(false);
        tracing::info!(link_id = link.id, slug, "manifest carries no artifact URLs, no update");
        return Ok(link);
    }

    let link = store.set_latest_artifacts(link.id, &urls).await?;
    metrics::manifest_polled(true);
    tracing::info!(link_id = link.id, slug, "artifact URLs reconciled from manifest");
    Ok(link)
}
