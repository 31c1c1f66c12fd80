//! Orchestrator HTTP routes — machine (CI), owner, and super-admin.

pub mod admin;
pub mod machine;
pub mod owner;

use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::ForgeConfig;
use crate::models::app_link::AppLink;
use crate::models::build_job::{BuildJob, BuildStatus, Platform};
use crate::services::ci_trigger::CiTrigger;
use crate::services::manifest::ManifestSource;
use crate::store::Store;

/// Shared state for route handlers.
#[derive(Clone)]
pub struct ForgeState {
    pub store: Arc<dyn Store>,
    pub trigger: Arc<dyn CiTrigger>,
    pub manifest: Arc<dyn ManifestSource>,
    pub config: ForgeConfig,
}

/// Build the orchestrator's Axum router.
pub fn forge_router(state: ForgeState) -> Router {
    Router::new()
        .nest("/ci", machine::router())
        .nest("/api", owner::router())
        .nest("/admin", admin::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Wire DTOs ──

/// JSON shape of a build job on every human and machine surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobJson {
    pub id: i64,
    pub link_id: i64,
    pub platform: Platform,
    pub status: BuildStatus,
    pub ci_build_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
}

impl From<BuildJob> for JobJson {
    fn from(job: BuildJob) -> Self {
        JobJson {
            id: job.id,
            link_id: job.link_id,
            platform: job.platform,
            status: job.status,
            ci_build_id: job.ci_build_id,
            created_at: job.created_at,
            started_at: job.started_at,
            finished_at: job.finished_at,
            error: job.error,
            apk_url: job.apk_url,
            bundle_url: job.bundle_url,
            ipa_url: job.ipa_url,
        }
    }
}

/// Flat JSON shape of an app link — no lazy-loaded entity graphs.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppLinkJson {
    pub id: i64,
    pub owner_id: i64,
    pub project_id: i64,
    pub slug: String,
    pub app_name: String,
    pub status: String,
    pub theme_id: Option<i64>,
    pub currency_id: Option<i64>,
    pub logo_url: Option<String>,
    pub android_package: String,
    pub android_version_code: i32,
    pub android_version_name: String,
    pub ios_bundle_id: String,
    pub ios_build_number: i32,
    pub ios_version_name: String,
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
}

impl From<AppLink> for AppLinkJson {
    fn from(link: AppLink) -> Self {
        AppLinkJson {
            id: link.id,
            owner_id: link.owner_id,
            project_id: link.project_id,
            slug: link.slug,
            app_name: link.app_name,
            status: link.status,
            theme_id: link.theme_id,
            currency_id: link.currency_id,
            logo_url: link.logo_url,
            android_package: link.android_package,
            android_version_code: link.android_version_code,
            android_version_name: link.android_version_name,
            ios_bundle_id: link.ios_bundle_id,
            ios_build_number: link.ios_build_number,
            ios_version_name: link.ios_version_name,
            apk_url: link.apk_url,
            bundle_url: link.bundle_url,
            ipa_url: link.ipa_url,
        }
    }
}
