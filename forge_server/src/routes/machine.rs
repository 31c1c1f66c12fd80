//! CI Callback Gateway — machine endpoints, all gated on the shared
//! secret before any ledger access.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::error::OrchestratorError;
use crate::metrics;
use crate::models::build_job::ArtifactUrls;
use crate::models::snapshot::BuildConfigSnapshot;
use crate::routes::{ForgeState, JobJson};
use crate::services::assembler::{self, ConfigOverrides};
use crate::services::{ledger, manifest};

pub fn router() -> Router<ForgeState> {
    Router::new()
        .route("/build-config/{link_id}", get(build_config))
        .route("/build-jobs/{ci_build_id}/running", post(job_running))
        .route("/build-jobs/{ci_build_id}/failed", post(job_failed))
        .route("/build-jobs/{ci_build_id}/succeeded", post(job_succeeded))
        .route(
            "/owner-projects/{owner_id}/{project_id}/apps/{slug}/apk-url",
            put(deliver_apk_url),
        )
        .route("/pull/{owner_id}/{project_id}/{slug}", post(pull_manifest))
}

/// Config snapshot plus identity fields, consumed by the CI pipeline to
/// generate build-time configuration files.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildConfigJson {
    link_id: i64,
    owner_id: i64,
    project_id: i64,
    slug: String,
    app_name: String,
    theme_id: Option<i64>,
    currency_id: Option<i64>,
    logo_url: Option<String>,
    #[serde(flatten)]
    config: BuildConfigSnapshot,
}

async fn build_config(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
) -> Result<Json<BuildConfigJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;

    let link = state
        .store
        .link_by_id(link_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    let snapshot = assembler::assemble(
        state.store.as_ref(),
        &state.config,
        &link,
        &ConfigOverrides::default(),
    )
    .await?;

    Ok(Json(BuildConfigJson {
        link_id: link.id,
        owner_id: link.owner_id,
        project_id: link.project_id,
        slug: link.slug,
        app_name: link.app_name,
        theme_id: link.theme_id,
        currency_id: link.currency_id,
        logo_url: link.logo_url,
        config: snapshot,
    }))
}

async fn job_running(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(ci_build_id): Path<String>,
) -> Result<Json<JobJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;
    metrics::callback_received("running");

    let job = ledger::mark_running(state.store.as_ref(), &ci_build_id).await?;
    Ok(Json(job.into()))
}

#[derive(Debug, Default, Deserialize)]
struct FailedBody {
    error: Option<String>,
}

async fn job_failed(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(ci_build_id): Path<String>,
    body: Option<Json<FailedBody>>,
) -> Result<Json<JobJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;
    metrics::callback_received("failed");

    let error = body
        .and_then(|Json(b)| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "build failed".to_string());

    let job = ledger::mark_failed(state.store.as_ref(), &ci_build_id, error).await?;
    Ok(Json(job.into()))
}

async fn job_succeeded(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(ci_build_id): Path<String>,
    body: Option<Json<ArtifactUrls>>,
) -> Result<Json<JobJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;
    metrics::callback_received("succeeded");

    let artifacts = body.map(|Json(b)| b).unwrap_or_default();
    let job = ledger::mark_succeeded(state.store.as_ref(), &ci_build_id, artifacts).await?;
    Ok(Json(job.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApkUrlBody {
    apk_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApkUrlJson {
    link_id: i64,
    apk_url: Option<String>,
}

async fn deliver_apk_url(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path((owner_id, project_id, slug)): Path<(i64, i64, String)>,
    Json(body): Json<ApkUrlBody>,
) -> Result<Json<ApkUrlJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;
    metrics::callback_received("apk_url");

    if body.apk_url.is_empty() {
        return Err(OrchestratorError::InvalidRequest(
            "apkUrl must not be empty".to_string(),
        ));
    }

    let link = ledger::set_apk_url(
        state.store.as_ref(),
        owner_id,
        project_id,
        &slug,
        body.apk_url,
    )
    .await?;

    Ok(Json(ApkUrlJson {
        link_id: link.id,
        apk_url: link.apk_url,
    }))
}

async fn pull_manifest(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path((owner_id, project_id, slug)): Path<(i64, i64, String)>,
) -> Result<Json<ApkUrlJson>, OrchestratorError> {
    auth::verify_ci_secret(&state.config, &headers)?;
    metrics::callback_received("pull");

    let link = manifest::pull(
        state.store.as_ref(),
        state.manifest.as_ref(),
        owner_id,
        project_id,
        &slug,
    )
    .await?;

    Ok(Json(ApkUrlJson {
        link_id: link.id,
        apk_url: link.apk_url,
    }))
}
