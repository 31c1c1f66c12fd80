//! Super-admin endpoints: fleet overview and rebuilds with version-bump
//! semantics. Role-gated; tenant scoping is ignored.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::auth;
use crate::error::OrchestratorError;
use crate::models::build_job::Platform;
use crate::routes::{AppLinkJson, ForgeState, JobJson};
use crate::services::rebuild::{self, AdminRebuildBothRequest, AdminRebuildRequest};
use crate::services::ledger;

pub fn router() -> Router<ForgeState> {
    Router::new()
        .route("/apps", get(list_apps))
        .route("/apps/{link_id}", get(app_detail))
        .route("/apps/{link_id}/rebuild-bundle", post(rebuild_bundle))
        .route("/apps/{link_id}/rebuild-ios", post(rebuild_ios))
        .route("/apps/{link_id}/rebuild-both", post(rebuild_both))
}

async fn list_apps(
    State(state): State<ForgeState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AppLinkJson>>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    auth::require_super_admin(&caller)?;

    let links = state.store.list_links().await?;
    Ok(Json(links.into_iter().map(AppLinkJson::from).collect()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppDetailJson {
    #[serde(flatten)]
    link: AppLinkJson,
    jobs: Vec<JobJson>,
}

async fn app_detail(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
) -> Result<Json<AppDetailJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    auth::require_super_admin(&caller)?;

    let link = state
        .store
        .link_by_id(link_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    let jobs = ledger::recent_jobs(state.store.as_ref(), link.id, 10).await?;

    Ok(Json(AppDetailJson {
        link: link.into(),
        jobs: jobs.into_iter().map(JobJson::from).collect(),
    }))
}

async fn rebuild_bundle(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
    body: Option<Json<AdminRebuildRequest>>,
) -> Result<Json<JobJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    auth::require_super_admin(&caller)?;

    let req = body.map(|Json(b)| b).unwrap_or_default();
    let job = rebuild::admin_rebuild(
        state.store.as_ref(),
        state.trigger.as_ref(),
        &state.config,
        link_id,
        Platform::Android,
        &req,
    )
    .await?;
    Ok(Json(job.into()))
}

async fn rebuild_ios(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
    body: Option<Json<AdminRebuildRequest>>,
) -> Result<Json<JobJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    auth::require_super_admin(&caller)?;

    let req = body.map(|Json(b)| b).unwrap_or_default();
    let job = rebuild::admin_rebuild(
        state.store.as_ref(),
        state.trigger.as_ref(),
        &state.config,
        link_id,
        Platform::Ios,
        &req,
    )
    .await?;
    Ok(Json(job.into()))
}

#[derive(Debug, Serialize)]
struct RebuildBothJson {
    android: JobJson,
    ios: JobJson,
}

async fn rebuild_both(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
    body: Option<Json<AdminRebuildBothRequest>>,
) -> Result<Json<RebuildBothJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    auth::require_super_admin(&caller)?;

    let req = body.map(|Json(b)| b).unwrap_or_default();
    let (android, ios) = rebuild::admin_rebuild_both(
        state.store.as_ref(),
        state.trigger.as_ref(),
        &state.config,
        link_id,
        &req,
    )
    .await?;

    Ok(Json(RebuildBothJson {
        android: android.into(),
        ios: ios.into(),
    }))
}
