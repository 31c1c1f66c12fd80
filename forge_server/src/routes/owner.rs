//! Owner-facing endpoints: build dashboards and self-service rebuild.
//!
//! Read endpoints answer "not found" uniformly for nonexistent and
//! foreign links so they leak nothing across tenants; the rebuild
//! endpoint distinguishes Forbidden because it mutates.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::auth::{self, Caller};
use crate::error::OrchestratorError;
use crate::models::app_link::AppLink;
use crate::models::build_job::Platform;
use crate::routes::{ForgeState, JobJson};
use crate::services::{ledger, rebuild};

pub fn router() -> Router<ForgeState> {
    Router::new()
        .route("/links/{link_id}/jobs", get(list_jobs))
        .route("/links/{link_id}/jobs/latest", get(latest_job))
        .route("/links/{link_id}/status", get(link_status))
        .route("/links/{link_id}/rebuild", post(rebuild_link))
}

/// Fetch a link for a read endpoint: nonexistent and foreign links are
/// indistinguishable to the caller.
async fn viewable_link(
    state: &ForgeState,
    caller: &Caller,
    link_id: i64,
) -> Result<AppLink, OrchestratorError> {
    let link = state
        .store
        .link_by_id(link_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    if !auth::can_view(caller, &link) {
        return Err(OrchestratorError::NotFound);
    }
    Ok(link)
}

#[derive(Debug, Deserialize)]
struct ListJobsQuery {
    limit: Option<i64>,
}

async fn list_jobs(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobJson>>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    let link = viewable_link(&state, &caller, link_id).await?;

    let jobs = ledger::recent_jobs(state.store.as_ref(), link.id, query.limit.unwrap_or(20)).await?;
    Ok(Json(jobs.into_iter().map(JobJson::from).collect()))
}

#[derive(Debug, Deserialize)]
struct LatestJobQuery {
    platform: Option<String>,
}

async fn latest_job(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
    Query(query): Query<LatestJobQuery>,
) -> Result<Json<JobJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    let link = viewable_link(&state, &caller, link_id).await?;

    let platform = query
        .platform
        .map(|p| {
            p.parse::<Platform>()
                .map_err(|e| OrchestratorError::InvalidRequest(e.to_string()))
        })
        .transpose()?;

    let job = ledger::latest_job(state.store.as_ref(), link.id, platform)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    Ok(Json(job.into()))
}

/// Aggregated android + ios status for the owner dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinkStatusJson {
    link_id: i64,
    app_name: String,
    android: Option<JobJson>,
    ios: Option<JobJson>,
    apk_url: Option<String>,
    bundle_url: Option<String>,
    ipa_url: Option<String>,
}

async fn link_status(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
) -> Result<Json<LinkStatusJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;
    let link = viewable_link(&state, &caller, link_id).await?;

    let android = ledger::latest_job(state.store.as_ref(), link.id, Some(Platform::Android)).await?;
    let ios = ledger::latest_job(state.store.as_ref(), link.id, Some(Platform::Ios)).await?;

    Ok(Json(LinkStatusJson {
        link_id: link.id,
        app_name: link.app_name,
        android: android.map(JobJson::from),
        ios: ios.map(JobJson::from),
        apk_url: link.apk_url,
        bundle_url: link.bundle_url,
        ipa_url: link.ipa_url,
    }))
}

async fn rebuild_link(
    State(state): State<ForgeState>,
    headers: HeaderMap,
    Path(link_id): Path<i64>,
) -> Result<Json<JobJson>, OrchestratorError> {
    let caller = auth::caller_from_headers(&headers)?;

    let job = rebuild::owner_rebuild(
        state.store.as_ref(),
        state.trigger.as_ref(),
        &state.config,
        &caller,
        link_id,
    )
    .await?;
    Ok(Json(job.into()))
}
