//! Build Job Ledger — the one-way state machine over build attempts.
//!
//! All transitions are keyed by `ci_build_id` and idempotent: the CI
//! runner delivers at-least-once and out of order, so a late "running"
//! after "succeeded" is a no-op and a duplicate terminal write changes
//! nothing. First terminal write wins.

use chrono::Utc;

use crate::error::OrchestratorError;
use crate::metrics;
use crate::models::app_link::AppLink;
use crate::models::build_job::{ArtifactUrls, BuildJob, JobOutcome, Platform};
use crate::store::Store;

/// CI acknowledged the build has started.
pub async fn mark_running(
    store: &dyn Store,
    ci_build_id: &str,
) -> Result<BuildJob, OrchestratorError> {
    let outcome = store
        .start_job(ci_build_id, Utc::now())
        .await?
        .ok_or_else(|| {
            tracing::info!(ci_build_id, "running callback for unknown job (late replay?)");
            OrchestratorError::NotFound
        })?;

    if outcome.applied {
        metrics::job_status_changed("running");
        tracing::info!(
            job_id = outcome.job.id,
            link_id = outcome.job.link_id,
            ci_build_id,
            "Build running"
        );
    } else {
        tracing::debug!(ci_build_id, status = %outcome.job.status, "running callback replayed, no-op");
    }

    Ok(outcome.job)
}

/// CI reported the build failed.
pub async fn mark_failed(
    store: &dyn Store,
    ci_build_id: &str,
    error: String,
) -> Result<BuildJob, OrchestratorError> {
    let outcome = store
        .finish_job(ci_build_id, &JobOutcome::failed(error), Utc::now())
        .await?
        .ok_or_else(|| {
            tracing::info!(ci_build_id, "failed callback for unknown job (late replay?)");
            OrchestratorError::NotFound
        })?;

    if outcome.applied {
        metrics::job_status_changed("failed");
        tracing::warn!(
            job_id = outcome.job.id,
            link_id = outcome.job.link_id,
            ci_build_id,
            error = outcome.job.error.as_deref().unwrap_or(""),
            "Build failed"
        );
    } else {
        tracing::debug!(ci_build_id, status = %outcome.job.status, "failed callback replayed, no-op");
    }

    Ok(outcome.job)
}

/// CI delivered artifacts. On the first success the URLs are copied onto
/// the job row and onto the owning link's latest-artifact fields, scoped
/// to the job's platform.
pub async fn mark_succeeded(
    store: &dyn Store,
    ci_build_id: &str,
    artifacts: ArtifactUrls,
) -> Result<BuildJob, OrchestratorError> {
    let platform = store
        .job_by_ci_build_id(ci_build_id)
        .await?
        .ok_or_else(|| {
            tracing::info!(ci_build_id, "succeeded callback for unknown job (late replay?)");
            OrchestratorError::NotFound
        })?
        .platform;

    let artifacts = artifacts.scoped(platform);
    let outcome = store
        .finish_job(ci_build_id, &JobOutcome::succeeded(artifacts.clone()), Utc::now())
        .await?
        .ok_or(OrchestratorError::NotFound)?;

    if outcome.applied {
        store
            .set_latest_artifacts(outcome.job.link_id, &artifacts)
            .await?;
        metrics::job_status_changed("succeeded");
        tracing::info!(
            job_id = outcome.job.id,
            link_id = outcome.job.link_id,
            ci_build_id,
            platform = %platform,
            "Build succeeded, artifacts recorded"
        );
    } else {
        tracing::debug!(ci_build_id, status = %outcome.job.status, "succeeded callback replayed, no-op");
    }

    Ok(outcome.job)
}

/// Tenant-scoped artifact delivery: set the APK URL by owner + project +
/// slug. Alternate wiring for runners that never saw a ci_build_id.
pub async fn set_apk_url(
    store: &dyn Store,
    owner_id: i64,
    project_id: i64,
    slug: &str,
    apk_url: String,
) -> Result<AppLink, OrchestratorError> {
    let link = store
        .link_by_key(owner_id, project_id, slug)
        .await?
        .ok_or(OrchestratorError::NotFound)?;

    let urls = ArtifactUrls {
        apk_url: Some(apk_url),
        bundle_url: None,
        ipa_url: None,
    };
    let link = store.set_latest_artifacts(link.id, &urls).await?;

    tracing::info!(
        link_id = link.id,
        owner_id,
        slug,
        "APK URL delivered via tenant-scoped callback"
    );

    Ok(link)
}

/// Dashboard queries.
pub async fn latest_job(
    store: &dyn Store,
    link_id: i64,
    platform: Option<Platform>,
) -> Result<Option<BuildJob>, OrchestratorError> {
    Ok(store.latest_job(link_id, platform).await?)
}

pub async fn recent_jobs(
    store: &dyn Store,
    link_id: i64,
    limit: i64,
) -> Result<Vec<BuildJob>, OrchestratorError> {
    Ok(store.recent_jobs(link_id, limit).await?)
}
