//! Build Dispatcher — create a ledger row and hand off to the external
//! CI runner.
//!
//! A trigger failure must never strand a QUEUED row with no possibility
//! of progress: the job is transitioned straight to FAILED with the
//! dispatch error recorded, so the caller always gets a queryable handle
//! in {QUEUED, FAILED}.

use chrono::Utc;

use crate::config::ForgeConfig;
use crate::error::OrchestratorError;
use crate::metrics;
use crate::models::app_link::AppLink;
use crate::models::build_job::{BuildJob, BuildStatus, JobOutcome, NewBuildJob, Platform};
use crate::services::assembler::{self, ConfigOverrides};
use crate::services::ci_trigger::{CiTrigger, CiTriggerRequest};
use crate::store::{Store, StoreError};

pub async fn dispatch(
    store: &dyn Store,
    trigger: &dyn CiTrigger,
    config: &ForgeConfig,
    link: &AppLink,
    platform: Platform,
    overrides: &ConfigOverrides,
) -> Result<BuildJob, OrchestratorError> {
    // At most one non-terminal job per (link, platform).
    if store.has_open_job(link.id, platform).await? {
        return Err(OrchestratorError::InvalidRequest(format!(
            "a {platform} build is already in flight for link {}",
            link.id
        )));
    }

    let snapshot = assembler::assemble(store, config, link, overrides).await?;
    let owner = store.owner_by_id(link.owner_id).await?;

    let job = store
        .insert_job(NewBuildJob {
            link_id: link.id,
            platform,
            status: BuildStatus::Queued,
            ci_build_id: None,
            created_at: Utc::now(),
        })
        .await?;

    metrics::job_dispatched(platform.as_str());
    metrics::job_status_changed("queued");

    let request = CiTriggerRequest {
        link_id: link.id,
        owner_id: link.owner_id,
        project_id: link.project_id,
        slug: link.slug.clone(),
        app_name: link.app_name.clone(),
        platform: platform.as_str().to_string(),
        android_package: link.android_package.clone(),
        android_version_code: link.android_version_code,
        android_version_name: link.android_version_name.clone(),
        ios_bundle_id: link.ios_bundle_id.clone(),
        ios_build_number: link.ios_build_number,
        ios_version_name: link.ios_version_name.clone(),
        logo_url: link.logo_url.clone(),
        owner_email: owner.as_ref().map(|o| o.email.clone()),
        owner_name: owner.map(|o| o.display_name),
        config: snapshot,
        callback_base_url: config.callback_base_url.clone(),
        callback_token: config.ci_callback_secret.clone(),
    };

    match trigger.trigger(&request).await {
        Ok(reply) => {
            // Some runners never return an id; synthesize a surrogate so
            // callbacks still have a correlation key.
            let ci_build_id = reply
                .ci_build_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| {
                    format!("{}-{}-{}", link.id, platform, uuid::Uuid::new_v4())
                });
            let job = store.assign_ci_build_id(job.id, &ci_build_id).await?;
            tracing::info!(
                job_id = job.id,
                link_id = link.id,
                platform = %platform,
                ci_build_id = %ci_build_id,
                "Build dispatched"
            );
            Ok(job)
        }
        Err(e) => {
            tracing::warn!(
                job_id = job.id,
                link_id = link.id,
                platform = %platform,
                "CI trigger failed: {e}"
            );
            let outcome = store
                .finish_job_by_id(job.id, &JobOutcome::failed(format!("dispatch failed: {e}")), Utc::now())
                .await?
                .ok_or(StoreError::NotFound)?;
            metrics::job_status_changed("failed");
            Ok(outcome.job)
        }
    }
}
