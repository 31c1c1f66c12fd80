//! Rebuild Orchestrator — owner self-service and super-admin flows.
//!
//! Version counters are monotonic: a bump is persisted before dispatch
//! and never rolled back, so a failed build still reserves its number and
//! the next attempt always uses a strictly higher one.

use serde::Deserialize;

use crate::auth::{self, Caller};
use crate::config::ForgeConfig;
use crate::error::OrchestratorError;
use crate::models::build_job::{BuildJob, Platform};
use crate::services::assembler::ConfigOverrides;
use crate::services::ci_trigger::CiTrigger;
use crate::services::dispatcher;
use crate::store::Store;

/// Super-admin rebuild of a single platform.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminRebuildRequest {
    pub bump_version: bool,
    #[serde(flatten)]
    pub overrides: ConfigOverrides,
}

/// Super-admin rebuild of both platforms with independent bump flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminRebuildBothRequest {
    pub bump_android: bool,
    pub bump_ios: bool,
    #[serde(flatten)]
    pub overrides: ConfigOverrides,
}

/// Owner self-service rebuild: "my APK didn't build, try again".
/// Dispatches a single Android job with the link's stored configuration.
pub async fn owner_rebuild(
    store: &dyn Store,
    trigger: &dyn CiTrigger,
    config: &ForgeConfig,
    caller: &Caller,
    link_id: i64,
) -> Result<BuildJob, OrchestratorError> {
    let link = store
        .link_by_id(link_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;
    auth::require_owner(caller, &link)?;

    tracing::info!(link_id, owner_id = link.owner_id, "Owner rebuild requested");
    dispatcher::dispatch(
        store,
        trigger,
        config,
        &link,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
}

/// Super-admin rebuild of one platform, with optional version bump and
/// config overrides.
pub async fn admin_rebuild(
    store: &dyn Store,
    trigger: &dyn CiTrigger,
    config: &ForgeConfig,
    link_id: i64,
    platform: Platform,
    req: &AdminRebuildRequest,
) -> Result<BuildJob, OrchestratorError> {
    let mut link = store
        .link_by_id(link_id)
        .await?
        .ok_or(OrchestratorError::NotFound)?;

    if req.bump_version {
        link = store.bump_version(link.id, platform).await?;
        tracing::info!(
            link_id,
            platform = %platform,
            version = link.version_counter(platform),
            "Version bumped for rebuild"
        );
    }

    dispatcher::dispatch(store, trigger, config, &link, platform, &req.overrides).await
}

/// Super-admin rebuild of both platforms from one logical request; two
/// ledger rows result.
pub async fn admin_rebuild_both(
    store: &dyn Store,
    trigger: &dyn CiTrigger,
    config: &ForgeConfig,
    link_id: i64,
    req: &AdminRebuildBothRequest,
) -> Result<(BuildJob, BuildJob), OrchestratorError> {
    let android = admin_rebuild(
        store,
        trigger,
        config,
        link_id,
        Platform::Android,
        &AdminRebuildRequest {
            bump_version: req.bump_android,
            overrides: req.overrides.clone(),
        },
    )
    .await?;

    let ios = admin_rebuild(
        store,
        trigger,
        config,
        link_id,
        Platform::Ios,
        &AdminRebuildRequest {
            bump_version: req.bump_ios,
            overrides: req.overrides.clone(),
        },
    )
    .await?;

    Ok((android, ios))
}
