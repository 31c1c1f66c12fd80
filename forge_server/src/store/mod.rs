//! Persistence ports for the orchestrator.
//!
//! Guarded state transitions (`start_job`, `finish_job`) live here rather
//! than in the services so that each adapter can make them atomic: a
//! single status-filtered UPDATE in Postgres, a single write-lock section
//! in memory. A replayed callback therefore resolves to a no-op inside
//! the store, never to a lost update.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::app_link::AppLink;
use crate::models::build_job::{
    ArtifactUrls, BuildJob, JobOutcome, NewBuildJob, Platform, TransitionOutcome,
};
use crate::models::catalog::{Currency, Owner, RuntimeConfig, Theme};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AppLinkStore: Send + Sync {
    async fn link_by_id(&self, id: i64) -> StoreResult<Option<AppLink>>;

    async fn link_by_key(
        &self,
        owner_id: i64,
        project_id: i64,
        slug: &str,
    ) -> StoreResult<Option<AppLink>>;

    async fn list_links(&self) -> StoreResult<Vec<AppLink>>;

    /// Atomically increment the platform's version counter and return the
    /// updated row. The bump is never rolled back, whatever the eventual
    /// build outcome.
    async fn bump_version(&self, link_id: i64, platform: Platform) -> StoreResult<AppLink>;

    /// Write the provided (Some) artifact URLs onto the link's
    /// denormalized latest-artifact fields. Absent fields stay unchanged.
    async fn set_latest_artifacts(
        &self,
        link_id: i64,
        urls: &ArtifactUrls,
    ) -> StoreResult<AppLink>;
}

#[async_trait]
pub trait BuildJobStore: Send + Sync {
    async fn insert_job(&self, new: NewBuildJob) -> StoreResult<BuildJob>;

    /// Record the external correlation id obtained at dispatch time.
    async fn assign_ci_build_id(&self, job_id: i64, ci_build_id: &str) -> StoreResult<BuildJob>;

    async fn job_by_ci_build_id(&self, ci_build_id: &str) -> StoreResult<Option<BuildJob>>;

    /// QUEUED -> RUNNING, setting started_at exactly once. Returns None
    /// for an unknown ci_build_id; `applied = false` on replays.
    async fn start_job(
        &self,
        ci_build_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>>;

    /// Non-terminal -> terminal. First terminal write wins; later writes
    /// are no-ops regardless of their payload.
    async fn finish_job(
        &self,
        ci_build_id: &str,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>>;

    /// Terminal write keyed by primary id, for jobs that never obtained a
    /// ci_build_id (dispatch failure) or are being swept.
    async fn finish_job_by_id(
        &self,
        job_id: i64,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>>;

    /// Latest job for a link, optionally scoped to one platform.
    async fn latest_job(
        &self,
        link_id: i64,
        platform: Option<Platform>,
    ) -> StoreResult<Option<BuildJob>>;

    async fn recent_jobs(&self, link_id: i64, limit: i64) -> StoreResult<Vec<BuildJob>>;

    /// Whether a non-terminal job exists for (link, platform).
    async fn has_open_job(&self, link_id: i64, platform: Platform) -> StoreResult<bool>;

    /// Non-terminal jobs created before `cutoff`, for the sweeper.
    async fn stale_open_jobs(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<BuildJob>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn theme_by_id(&self, id: i64) -> StoreResult<Option<Theme>>;

    /// The single globally-flagged active theme, if any.
    async fn active_theme(&self) -> StoreResult<Option<Theme>>;

    async fn currency_by_id(&self, id: i64) -> StoreResult<Option<Currency>>;

    async fn runtime_config(&self, link_id: i64) -> StoreResult<Option<RuntimeConfig>>;

    async fn owner_by_id(&self, id: i64) -> StoreResult<Option<Owner>>;
}

/// The full persistence surface the orchestrator needs.
pub trait Store: AppLinkStore + BuildJobStore + CatalogStore {}

impl<T: AppLinkStore + BuildJobStore + CatalogStore> Store for T {}
