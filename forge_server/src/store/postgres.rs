//! PostgreSQL store adapter (diesel-async over a deadpool pool).
//!
//! State transitions are single status-guarded UPDATEs so concurrent
//! callbacks resolve inside the database, and version bumps are a single
//! `SET n = n + 1 ... RETURNING` so racing rebuilds never read a stale
//! counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::deadpool::{Object, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::models::app_link::AppLink;
use crate::models::build_job::{
    ArtifactUrls, BuildJob, BuildStatus, JobOutcome, NewBuildJob, Platform, TransitionOutcome,
};
use crate::models::catalog::{Currency, Owner, RuntimeConfig, Theme};
use crate::schema::{
    forge_app_links, forge_build_jobs, forge_currencies, forge_owners, forge_runtime_configs,
    forge_themes,
};
use crate::store::{AppLinkStore, BuildJobStore, CatalogStore, StoreError, StoreResult};

pub struct PgStore {
    pool: Pool<AsyncPgConnection>,
}

impl PgStore {
    pub fn connect(database_url: &str) -> anyhow::Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder(manager).max_size(10).build()?;
        Ok(Self { pool })
    }

    pub async fn run_migration(&self) -> anyhow::Result<()> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| anyhow::anyhow!("diesel pool: {e}"))?;
        crate::migration::run_migration(&mut conn).await
    }

    async fn conn(&self) -> StoreResult<Object<AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Backend(format!("diesel pool: {e}")))
    }
}

fn db_err(e: diesel::result::Error) -> StoreError {
    match e {
        diesel::result::Error::NotFound => StoreError::NotFound,
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl AppLinkStore for PgStore {
    async fn link_by_id(&self, id: i64) -> StoreResult<Option<AppLink>> {
        let mut conn = self.conn().await?;
        forge_app_links::table
            .find(id)
            .select(AppLink::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn link_by_key(
        &self,
        owner_id: i64,
        project_id: i64,
        slug: &str,
    ) -> StoreResult<Option<AppLink>> {
        let mut conn = self.conn().await?;
        forge_app_links::table
            .filter(forge_app_links::owner_id.eq(owner_id))
            .filter(forge_app_links::project_id.eq(project_id))
            .filter(forge_app_links::slug.eq(slug))
            .select(AppLink::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn list_links(&self) -> StoreResult<Vec<AppLink>> {
        let mut conn = self.conn().await?;
        forge_app_links::table
            .order(forge_app_links::id.asc())
            .select(AppLink::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err)
    }

    async fn bump_version(&self, link_id: i64, platform: Platform) -> StoreResult<AppLink> {
        let mut conn = self.conn().await?;
        let target = forge_app_links::table.find(link_id);
        match platform {
            Platform::Android => diesel::update(target)
                .set((
                    forge_app_links::android_version_code
                        .eq(forge_app_links::android_version_code + 1),
                    forge_app_links::updated_at.eq(Utc::now()),
                ))
                .returning(AppLink::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(db_err),
            Platform::Ios => diesel::update(target)
                .set((
                    forge_app_links::ios_build_number.eq(forge_app_links::ios_build_number + 1),
                    forge_app_links::updated_at.eq(Utc::now()),
                ))
                .returning(AppLink::as_returning())
                .get_result(&mut conn)
                .await
                .map_err(db_err),
        }
    }

    async fn set_latest_artifacts(
        &self,
        link_id: i64,
        urls: &ArtifactUrls,
    ) -> StoreResult<AppLink> {
        let mut conn = self.conn().await?;
        let target = forge_app_links::table.find(link_id);

        // Each provided field is its own column write; absent fields are
        // left untouched rather than overwritten with NULL.
        if let Some(u) = &urls.apk_url {
            diesel::update(target)
                .set((
                    forge_app_links::apk_url.eq(u),
                    forge_app_links::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)
                .await
                .map_err(db_err)?;
        }
        if let Some(u) = &urls.bundle_url {
            diesel::update(target)
                .set((
                    forge_app_links::bundle_url.eq(u),
                    forge_app_links::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)
                .await
                .map_err(db_err)?;
        }
        if let Some(u) = &urls.ipa_url {
            diesel::update(target)
                .set((
                    forge_app_links::ipa_url.eq(u),
                    forge_app_links::updated_at.eq(Utc::now()),
                ))
                .execute(&mut conn)
                .await
                .map_err(db_err)?;
        }

        forge_app_links::table
            .find(link_id)
            .select(AppLink::as_select())
            .first(&mut conn)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl BuildJobStore for PgStore {
    async fn insert_job(&self, new: NewBuildJob) -> StoreResult<BuildJob> {
        let mut conn = self.conn().await?;
        diesel::insert_into(forge_build_jobs::table)
            .values(&new)
            .returning(BuildJob::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(db_err)
    }

    async fn assign_ci_build_id(&self, job_id: i64, ci_build_id: &str) -> StoreResult<BuildJob> {
        let mut conn = self.conn().await?;
        diesel::update(forge_build_jobs::table.find(job_id))
            .set(forge_build_jobs::ci_build_id.eq(ci_build_id))
            .returning(BuildJob::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(db_err)
    }

    async fn job_by_ci_build_id(&self, ci_build_id: &str) -> StoreResult<Option<BuildJob>> {
        let mut conn = self.conn().await?;
        forge_build_jobs::table
            .filter(forge_build_jobs::ci_build_id.eq(ci_build_id))
            .select(BuildJob::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn start_job(
        &self,
        ci_build_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            forge_build_jobs::table
                .filter(forge_build_jobs::ci_build_id.eq(ci_build_id))
                .filter(forge_build_jobs::status.eq(BuildStatus::Queued)),
        )
        .set((
            forge_build_jobs::status.eq(BuildStatus::Running),
            forge_build_jobs::started_at.eq(at),
        ))
        .returning(BuildJob::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(db_err)?;

        if let Some(job) = updated {
            return Ok(Some(TransitionOutcome { job, applied: true }));
        }

        // Replay or unknown id: report the row as it stands, if any.
        Ok(self
            .job_by_ci_build_id(ci_build_id)
            .await?
            .map(|job| TransitionOutcome {
                job,
                applied: false,
            }))
    }

    async fn finish_job(
        &self,
        ci_build_id: &str,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            forge_build_jobs::table
                .filter(forge_build_jobs::ci_build_id.eq(ci_build_id))
                .filter(
                    forge_build_jobs::status
                        .eq_any([BuildStatus::Queued, BuildStatus::Running]),
                ),
        )
        .set((
            forge_build_jobs::status.eq(outcome.status),
            forge_build_jobs::finished_at.eq(at),
            forge_build_jobs::error.eq(outcome.error.clone()),
            forge_build_jobs::apk_url.eq(outcome.artifacts.apk_url.clone()),
            forge_build_jobs::bundle_url.eq(outcome.artifacts.bundle_url.clone()),
            forge_build_jobs::ipa_url.eq(outcome.artifacts.ipa_url.clone()),
        ))
        .returning(BuildJob::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(db_err)?;

        if let Some(job) = updated {
            return Ok(Some(TransitionOutcome { job, applied: true }));
        }

        Ok(self
            .job_by_ci_build_id(ci_build_id)
            .await?
            .map(|job| TransitionOutcome {
                job,
                applied: false,
            }))
    }

    async fn finish_job_by_id(
        &self,
        job_id: i64,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(
            forge_build_jobs::table
                .find(job_id)
                .filter(
                    forge_build_jobs::status
                        .eq_any([BuildStatus::Queued, BuildStatus::Running]),
                ),
        )
        .set((
            forge_build_jobs::status.eq(outcome.status),
            forge_build_jobs::finished_at.eq(at),
            forge_build_jobs::error.eq(outcome.error.clone()),
            forge_build_jobs::apk_url.eq(outcome.artifacts.apk_url.clone()),
            forge_build_jobs::bundle_url.eq(outcome.artifacts.bundle_url.clone()),
            forge_build_jobs::ipa_url.eq(outcome.artifacts.ipa_url.clone()),
        ))
        .returning(BuildJob::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(db_err)?;

        if let Some(job) = updated {
            return Ok(Some(TransitionOutcome { job, applied: true }));
        }

        let current = forge_build_jobs::table
            .find(job_id)
            .select(BuildJob::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)?;

        Ok(current.map(|job| TransitionOutcome {
            job,
            applied: false,
        }))
    }

    async fn latest_job(
        &self,
        link_id: i64,
        platform: Option<Platform>,
    ) -> StoreResult<Option<BuildJob>> {
        let mut conn = self.conn().await?;
        let mut query = forge_build_jobs::table
            .filter(forge_build_jobs::link_id.eq(link_id))
            .order(forge_build_jobs::id.desc())
            .into_boxed();
        if let Some(p) = platform {
            query = query.filter(forge_build_jobs::platform.eq(p));
        }
        query
            .select(BuildJob::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn recent_jobs(&self, link_id: i64, limit: i64) -> StoreResult<Vec<BuildJob>> {
        let mut conn = self.conn().await?;
        forge_build_jobs::table
            .filter(forge_build_jobs::link_id.eq(link_id))
            .order(forge_build_jobs::id.desc())
            .limit(limit)
            .select(BuildJob::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err)
    }

    async fn has_open_job(&self, link_id: i64, platform: Platform) -> StoreResult<bool> {
        let mut conn = self.conn().await?;
        let count: i64 = forge_build_jobs::table
            .filter(forge_build_jobs::link_id.eq(link_id))
            .filter(forge_build_jobs::platform.eq(platform))
            .filter(
                forge_build_jobs::status.eq_any([BuildStatus::Queued, BuildStatus::Running]),
            )
            .count()
            .get_result(&mut conn)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }

    async fn stale_open_jobs(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<BuildJob>> {
        let mut conn = self.conn().await?;
        forge_build_jobs::table
            .filter(
                forge_build_jobs::status.eq_any([BuildStatus::Queued, BuildStatus::Running]),
            )
            .filter(forge_build_jobs::created_at.lt(cutoff))
            .select(BuildJob::as_select())
            .load(&mut conn)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn theme_by_id(&self, id: i64) -> StoreResult<Option<Theme>> {
        let mut conn = self.conn().await?;
        forge_themes::table
            .find(id)
            .select(Theme::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn active_theme(&self) -> StoreResult<Option<Theme>> {
        let mut conn = self.conn().await?;
        forge_themes::table
            .filter(forge_themes::active.eq(true))
            .order(forge_themes::id.asc())
            .select(Theme::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn currency_by_id(&self, id: i64) -> StoreResult<Option<Currency>> {
        let mut conn = self.conn().await?;
        forge_currencies::table
            .find(id)
            .select(Currency::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn runtime_config(&self, link_id: i64) -> StoreResult<Option<RuntimeConfig>> {
        let mut conn = self.conn().await?;
        forge_runtime_configs::table
            .filter(forge_runtime_configs::link_id.eq(link_id))
            .select(RuntimeConfig::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }

    async fn owner_by_id(&self, id: i64) -> StoreResult<Option<Owner>> {
        let mut conn = self.conn().await?;
        forge_owners::table
            .find(id)
            .select(Owner::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(db_err)
    }
}
