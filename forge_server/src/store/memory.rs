//! In-memory store adapter, used by the local/dev profile and the test
//! suite. All mutations run under a single write lock, which gives the
//! same read-modify-write atomicity the Postgres adapter gets from
//! guarded UPDATEs.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::app_link::AppLink;
use crate::models::build_job::{
    ArtifactUrls, BuildJob, BuildStatus, JobOutcome, NewBuildJob, Platform, TransitionOutcome,
};
use crate::models::catalog::{Currency, Owner, RuntimeConfig, Theme};
use crate::store::{AppLinkStore, BuildJobStore, CatalogStore, StoreError, StoreResult};

#[derive(Default)]
struct MemInner {
    links: HashMap<i64, AppLink>,
    jobs: HashMap<i64, BuildJob>,
    themes: HashMap<i64, Theme>,
    currencies: HashMap<i64, Currency>,
    runtime_configs: HashMap<i64, RuntimeConfig>,
    owners: HashMap<i64, Owner>,
    next_job_id: i64,
}

#[derive(Default)]
pub struct MemStore {
    inner: RwLock<MemInner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Seeding helpers for the dev profile and tests.

    pub async fn insert_link(&self, link: AppLink) {
        self.inner.write().await.links.insert(link.id, link);
    }

    pub async fn insert_theme(&self, theme: Theme) {
        self.inner.write().await.themes.insert(theme.id, theme);
    }

    pub async fn insert_currency(&self, currency: Currency) {
        self.inner
            .write()
            .await
            .currencies
            .insert(currency.id, currency);
    }

    pub async fn insert_runtime_config(&self, config: RuntimeConfig) {
        self.inner
            .write()
            .await
            .runtime_configs
            .insert(config.link_id, config);
    }

    pub async fn insert_owner(&self, owner: Owner) {
        self.inner.write().await.owners.insert(owner.id, owner);
    }
}

fn apply_finish(job: &mut BuildJob, outcome: &JobOutcome, at: DateTime<Utc>) {
    job.status = outcome.status;
    job.finished_at = Some(at);
    job.error = outcome.error.clone();
    job.apk_url = outcome.artifacts.apk_url.clone();
    job.bundle_url = outcome.artifacts.bundle_url.clone();
    job.ipa_url = outcome.artifacts.ipa_url.clone();
}

#[async_trait]
impl AppLinkStore for MemStore {
    async fn link_by_id(&self, id: i64) -> StoreResult<Option<AppLink>> {
        Ok(self.inner.read().await.links.get(&id).cloned())
    }

    async fn link_by_key(
        &self,
        owner_id: i64,
        project_id: i64,
        slug: &str,
    ) -> StoreResult<Option<AppLink>> {
        Ok(self
            .inner
            .read()
            .await
            .links
            .values()
            .find(|l| l.owner_id == owner_id && l.project_id == project_id && l.slug == slug)
            .cloned())
    }

    async fn list_links(&self) -> StoreResult<Vec<AppLink>> {
        let mut links: Vec<AppLink> = self.inner.read().await.links.values().cloned().collect();
        links.sort_by_key(|l| l.id);
        Ok(links)
    }

    async fn bump_version(&self, link_id: i64, platform: Platform) -> StoreResult<AppLink> {
        let mut inner = self.inner.write().await;
        let link = inner.links.get_mut(&link_id).ok_or(StoreError::NotFound)?;
        match platform {
            Platform::Android => link.android_version_code += 1,
            Platform::Ios => link.ios_build_number += 1,
        }
        link.updated_at = Utc::now();
        Ok(link.clone())
    }

    async fn set_latest_artifacts(
        &self,
        link_id: i64,
        urls: &ArtifactUrls,
    ) -> StoreResult<AppLink> {
        let mut inner = self.inner.write().await;
        let link = inner.links.get_mut(&link_id).ok_or(StoreError::NotFound)?;
        if let Some(u) = &urls.apk_url {
            link.apk_url = Some(u.clone());
        }
        if let Some(u) = &urls.bundle_url {
            link.bundle_url = Some(u.clone());
        }
        if let Some(u) = &urls.ipa_url {
            link.ipa_url = Some(u.clone());
        }
        link.updated_at = Utc::now();
        Ok(link.clone())
    }
}

#[async_trait]
impl BuildJobStore for MemStore {
    async fn insert_job(&self, new: NewBuildJob) -> StoreResult<BuildJob> {
        let mut inner = self.inner.write().await;
        inner.next_job_id += 1;
        let job = BuildJob {
            id: inner.next_job_id,
            link_id: new.link_id,
            platform: new.platform,
            status: new.status,
            ci_build_id: new.ci_build_id,
            created_at: new.created_at,
            started_at: None,
            finished_at: None,
            error: None,
            apk_url: None,
            bundle_url: None,
            ipa_url: None,
        };
        inner.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn assign_ci_build_id(&self, job_id: i64, ci_build_id: &str) -> StoreResult<BuildJob> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&job_id).ok_or(StoreError::NotFound)?;
        job.ci_build_id = Some(ci_build_id.to_string());
        Ok(job.clone())
    }

    async fn job_by_ci_build_id(&self, ci_build_id: &str) -> StoreResult<Option<BuildJob>> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .find(|j| j.ci_build_id.as_deref() == Some(ci_build_id))
            .cloned())
    }

    async fn start_job(
        &self,
        ci_build_id: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .values_mut()
            .find(|j| j.ci_build_id.as_deref() == Some(ci_build_id));
        Ok(job.map(|job| {
            if job.status == BuildStatus::Queued {
                job.status = BuildStatus::Running;
                job.started_at = Some(at);
                TransitionOutcome {
                    job: job.clone(),
                    applied: true,
                }
            } else {
                TransitionOutcome {
                    job: job.clone(),
                    applied: false,
                }
            }
        }))
    }

    async fn finish_job(
        &self,
        ci_build_id: &str,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .values_mut()
            .find(|j| j.ci_build_id.as_deref() == Some(ci_build_id));
        Ok(job.map(|job| {
            if job.status.is_terminal() {
                TransitionOutcome {
                    job: job.clone(),
                    applied: false,
                }
            } else {
                apply_finish(job, outcome, at);
                TransitionOutcome {
                    job: job.clone(),
                    applied: true,
                }
            }
        }))
    }

    async fn finish_job_by_id(
        &self,
        job_id: i64,
        outcome: &JobOutcome,
        at: DateTime<Utc>,
    ) -> StoreResult<Option<TransitionOutcome>> {
        let mut inner = self.inner.write().await;
        Ok(inner.jobs.get_mut(&job_id).map(|job| {
            if job.status.is_terminal() {
                TransitionOutcome {
                    job: job.clone(),
                    applied: false,
                }
            } else {
                apply_finish(job, outcome, at);
                TransitionOutcome {
                    job: job.clone(),
                    applied: true,
                }
            }
        }))
    }

    async fn latest_job(
        &self,
        link_id: i64,
        platform: Option<Platform>,
    ) -> StoreResult<Option<BuildJob>> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.link_id == link_id)
            .filter(|j| platform.map(|p| j.platform == p).unwrap_or(true))
            .max_by_key(|j| j.id)
            .cloned())
    }

    async fn recent_jobs(&self, link_id: i64, limit: i64) -> StoreResult<Vec<BuildJob>> {
        let mut jobs: Vec<BuildJob> = self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| j.link_id == link_id)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| std::cmp::Reverse(j.id));
        jobs.truncate(limit.max(0) as usize);
        Ok(jobs)
    }

    async fn has_open_job(&self, link_id: i64, platform: Platform) -> StoreResult<bool> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .any(|j| j.link_id == link_id && j.platform == platform && !j.status.is_terminal()))
    }

    async fn stale_open_jobs(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<BuildJob>> {
        Ok(self
            .inner
            .read()
            .await
            .jobs
            .values()
            .filter(|j| !j.status.is_terminal() && j.created_at < cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemStore {
    async fn theme_by_id(&self, id: i64) -> StoreResult<Option<Theme>> {
        Ok(self.inner.read().await.themes.get(&id).cloned())
    }

    async fn active_theme(&self) -> StoreResult<Option<Theme>> {
        Ok(self
            .inner
            .read()
            .await
            .themes
            .values()
            .find(|t| t.active)
            .cloned())
    }

    async fn currency_by_id(&self, id: i64) -> StoreResult<Option<Currency>> {
        Ok(self.inner.read().await.currencies.get(&id).cloned())
    }

    async fn runtime_config(&self, link_id: i64) -> StoreResult<Option<RuntimeConfig>> {
        Ok(self.inner.read().await.runtime_configs.get(&link_id).cloned())
    }

    async fn owner_by_id(&self, id: i64) -> StoreResult<Option<Owner>> {
        Ok(self.inner.read().await.owners.get(&id).cloned())
    }
}
