//! End-to-end pipeline tests over the in-memory store with a scripted
//! CI trigger, exercising dispatch, callbacks, rebuilds, manifest pull,
//! and the stuck-job sweeper.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use appforge_server::auth::{Caller, Role};
use appforge_server::config::ForgeConfig;
use appforge_server::error::OrchestratorError;
use appforge_server::models::app_link::{AppLink, STATUS_ACTIVE};
use appforge_server::models::build_job::{ArtifactUrls, BuildStatus, NewBuildJob, Platform};
use appforge_server::models::catalog::{Currency, Owner, RuntimeConfig, Theme};
use appforge_server::services::assembler::{self, ConfigOverrides};
use appforge_server::services::ci_trigger::{
    CiTrigger, CiTriggerError, CiTriggerReply, CiTriggerRequest,
};
use appforge_server::services::manifest::{self, ManifestDoc, ManifestError, ManifestSource};
use appforge_server::services::rebuild::{self, AdminRebuildBothRequest, AdminRebuildRequest};
use appforge_server::services::{dispatcher, ledger, sweeper};
use appforge_server::store::memory::MemStore;
use appforge_server::store::{AppLinkStore, BuildJobStore};

// ── Fixtures ──

fn test_config() -> ForgeConfig {
    ForgeConfig {
        ci_callback_secret: "s3cret".to_string(),
        ci_trigger_url: "http://ci.local/trigger".to_string(),
        callback_base_url: "http://forge.local".to_string(),
        manifest_base_url: "http://cdn.local/manifests".to_string(),
        mobile_api_url: "https://api.appforge.dev".to_string(),
        mobile_ws_path: "/ws".to_string(),
        default_attach_mode: "auto".to_string(),
        default_app_role: "customer".to_string(),
        stuck_job_ttl_min: 0,
        dev_auth_bypass: false,
    }
}

fn link(id: i64, owner_id: i64) -> AppLink {
    AppLink {
        id,
        owner_id,
        project_id: 100,
        slug: format!("app-{id}"),
        app_name: format!("App {id}"),
        status: STATUS_ACTIVE.to_string(),
        valid_from: Utc::now(),
        end_to: None,
        theme_id: None,
        currency_id: None,
        logo_url: None,
        api_base_url: None,
        android_package: format!("dev.appforge.app{id}"),
        android_version_code: 7,
        android_version_name: "1.7".to_string(),
        ios_bundle_id: format!("dev.appforge.app{id}"),
        ios_build_number: 3,
        ios_version_name: "1.3".to_string(),
        apk_url: None,
        bundle_url: None,
        ipa_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

async fn seeded_store() -> MemStore {
    let store = MemStore::new();
    store.insert_link(link(1, 10)).await;
    store
        .insert_owner(Owner {
            id: 10,
            email: "owner@example.com".to_string(),
            display_name: "Owner Ten".to_string(),
        })
        .await;
    store
}

/// Scripted CI trigger: records every request, answers per `mode`.
enum TriggerMode {
    /// Runner assigns a build id synchronously.
    AssignId(String),
    /// Runner accepts but returns an empty body.
    EmptyReply,
    /// Trigger call fails outright.
    Fail(String),
}

struct FakeTrigger {
    mode: TriggerMode,
    requests: Mutex<Vec<CiTriggerRequest>>,
}

impl FakeTrigger {
    fn new(mode: TriggerMode) -> Self {
        Self {
            mode,
            requests: Mutex::new(Vec::new()),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> CiTriggerRequest {
        self.requests.lock().unwrap().last().unwrap().clone()
    }
}

#[async_trait]
impl CiTrigger for FakeTrigger {
    async fn trigger(&self, req: &CiTriggerRequest) -> Result<CiTriggerReply, CiTriggerError> {
        self.requests.lock().unwrap().push(req.clone());
        match &self.mode {
            TriggerMode::AssignId(id) => Ok(CiTriggerReply {
                ci_build_id: Some(id.clone()),
            }),
            TriggerMode::EmptyReply => Ok(CiTriggerReply::default()),
            TriggerMode::Fail(msg) => Err(CiTriggerError::Http(msg.clone())),
        }
    }
}

struct FakeManifest {
    doc: Option<ManifestDoc>,
}

#[async_trait]
impl ManifestSource for FakeManifest {
    async fn fetch(
        &self,
        _owner_id: i64,
        _project_id: i64,
        _slug: &str,
    ) -> Result<Option<ManifestDoc>, ManifestError> {
        Ok(self.doc.clone())
    }
}

// ── Config assembly ──

#[tokio::test]
async fn assembly_defaults_when_nothing_is_configured() {
    let store = seeded_store().await;
    let config = test_config();
    let l = link(1, 10);

    let snap = assembler::assemble(&store, &config, &l, &ConfigOverrides::default())
        .await
        .unwrap();

    assert_eq!(snap.theme_json, "{}");
    assert_eq!(snap.nav_json, "[]");
    assert_eq!(snap.home_json, "{}");
    assert_eq!(snap.features_json, "[]");
    assert_eq!(snap.branding_json, "{}");
    assert!(snap.currency_code.is_none());
    assert_eq!(snap.api_base_url, "https://api.appforge.dev");
    assert_eq!(snap.attach_mode, "auto");
    assert_eq!(snap.app_role, "customer");
}

#[tokio::test]
async fn assembly_layers_runtime_config_theme_and_overrides() {
    let store = seeded_store().await;
    store
        .insert_theme(Theme {
            id: 5,
            name: "Dark".to_string(),
            payload: serde_json::json!({"primary": "#112233"}),
            active: false,
        })
        .await;
    store
        .insert_currency(Currency {
            id: 2,
            code: "EUR".to_string(),
            symbol: "€".to_string(),
        })
        .await;
    store
        .insert_runtime_config(RuntimeConfig {
            id: 1,
            link_id: 1,
            nav: Some(serde_json::json!([{"title": "Home"}])),
            home: None,
            features: None,
            branding: Some(serde_json::json!({"name": "Acme"})),
        })
        .await;

    let mut l = link(1, 10);
    l.theme_id = Some(5);
    l.currency_id = Some(2);
    l.api_base_url = Some("https://acme.example.com".to_string());

    let config = test_config();
    let overrides = ConfigOverrides {
        nav_json: Some(r#"[{"title":"Override"}]"#.to_string()),
        ..ConfigOverrides::default()
    };
    let snap = assembler::assemble(&store, &config, &l, &overrides)
        .await
        .unwrap();

    // Override beats stored runtime config; other fields fall through.
    assert_eq!(snap.nav_json, r#"[{"title":"Override"}]"#);
    assert!(snap.branding_json.contains("Acme"));
    assert_eq!(snap.home_json, "{}");
    assert!(snap.theme_json.contains("#112233"));
    assert_eq!(snap.currency_code.as_deref(), Some("EUR"));
    assert_eq!(snap.currency_symbol.as_deref(), Some("€"));
    assert_eq!(snap.api_base_url, "https://acme.example.com");
}

#[tokio::test]
async fn assembly_falls_back_to_active_theme_for_dangling_theme_id() {
    let store = seeded_store().await;
    store
        .insert_theme(Theme {
            id: 9,
            name: "Default".to_string(),
            payload: serde_json::json!({"primary": "#ffffff"}),
            active: true,
        })
        .await;

    let mut l = link(1, 10);
    l.theme_id = Some(404);

    let snap = assembler::assemble(&store, &test_config(), &l, &ConfigOverrides::default())
        .await
        .unwrap();
    assert!(snap.theme_json.contains("#ffffff"));
}

// ── Dispatch ──

#[tokio::test]
async fn dispatch_records_ci_build_id_from_runner() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-123".to_string()));
    let config = test_config();
    let l = link(1, 10);

    let job = dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    assert_eq!(job.status, BuildStatus::Queued);
    assert_eq!(job.ci_build_id.as_deref(), Some("ci-123"));
    assert_eq!(trigger.request_count(), 1);

    let req = trigger.last_request();
    assert_eq!(req.link_id, 1);
    assert_eq!(req.platform, "android");
    assert_eq!(req.android_version_code, 7);
    assert_eq!(req.owner_email.as_deref(), Some("owner@example.com"));
    assert_eq!(req.callback_token, "s3cret");
}

#[tokio::test]
async fn dispatch_synthesizes_surrogate_id_on_empty_reply() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::EmptyReply);
    let l = link(1, 10);

    let job = dispatcher::dispatch(
        &store,
        &trigger,
        &test_config(),
        &l,
        Platform::Ios,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    let id = job.ci_build_id.unwrap();
    assert!(id.starts_with("1-ios-"), "surrogate id was {id}");
}

#[tokio::test]
async fn dispatch_failure_yields_failed_job_not_error() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::Fail("runner unreachable".to_string()));
    let l = link(1, 10);

    let job = dispatcher::dispatch(
        &store,
        &trigger,
        &test_config(),
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    assert_eq!(job.status, BuildStatus::Failed);
    assert!(job.error.unwrap().contains("runner unreachable"));
    assert!(job.finished_at.is_some());
    // A failed dispatch does not block the next attempt.
    assert!(!store.has_open_job(1, Platform::Android).await.unwrap());
}

#[tokio::test]
async fn second_dispatch_is_rejected_while_a_job_is_in_flight() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-1".to_string()));
    let l = link(1, 10);
    let config = test_config();

    dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    let err = dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidRequest(_)));
    assert_eq!(trigger.request_count(), 1);

    // The other platform is independent.
    dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Ios,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();
}

// ── Callback ledger ──

async fn dispatched(store: &MemStore, ci_build_id: &str) {
    let trigger = FakeTrigger::new(TriggerMode::AssignId(ci_build_id.to_string()));
    let l = link(1, 10);
    dispatcher::dispatch(
        store,
        &trigger,
        &test_config(),
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn happy_path_callbacks_advance_the_job_and_publish_artifacts() {
    let store = seeded_store().await;
    dispatched(&store, "ci-9").await;

    let job = ledger::mark_running(&store, "ci-9").await.unwrap();
    assert_eq!(job.status, BuildStatus::Running);
    assert!(job.started_at.is_some());

    let artifacts = ArtifactUrls {
        apk_url: Some("https://cdn/app.apk".to_string()),
        bundle_url: Some("https://cdn/app.aab".to_string()),
        ipa_url: None,
    };
    let job = ledger::mark_succeeded(&store, "ci-9", artifacts).await.unwrap();
    assert_eq!(job.status, BuildStatus::Succeeded);
    assert_eq!(job.apk_url.as_deref(), Some("https://cdn/app.apk"));
    assert!(job.finished_at.is_some());

    // Latest artifacts are denormalized onto the link.
    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(l.apk_url.as_deref(), Some("https://cdn/app.apk"));
    assert_eq!(l.bundle_url.as_deref(), Some("https://cdn/app.aab"));
    assert!(l.ipa_url.is_none());
}

#[tokio::test]
async fn late_running_callback_after_success_is_a_noop() {
    let store = seeded_store().await;
    dispatched(&store, "ci-9").await;

    ledger::mark_running(&store, "ci-9").await.unwrap();
    ledger::mark_succeeded(
        &store,
        "ci-9",
        ArtifactUrls {
            apk_url: Some("https://cdn/app.apk".to_string()),
            ..ArtifactUrls::default()
        },
    )
    .await
    .unwrap();

    // Replayed "running" must not regress the state or clear timestamps.
    let job = ledger::mark_running(&store, "ci-9").await.unwrap();
    assert_eq!(job.status, BuildStatus::Succeeded);
    assert_eq!(job.apk_url.as_deref(), Some("https://cdn/app.apk"));
    assert!(job.finished_at.is_some());
}

#[tokio::test]
async fn first_terminal_write_wins_over_replays() {
    let store = seeded_store().await;
    dispatched(&store, "ci-9").await;

    ledger::mark_succeeded(
        &store,
        "ci-9",
        ArtifactUrls {
            apk_url: Some("https://cdn/v1.apk".to_string()),
            ..ArtifactUrls::default()
        },
    )
    .await
    .unwrap();

    // A contradictory "failed" afterwards changes nothing.
    let job = ledger::mark_failed(&store, "ci-9", "late failure".to_string())
        .await
        .unwrap();
    assert_eq!(job.status, BuildStatus::Succeeded);
    assert!(job.error.is_none());

    // And a duplicate success with different URLs changes nothing either.
    let job = ledger::mark_succeeded(
        &store,
        "ci-9",
        ArtifactUrls {
            apk_url: Some("https://cdn/v2.apk".to_string()),
            ..ArtifactUrls::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(job.apk_url.as_deref(), Some("https://cdn/v1.apk"));
}

#[tokio::test]
async fn started_at_is_set_exactly_once() {
    let store = seeded_store().await;
    dispatched(&store, "ci-9").await;

    let first = ledger::mark_running(&store, "ci-9").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = ledger::mark_running(&store, "ci-9").await.unwrap();

    assert_eq!(first.started_at, second.started_at);
}

#[tokio::test]
async fn callback_for_unknown_build_id_is_not_found_and_creates_nothing() {
    let store = seeded_store().await;

    let err = ledger::mark_failed(&store, "ci-ghost", "boom".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));

    let err = ledger::mark_running(&store, "ci-ghost").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));

    assert!(store.recent_jobs(1, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn success_artifacts_are_scoped_to_the_job_platform() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-ios".to_string()));
    let l = link(1, 10);
    dispatcher::dispatch(
        &store,
        &trigger,
        &test_config(),
        &l,
        Platform::Ios,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    // A confused runner reports every URL; only the ipa belongs to iOS.
    let job = ledger::mark_succeeded(
        &store,
        "ci-ios",
        ArtifactUrls {
            apk_url: Some("https://cdn/app.apk".to_string()),
            bundle_url: Some("https://cdn/app.aab".to_string()),
            ipa_url: Some("https://cdn/app.ipa".to_string()),
        },
    )
    .await
    .unwrap();

    assert!(job.apk_url.is_none() && job.bundle_url.is_none());
    assert_eq!(job.ipa_url.as_deref(), Some("https://cdn/app.ipa"));

    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert!(l.apk_url.is_none());
    assert_eq!(l.ipa_url.as_deref(), Some("https://cdn/app.ipa"));
}

#[tokio::test]
async fn tenant_scoped_apk_delivery_matches_on_the_full_key() {
    let store = seeded_store().await;

    let err = ledger::set_apk_url(&store, 10, 100, "wrong-slug", "https://cdn/a.apk".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));

    let l = ledger::set_apk_url(&store, 10, 100, "app-1", "https://cdn/a.apk".to_string())
        .await
        .unwrap();
    assert_eq!(l.apk_url.as_deref(), Some("https://cdn/a.apk"));
    assert!(l.bundle_url.is_none() && l.ipa_url.is_none());
}

// ── Rebuild flows ──

#[tokio::test]
async fn owner_rebuild_dispatches_android_for_own_link_only() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-r".to_string()));
    let config = test_config();

    let owner = Caller {
        user_id: 10,
        role: Role::Owner,
    };
    let job = rebuild::owner_rebuild(&store, &trigger, &config, &owner, 1)
        .await
        .unwrap();
    assert_eq!(job.platform, Platform::Android);
    assert_eq!(job.status, BuildStatus::Queued);

    let stranger = Caller {
        user_id: 11,
        role: Role::Owner,
    };
    let err = rebuild::owner_rebuild(&store, &trigger, &config, &stranger, 1)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Forbidden));

    let err = rebuild::owner_rebuild(&store, &trigger, &config, &owner, 404)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));
}

#[tokio::test]
async fn admin_rebuild_bumps_the_version_before_dispatch() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-b".to_string()));
    let config = test_config();

    let req = AdminRebuildRequest {
        bump_version: true,
        ..AdminRebuildRequest::default()
    };
    rebuild::admin_rebuild(&store, &trigger, &config, 1, Platform::Android, &req)
        .await
        .unwrap();

    // 7 -> 8, and the CI runner sees the bumped value.
    assert_eq!(trigger.last_request().android_version_code, 8);
    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(l.android_version_code, 8);
    assert_eq!(l.ios_build_number, 3);
}

#[tokio::test]
async fn version_bump_survives_a_failed_dispatch() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::Fail("down".to_string()));
    let config = test_config();

    let req = AdminRebuildRequest {
        bump_version: true,
        ..AdminRebuildRequest::default()
    };
    let job = rebuild::admin_rebuild(&store, &trigger, &config, 1, Platform::Android, &req)
        .await
        .unwrap();
    assert_eq!(job.status, BuildStatus::Failed);

    // The bump is never rolled back; the next attempt goes higher still.
    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(l.android_version_code, 8);

    rebuild::admin_rebuild(&store, &trigger, &config, 1, Platform::Android, &req)
        .await
        .unwrap();
    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(l.android_version_code, 9);
}

#[tokio::test]
async fn rebuild_both_creates_two_jobs_with_independent_bumps() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-x".to_string()));
    let config = test_config();

    let req = AdminRebuildBothRequest {
        bump_android: true,
        bump_ios: false,
        ..AdminRebuildBothRequest::default()
    };
    let (android, ios) = rebuild::admin_rebuild_both(&store, &trigger, &config, 1, &req)
        .await
        .unwrap();

    assert_eq!(android.platform, Platform::Android);
    assert_eq!(ios.platform, Platform::Ios);
    assert_ne!(android.id, ios.id);
    assert_eq!(trigger.request_count(), 2);

    let l = AppLinkStore::link_by_id(&store, 1).await.unwrap().unwrap();
    assert_eq!(l.android_version_code, 8);
    assert_eq!(l.ios_build_number, 3);
}

// ── Manifest pull ──

#[tokio::test]
async fn manifest_pull_reconciles_artifact_urls() {
    let store = seeded_store().await;
    let source = FakeManifest {
        doc: Some(ManifestDoc {
            apk_url: Some("https://cdn/m.apk".to_string()),
            bundle_url: None,
            ipa_url: None,
        }),
    };

    let l = manifest::pull(&store, &source, 10, 100, "app-1").await.unwrap();
    assert_eq!(l.apk_url.as_deref(), Some("https://cdn/m.apk"));
}

#[tokio::test]
async fn unpublished_or_empty_manifest_leaves_the_link_unchanged() {
    let store = seeded_store().await;

    let absent = FakeManifest { doc: None };
    let l = manifest::pull(&store, &absent, 10, 100, "app-1").await.unwrap();
    assert!(l.apk_url.is_none());

    let empty = FakeManifest {
        doc: Some(ManifestDoc::default()),
    };
    let l = manifest::pull(&store, &empty, 10, 100, "app-1").await.unwrap();
    assert!(l.apk_url.is_none() && l.bundle_url.is_none() && l.ipa_url.is_none());
}

#[tokio::test]
async fn manifest_pull_for_unknown_link_is_not_found() {
    let store = seeded_store().await;
    let source = FakeManifest { doc: None };

    let err = manifest::pull(&store, &source, 10, 100, "nope").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::NotFound));
}

// ── Stuck-job sweeper ──

#[tokio::test]
async fn sweeper_fails_only_stale_open_jobs() {
    let store = seeded_store().await;

    // Stale queued job, stale succeeded job, fresh queued job.
    let old = Utc::now() - Duration::minutes(120);
    store
        .insert_job(NewBuildJob {
            link_id: 1,
            platform: Platform::Android,
            status: BuildStatus::Queued,
            ci_build_id: Some("ci-stale".to_string()),
            created_at: old,
        })
        .await
        .unwrap();
    store
        .insert_job(NewBuildJob {
            link_id: 1,
            platform: Platform::Ios,
            status: BuildStatus::Queued,
            ci_build_id: Some("ci-done".to_string()),
            created_at: old,
        })
        .await
        .unwrap();
    ledger::mark_succeeded(&store, "ci-done", ArtifactUrls::default())
        .await
        .unwrap();
    store
        .insert_job(NewBuildJob {
            link_id: 1,
            platform: Platform::Android,
            status: BuildStatus::Running,
            ci_build_id: Some("ci-fresh".to_string()),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let swept = sweeper::sweep_once(&store, 60).await.unwrap();
    assert_eq!(swept, 1);

    let stale = store.job_by_ci_build_id("ci-stale").await.unwrap().unwrap();
    assert_eq!(stale.status, BuildStatus::Failed);
    assert_eq!(stale.error.as_deref(), Some("timed out waiting for CI"));
    assert!(stale.finished_at.is_some());

    let done = store.job_by_ci_build_id("ci-done").await.unwrap().unwrap();
    assert_eq!(done.status, BuildStatus::Succeeded);

    let fresh = store.job_by_ci_build_id("ci-fresh").await.unwrap().unwrap();
    assert_eq!(fresh.status, BuildStatus::Running);
}

// ── Dashboard queries ──

#[tokio::test]
async fn latest_job_filters_by_platform() {
    let store = seeded_store().await;
    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-a".to_string()));
    let config = test_config();
    let l = link(1, 10);

    dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Android,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();
    ledger::mark_failed(&store, "ci-a", "oops".to_string())
        .await
        .unwrap();

    let trigger = FakeTrigger::new(TriggerMode::AssignId("ci-i".to_string()));
    dispatcher::dispatch(
        &store,
        &trigger,
        &config,
        &l,
        Platform::Ios,
        &ConfigOverrides::default(),
    )
    .await
    .unwrap();

    let latest = ledger::latest_job(&store, 1, None).await.unwrap().unwrap();
    assert_eq!(latest.platform, Platform::Ios);

    let android = ledger::latest_job(&store, 1, Some(Platform::Android))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(android.platform, Platform::Android);
    assert_eq!(android.status, BuildStatus::Failed);

    let jobs = ledger::recent_jobs(&store, 1, 10).await.unwrap();
    assert_eq!(jobs.len(), 2);
    // Newest first.
    assert_eq!(jobs[0].platform, Platform::Ios);
}
