//! SQL migration for the orchestrator tables.

use diesel_async::{AsyncPgConnection, SimpleAsyncConnection};

/// Creates the orchestrator tables. ci_build_id gets a unique index: it
/// is the key the external CI system correlates every callback with.
pub const MIGRATION_SQL: &str = r#"
-- ================================================================
-- AppForge build pipeline orchestrator tables
-- ================================================================

CREATE TABLE IF NOT EXISTS forge_owners (
    id              BIGSERIAL PRIMARY KEY,
    email           VARCHAR(255) NOT NULL,
    display_name    VARCHAR(255) NOT NULL
);

CREATE TABLE IF NOT EXISTS forge_themes (
    id              BIGSERIAL PRIMARY KEY,
    name            VARCHAR(255) NOT NULL,
    payload         JSONB NOT NULL DEFAULT '{}',
    active          BOOLEAN NOT NULL DEFAULT FALSE
);

CREATE TABLE IF NOT EXISTS forge_currencies (
    id              BIGSERIAL PRIMARY KEY,
    code            VARCHAR(8) NOT NULL,
    symbol          VARCHAR(8) NOT NULL
);

CREATE TABLE IF NOT EXISTS forge_app_links (
    id                   BIGSERIAL PRIMARY KEY,
    owner_id             BIGINT NOT NULL,
    project_id           BIGINT NOT NULL,
    slug                 VARCHAR(255) NOT NULL,
    app_name             VARCHAR(255) NOT NULL,
    status               VARCHAR(16) NOT NULL DEFAULT 'ACTIVE',
    valid_from           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    end_to               TIMESTAMPTZ,
    theme_id             BIGINT REFERENCES forge_themes(id),
    currency_id          BIGINT REFERENCES forge_currencies(id),
    logo_url             VARCHAR(512),
    api_base_url         VARCHAR(512),
    android_package      VARCHAR(255) NOT NULL,
    android_version_code INTEGER NOT NULL DEFAULT 1,
    android_version_name VARCHAR(32) NOT NULL DEFAULT '1.0.0',
    ios_bundle_id        VARCHAR(255) NOT NULL,
    ios_build_number     INTEGER NOT NULL DEFAULT 1,
    ios_version_name     VARCHAR(32) NOT NULL DEFAULT '1.0.0',
    apk_url              VARCHAR(512),
    bundle_url           VARCHAR(512),
    ipa_url              VARCHAR(512),
    created_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at           TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (owner_id, project_id, slug)
);

CREATE TABLE IF NOT EXISTS forge_build_jobs (
    id              BIGSERIAL PRIMARY KEY,
    link_id         BIGINT NOT NULL REFERENCES forge_app_links(id) ON DELETE CASCADE,
    platform        TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'queued',
    ci_build_id     TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    started_at      TIMESTAMPTZ,
    finished_at     TIMESTAMPTZ,
    error           TEXT,
    apk_url         VARCHAR(512),
    bundle_url      VARCHAR(512),
    ipa_url         VARCHAR(512)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_forge_build_jobs_ci_build_id
    ON forge_build_jobs (ci_build_id) WHERE ci_build_id IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_forge_build_jobs_link ON forge_build_jobs (link_id);
CREATE INDEX IF NOT EXISTS idx_forge_build_jobs_status ON forge_build_jobs (status);

CREATE TABLE IF NOT EXISTS forge_runtime_configs (
    id              BIGSERIAL PRIMARY KEY,
    link_id         BIGINT NOT NULL REFERENCES forge_app_links(id) ON DELETE CASCADE,
    nav             JSONB,
    home            JSONB,
    features        JSONB,
    branding        JSONB,
    UNIQUE (link_id)
);
"#;

/// Run the orchestrator migration.
pub async fn run_migration(conn: &mut AsyncPgConnection) -> anyhow::Result<()> {
    conn.batch_execute(MIGRATION_SQL)
        .await
        .map_err(|e| anyhow::anyhow!("orchestrator migration failed: {e}"))?;
    Ok(())
}
