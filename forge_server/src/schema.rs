//! Diesel table definitions for the build pipeline orchestrator.
//!
//! Tables: forge_app_links, forge_build_jobs, forge_themes,
//! forge_currencies, forge_runtime_configs, forge_owners.
//! forge_build_jobs.ci_build_id carries a unique index — it is the
//! secondary key the external CI system correlates callbacks with.

diesel::table! {
    forge_app_links (id) {
        id -> Int8,
        owner_id -> Int8,
        project_id -> Int8,
        slug -> Varchar,
        app_name -> Varchar,
        status -> Varchar,
        valid_from -> Timestamptz,
        end_to -> Nullable<Timestamptz>,
        theme_id -> Nullable<Int8>,
        currency_id -> Nullable<Int8>,
        logo_url -> Nullable<Varchar>,
        api_base_url -> Nullable<Varchar>,
        android_package -> Varchar,
        android_version_code -> Int4,
        android_version_name -> Varchar,
        ios_bundle_id -> Varchar,
        ios_build_number -> Int4,
        ios_version_name -> Varchar,
        apk_url -> Nullable<Varchar>,
        bundle_url -> Nullable<Varchar>,
        ipa_url -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    forge_build_jobs (id) {
        id -> Int8,
        link_id -> Int8,
        platform -> Text,
        status -> Text,
        ci_build_id -> Nullable<Text>,
        created_at -> Timestamptz,
        started_at -> Nullable<Timestamptz>,
        finished_at -> Nullable<Timestamptz>,
        error -> Nullable<Text>,
        apk_url -> Nullable<Varchar>,
        bundle_url -> Nullable<Varchar>,
        ipa_url -> Nullable<Varchar>,
    }
}

diesel::table! {
    forge_themes (id) {
        id -> Int8,
        name -> Varchar,
        payload -> Jsonb,
        active -> Bool,
    }
}

diesel::table! {
    forge_currencies (id) {
        id -> Int8,
        code -> Varchar,
        symbol -> Varchar,
    }
}

diesel::table! {
    forge_runtime_configs (id) {
        id -> Int8,
        link_id -> Int8,
        nav -> Nullable<Jsonb>,
        home -> Nullable<Jsonb>,
        features -> Nullable<Jsonb>,
        branding -> Nullable<Jsonb>,
    }
}

diesel::table! {
    forge_owners (id) {
        id -> Int8,
        email -> Varchar,
        display_name -> Varchar,
    }
}

diesel::joinable!(forge_build_jobs -> forge_app_links (link_id));
diesel::joinable!(forge_runtime_configs -> forge_app_links (link_id));

diesel::allow_tables_to_appear_in_same_query!(
    forge_app_links,
    forge_build_jobs,
    forge_themes,
    forge_currencies,
    forge_runtime_configs,
    forge_owners,
);
