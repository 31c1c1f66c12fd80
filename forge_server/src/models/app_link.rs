//! forge.app_link — a tenant's app identity and configuration root.
//!
//! Owned upstream by the tenant registry; this core reads it, bumps
//! per-platform version counters before rebuilds, and writes the
//! denormalized latest-artifact URLs when builds complete. It is never
//! deleted here (soft-deletion happens upstream via `status`).

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::build_job::Platform;
use crate::schema::forge_app_links;

pub const STATUS_ACTIVE: &str = "ACTIVE";
pub const STATUS_DELETED: &str = "DELETED";
pub const STATUS_EXPIRED: &str = "EXPIRED";

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = forge_app_links)]
pub struct AppLink {
    pub id: i64,
    pub owner_id: i64,
    pub project_id: i64,
    pub slug: String,
    pub app_name: String,
    pub status: String,
    pub valid_from: DateTime<Utc>,
    pub end_to: Option<DateTime<Utc>>,
    pub theme_id: Option<i64>,
    pub currency_id: Option<i64>,
    pub logo_url: Option<String>,
    pub api_base_url: Option<String>,
    pub android_package: String,
    pub android_version_code: i32,
    pub android_version_name: String,
    pub ios_bundle_id: String,
    pub ios_build_number: i32,
    pub ios_version_name: String,
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppLink {
    /// Monotonic build counter for a platform.
    pub fn version_counter(&self, platform: Platform) -> i32 {
        match platform {
            Platform::Android => self.android_version_code,
            Platform::Ios => self.ios_build_number,
        }
    }
}
