//! Ephemeral build configuration snapshot, assembled fresh per dispatch.
//!
//! Every JSON field carries a base64 twin so the CI runner can pass it
//! through environments that mangle raw JSON (env vars, shell quoting).
//! None of this is persisted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfigSnapshot {
    pub theme_json: String,
    pub theme_b64: String,
    pub nav_json: String,
    pub nav_b64: String,
    pub home_json: String,
    pub home_b64: String,
    pub features_json: String,
    pub features_b64: String,
    pub branding_json: String,
    pub branding_b64: String,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub api_base_url: String,
    pub mobile_ws_path: String,
    pub attach_mode: String,
    pub app_role: String,
}

/// Transport encoding of a JSON field.
pub fn b64(raw: &str) -> String {
    STANDARD.encode(raw)
}
