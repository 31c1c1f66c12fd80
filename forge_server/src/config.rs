//! Orchestrator configuration — loaded from environment variables.

#[derive(Clone, Debug)]
pub struct ForgeConfig {
    /// Shared secret the CI runner presents on every callback.
    pub ci_callback_secret: String,
    /// Endpoint of the external CI system's trigger API.
    pub ci_trigger_url: String,
    /// Base URL the CI runner calls back on (handed out at dispatch).
    pub callback_base_url: String,
    /// Base URL for published build manifests (pull fallback).
    pub manifest_base_url: String,
    /// Default API base URL baked into generated apps.
    pub mobile_api_url: String,
    /// WebSocket path baked into generated apps.
    pub mobile_ws_path: String,
    /// Default owner-attach mode for generated apps.
    pub default_attach_mode: String,
    /// Default role assigned inside generated apps.
    pub default_app_role: String,
    /// Minutes before a non-terminal job is swept to FAILED. 0 disables.
    pub stuck_job_ttl_min: i64,
    /// Dev-profile escape hatch: skip the machine shared-secret check.
    pub dev_auth_bypass: bool,
}

impl ForgeConfig {
    pub fn from_env() -> Self {
        let ci_callback_secret = std::env::var("FORGE_CI_SECRET").unwrap_or_default();
        let ci_trigger_url = std::env::var("FORGE_CI_TRIGGER_URL").unwrap_or_default();
        let callback_base_url = std::env::var("FORGE_CALLBACK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let manifest_base_url = std::env::var("FORGE_MANIFEST_BASE_URL").unwrap_or_default();
        let mobile_api_url = std::env::var("FORGE_MOBILE_API_URL")
            .unwrap_or_else(|_| "https://api.appforge.dev".to_string());
        let mobile_ws_path =
            std::env::var("FORGE_MOBILE_WS_PATH").unwrap_or_else(|_| "/ws".to_string());
        let default_attach_mode =
            std::env::var("FORGE_DEFAULT_ATTACH_MODE").unwrap_or_else(|_| "auto".to_string());
        let default_app_role =
            std::env::var("FORGE_DEFAULT_APP_ROLE").unwrap_or_else(|_| "customer".to_string());
        let stuck_job_ttl_min = std::env::var("FORGE_STUCK_JOB_TTL_MIN")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let dev_auth_bypass = std::env::var("FORGE_DEV_AUTH_BYPASS")
            .map(|s| s == "1" || s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        if ci_callback_secret.is_empty() && !dev_auth_bypass {
            tracing::warn!("FORGE_CI_SECRET not set -- all CI callbacks will be rejected");
        }
        if ci_trigger_url.is_empty() {
            tracing::warn!("FORGE_CI_TRIGGER_URL not set -- dispatches will fail fast");
        }
        if manifest_base_url.is_empty() {
            tracing::warn!("FORGE_MANIFEST_BASE_URL not set -- manifest pull disabled");
        }

        Self {
            ci_callback_secret,
            ci_trigger_url,
            callback_base_url,
            manifest_base_url,
            mobile_api_url,
            mobile_ws_path,
            default_attach_mode,
            default_app_role,
            stuck_job_ttl_min,
            dev_auth_bypass,
        }
    }
}
