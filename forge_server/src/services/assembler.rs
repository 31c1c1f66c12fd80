//! Build Config Assembler — turns an app link plus optional overrides
//! into a flat, transport-safe snapshot. Pure read + transform; nothing
//! is persisted or cached, since overrides may differ per rebuild call.

use serde::Deserialize;

use crate::config::ForgeConfig;
use crate::error::OrchestratorError;
use crate::models::app_link::AppLink;
use crate::models::snapshot::{b64, BuildConfigSnapshot};
use crate::store::Store;

/// Caller-supplied config overrides, used by rebuild flows. Absent on a
/// first build, where stored runtime config and defaults apply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub nav_json: Option<String>,
    pub home_json: Option<String>,
    pub features_json: Option<String>,
    pub branding_json: Option<String>,
}

/// Assemble the snapshot for one dispatch.
///
/// Theme resolution: explicit theme id if set and found, else the single
/// active theme, else `{}`. JSON fields are never null: absent data
/// yields `{}` / `[]` so the CI scripts can always parse.
pub async fn assemble(
    store: &dyn Store,
    config: &ForgeConfig,
    link: &AppLink,
    overrides: &ConfigOverrides,
) -> Result<BuildConfigSnapshot, OrchestratorError> {
    let theme = match link.theme_id {
        Some(id) => match store.theme_by_id(id).await? {
            Some(theme) => Some(theme),
            None => store.active_theme().await?,
        },
        None => store.active_theme().await?,
    };
    let theme_json = theme
        .map(|t| t.payload.to_string())
        .unwrap_or_else(|| "{}".to_string());

    let runtime = store.runtime_config(link.id).await?;

    let nav_json = overrides
        .nav_json
        .clone()
        .or_else(|| runtime.as_ref().and_then(|r| r.nav.as_ref().map(|v| v.to_string())))
        .unwrap_or_else(|| "[]".to_string());
    let home_json = overrides
        .home_json
        .clone()
        .or_else(|| runtime.as_ref().and_then(|r| r.home.as_ref().map(|v| v.to_string())))
        .unwrap_or_else(|| "{}".to_string());
    let features_json = overrides
        .features_json
        .clone()
        .or_else(|| {
            runtime
                .as_ref()
                .and_then(|r| r.features.as_ref().map(|v| v.to_string()))
        })
        .unwrap_or_else(|| "[]".to_string());
    let branding_json = overrides
        .branding_json
        .clone()
        .or_else(|| {
            runtime
                .as_ref()
                .and_then(|r| r.branding.as_ref().map(|v| v.to_string()))
        })
        .unwrap_or_else(|| "{}".to_string());

    let currency = match link.currency_id {
        Some(id) => store.currency_by_id(id).await?,
        None => None,
    };

    let api_base_url = overrides
        .api_base_url
        .clone()
        .or_else(|| link.api_base_url.clone())
        .unwrap_or_else(|| config.mobile_api_url.clone());

    Ok(BuildConfigSnapshot {
        theme_b64: b64(&theme_json),
        theme_json,
        nav_b64: b64(&nav_json),
        nav_json,
        home_b64: b64(&home_json),
        home_json,
        features_b64: b64(&features_json),
        features_json,
        branding_b64: b64(&branding_json),
        branding_json,
        currency_code: currency.as_ref().map(|c| c.code.clone()),
        currency_symbol: currency.map(|c| c.symbol),
        api_base_url,
        mobile_ws_path: config.mobile_ws_path.clone(),
        attach_mode: config.default_attach_mode.clone(),
        app_role: config.default_app_role.clone(),
    })
}
