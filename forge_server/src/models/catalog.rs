//! Read-only collaborator rows: themes, currencies, per-link runtime
//! config overrides, and owner identity for signing metadata.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::{forge_currencies, forge_owners, forge_runtime_configs, forge_themes};

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = forge_themes)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    pub payload: serde_json::Value,
    pub active: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = forge_currencies)]
pub struct Currency {
    pub id: i64,
    pub code: String,
    pub symbol: String,
}

/// Owner-supplied JSON overrides for a link's generated app. Any field
/// may be absent; the assembler substitutes `{}` / `[]` literals.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = forge_runtime_configs)]
pub struct RuntimeConfig {
    pub id: i64,
    pub link_id: i64,
    pub nav: Option<serde_json::Value>,
    pub home: Option<serde_json::Value>,
    pub features: Option<serde_json::Value>,
    pub branding: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = forge_owners)]
pub struct Owner {
    pub id: i64,
    pub email: String,
    pub display_name: String,
}
