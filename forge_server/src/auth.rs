//! Authorization guard — machine shared-secret checks and human
//! owner/super-admin scoping. The two are never conflated: CI callbacks
//! only ever pass the secret check, humans only ever pass the role check.

use axum::http::HeaderMap;

use crate::config::ForgeConfig;
use crate::error::OrchestratorError;
use crate::models::app_link::AppLink;

/// Header the CI runner uses for its shared secret. A standard
/// `Authorization: Bearer <secret>` is accepted as well.
pub const CI_TOKEN_HEADER: &str = "x-ci-token";

/// Headers the upstream session gateway injects for human callers.
pub const USER_HEADER: &str = "x-forge-user";
pub const ROLE_HEADER: &str = "x-forge-role";

/// Verify the machine shared secret before any ledger access.
pub fn verify_ci_secret(
    config: &ForgeConfig,
    headers: &HeaderMap,
) -> Result<(), OrchestratorError> {
    if config.dev_auth_bypass {
        tracing::warn!("CI auth bypass enabled, accepting callback without secret");
        return Ok(());
    }

    let expected = config.ci_callback_secret.as_str();
    if expected.is_empty() {
        return Err(OrchestratorError::Unauthorized);
    }

    let presented = headers
        .get(CI_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(axum::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .unwrap_or("");

    if presented.is_empty() || presented != expected {
        tracing::warn!("CI callback rejected: bad or missing shared secret");
        return Err(OrchestratorError::Unauthorized);
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    SuperAdmin,
}

/// An authenticated human caller, as asserted by the upstream gateway.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

/// Extract the caller identity from session headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, OrchestratorError> {
    let user_id = headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(OrchestratorError::Unauthorized)?;

    let role = match headers.get(ROLE_HEADER).and_then(|v| v.to_str().ok()) {
        Some("owner") => Role::Owner,
        Some("super_admin") => Role::SuperAdmin,
        _ => return Err(OrchestratorError::Unauthorized),
    };

    Ok(Caller { user_id, role })
}

/// Owner-scoped access: the link must belong to the caller's tenant.
/// A mismatch is Forbidden, not NotFound.
pub fn require_owner(caller: &Caller, link: &AppLink) -> Result<(), OrchestratorError> {
    if caller.role == Role::SuperAdmin {
        return Ok(());
    }
    if link.owner_id != caller.user_id {
        return Err(OrchestratorError::Forbidden);
    }
    Ok(())
}

/// Whether the caller may see this link at all. Used by read endpoints
/// that answer "not found" uniformly for nonexistent and foreign links.
pub fn can_view(caller: &Caller, link: &AppLink) -> bool {
    caller.role == Role::SuperAdmin || link.owner_id == caller.user_id
}

/// Super-admin-scoped access: tenant scoping is ignored entirely.
pub fn require_super_admin(caller: &Caller) -> Result<(), OrchestratorError> {
    if caller.role != Role::SuperAdmin {
        return Err(OrchestratorError::Forbidden);
    }
    Ok(())
}
