//! forge.build_job — one attempt to produce a platform-specific artifact.
//!
//! The ledger is append-only: a row is inserted at dispatch time and only
//! ever moves forward through the state machine
//! `queued -> running -> {succeeded, failed}`. External CI callbacks are
//! correlated via `ci_build_id`, a secondary unique key, because the CI
//! runner only knows the id it was handed at dispatch time.

use std::io::Write;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};

use crate::schema::forge_build_jobs;

/// Target platform of a build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(String);

impl std::str::FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(ParsePlatformError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Pg> for Platform {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for Platform {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        s.parse().map_err(|e: ParsePlatformError| e.to_string().into())
    }
}

/// Job lifecycle state. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl BuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Queued => "queued",
            BuildStatus::Running => "running",
            BuildStatus::Succeeded => "succeeded",
            BuildStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Succeeded | BuildStatus::Failed)
    }
}

impl std::str::FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(BuildStatus::Queued),
            "running" => Ok(BuildStatus::Running),
            "succeeded" => Ok(BuildStatus::Succeeded),
            "failed" => Ok(BuildStatus::Failed),
            other => Err(format!("unknown build status: {other}")),
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql<Text, Pg> for BuildStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for BuildStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        s.parse().map_err(|e: String| e.into())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = forge_build_jobs)]
pub struct BuildJob {
    pub id: i64,
    pub link_id: i64,
    pub platform: Platform,
    pub status: BuildStatus,
    pub ci_build_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = forge_build_jobs)]
pub struct NewBuildJob {
    pub link_id: i64,
    pub platform: Platform,
    pub status: BuildStatus,
    pub ci_build_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Artifact URLs produced by a build, by platform convention:
/// apk + bundle for Android, ipa for iOS.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtifactUrls {
    pub apk_url: Option<String>,
    pub bundle_url: Option<String>,
    pub ipa_url: Option<String>,
}

impl ArtifactUrls {
    /// Keep only the fields that belong to `platform`.
    pub fn scoped(self, platform: Platform) -> Self {
        match platform {
            Platform::Android => ArtifactUrls {
                apk_url: self.apk_url,
                bundle_url: self.bundle_url,
                ipa_url: None,
            },
            Platform::Ios => ArtifactUrls {
                apk_url: None,
                bundle_url: None,
                ipa_url: self.ipa_url,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.apk_url.is_none() && self.bundle_url.is_none() && self.ipa_url.is_none()
    }
}

/// Terminal write requested for a job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub status: BuildStatus,
    pub error: Option<String>,
    pub artifacts: ArtifactUrls,
}

impl JobOutcome {
    pub fn succeeded(artifacts: ArtifactUrls) -> Self {
        JobOutcome {
            status: BuildStatus::Succeeded,
            error: None,
            artifacts,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        JobOutcome {
            status: BuildStatus::Failed,
            error: Some(error.into()),
            artifacts: ArtifactUrls::default(),
        }
    }
}

/// Result of a guarded state transition: the row as it stands, and
/// whether this call actually applied the write (false on idempotent
/// replays).
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub job: BuildJob,
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_case_insensitively() {
        assert_eq!("ANDROID".parse::<Platform>().unwrap(), Platform::Android);
        assert_eq!("ios".parse::<Platform>().unwrap(), Platform::Ios);
        assert!("windows".parse::<Platform>().is_err());
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(!BuildStatus::Queued.is_terminal());
        assert!(!BuildStatus::Running.is_terminal());
        assert!(BuildStatus::Succeeded.is_terminal());
        assert!(BuildStatus::Failed.is_terminal());
    }

    #[test]
    fn artifact_urls_scope_by_platform() {
        let urls = ArtifactUrls {
            apk_url: Some("https://x/app.apk".into()),
            bundle_url: Some("https://x/app.aab".into()),
            ipa_url: Some("https://x/app.ipa".into()),
        };
        let android = urls.clone().scoped(Platform::Android);
        assert!(android.apk_url.is_some() && android.bundle_url.is_some());
        assert!(android.ipa_url.is_none());

        let ios = urls.scoped(Platform::Ios);
        assert!(ios.apk_url.is_none() && ios.bundle_url.is_none());
        assert!(ios.ipa_url.is_some());
    }
}
