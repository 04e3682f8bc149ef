//! Admission settings and outcomes.

use serde::Serialize;
use std::time::Duration;

use crate::credentials::{RateLimits, Tier};

/// Settings for [`super::AdmissionController`].
#[derive(Debug, Clone)]
pub struct AdmissionSettings {
    /// Trailing window for the per-minute budget.
    pub window: Duration,
    /// Budget of the shared anonymous bucket.
    pub public_limits: RateLimits,
    /// Reject unknown or revoked credentials instead of downgrading them to public.
    pub strict_credentials: bool,
}

impl Default for AdmissionSettings {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(60),
            public_limits: Tier::Public.default_limits(),
            strict_credentials: false,
        }
    }
}

/// An admitted request: who it was counted against and what is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admission {
    /// Bucket the request was counted in (`"public"` or a credential id)
    pub identity: String,
    pub tier: Tier,
    /// Credential display name, `None` for anonymous traffic
    pub credential_name: Option<String>,
    pub limit: u32,
    pub remaining: u32,
    pub reset_seconds: u64,
}

impl Admission {
    pub fn is_public(&self) -> bool {
        self.credential_name.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinuteUsage {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
}

/// Per-day figures are informational; only the per-minute budget is enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayUsage {
    pub limit: u32,
    pub used: u64,
}

/// Current budget of a credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub key: String,
    pub name: String,
    pub tier: Tier,
    pub per_minute: MinuteUsage,
    pub per_day: DayUsage,
    pub last_used_at: Option<chrono::DateTime<chrono::Utc>>,
}
