//! Credential domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Named bundle of rate limits and features.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Callers without a valid credential
    Public,
    Free,
    Basic,
    Pro,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Public,
        Tier::Free,
        Tier::Basic,
        Tier::Pro,
        Tier::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Public => "public",
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tier::Public => "Public (No API Key)",
            Tier::Free => "Free Tier",
            Tier::Basic => "Basic Tier",
            Tier::Pro => "Pro Tier",
            Tier::Enterprise => "Enterprise Tier",
        }
    }

    /// Default limits applied when a credential is issued for this tier.
    pub fn default_limits(&self) -> RateLimits {
        match self {
            Tier::Public => RateLimits::new(20, 500),
            Tier::Free => RateLimits::new(60, 1_000),
            Tier::Basic => RateLimits::new(120, 5_000),
            Tier::Pro => RateLimits::new(300, 20_000),
            Tier::Enterprise => RateLimits::new(1_000, 100_000),
        }
    }

    /// Feature flags unlocked by the tier. `"*"` means every base feature.
    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Tier::Public => &["basic_data", "technical_indicators"],
            Tier::Free => &[
                "basic_data",
                "technical_indicators",
                "fundamental_data",
                "screener",
            ],
            Tier::Basic => &["*", "portfolio_analytics", "intraday_data"],
            Tier::Pro => &["*", "websocket", "priority_support"],
            Tier::Enterprise => &["*", "custom_integration", "dedicated_support"],
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownTier(s.to_string()))
    }
}

/// Per-credential request budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimits {
    pub per_minute: u32,
    pub per_day: u32,
}

impl RateLimits {
    pub const fn new(per_minute: u32, per_day: u32) -> Self {
        Self {
            per_minute,
            per_day,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Active,
    /// Terminal
    Revoked,
}

/// A registered API credential.
///
/// The secret itself is never kept; `id` is its SHA-256 digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: String,
    pub name: String,
    pub tier: Tier,
    pub limits: RateLimits,
    pub status: CredentialStatus,
    pub total_requests: u64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Leading characters of the secret followed by an ellipsis
    pub masked_key: String,
}

impl Credential {
    pub fn is_active(&self) -> bool {
        self.status == CredentialStatus::Active
    }
}

/// Audit view of a credential, safe to show to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub key: String,
    pub name: String,
    pub tier: Tier,
    pub limits: RateLimits,
    pub is_active: bool,
    pub total_requests: u64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Credential> for CredentialView {
    fn from(c: &Credential) -> Self {
        Self {
            key: c.masked_key.clone(),
            name: c.name.clone(),
            tier: c.tier,
            limits: c.limits,
            is_active: c.is_active(),
            total_requests: c.total_requests,
            last_used_at: c.last_used_at,
            created_at: c.created_at,
        }
    }
}

/// Result of issuing a credential. The secret is only ever returned here.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub secret: String,
    pub tier: Tier,
    pub limits: RateLimits,
}

/// Aggregate numbers over every registered credential.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStats {
    pub total: usize,
    pub active: usize,
    pub revoked: usize,
    /// Active credentials per tier
    pub by_tier: BTreeMap<Tier, usize>,
    pub total_requests: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trips_through_str() {
        for tier in Tier::ALL {
            assert_eq!(tier.as_str().parse::<Tier>().unwrap(), tier);
        }
        assert_eq!("PRO".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("platinum".parse::<Tier>().is_err());
    }

    #[test]
    fn test_tier_limits_grow_with_tier() {
        let mut previous = 0;
        for tier in Tier::ALL {
            let limits = tier.default_limits();
            assert!(limits.per_minute > previous);
            assert!(limits.per_minute <= 1_000);
            previous = limits.per_minute;
        }
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Tier::Enterprise).unwrap(), "\"enterprise\"");
    }
}
