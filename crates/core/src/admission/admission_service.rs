//! Request admission: credential lookup plus per-identity sliding windows.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

use super::admission_model::{
    Admission, AdmissionSettings, DayUsage, MinuteUsage, RateLimitStatus,
};
use super::sliding_window::SlidingWindowLimiter;
use crate::credentials::{mask_secret, Credential, CredentialRegistry, Tier, PUBLIC_IDENTITY};
use crate::errors::{Error, Result};

/// Decides whether a request may proceed and counts it.
pub struct AdmissionController {
    registry: Arc<CredentialRegistry>,
    limiter: SlidingWindowLimiter,
    settings: AdmissionSettings,
}

impl AdmissionController {
    pub fn new(registry: Arc<CredentialRegistry>, settings: AdmissionSettings) -> Self {
        Self {
            registry,
            limiter: SlidingWindowLimiter::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &AdmissionSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<CredentialRegistry> {
        &self.registry
    }

    /// Raw sliding-window check for an arbitrary identity.
    pub fn consume(&self, identity: &str, max: u32, window: Duration) -> bool {
        self.limiter.consume(identity, max, window)
    }

    /// Requests left for an arbitrary identity, without recording one.
    pub fn remaining(&self, identity: &str, max: u32, window: Duration) -> u32 {
        self.limiter.remaining(identity, max, window)
    }

    /// Admit a request on a path that tolerates anonymous callers.
    ///
    /// Missing credentials share the public bucket. Unknown or revoked
    /// credentials are downgraded to that bucket too, unless
    /// `strict_credentials` is set.
    pub fn admit(&self, secret: Option<&str>) -> Result<Admission> {
        let Some(secret) = secret.filter(|s| !s.is_empty()) else {
            return self.admit_public();
        };

        match self.registry.validate(secret) {
            Ok(credential) => self.admit_credential(credential),
            Err(_) if self.settings.strict_credentials => Err(Error::Unauthenticated),
            Err(_) => {
                warn!(
                    "Invalid API key {} downgraded to public limits",
                    mask_secret(secret)
                );
                self.admit_public()
            }
        }
    }

    /// Admit a request on a path that requires a valid credential.
    pub fn admit_required(&self, secret: Option<&str>) -> Result<Admission> {
        let secret = secret
            .filter(|s| !s.is_empty())
            .ok_or(Error::Unauthenticated)?;
        let credential = self.registry.validate(secret)?;
        self.admit_credential(credential)
    }

    /// Current budget of a credential. Does not count as a request.
    pub fn status(&self, secret: &str) -> Result<RateLimitStatus> {
        let credential = self.registry.validate(secret)?;
        let limit = credential.limits.per_minute;
        let remaining = self
            .limiter
            .remaining(&credential.id, limit, self.settings.window);

        Ok(RateLimitStatus {
            key: credential.masked_key,
            name: credential.name,
            tier: credential.tier,
            per_minute: MinuteUsage {
                limit,
                remaining,
                used: limit - remaining,
            },
            per_day: DayUsage {
                limit: credential.limits.per_day,
                used: credential.total_requests,
            },
            last_used_at: credential.last_used_at,
        })
    }

    pub fn tracked_identities(&self) -> usize {
        self.limiter.tracked_identities()
    }

    fn admit_public(&self) -> Result<Admission> {
        let limit = self.settings.public_limits.per_minute;
        self.check(PUBLIC_IDENTITY, limit)?;
        Ok(self.admission(PUBLIC_IDENTITY.to_string(), Tier::Public, None, limit))
    }

    fn admit_credential(&self, credential: Credential) -> Result<Admission> {
        let limit = credential.limits.per_minute;
        self.check(&credential.id, limit)?;
        self.registry.record_usage_by_id(&credential.id);
        debug!("Admitted request for credential '{}'", credential.name);
        Ok(self.admission(credential.id, credential.tier, Some(credential.name), limit))
    }

    fn check(&self, identity: &str, limit: u32) -> Result<()> {
        if self.limiter.consume(identity, limit, self.settings.window) {
            Ok(())
        } else {
            Err(Error::RateLimitExceeded {
                limit,
                remaining: 0,
                reset_seconds: self.settings.window.as_secs(),
            })
        }
    }

    fn admission(
        &self,
        identity: String,
        tier: Tier,
        credential_name: Option<String>,
        limit: u32,
    ) -> Admission {
        let remaining = self
            .limiter
            .remaining(&identity, limit, self.settings.window);
        Admission {
            identity,
            tier,
            credential_name,
            limit,
            remaining,
            reset_seconds: self.settings.window.as_secs(),
        }
    }
}
