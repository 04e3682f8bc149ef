//! In-memory credential registry.

use chrono::Utc;
use log::{debug, info, warn};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::credentials_constants::{MASKED_PREFIX_LEN, SECRET_ENTROPY_BYTES, SECRET_PREFIX};
use super::credentials_model::{
    Credential, CredentialStats, CredentialStatus, CredentialView, IssuedCredential, RateLimits,
    Tier,
};
use crate::errors::{Error, Result, ValidationError};

/// SHA-256 digest of a secret, hex encoded. This is the registry key.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Leading characters of a secret followed by an ellipsis.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(MASKED_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{}_{}", SECRET_PREFIX, hex::encode(bytes))
}

/// Issues, validates, revokes and tracks usage of API credentials.
///
/// Secrets are stored only as their SHA-256 digest; the plaintext leaves the
/// registry exactly once, from [`CredentialRegistry::create`].
pub struct CredentialRegistry {
    credentials: Mutex<HashMap<String, Credential>>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self {
            credentials: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the credential map, recovering from poison if necessary.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Credential>> {
        self.credentials.lock().unwrap_or_else(|poisoned| {
            warn!("Credential registry mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Issue a new credential and return its secret.
    pub fn create(&self, name: &str, tier: Tier, limits: RateLimits) -> Result<IssuedCredential> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("name".to_string()).into());
        }
        if limits.per_minute == 0 || limits.per_day == 0 {
            return Err(ValidationError::InvalidInput(
                "rate limits must be greater than zero".to_string(),
            )
            .into());
        }

        let secret = generate_secret();
        let credential = Credential {
            id: hash_secret(&secret),
            name: name.to_string(),
            tier,
            limits,
            status: CredentialStatus::Active,
            total_requests: 0,
            last_used_at: None,
            created_at: Utc::now(),
            masked_key: mask_secret(&secret),
        };

        info!(
            "Issued {} credential '{}' ({}/min, {}/day)",
            tier, credential.name, limits.per_minute, limits.per_day
        );
        self.lock().insert(credential.id.clone(), credential);

        Ok(IssuedCredential {
            secret,
            tier,
            limits,
        })
    }

    /// Issue a credential with the tier's default limits.
    pub fn create_for_tier(&self, name: &str, tier: Tier) -> Result<IssuedCredential> {
        self.create(name, tier, tier.default_limits())
    }

    /// Look up an active credential. Unknown and revoked secrets both fail.
    pub fn validate(&self, secret: &str) -> Result<Credential> {
        if secret.is_empty() {
            return Err(Error::Unauthenticated);
        }
        let id = hash_secret(secret);
        match self.lock().get(&id) {
            Some(credential) if credential.is_active() => Ok(credential.clone()),
            _ => Err(Error::Unauthenticated),
        }
    }

    /// Revoke a credential. Revoking twice succeeds; unknown secrets fail.
    pub fn revoke(&self, secret: &str) -> Result<()> {
        let id = hash_secret(secret);
        let mut credentials = self.lock();
        let credential = credentials
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("API key {}", mask_secret(secret))))?;

        if credential.is_active() {
            credential.status = CredentialStatus::Revoked;
            info!("Revoked credential '{}'", credential.name);
        } else {
            debug!("Credential '{}' was already revoked", credential.name);
        }
        Ok(())
    }

    /// Count an admitted request against the credential.
    pub fn record_usage(&self, secret: &str) {
        self.record_usage_by_id(&hash_secret(secret));
    }

    pub(crate) fn record_usage_by_id(&self, id: &str) {
        if let Some(credential) = self.lock().get_mut(id) {
            credential.total_requests += 1;
            credential.last_used_at = Some(Utc::now());
        }
    }

    /// Every credential with its secret masked, oldest first.
    pub fn list(&self) -> Vec<CredentialView> {
        let credentials = self.lock();
        let mut views: Vec<CredentialView> =
            credentials.values().map(CredentialView::from).collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        views
    }

    pub fn stats(&self) -> CredentialStats {
        let credentials = self.lock();
        let mut stats = CredentialStats {
            total: credentials.len(),
            ..Default::default()
        };
        for credential in credentials.values() {
            stats.total_requests += credential.total_requests;
            if credential.is_active() {
                stats.active += 1;
                *stats.by_tier.entry(credential.tier).or_insert(0) += 1;
            } else {
                stats.revoked += 1;
            }
        }
        stats
    }
}

impl Default for CredentialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_then_validate() {
        let registry = CredentialRegistry::new();
        let issued = registry.create_for_tier("Analytics", Tier::Pro).unwrap();

        assert!(issued.secret.starts_with("vnsk_"));
        assert_eq!(issued.limits, Tier::Pro.default_limits());

        let credential = registry.validate(&issued.secret).unwrap();
        assert_eq!(credential.name, "Analytics");
        assert_eq!(credential.tier, Tier::Pro);
        assert_eq!(credential.total_requests, 0);
        assert!(credential.last_used_at.is_none());
    }

    #[test]
    fn test_secrets_are_unique_and_not_stored_in_plaintext() {
        let registry = CredentialRegistry::new();
        let a = registry.create_for_tier("a", Tier::Free).unwrap();
        let b = registry.create_for_tier("b", Tier::Free).unwrap();
        assert_ne!(a.secret, b.secret);

        let credential = registry.validate(&a.secret).unwrap();
        assert_ne!(credential.id, a.secret);
        assert_eq!(credential.id, hash_secret(&a.secret));
    }

    #[test]
    fn test_unknown_secret_fails_closed() {
        let registry = CredentialRegistry::new();
        assert!(matches!(
            registry.validate("vnsk_unknown"),
            Err(Error::Unauthenticated)
        ));
        assert!(matches!(registry.validate(""), Err(Error::Unauthenticated)));
    }

    #[test]
    fn test_revoke_is_terminal_and_repeatable() {
        let registry = CredentialRegistry::new();
        let issued = registry.create_for_tier("temp", Tier::Basic).unwrap();

        registry.revoke(&issued.secret).unwrap();
        assert!(registry.validate(&issued.secret).is_err());

        // Second revoke is a no-op success
        registry.revoke(&issued.secret).unwrap();
        assert!(registry.validate(&issued.secret).is_err());
    }

    #[test]
    fn test_revoke_unknown_is_not_found() {
        let registry = CredentialRegistry::new();
        assert!(matches!(
            registry.revoke("vnsk_missing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_record_usage() {
        let registry = CredentialRegistry::new();
        let issued = registry.create_for_tier("usage", Tier::Free).unwrap();

        registry.record_usage(&issued.secret);
        registry.record_usage(&issued.secret);

        let credential = registry.validate(&issued.secret).unwrap();
        assert_eq!(credential.total_requests, 2);
        assert!(credential.last_used_at.is_some());
    }

    #[test]
    fn test_list_masks_secrets() {
        let registry = CredentialRegistry::new();
        let issued = registry.create_for_tier("masked", Tier::Free).unwrap();

        let views = registry.list();
        assert_eq!(views.len(), 1);
        assert!(views[0].key.ends_with("..."));
        assert_eq!(views[0].key.len(), MASKED_PREFIX_LEN + 3);
        assert!(issued.secret.starts_with(views[0].key.trim_end_matches("...")));
        assert_ne!(views[0].key, issued.secret);
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let registry = CredentialRegistry::new();
        assert!(registry.create_for_tier("  ", Tier::Free).is_err());
        assert!(registry
            .create("zero", Tier::Free, RateLimits::new(0, 10))
            .is_err());
    }

    #[test]
    fn test_stats() {
        let registry = CredentialRegistry::new();
        let a = registry.create_for_tier("a", Tier::Free).unwrap();
        registry.create_for_tier("b", Tier::Pro).unwrap();
        registry.create_for_tier("c", Tier::Pro).unwrap();
        registry.record_usage(&a.secret);
        registry.revoke(&a.secret).unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.revoked, 1);
        assert_eq!(stats.by_tier.get(&Tier::Pro), Some(&2));
        assert_eq!(stats.by_tier.get(&Tier::Free), None);
        assert_eq!(stats.total_requests, 1);
    }
}
