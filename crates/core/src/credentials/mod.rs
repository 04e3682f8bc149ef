//! Credentials module - API keys, tiers and the credential registry.

mod credentials_constants;
mod credentials_model;
mod credentials_service;

pub use credentials_constants::*;
pub use credentials_model::{
    Credential, CredentialStats, CredentialStatus, CredentialView, IssuedCredential, RateLimits,
    Tier,
};
pub use credentials_service::{hash_secret, mask_secret, CredentialRegistry};
