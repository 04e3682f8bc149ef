//! Error types for the market data crate.
//!
//! Every variant describes a failure of a single provider call. Callers running
//! batches treat all of them as per-symbol failures; none of them says anything
//! about the health of local persistence.

use thiserror::Error;

/// Errors that can occur while talking to a market data provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider answered but had nothing for the symbol.
    #[error("No data returned for {0}")]
    NoData(String),

    /// The provider rate limited the request (HTTP 429 or an in-band signal).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
        /// Seconds the provider asked us to wait, when it said so
        retry_after: Option<u64>,
    },

    /// The request to the provider did not finish within the call budget.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider does not implement the operation.
    #[error("{operation} is not supported by {provider}")]
    NotSupported {
        operation: String,
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether the provider pushed back on our request rate.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Whether the call ran out of time, either locally or on the wire.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Network(e) => e.is_timeout(),
            _ => false,
        }
    }
}
