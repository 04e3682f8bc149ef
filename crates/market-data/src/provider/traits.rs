//! Market data provider trait definitions.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{ListedSymbol, ScreeningSnapshot};

/// Trait for market data providers.
///
/// Implementations are expected to be slow and rate limited. Callers pace their
/// own requests; a provider only reports what happened on a single call.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use vnscreen_market_data::{MarketDataError, MarketDataProvider, ScreeningSnapshot};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for FixedProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch(&self, symbol: &str) -> Result<ScreeningSnapshot, MarketDataError> {
///         Ok(ScreeningSnapshot::new(symbol))
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider, used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Fetch the current screening snapshot for a symbol.
    ///
    /// Returns `MarketDataError::RateLimited` when the upstream pushes back,
    /// and any other variant for generic failures.
    async fn fetch(&self, symbol: &str) -> Result<ScreeningSnapshot, MarketDataError>;

    /// List every symbol traded on an exchange.
    ///
    /// Default implementation returns `NotSupported`.
    async fn list_symbols(&self, exchange: &str) -> Result<Vec<ListedSymbol>, MarketDataError> {
        let _ = exchange;
        Err(MarketDataError::NotSupported {
            operation: "list_symbols".to_string(),
            provider: self.id().to_string(),
        })
    }
}
