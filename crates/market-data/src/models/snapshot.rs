use serde::{Deserialize, Serialize};

/// Screening attributes for one symbol as reported by a provider.
///
/// Every attribute is optional: providers frequently omit ratios for thinly
/// traded names, and a missing value must not overwrite a stored one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningSnapshot {
    /// Ticker symbol (e.g., "VNM", "FPT")
    pub symbol: String,

    /// Listing exchange: "HOSE", "HNX" or "UPCOM"
    #[serde(default)]
    pub exchange: Option<String>,

    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,

    /// Last traded price
    #[serde(default)]
    pub current_price: Option<f64>,

    /// Percentage price change over the last 30 days
    #[serde(default)]
    pub price_change_30d: Option<f64>,

    #[serde(default)]
    pub volume: Option<f64>,

    /// Price to earnings
    #[serde(default)]
    pub pe: Option<f64>,

    /// Price to book
    #[serde(default)]
    pub pb: Option<f64>,

    /// Return on equity
    #[serde(default)]
    pub roe: Option<f64>,

    /// Earnings per share
    #[serde(default)]
    pub eps: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    /// 14-period RSI
    #[serde(default)]
    pub rsi: Option<f64>,

    /// Composite screening score
    #[serde(default)]
    pub score: Option<f64>,
}

impl ScreeningSnapshot {
    /// Create an empty snapshot for a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Normalized symbol used as the storage key.
    pub fn normalized_symbol(&self) -> String {
        self.symbol.trim().to_uppercase()
    }

    /// True when the provider returned no attribute at all.
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.current_price.is_none()
            && self.price_change_30d.is_none()
            && self.volume.is_none()
            && self.pe.is_none()
            && self.pb.is_none()
            && self.roe.is_none()
            && self.eps.is_none()
            && self.market_cap.is_none()
            && self.rsi.is_none()
            && self.score.is_none()
    }
}
