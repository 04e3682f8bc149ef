use serde::{Deserialize, Serialize};

/// A symbol listed on an exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedSymbol {
    pub symbol: String,
    pub exchange: String,
    #[serde(default)]
    pub organ_name: Option<String>,
}

/// Map exchange board codes to the names used throughout the system.
pub fn normalize_exchange(board: &str) -> String {
    match board.trim().to_uppercase().as_str() {
        "HSX" => "HOSE".to_string(),
        other => other.to_string(),
    }
}
