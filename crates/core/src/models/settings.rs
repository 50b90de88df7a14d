use serde::{Deserialize, Serialize};

/// User-configurable settings. Persisted as named keys in the config store
/// (see `storage::config`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// The loppis event this till is registered with, if any.
    pub event_id: Option<String>,

    /// API key issued for the event/cashier pair.
    pub api_key: Option<String>,

    /// Sellers approved for the event. Empty = accept any seller number.
    pub approved_sellers: Vec<u32>,

    /// Work without the remote service.
    pub offline_mode: bool,

    /// Percentage of each sale kept by the market organiser (0..=100).
    pub market_share_percent: u8,

    /// Currency label used when formatting amounts (e.g., "SEK").
    pub currency: String,

    /// Override for the remote service base URL.
    pub api_base_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            event_id: None,
            api_key: None,
            approved_sellers: Vec::new(),
            offline_mode: false,
            market_share_percent: 0,
            currency: "SEK".to_string(),
            api_base_url: None,
        }
    }
}

impl Settings {
    /// Whether `seller` may sell at this till. The approved list only applies
    /// when it has been fetched and the till is online.
    pub fn is_seller_approved(&self, seller: u32) -> bool {
        self.offline_mode
            || self.approved_sellers.is_empty()
            || self.approved_sellers.contains(&seller)
    }
}
