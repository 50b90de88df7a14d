use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::CoreError;

/// How the buyer paid for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Notes and coins
    #[serde(rename = "Kontant")]
    Cash,
    /// Mobile payment (Swish)
    Swish,
}

impl PaymentMethod {
    /// Token used in the CSV ledger.
    pub fn token(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Kontant",
            PaymentMethod::Swish => "Swish",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kontant" | "cash" => Ok(PaymentMethod::Cash),
            "swish" => Ok(PaymentMethod::Swish),
            other => Err(CoreError::ValidationError(format!(
                "Unknown payment method '{other}' (expected Kontant or Swish)"
            ))),
        }
    }
}

/// A single item sold at the till.
///
/// Identity is the `item_id`: two items with the same id are equal even if
/// other fields differ (e.g. one copy has been paid out and the other not).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoldItem {
    /// Shared by every item checked out together. `None` until checkout.
    pub purchase_id: Option<String>,

    /// Unique per item, stable across save/reload.
    pub item_id: String,

    /// Seller number assigned by the vendor.
    pub seller: u32,

    /// Price in whole currency units.
    pub price: u32,

    /// When the item was checked out (minute precision).
    pub sold_time: NaiveDateTime,

    /// When the proceeds were handed to the seller, if they have been.
    pub collected_by_seller_time: Option<NaiveDateTime>,

    pub payment_method: PaymentMethod,

    /// Whether the record has been synced to the remote server.
    #[serde(default)]
    pub uploaded: bool,
}

impl SoldItem {
    /// Create an item for the sale in progress. Purchase id, sold time and
    /// payment method are placeholders until checkout binds them.
    pub fn new_pending(seller: u32, price: u32) -> Self {
        Self {
            purchase_id: None,
            item_id: Uuid::new_v4().to_string(),
            seller,
            price,
            sold_time: now_minute(),
            collected_by_seller_time: None,
            payment_method: PaymentMethod::Cash,
            uploaded: false,
        }
    }

    pub fn is_collected_by_seller(&self) -> bool {
        self.collected_by_seller_time.is_some()
    }

    /// Mark the item as paid out. A collected time is never overwritten.
    /// Returns `true` if the item changed.
    pub fn mark_collected(&mut self, now: NaiveDateTime) -> bool {
        if self.collected_by_seller_time.is_some() {
            return false;
        }
        self.collected_by_seller_time = Some(truncate_to_minute(now));
        true
    }
}

impl PartialEq for SoldItem {
    fn eq(&self, other: &Self) -> bool {
        self.item_id == other.item_id
    }
}

impl Eq for SoldItem {}

impl Hash for SoldItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item_id.hash(state);
    }
}

/// Current local time with seconds dropped; the ledger stores minutes only.
pub fn now_minute() -> NaiveDateTime {
    truncate_to_minute(Local::now().naive_local())
}

pub fn truncate_to_minute(t: NaiveDateTime) -> NaiveDateTime {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}
