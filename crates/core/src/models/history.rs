use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::sold_item::{PaymentMethod, SoldItem};

/// Optional history filter criteria. `None` on a dimension means "all".
/// Criteria are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleFilter {
    pub seller: Option<u32>,
    pub payment_method: Option<PaymentMethod>,
    /// `Some(true)` = paid out to seller, `Some(false)` = not yet paid out.
    pub paid: Option<bool>,
}

impl SaleFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_seller(seller: u32) -> Self {
        Self {
            seller: Some(seller),
            ..Self::default()
        }
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_paid(mut self, paid: bool) -> Self {
        self.paid = Some(paid);
        self
    }

    pub fn matches(&self, item: &SoldItem) -> bool {
        self.seller.map_or(true, |s| item.seller == s)
            && self.payment_method.map_or(true, |m| item.payment_method == m)
            && self.paid.map_or(true, |p| item.is_collected_by_seller() == p)
    }
}

/// Everything the history view needs after applying a filter.
#[derive(Debug, Clone, Default)]
pub struct HistorySummary {
    /// Items matching the filter, in ledger order.
    pub items: Vec<SoldItem>,
    pub count: usize,
    /// Sum of prices of the matching items.
    pub total: u64,
    /// Distinct sellers in the full (unfiltered) history.
    pub sellers: BTreeSet<u32>,
    /// A specific seller is selected and at least one matching item is unpaid.
    pub payout_enabled: bool,
}

/// Split of the filtered takings between the seller and the market organiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SellerSettlement {
    pub gross: u64,
    pub market_share: u64,
    pub net: u64,
}

/// Result of merging an imported ledger into the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub added: usize,
    pub updated: usize,
}
